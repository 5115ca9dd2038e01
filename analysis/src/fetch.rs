use crate::aggregate::{filter_by_year, sum_by_group, time_series_by_entity};
use crate::load::{COUNTRY_TABLE, Dataset, STATE_TABLE};
use anyhow::Result;
use log::{debug, info, warn};
use rand::RngExt;
use rand::seq::SliceRandom;
use reqwest::Client;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tokio::runtime::Runtime;

/// Base URL for the source tables. When unset, the tables already present in
/// the data directory are used as-is.
const DATA_BASE_ENV: &str = "EVDASH_DATA_BASE";

const SPOT_CHECK_YEARS: usize = 4;

pub fn fetch_datasets(dir: &Path) -> Result<()> {
    let Ok(base) = std::env::var(DATA_BASE_ENV) else {
        info!("{DATA_BASE_ENV} not set, using local tables");
        return Ok(());
    };

    let rt = Runtime::new()?;
    rt.block_on(async {
        let client = Client::new();
        for table in [COUNTRY_TABLE, STATE_TABLE] {
            if let Err(e) = fetch_table(&client, &base, dir, table).await {
                warn!("Failed to fetch {table}: {e:?}");
            }
        }
        Ok(())
    })
}

async fn fetch_table(client: &Client, base: &str, dir: &Path, table: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(table);
    if path.exists() {
        debug!("{} already present, not fetching", path.display());
        return Ok(());
    }

    let url = format!("{}/{table}", base.trim_end_matches('/'));
    info!("Fetching {url}");
    let res = client.get(&url).send().await?;
    debug!("Status: {:?}", res.status());

    let bytes = res.error_for_status()?.bytes().await?;
    debug!("Received {} bytes", bytes.len());

    let mut file = File::create_new(&path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Cross-checks the aggregation layer against direct recomputation on a few
/// random year samples, so a bad ingest run shows up in the logs before any
/// chart is drawn.
pub fn spot_check(data: &Dataset) {
    let mut rng = rand::rng();

    let mut sampled = data.years.clone();
    sampled.partial_shuffle(&mut rng, SPOT_CHECK_YEARS);
    sampled.truncate(SPOT_CHECK_YEARS);

    let mut mismatches = 0;
    for &year in &sampled {
        let rows = filter_by_year(&data.countries, |r| r.year, year);
        let totals = sum_by_group(&rows, |r| r.region.clone(), |r| r.ev_sales);

        let grouped: f64 = totals.iter().map(|t| t.1).sum();
        let direct: f64 = rows.iter().map(|r| r.ev_sales).sum();
        if (grouped - direct).abs() > 1e-6 * direct.abs().max(1.0) {
            warn!("Sales totals for {year} diverge: grouped {grouped}, direct {direct}");
            mismatches += 1;
        }

        if totals.windows(2).any(|pair| pair[0].1 < pair[1].1) {
            warn!("Sales ranking for {year} is not descending: {totals:?}");
            mismatches += 1;
        }
    }

    let series = time_series_by_entity(&data.countries, |r| r.country.clone(), |r| r.year);
    if !series.is_empty() {
        let (country, records) = &series[rng.random_range(0..series.len())];
        if records.windows(2).any(|pair| pair[0].year > pair[1].year) {
            warn!("Time series for {country} is not ascending by year");
            mismatches += 1;
        }
    }

    if mismatches == 0 {
        info!("Aggregation spot check passed over {} year samples", sampled.len());
    } else {
        warn!("Aggregation spot check found {mismatches} inconsistencies");
    }
}
