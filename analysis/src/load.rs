use crate::schema::{RawCountryRow, RawStateRow};
use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

pub const COUNTRY_TABLE: &str = "ev_country_year.csv";
pub const STATE_TABLE: &str = "us_state_infra.csv";

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("empty {0} table")]
    EmptyTable(&'static str),
    #[error("non-numeric year {value:?} for {entity:?}")]
    InvalidYear { entity: String, value: String },
    #[error("failed to read {path}: {source}")]
    Unreadable { path: String, source: csv::Error },
}

#[derive(Clone, Debug, Serialize)]
pub struct CountryYearRecord {
    pub country: String,
    pub region: String,
    pub year: u32,
    pub ev_stock: f64,
    pub ev_sales: f64,
    pub market_share: f64,
    pub co2_transport: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StateYearRecord {
    pub state: String,
    pub year: u32,
    pub chargers: f64,
    pub ev_stock: f64,
    pub market_share: f64,
}

/// The in-memory model both the aggregation engine and the dashboard read.
///
/// Immutable once loaded: a reload builds a fresh `Dataset` and swaps it in
/// wholesale, so a failed reload leaves the previous one untouched.
#[derive(Debug, Serialize)]
pub struct Dataset {
    pub countries: Vec<CountryYearRecord>,
    pub states: Vec<StateYearRecord>,
    /// Distinct years present in the country table, ascending.
    pub years: Vec<u32>,
    /// Distinct years present in the US state table, ascending.
    pub us_years: Vec<u32>,
}

impl Dataset {
    pub fn load(dir: &Path) -> Result<Self, DataLoadError> {
        let countries = read_table::<RawCountryRow>(&dir.join(COUNTRY_TABLE))?;
        let states = read_table::<RawStateRow>(&dir.join(STATE_TABLE))?;
        Self::from_rows(countries, states)
    }

    pub fn from_rows(
        country_rows: Vec<RawCountryRow>,
        state_rows: Vec<RawStateRow>,
    ) -> Result<Self, DataLoadError> {
        if country_rows.is_empty() {
            return Err(DataLoadError::EmptyTable("country"));
        }
        if state_rows.is_empty() {
            return Err(DataLoadError::EmptyTable("state"));
        }

        let countries = country_rows
            .into_iter()
            .map(|row| {
                Ok(CountryYearRecord {
                    year: parse_year(&row.country, &row.year)?,
                    country: row.country,
                    region: row.region,
                    ev_stock: non_negative(row.ev_stock),
                    ev_sales: non_negative(row.ev_sales),
                    market_share: row.market_share.clamp(0.0, 100.0),
                    co2_transport: non_negative(row.co2_transport),
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;

        let states = state_rows
            .into_iter()
            .map(|row| {
                Ok(StateYearRecord {
                    year: parse_year(&row.state, &row.year)?,
                    state: row.state,
                    chargers: non_negative(row.chargers),
                    ev_stock: non_negative(row.ev_stock),
                    market_share: row.market_share.clamp(0.0, 100.0),
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;

        let years: Vec<u32> = countries
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let us_years: Vec<u32> = states
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        debug!(
            "Loaded {} country records over {} years, {} state records over {} years",
            countries.len(),
            years.len(),
            states.len(),
            us_years.len()
        );

        Ok(Dataset {
            countries,
            states,
            years,
            us_years,
        })
    }

    /// Writes the compact database embedded by the browser dashboard.
    pub fn serialize(&self, path: &Path) -> Result<()> {
        info!("Serializing dashboard database to {}", path.display());
        let file = File::create_new(path)?;
        postcard::to_io(self, BufWriter::new(file))?;
        Ok(())
    }
}

fn read_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, DataLoadError> {
    let unreadable = |source: csv::Error| DataLoadError::Unreadable {
        path: path.display().to_string(),
        source,
    };
    let file = File::open(path).map_err(|e| unreadable(e.into()))?;
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file)
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .map_err(unreadable)
}

fn parse_year(entity: &str, value: &str) -> Result<u32, DataLoadError> {
    value
        .trim()
        .parse()
        .map_err(|_| DataLoadError::InvalidYear {
            entity: entity.to_owned(),
            value: value.to_owned(),
        })
}

fn non_negative(x: f64) -> f64 {
    x.max(0.0)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub fn country_row(country: &str, region: &str, year: &str, sales: f64) -> RawCountryRow {
        RawCountryRow {
            country: country.into(),
            region: region.into(),
            year: year.into(),
            ev_stock: 0.0,
            ev_sales: sales,
            market_share: 0.0,
            co2_transport: 0.0,
        }
    }

    pub fn state_row(state: &str, year: &str, chargers: f64) -> RawStateRow {
        RawStateRow {
            state: state.into(),
            year: year.into(),
            chargers,
            ev_stock: 0.0,
            market_share: 0.0,
        }
    }

    #[test]
    fn years_are_distinct_and_ascending() {
        let dataset = Dataset::from_rows(
            vec![
                country_row("Norway", "Europe", "2021", 1.0),
                country_row("Norway", "Europe", "2019", 1.0),
                country_row("China", "Asia", "2021", 1.0),
                country_row("China", "Asia", "2020", 1.0),
            ],
            vec![state_row("California", "2021", 1.0)],
        )
        .unwrap();
        assert_eq!(dataset.years, vec![2019, 2020, 2021]);
        assert_eq!(dataset.us_years, vec![2021]);
    }

    #[test]
    fn non_numeric_year_is_fatal() {
        let result = Dataset::from_rows(
            vec![
                country_row("Norway", "Europe", "2020", 1.0),
                country_row("China", "Asia", "20x1", 1.0),
            ],
            vec![state_row("California", "2021", 1.0)],
        );
        match result {
            Err(DataLoadError::InvalidYear { entity, value }) => {
                assert_eq!(entity, "China");
                assert_eq!(value, "20x1");
            }
            other => panic!("Expected InvalidYear, got {other:?}"),
        }
    }

    #[test]
    fn empty_table_is_fatal() {
        let result = Dataset::from_rows(vec![], vec![state_row("California", "2021", 1.0)]);
        assert!(matches!(result, Err(DataLoadError::EmptyTable("country"))));

        let result =
            Dataset::from_rows(vec![country_row("Norway", "Europe", "2020", 1.0)], vec![]);
        assert!(matches!(result, Err(DataLoadError::EmptyTable("state"))));
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        let mut row = country_row("X", "R1", "2020", -5.0);
        row.market_share = 120.0;
        row.co2_transport = -1.0;
        let dataset =
            Dataset::from_rows(vec![row], vec![state_row("California", "2020", 1.0)]).unwrap();
        assert_eq!(dataset.countries[0].ev_sales, 0.0);
        assert_eq!(dataset.countries[0].market_share, 100.0);
        assert_eq!(dataset.countries[0].co2_transport, 0.0);
    }

    #[test]
    fn duplicate_year_pairs_are_kept() {
        let dataset = Dataset::from_rows(
            vec![
                country_row("Norway", "Europe", "2020", 10.0),
                country_row("Norway", "Europe", "2020", 5.0),
            ],
            vec![state_row("California", "2020", 1.0)],
        )
        .unwrap();
        assert_eq!(dataset.countries.len(), 2);
        assert_eq!(dataset.years, vec![2020]);
    }
}
