#![forbid(unsafe_code)]

use anyhow::Result;
use evdash::aggregate::{filter_by_year, max_by_group, sum_by_group};
use evdash::dashboard::{TOP_COUNTRIES, on_hover, render_all, stock_lines_frame, stock_tooltip};
use evdash::fetch;
use evdash::load::Dataset;
use evdash::plot::PngSurface;
use evdash::state::InteractionState;
use log::{info, warn};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let data_dir = Path::new("data");
    fetch::fetch_datasets(data_dir)?;

    let dataset = Dataset::load(data_dir)?;
    info!(
        "Loaded {} country records over {} years and {} state records over {} years",
        dataset.countries.len(),
        dataset.years.len(),
        dataset.states.len(),
        dataset.us_years.len()
    );

    fetch::spot_check(&dataset);

    if let Err(e) = dataset.serialize(Path::new("data/dashboard.db")) {
        warn!("Failed to serialize dashboard database: {e:?}");
    }

    print_summaries(&dataset);

    let view = InteractionState::new(&dataset);
    let mut surface = PngSurface::new(Path::new("plots"))?;
    render_all(&dataset, &view, &mut surface);

    render_focused(&dataset)?;

    Ok(())
}

/// Second pass with the leading country highlighted, the way the dashboard
/// fades competitors on hover.
fn render_focused(dataset: &Dataset) -> Result<()> {
    let mut ranked =
        max_by_group(&dataset.countries, |r| r.country.clone(), |r| r.market_share);
    ranked.truncate(1);
    let Some((leader, _)) = ranked.into_iter().next() else {
        return Ok(());
    };

    let mut focus = InteractionState::new(dataset);
    let content = stock_tooltip(&stock_lines_frame(dataset, None), &leader)
        .unwrap_or_else(|| leader.clone());
    on_hover(&mut focus, &leader, content, 0.0, 0.0);
    info!("Highlighting {leader} for the focused render");

    let mut surface = PngSurface::new(Path::new("plots/focus"))?;
    render_all(dataset, &focus, &mut surface);
    Ok(())
}

fn print_summaries(data: &Dataset) {
    let Some(&year) = data.years.last() else {
        return;
    };

    println!("### EV sales by region ({year}) ###");
    println!("| {:<16} | {:>12} |", "Region", "Sales");
    let rows = filter_by_year(&data.countries, |r| r.year, year);
    for (region, total) in sum_by_group(&rows, |r| r.region.clone(), |r| r.ev_sales) {
        println!("| {region:<16} | {total:>12.0} |");
    }

    println!("### Peak market share by country ###");
    println!("| {:<20} | {:>8} |", "Country", "Share");
    let mut ranked = max_by_group(&data.countries, |r| r.country.clone(), |r| r.market_share);
    ranked.truncate(TOP_COUNTRIES);
    for (country, share) in ranked {
        println!("| {country:<20} | {share:>7.1}% |");
    }
}
