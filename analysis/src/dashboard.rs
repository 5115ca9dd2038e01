//! Per-chart aggregation frames and the render coordinator.
//!
//! A frame is everything one chart needs for a redraw: the aggregation
//! result plus the scalars extracted from the interaction state. Render
//! adapters implement [`Surface`] and never touch the dataset directly.

use crate::aggregate::{domain_extent, filter_by_year, max_by_group, sum_by_group, time_series_by_entity};
use crate::load::Dataset;
use crate::state::InteractionState;
use anyhow::Result;
use log::warn;

/// How many countries the heatmap keeps, ranked by peak market share.
pub const TOP_COUNTRIES: usize = 25;
/// Upper bound of the heatmap color ramp, in percent.
pub const SHARE_COLOR_MAX: f64 = 80.0;
/// Parallel-coordinate axes, in drawing order.
pub const DIMENSION_LABELS: [&str; 4] = ["Stock", "Sales", "Share %", "CO2"];

pub struct SalesBarsFrame {
    pub year: u32,
    /// Sales summed per region, descending.
    pub totals: Vec<(String, f64)>,
    pub sales_max: f64,
}

pub struct CountrySeries {
    pub country: String,
    pub points: Vec<(u32, f64)>,
}

pub struct StockLinesFrame {
    pub year_range: (u32, u32),
    pub stock_max: f64,
    pub series: Vec<CountrySeries>,
    pub highlighted: Option<String>,
}

pub struct HeatCell {
    pub country: String,
    pub year: u32,
    pub share: f64,
}

pub struct ShareHeatmapFrame {
    /// Top countries by peak market share, descending.
    pub countries: Vec<String>,
    pub years: Vec<u32>,
    pub cells: Vec<HeatCell>,
}

pub struct ScatterPoint {
    pub state: String,
    pub chargers: f64,
    pub ev_stock: f64,
    pub market_share: f64,
}

pub struct InfraScatterFrame {
    pub year: u32,
    pub chargers_max: f64,
    pub stock_max: f64,
    pub points: Vec<ScatterPoint>,
    pub highlighted: Option<String>,
}

pub struct ParallelRow {
    pub country: String,
    pub values: [f64; 4],
}

pub struct ParallelCoordsFrame {
    pub year: u32,
    /// Per-dimension extents over the whole country table, aligned with
    /// [`DIMENSION_LABELS`].
    pub extents: [(f64, f64); 4],
    pub rows: Vec<ParallelRow>,
    pub highlighted: Option<String>,
}

pub fn sales_bars_frame(data: &Dataset, year: u32) -> SalesBarsFrame {
    let rows = filter_by_year(&data.countries, |r| r.year, year);
    let totals = sum_by_group(&rows, |r| r.region.clone(), |r| r.ev_sales);
    SalesBarsFrame {
        year,
        sales_max: positive_max(&totals, |t| t.1, 100.0),
        totals,
    }
}

pub fn stock_lines_frame(data: &Dataset, highlighted: Option<&str>) -> StockLinesFrame {
    let series = time_series_by_entity(&data.countries, |r| r.country.clone(), |r| r.year)
        .into_iter()
        .map(|(country, records)| CountrySeries {
            country,
            points: records.iter().map(|r| (r.year, r.ev_stock)).collect(),
        })
        .collect();
    StockLinesFrame {
        year_range: year_range(&data.years),
        stock_max: positive_max(&data.countries, |r| r.ev_stock, 100.0),
        series,
        highlighted: highlighted.map(str::to_owned),
    }
}

pub fn share_heatmap_frame(data: &Dataset) -> ShareHeatmapFrame {
    let mut ranked = max_by_group(&data.countries, |r| r.country.clone(), |r| r.market_share);
    ranked.truncate(TOP_COUNTRIES);
    let countries: Vec<String> = ranked.into_iter().map(|(country, _)| country).collect();
    let cells = data
        .countries
        .iter()
        .filter(|r| countries.contains(&r.country))
        .map(|r| HeatCell {
            country: r.country.clone(),
            year: r.year,
            share: r.market_share,
        })
        .collect();
    ShareHeatmapFrame {
        countries,
        years: data.years.clone(),
        cells,
    }
}

pub fn infra_scatter_frame(data: &Dataset, year: u32, highlighted: Option<&str>) -> InfraScatterFrame {
    let points = filter_by_year(&data.states, |r| r.year, year)
        .into_iter()
        .map(|r| ScatterPoint {
            state: r.state.clone(),
            chargers: r.chargers,
            ev_stock: r.ev_stock,
            market_share: r.market_share,
        })
        .collect();
    InfraScatterFrame {
        year,
        chargers_max: positive_max(&data.states, |r| r.chargers, 1000.0),
        stock_max: positive_max(&data.states, |r| r.ev_stock, 1000.0),
        points,
        highlighted: highlighted.map(str::to_owned),
    }
}

pub fn parallel_coords_frame(data: &Dataset, highlighted: Option<&str>) -> ParallelCoordsFrame {
    let year = data.years.last().copied().unwrap_or_default();
    let rows = filter_by_year(&data.countries, |r| r.year, year)
        .into_iter()
        .map(|r| ParallelRow {
            country: r.country.clone(),
            values: dimensions(r),
        })
        .collect();
    let extents = [0, 1, 2, 3].map(|dim| {
        domain_extent(&data.countries, |r| dimensions(r)[dim], (0.0, 1.0))
    });
    ParallelCoordsFrame {
        year,
        extents,
        rows,
        highlighted: highlighted.map(str::to_owned),
    }
}

fn dimensions(r: &crate::load::CountryYearRecord) -> [f64; 4] {
    [r.ev_stock, r.ev_sales, r.market_share, r.co2_transport]
}

fn year_range(years: &[u32]) -> (u32, u32) {
    match (years.first(), years.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (0, 0),
    }
}

/// Chart y-domains are `[0, max]`; an empty or all-zero input falls back to a
/// fixed span so the axis stays drawable.
fn positive_max<R, VF>(records: &[R], value: VF, fallback: f64) -> f64
where
    VF: Fn(&R) -> f64,
{
    match domain_extent(records, value, (0.0, 0.0)) {
        (_, hi) if hi > 0.0 => hi,
        _ => fallback,
    }
}

// Tooltip content, resolved per chart the way each renderer labels its marks.
// `None` means the entity is not in the frame and nothing should pop up.

pub fn sales_tooltip(frame: &SalesBarsFrame, region: &str) -> Option<String> {
    let (region, total) = frame.totals.iter().find(|(r, _)| r == region)?;
    Some(format!("{region}\nSales: {}", group_digits(*total)))
}

pub fn stock_tooltip(frame: &StockLinesFrame, country: &str) -> Option<String> {
    let series = frame.series.iter().find(|s| s.country == country)?;
    let &(_, stock) = series.points.last()?;
    Some(format!("{country}\nMax stock: {}", group_digits(stock)))
}

pub fn share_tooltip(frame: &ShareHeatmapFrame, country: &str, year: u32) -> Option<String> {
    let cell = frame
        .cells
        .iter()
        .find(|c| c.country == country && c.year == year)?;
    Some(format!("{country} ({year})\nShare: {:.1}%", cell.share))
}

pub fn infra_tooltip(frame: &InfraScatterFrame, state: &str) -> Option<String> {
    let point = frame.points.iter().find(|p| p.state == state)?;
    Some(format!(
        "{state}\nStock: {}\nChargers: {}\nShare: {}%",
        group_digits(point.ev_stock),
        group_digits(point.chargers),
        point.market_share
    ))
}

pub fn profile_tooltip(frame: &ParallelCoordsFrame, country: &str) -> Option<String> {
    let row = frame.rows.iter().find(|r| r.country == country)?;
    Some(format!(
        "{country}\nShare: {}%\nCO2: {}",
        row.values[2], row.values[3]
    ))
}

fn group_digits(x: f64) -> String {
    let digits = format!("{x:.0}");
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// One render target per chart. Implementations draw a frame or skip with
/// `Ok(())` when their target is missing.
pub trait Surface {
    fn sales_bars(&mut self, frame: &SalesBarsFrame) -> Result<()>;
    fn stock_lines(&mut self, frame: &StockLinesFrame) -> Result<()>;
    fn share_heatmap(&mut self, frame: &ShareHeatmapFrame) -> Result<()>;
    fn infra_scatter(&mut self, frame: &InfraScatterFrame) -> Result<()>;
    fn parallel_coords(&mut self, frame: &ParallelCoordsFrame) -> Result<()>;
}

/// Redraws the five charts in fixed order. A chart that fails to draw is
/// logged and skipped so it cannot take the others down with it.
pub fn render_all<S: Surface>(data: &Dataset, view: &InteractionState, surface: &mut S) {
    let highlighted = view.highlighted.as_deref();
    if let Err(e) = surface.sales_bars(&sales_bars_frame(data, view.sales_year)) {
        warn!("Failed to render sales bars: {e:?}");
    }
    if let Err(e) = surface.stock_lines(&stock_lines_frame(data, highlighted)) {
        warn!("Failed to render stock lines: {e:?}");
    }
    if let Err(e) = surface.share_heatmap(&share_heatmap_frame(data)) {
        warn!("Failed to render share heatmap: {e:?}");
    }
    if let Err(e) = surface.infra_scatter(&infra_scatter_frame(data, view.scatter_year, highlighted)) {
        warn!("Failed to render infra scatter: {e:?}");
    }
    if let Err(e) = surface.parallel_coords(&parallel_coords_frame(data, highlighted)) {
        warn!("Failed to render parallel coordinates: {e:?}");
    }
}

/// Adapter callbacks map straight onto interaction-state transitions.
pub fn on_hover(view: &mut InteractionState, entity: &str, content: String, x: f64, y: f64) {
    view.highlight(entity);
    view.show_tooltip(content, x, y);
}

pub fn on_move(view: &mut InteractionState, x: f64, y: f64) {
    view.move_tooltip(x, y);
}

pub fn on_leave(view: &mut InteractionState) {
    view.unhighlight();
    view.hide_tooltip();
}
