use crate::dashboard::{
    DIMENSION_LABELS, InfraScatterFrame, ParallelCoordsFrame, SHARE_COLOR_MAX, SalesBarsFrame,
    ShareHeatmapFrame, StockLinesFrame, Surface,
};
use anyhow::Result;
use log::info;
use plotters::coord::ranged1d::{IntoSegmentedCoord, SegmentValue};
use plotters::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

const ACCENT: RGBColor = RGBColor(0x2a, 0x9d, 0x8f);

const CATEGORY_COLORS: [RGBColor; 10] = [
    RGBColor(0x4e, 0x79, 0xa7),
    RGBColor(0xf2, 0x8e, 0x2c),
    RGBColor(0xe1, 0x57, 0x59),
    RGBColor(0x76, 0xb7, 0xb2),
    RGBColor(0x59, 0xa1, 0x4f),
    RGBColor(0xed, 0xc9, 0x49),
    RGBColor(0xaf, 0x7a, 0xa1),
    RGBColor(0xff, 0x9d, 0xa7),
    RGBColor(0x9c, 0x75, 0x5f),
    RGBColor(0xba, 0xb0, 0xab),
];

/// Renders every chart as a PNG under the output directory.
pub struct PngSurface {
    out_dir: PathBuf,
}

impl PngSurface {
    pub fn new(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    fn chart_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{name}.png"))
    }
}

impl Surface for PngSurface {
    fn sales_bars(&mut self, frame: &SalesBarsFrame) -> Result<()> {
        let path = self.chart_path(&format!("sales-by-region-{}", frame.year));
        info!("Rendering sales bars for {} to {}", frame.year, path.display());
        let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let bars = frame.totals.len().max(1) as i32;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Annual EV sales by region ({})", frame.year),
                ("sans-serif", 24),
            )
            .margin(20)
            .x_label_area_size(80)
            .y_label_area_size(80)
            .build_cartesian_2d((0..bars).into_segmented(), 0.0..frame.sales_max)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(frame.totals.len().max(1))
            .x_label_formatter(&|x| segment_label(x, &frame.totals))
            .y_labels(5)
            .label_style(("sans-serif", 14))
            .draw()?;

        chart.draw_series(frame.totals.iter().enumerate().map(|(i, (_, total))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i as i32), 0.0),
                    (SegmentValue::Exact(i as i32 + 1), *total),
                ],
                category_color(i).filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    fn stock_lines(&mut self, frame: &StockLinesFrame) -> Result<()> {
        let path = self.chart_path("ev-stock-trends");
        info!("Rendering stock lines to {}", path.display());
        let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let (first_year, last_year) = frame.year_range;
        let mut chart = ChartBuilder::on(&root)
            .caption("Total EV stock by country", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(
                first_year..last_year.max(first_year + 1),
                0.0..frame.stock_max,
            )?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(8)
            .y_labels(5)
            .label_style(("sans-serif", 14))
            .draw()?;

        for (i, series) in frame.series.iter().enumerate() {
            let style = emphasis(
                category_color(i),
                frame.highlighted.as_deref(),
                &series.country,
                4,
                2,
                0.6,
            );
            chart.draw_series(LineSeries::new(series.points.iter().copied(), style))?;
        }

        root.present()?;
        Ok(())
    }

    fn share_heatmap(&mut self, frame: &ShareHeatmapFrame) -> Result<()> {
        let path = self.chart_path("market-share-heatmap");
        info!(
            "Rendering share heatmap for {} countries to {}",
            frame.countries.len(),
            path.display()
        );
        let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let cols = frame.years.len().max(1) as i32;
        let rows = frame.countries.len().max(1) as i32;
        let mut chart = ChartBuilder::on(&root)
            .caption("EV market share (%)", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(140)
            .build_cartesian_2d((0..cols).into_segmented(), (0..rows).into_segmented())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(frame.years.len().max(1))
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => frame
                    .years
                    .get(*i as usize)
                    .map(u32::to_string)
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_labels(frame.countries.len().max(1))
            .y_label_formatter(&|y| match y {
                SegmentValue::CenterOf(i) => frame
                    .countries
                    .get(*i as usize)
                    .cloned()
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .label_style(("sans-serif", 12))
            .draw()?;

        let year_index: HashMap<u32, i32> = frame
            .years
            .iter()
            .enumerate()
            .map(|(i, &year)| (year, i as i32))
            .collect();
        let country_index: HashMap<&str, i32> = frame
            .countries
            .iter()
            .enumerate()
            .map(|(i, country)| (country.as_str(), i as i32))
            .collect();

        chart.draw_series(frame.cells.iter().filter_map(|cell| {
            let x = *year_index.get(&cell.year)?;
            let y = *country_index.get(cell.country.as_str())?;
            let mut rect = Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                share_color(cell.share).filled(),
            );
            rect.set_margin(1, 1, 1, 1);
            Some(rect)
        }))?;

        root.present()?;
        Ok(())
    }

    fn infra_scatter(&mut self, frame: &InfraScatterFrame) -> Result<()> {
        let path = self.chart_path(&format!("infrastructure-scatter-{}", frame.year));
        info!(
            "Rendering infra scatter for {} to {}",
            frame.year,
            path.display()
        );
        let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        if frame.points.is_empty() {
            root.draw(&Text::new(
                "No Data",
                (WIDTH as i32 / 2 - 50, HEIGHT as i32 / 2),
                ("sans-serif", 28),
            ))?;
            root.present()?;
            return Ok(());
        }

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("US states: chargers vs EV stock ({})", frame.year),
                ("sans-serif", 24),
            )
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(0.0..frame.chargers_max, 0.0..frame.stock_max)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Chargers")
            .y_desc("EV stock")
            .x_labels(5)
            .y_labels(5)
            .label_style(("sans-serif", 14))
            .axis_desc_style(("sans-serif", 16))
            .draw()?;

        chart.draw_series(frame.points.iter().map(|p| {
            let style = match frame.highlighted.as_deref() {
                Some(sel) if sel == p.state => ACCENT.stroke_width(3),
                Some(_) => ACCENT.mix(0.15).filled(),
                None => ACCENT.mix(0.7).filled(),
            };
            Circle::new(
                (p.chargers, p.ev_stock),
                bubble_radius(p.market_share),
                style,
            )
        }))?;

        root.present()?;
        Ok(())
    }

    fn parallel_coords(&mut self, frame: &ParallelCoordsFrame) -> Result<()> {
        let path = self.chart_path(&format!("parallel-coordinates-{}", frame.year));
        info!(
            "Rendering parallel coordinates for {} to {}",
            frame.year,
            path.display()
        );
        let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let dims = DIMENSION_LABELS.len() as f64;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Country profiles ({})", frame.year),
                ("sans-serif", 24),
            )
            .margin(30)
            .build_cartesian_2d(-0.5..dims - 0.5, 0.0..1.15)?;

        for (dim, label) in DIMENSION_LABELS.iter().enumerate() {
            let x = dim as f64;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x, 0.0), (x, 1.0)],
                BLACK.mix(0.5),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                *label,
                (x - 0.08, 1.1),
                ("sans-serif", 16),
            )))?;
        }

        for (i, row) in frame.rows.iter().enumerate() {
            let points: Vec<(f64, f64)> = row
                .values
                .iter()
                .enumerate()
                .map(|(dim, &v)| (dim as f64, normalize(v, frame.extents[dim])))
                .collect();
            let style = emphasis(
                category_color(i),
                frame.highlighted.as_deref(),
                &row.country,
                3,
                1,
                0.4,
            );
            chart.draw_series(std::iter::once(PathElement::new(points, style)))?;
        }

        root.present()?;
        Ok(())
    }
}

fn category_color(i: usize) -> RGBColor {
    CATEGORY_COLORS[i % CATEGORY_COLORS.len()]
}

/// Highlighted entities draw at full strength, everything else fades while a
/// highlight is active.
fn emphasis(
    base: RGBColor,
    highlighted: Option<&str>,
    entity: &str,
    strong_width: u32,
    width: u32,
    idle_alpha: f64,
) -> ShapeStyle {
    match highlighted {
        Some(selected) if selected == entity => base.stroke_width(strong_width),
        Some(_) => base.mix(0.1).stroke_width(width),
        None => base.mix(idle_alpha).stroke_width(width),
    }
}

fn segment_label(x: &SegmentValue<i32>, totals: &[(String, f64)]) -> String {
    match x {
        SegmentValue::CenterOf(i) => totals
            .get(*i as usize)
            .map(|t| t.0.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn bubble_radius(share: f64) -> i32 {
    let t = (share / 20.0).clamp(0.0, 1.0).sqrt();
    (4.0 + 21.0 * t).round() as i32
}

fn normalize(v: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { (v - lo) / (hi - lo) } else { 0.5 }
}

fn share_color(share: f64) -> RGBColor {
    let t = (share / SHARE_COLOR_MAX).clamp(0.0, 1.0);
    if t < 0.5 {
        interpolate(
            RGBColor(0x00, 0x00, 0x04),
            RGBColor(0xbb, 0x37, 0x54),
            0.0,
            0.5,
            t,
        )
    } else {
        interpolate(
            RGBColor(0xbb, 0x37, 0x54),
            RGBColor(0xfc, 0xff, 0xa4),
            0.5,
            1.0,
            t,
        )
    }
}

fn interpolate(color1: RGBColor, color2: RGBColor, start: f64, end: f64, value: f64) -> RGBColor {
    let x = (value - start) / (end - start);
    if x <= 0.0 {
        color1
    } else if x >= 1.0 {
        color2
    } else {
        RGBColor(
            (color1.0 as f64 * (1.0 - x) + color2.0 as f64 * x) as u8,
            (color1.1 as f64 * (1.0 - x) + color2.1 as f64 * x) as u8,
            (color1.2 as f64 * (1.0 - x) + color2.2 as f64 * x) as u8,
        )
    }
}
