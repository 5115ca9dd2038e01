use crate::load::Dataset;

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub content: String,
    pub x: f64,
    pub y: f64,
}

/// The shared selection all charts read: active slider years, the entity
/// under the pointer and the tooltip payload. Mutated only through the
/// transitions below; every render cycle re-derives its aggregates from the
/// dataset plus these scalars.
#[derive(Clone, Debug)]
pub struct InteractionState {
    pub sales_year: u32,
    pub scatter_year: u32,
    pub highlighted: Option<String>,
    pub tooltip: Option<Tooltip>,
}

impl InteractionState {
    pub fn new(data: &Dataset) -> Self {
        Self {
            sales_year: data.years.last().copied().unwrap_or_default(),
            scatter_year: data.us_years.last().copied().unwrap_or_default(),
            highlighted: None,
            tooltip: None,
        }
    }

    /// Out-of-range years clamp to the nearest valid one: year selection is
    /// a UI convenience, not a correctness-critical value.
    pub fn set_sales_year(&mut self, data: &Dataset, year: u32) {
        self.sales_year = nearest_year(&data.years, year);
    }

    pub fn set_scatter_year(&mut self, data: &Dataset, year: u32) {
        self.scatter_year = nearest_year(&data.us_years, year);
    }

    /// Re-clamps both years after a dataset swap.
    pub fn rebind(&mut self, data: &Dataset) {
        self.sales_year = nearest_year(&data.years, self.sales_year);
        self.scatter_year = nearest_year(&data.us_years, self.scatter_year);
    }

    pub fn highlight(&mut self, entity: &str) {
        self.highlighted = Some(entity.to_owned());
    }

    pub fn unhighlight(&mut self) {
        self.highlighted = None;
    }

    pub fn show_tooltip(&mut self, content: impl Into<String>, x: f64, y: f64) {
        self.tooltip = Some(Tooltip {
            content: content.into(),
            x,
            y,
        });
    }

    pub fn move_tooltip(&mut self, x: f64, y: f64) {
        if let Some(tooltip) = &mut self.tooltip {
            tooltip.x = x;
            tooltip.y = y;
        }
    }

    pub fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    /// Back to the dataset-derived defaults: both sliders at their latest
    /// year, nothing highlighted, no tooltip.
    pub fn reset(&mut self, data: &Dataset) {
        *self = Self::new(data);
    }
}

fn nearest_year(years: &[u32], wanted: u32) -> u32 {
    years
        .iter()
        .copied()
        .min_by_key(|y| y.abs_diff(wanted))
        .unwrap_or(wanted)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::load::test::{country_row, state_row};

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec![
                country_row("Norway", "Europe", "2015", 1.0),
                country_row("Norway", "Europe", "2020", 2.0),
                country_row("Norway", "Europe", "2023", 3.0),
            ],
            vec![
                state_row("California", "2019", 1.0),
                state_row("California", "2022", 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn defaults_to_latest_years() {
        let data = dataset();
        let view = InteractionState::new(&data);
        assert_eq!(view.sales_year, 2023);
        assert_eq!(view.scatter_year, 2022);
        assert_eq!(view.highlighted, None);
        assert_eq!(view.tooltip, None);
    }

    #[test]
    fn valid_year_is_kept() {
        let data = dataset();
        let mut view = InteractionState::new(&data);
        view.set_sales_year(&data, 2015);
        assert_eq!(view.sales_year, 2015);
    }

    #[test]
    fn invalid_year_clamps_to_nearest() {
        let data = dataset();
        let mut view = InteractionState::new(&data);
        view.set_sales_year(&data, 2016);
        assert_eq!(view.sales_year, 2015);
        view.set_sales_year(&data, 1990);
        assert_eq!(view.sales_year, 2015);
        view.set_sales_year(&data, 2050);
        assert_eq!(view.sales_year, 2023);
        view.set_scatter_year(&data, 2023);
        assert_eq!(view.scatter_year, 2022);
    }

    #[test]
    fn tooltip_lifecycle() {
        let data = dataset();
        let mut view = InteractionState::new(&data);
        view.move_tooltip(5.0, 5.0);
        assert_eq!(view.tooltip, None);

        view.show_tooltip("Norway", 10.0, 20.0);
        view.move_tooltip(30.0, 40.0);
        assert_eq!(
            view.tooltip,
            Some(Tooltip {
                content: "Norway".into(),
                x: 30.0,
                y: 40.0,
            })
        );
        view.hide_tooltip();
        assert_eq!(view.tooltip, None);
    }

    #[test]
    fn reset_restores_defaults() {
        let data = dataset();
        let mut view = InteractionState::new(&data);
        view.set_sales_year(&data, 2015);
        view.highlight("Norway");
        view.show_tooltip("Norway", 1.0, 2.0);

        view.reset(&data);
        assert_eq!(view.sales_year, 2023);
        assert_eq!(view.scatter_year, 2022);
        assert_eq!(view.highlighted, None);
        assert_eq!(view.tooltip, None);
    }

    #[test]
    fn rebind_clamps_after_swap() {
        let data = dataset();
        let mut view = InteractionState::new(&data);
        view.set_sales_year(&data, 2015);

        let smaller = Dataset::from_rows(
            vec![country_row("Norway", "Europe", "2020", 1.0)],
            vec![state_row("California", "2019", 1.0)],
        )
        .unwrap();
        view.rebind(&smaller);
        assert_eq!(view.sales_year, 2020);
        assert_eq!(view.scatter_year, 2019);
    }
}
