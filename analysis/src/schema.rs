use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

// Country table
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCountryRow {
    pub country: String,
    pub region: String,
    pub year: String,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub ev_stock: f64,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub ev_sales: f64,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub market_share: f64,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub co2_transport: f64,
}

// US state table
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStateRow {
    pub state: String,
    pub year: String,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub chargers: f64,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub ev_stock: f64,
    #[serde(default, deserialize_with = "parse_or_zero")]
    pub market_share: f64,
}

// Helpers

/// Lenient numeric coercion: a value that fails to parse as a finite number
/// becomes 0 instead of an error. The `year` columns are excluded from this
/// policy on purpose and stay strings until validated.
fn parse_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct ParseOrZero;

    impl<'de> Visitor<'de> for ParseOrZero {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a string containing one")
        }

        fn visit_f64<E>(self, v: f64) -> Result<f64, E> {
            Ok(finite_or_zero(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E>(self, s: &str) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(s.trim().parse().map_or(0.0, finite_or_zero))
        }

        fn visit_unit<E>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_none<E>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<f64, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(ParseOrZero)
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

#[cfg(test)]
mod test {
    use super::*;

    fn country_rows(csv: &str) -> Vec<RawCountryRow> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes())
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn parse_numeric_fields() {
        let rows = country_rows(
            "country,region,year,ev_stock,ev_sales,market_share,co2_transport\n\
             Norway,Europe,2020,500000,105000,74.8,12.5\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ev_stock, 500000.0);
        assert_eq!(rows[0].ev_sales, 105000.0);
        assert_eq!(rows[0].market_share, 74.8);
        assert_eq!(rows[0].co2_transport, 12.5);
    }

    #[test]
    fn non_numeric_coerces_to_zero() {
        let rows = country_rows(
            "country,region,year,ev_stock,ev_sales,market_share,co2_transport\n\
             X,R1,2020,5,abc,10,1\n",
        );
        assert_eq!(rows[0].ev_sales, 0.0);
        assert_eq!(rows[0].ev_stock, 5.0);
        assert_eq!(rows[0].market_share, 10.0);
        assert_eq!(rows[0].co2_transport, 1.0);
    }

    #[test]
    fn empty_and_nan_coerce_to_zero() {
        let rows = country_rows(
            "country,region,year,ev_stock,ev_sales,market_share,co2_transport\n\
             X,R1,2020,,NaN,inf,-\n",
        );
        assert_eq!(rows[0].ev_stock, 0.0);
        assert_eq!(rows[0].ev_sales, 0.0);
        assert_eq!(rows[0].market_share, 0.0);
        assert_eq!(rows[0].co2_transport, 0.0);
    }

    #[test]
    fn year_stays_raw() {
        let rows = country_rows(
            "country,region,year,ev_stock,ev_sales,market_share,co2_transport\n\
             X,R1,n/a,1,1,1,1\n",
        );
        assert_eq!(rows[0].year, "n/a");
    }

    #[test]
    fn state_row_parses() {
        let rows: Vec<RawStateRow> = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(
                "state,year,chargers,ev_stock,market_share\n\
                 California,2022,14000,900000,18.9\n"
                    .as_bytes(),
            )
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows[0].state, "California");
        assert_eq!(rows[0].chargers, 14000.0);
    }
}
