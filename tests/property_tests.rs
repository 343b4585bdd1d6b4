//! Property-based tests for series construction and forecasting.
//!
//! These verify invariants that should hold for all valid inputs, using
//! randomly generated transaction records and series.

use proptest::prelude::*;
use salescast::core::{InvalidRecordPolicy, Month, MonthlySeries, TransactionRecord};
use salescast::models::{FitConfig, FittedSarima, SarimaSpec};
use salescast::report::ComparisonTable;

fn record(year: i32, month: u32, day: u32, sales: f64, tag: u32) -> TransactionRecord {
    TransactionRecord {
        category_id: Some(tag),
        category_name: Some(format!("Category {}", tag % 5)),
        customer_country: Some("EE. UU.".to_string()),
        department_name: Some("Outdoors".to_string()),
        order_country: Some("Germany".to_string()),
        order_region: Some("Western Europe".to_string()),
        order_date: Some(format!("{year:04}-{month:02}-{day:02}")),
        item_quantity: Some(1),
        sales: Some(sales),
    }
}

fn make_series(values: &[f64]) -> MonthlySeries {
    let mut months = vec![Month::new(2015, 1).unwrap()];
    while months.len() < values.len() {
        months.push(months.last().unwrap().succ());
    }
    MonthlySeries::from_parts(months, values.to_vec()).unwrap()
}

/// Strategy: a batch of positive-sales records scattered over 2015-2017.
fn records_strategy() -> impl Strategy<Value = Vec<TransactionRecord>> {
    prop::collection::vec(
        (2015i32..2018, 1u32..13, 1u32..29, 1.0f64..5_000.0, 0u32..1_000),
        1..120,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(y, m, d, sales, tag)| record(y, m, d, sales, tag))
            .collect()
    })
}

/// Strategy: series values with enough length and variation to fit on.
fn series_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(100.0..10_000.0f64, len).prop_map(|mut v| {
            // Small deterministic variation avoids all-constant series.
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.01;
            }
            v
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn built_series_months_strictly_increase(records in records_strategy()) {
        let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        let months = build.series.months();
        prop_assert!(!months.is_empty());
        for pair in months.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        prop_assert_eq!(build.series.values().len(), months.len());
        for &v in build.series.values() {
            prop_assert!(v > 0.0);
        }
    }

    #[test]
    fn building_twice_is_identical(records in records_strategy()) {
        let first = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        let second = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        prop_assert_eq!(first.series, second.series);
    }

    #[test]
    fn trim_never_lengthens(records in records_strategy(), y in 2014i32..2019, m in 1u32..13) {
        let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        let series = build.series;
        let boundary = Month::new(y, m).unwrap();

        let trimmed = series.trim(boundary);
        prop_assert!(trimmed.len() <= series.len());
        if boundary >= series.last_month() {
            prop_assert_eq!(&trimmed, &series);
        }
        for &kept in trimmed.months() {
            prop_assert!(kept <= boundary);
        }
    }

    #[test]
    fn random_walk_forecast_matches_horizon_and_cadence(
        values in series_values_strategy(10, 60),
        horizon in 1usize..18,
    ) {
        let series = make_series(&values);
        // ARIMA(0,1,0) estimates only the drift; it always fits.
        let model = FittedSarima::fit(
            &series,
            SarimaSpec::new(0, 1, 0),
            &FitConfig::default(),
        ).unwrap();

        let forecast = model.forecast(horizon, 0.95).unwrap();
        prop_assert_eq!(forecast.horizon(), horizon);

        let mut expected = series.last_month();
        for &m in forecast.future_months() {
            expected = expected.succ();
            prop_assert_eq!(m, expected);
        }
    }

    #[test]
    fn confidence_band_always_brackets_point(
        values in series_values_strategy(10, 60),
        horizon in 1usize..12,
    ) {
        let series = make_series(&values);
        let model = FittedSarima::fit(
            &series,
            SarimaSpec::new(0, 1, 0),
            &FitConfig::default(),
        ).unwrap();

        let forecast = model.forecast(horizon, 0.95).unwrap();
        for i in 0..horizon {
            prop_assert!(forecast.lower()[i] <= forecast.point()[i]);
            prop_assert!(forecast.point()[i] <= forecast.upper()[i]);
        }
        // Forecast-error variance accumulates, so the band never narrows.
        for i in 1..horizon {
            let previous = forecast.upper()[i - 1] - forecast.lower()[i - 1];
            let current = forecast.upper()[i] - forecast.lower()[i];
            prop_assert!(current >= previous - 1e-9);
        }
    }

    #[test]
    fn same_horizon_forecasts_always_align(
        values in series_values_strategy(12, 48),
        horizon in 1usize..10,
    ) {
        let series = make_series(&values);
        let fit = FitConfig::default();
        let drift = FittedSarima::fit(&series, SarimaSpec::new(0, 1, 0), &fit).unwrap();
        let mean = FittedSarima::fit(&series, SarimaSpec::new(0, 0, 0), &fit).unwrap();

        let a = drift.forecast(horizon, 0.95).unwrap();
        let b = mean.forecast(horizon, 0.95).unwrap();

        let table = ComparisonTable::align(&[("drift", &a), ("mean", &b)]).unwrap();
        prop_assert_eq!(table.rows().len(), horizon);
        for row in table.rows() {
            prop_assert_eq!(row.cells.len(), 2);
        }
    }
}
