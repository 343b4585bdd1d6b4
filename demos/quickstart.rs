//! Quickstart: the full pipeline from a transaction log to compared
//! forecasts.
//!
//! Run with: cargo run --example quickstart

use salescast::core::{
    category_sales, region_sales, InvalidRecordPolicy, Month, MonthlySeries, TransactionRecord,
};
use salescast::models::{FitConfig, FittedSarima, OrderSearch, SarimaSpec, SearchConfig};
use salescast::report::ComparisonTable;
use salescast::validation::test_stationarity;

fn main() {
    println!("=== salescast quickstart ===\n");

    // 1. A synthetic transaction log shaped like the real export: a few
    //    records per month, trending, with a yearly cycle and three weak
    //    trailing months from an incomplete collection window.
    let records = sample_log();
    println!("Loaded {} transaction records", records.len());

    let by_category = category_sales(&records);
    let by_region = region_sales(&records);
    if let (Some(top_cat), Some(top_region)) = (by_category.last(), by_region.last()) {
        println!(
            "Top category: {} ({:.0}); top region: {} ({:.0})",
            top_cat.0, top_cat.1, top_region.0, top_region.1
        );
    }

    // 2. Build the monthly series.
    let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
    println!(
        "Built {} months ({} duplicates dropped, {} invalid records dropped)",
        build.series.len(),
        build.report.duplicates_dropped,
        build.report.missing_fields_dropped + build.report.unparseable_dates_dropped,
    );

    // 3. The trailing quarter is a collection artifact; cut it off.
    let series = build.series.trim(Month::new(2017, 10).unwrap());
    println!(
        "Trimmed to {} months ending {}",
        series.len(),
        series.last_month()
    );

    // 4. Stationarity check.
    let stationarity = test_stationarity(&series).unwrap();
    println!(
        "\nADF statistic {:.3}, p-value {:.3} -> {}",
        stationarity.test_statistic,
        stationarity.p_value,
        if stationarity.is_stationary {
            "stationary"
        } else {
            "NOT stationary, differencing required"
        }
    );

    // 5. Let the stepwise search pick orders.
    let search = OrderSearch::new(SearchConfig::default().with_seasonal_period(12));
    let outcome = search.search(&series).unwrap();
    println!(
        "\nOrder search evaluated {} candidates; selected {} (AIC {:.2})",
        outcome.evaluated.len(),
        outcome.spec,
        outcome.score
    );

    // 6. Forecast 6 months ahead with the winner and with an explicit
    //    non-seasonal alternative, then put them side by side.
    let auto_forecast = outcome.model.forecast(6, 0.95).unwrap();
    let auto_label = outcome.spec.to_string();

    let arima = FittedSarima::fit(&series, SarimaSpec::new(2, 1, 0), &FitConfig::default())
        .expect("explicit ARIMA(2,1,0) fit");
    let arima_forecast = arima.forecast(6, 0.95).unwrap();

    let table = ComparisonTable::align(&[
        (auto_label.as_str(), &auto_forecast),
        ("ARIMA(2,1,0)", &arima_forecast),
    ])
    .unwrap();

    println!("\n{:<10} {:>24} {:>24}", "month", table.labels()[0], table.labels()[1]);
    for row in table.rows() {
        println!(
            "{:<10} {:>10.0} [{:>4.0}] {:>10.0} [{:>4.0}]",
            row.month.to_string(),
            row.cells[0].point,
            row.cells[0].upper - row.cells[0].lower,
            row.cells[1].point,
            row.cells[1].upper - row.cells[1].lower,
        );
    }
}

fn sample_log() -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    for year in 2014..=2017i32 {
        for month in 1..=12u32 {
            let t = ((year - 2014) * 12 + month as i32 - 1) as f64;
            let weak_tail = if year == 2017 && month >= 11 { 0.08 } else { 1.0 };
            let total = weak_tail
                * (55_000.0
                    + 450.0 * t
                    + 6_000.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin());
            for k in 0..3u32 {
                records.push(TransactionRecord {
                    category_id: Some(40 + k),
                    category_name: Some(format!("Category {k}")),
                    customer_country: Some("EE. UU.".to_string()),
                    department_name: Some("Fan Shop".to_string()),
                    order_country: Some("Mexico".to_string()),
                    order_region: Some("Central America".to_string()),
                    order_date: Some(format!("{month}/{}/{year} 09:1{k}", 2 + 9 * k)),
                    item_quantity: Some(1),
                    sales: Some(total / 3.0),
                });
            }
        }
    }
    records
}
