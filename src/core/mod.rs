//! Core data structures of the forecasting pipeline.

mod forecast;
mod record;
mod series;

pub use forecast::ForecastResult;
pub use record::{
    category_sales, drop_duplicates, region_sales, validate_record, InvalidRecordPolicy,
    TransactionRecord,
};
pub use series::{BuildReport, Month, MonthlySeries, SeriesBuild};
