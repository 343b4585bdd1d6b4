//! # salescast
//!
//! Monthly retail sales forecasting pipeline: builds a clean monthly
//! series from a supply-chain transaction log, tests it for stationarity,
//! selects seasonal ARIMA orders with a stepwise search, and produces
//! point forecasts with confidence bands that several models can be
//! compared on.
//!
//! The pipeline is a batch of pure stages: every stage consumes an
//! immutable input and returns a new immutable output. Ingestion of
//! tabular files and rendering of results are collaborator concerns; the
//! crate consumes [`core::TransactionRecord`]s and emits plain
//! serializable data.

pub mod core;
pub mod error;
pub mod models;
pub mod report;
pub mod utils;
pub mod validation;

pub use error::{Result, SalescastError};

pub mod prelude {
    pub use crate::core::{
        ForecastResult, InvalidRecordPolicy, Month, MonthlySeries, TransactionRecord,
    };
    pub use crate::error::{Result, SalescastError};
    pub use crate::models::{FitConfig, FittedSarima, OrderSearch, SarimaSpec, SearchConfig};
    pub use crate::report::ComparisonTable;
    pub use crate::validation::{test_stationarity, StationarityResult};
}
