//! Series diagnostics.

mod stationarity;

pub use stationarity::{adf_test, test_stationarity, StationarityResult};
