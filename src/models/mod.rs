//! Forecasting models.

pub mod sarima;

pub use sarima::{
    FitConfig, FittedSarima, OrderSearch, SarimaSpec, SearchConfig, SearchOutcome, SeasonalOrder,
};
