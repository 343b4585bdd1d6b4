//! Forecast result structure.

use crate::core::series::Month;
use crate::error::{Result, SalescastError};
use serde::Serialize;

/// An immutable N-step-ahead forecast with a confidence band.
///
/// Future months strictly continue the monthly cadence of the series the
/// model was fitted on. Consumed read-only by the comparison reporter and
/// by rendering collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    future_months: Vec<Month>,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    confidence_level: f64,
}

impl ForecastResult {
    /// Assemble a forecast result, validating shape and band ordering.
    pub fn new(
        future_months: Vec<Month>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        confidence_level: f64,
    ) -> Result<Self> {
        let h = future_months.len();
        if h == 0 {
            return Err(SalescastError::InvalidParameter(
                "forecast must cover at least one period".to_string(),
            ));
        }
        if point.len() != h || lower.len() != h || upper.len() != h {
            return Err(SalescastError::InvalidParameter(format!(
                "forecast vectors must all have length {h}"
            )));
        }
        if confidence_level <= 0.0 || confidence_level >= 1.0 {
            return Err(SalescastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {confidence_level}"
            )));
        }
        for pair in future_months.windows(2) {
            if pair[1] != pair[0].succ() {
                return Err(SalescastError::InvalidParameter(format!(
                    "future months must be consecutive, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        for i in 0..h {
            if !(lower[i] <= point[i] && point[i] <= upper[i]) {
                return Err(SalescastError::InvalidParameter(format!(
                    "band out of order at step {i}: [{}, {}] around {}",
                    lower[i], upper[i], point[i]
                )));
            }
        }
        Ok(Self {
            future_months,
            point,
            lower,
            upper,
            confidence_level,
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.future_months.len()
    }

    pub fn future_months(&self) -> &[Month] {
        &self.future_months
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }
}
