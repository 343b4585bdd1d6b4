//! Side-by-side comparison of forecasts from multiple models.

use crate::core::{ForecastResult, Month};
use crate::error::{Result, SalescastError};
use serde::Serialize;

/// One model's numbers for a single future month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastCell {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// One future month across all compared models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub month: Month,
    /// One cell per model, in the order the forecasts were supplied.
    pub cells: Vec<ForecastCell>,
}

/// Forecasts from several models aligned on a shared future date index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    labels: Vec<String>,
    rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Align labeled forecasts on their common future months.
    ///
    /// All forecasts must cover exactly the same months; otherwise the
    /// comparison fails with `MisalignedForecast` naming the first
    /// offender.
    pub fn align(entries: &[(&str, &ForecastResult)]) -> Result<ComparisonTable> {
        let [(first_label, first), rest @ ..] = entries else {
            return Err(SalescastError::InvalidParameter(
                "at least one forecast is required".to_string(),
            ));
        };

        let months = first.future_months();
        for (label, forecast) in rest {
            if forecast.future_months() != months {
                return Err(SalescastError::MisalignedForecast(format!(
                    "'{label}' covers {}..{} but '{first_label}' covers {}..{}",
                    forecast.future_months()[0],
                    forecast.future_months()[forecast.horizon() - 1],
                    months[0],
                    months[months.len() - 1],
                )));
            }
        }

        let rows = months
            .iter()
            .enumerate()
            .map(|(i, &month)| ComparisonRow {
                month,
                cells: entries
                    .iter()
                    .map(|(_, f)| ForecastCell {
                        point: f.point()[i],
                        lower: f.lower()[i],
                        upper: f.upper()[i],
                    })
                    .collect(),
            })
            .collect();

        Ok(ComparisonTable {
            labels: entries.iter().map(|(l, _)| l.to_string()).collect(),
            rows,
        })
    }

    /// Model labels in column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// One row per future month, chronological.
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }
}
