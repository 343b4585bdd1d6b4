//! Seasonal ARIMA model: specification, estimation, forecasting.

use crate::core::{ForecastResult, Month, MonthlySeries};
use crate::error::{Result, SalescastError};
use crate::models::sarima::diff::{
    difference, integrate, seasonal_difference, seasonal_integrate,
};
use crate::utils::optimization::{nelder_mead, SimplexConfig};
use crate::utils::stats::{mean, normal_band_z};
use serde::Serialize;
use std::fmt;

/// Seasonal component of a model specification: orders (P, D, Q) applied at
/// a seasonal lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SeasonalOrder {
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period (lag), e.g. 12 for monthly data with a yearly cycle.
    pub period: usize,
}

/// Immutable model specification: (p, d, q) plus an optional seasonal part.
///
/// Either chosen by the order search or supplied explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SarimaSpec {
    /// AR order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// MA order.
    pub q: usize,
    /// Seasonal orders, or `None` for a plain ARIMA.
    pub seasonal: Option<SeasonalOrder>,
}

impl SarimaSpec {
    /// Non-seasonal ARIMA(p, d, q).
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal: None,
        }
    }

    /// SARIMA(p, d, q)(P, D, Q)[s].
    pub fn with_seasonal(p: usize, d: usize, q: usize, seasonal: SeasonalOrder) -> Self {
        Self {
            p,
            d,
            q,
            seasonal: Some(seasonal),
        }
    }

    /// Estimated parameter count: AR + MA + seasonal AR + seasonal MA + intercept.
    pub fn num_params(&self) -> usize {
        let (cap_p, cap_q) = match self.seasonal {
            Some(s) => (s.cap_p, s.cap_q),
            None => (0, 0),
        };
        self.p + self.q + cap_p + cap_q + 1
    }

    /// Seasonal period, 0 when non-seasonal.
    pub fn seasonal_period(&self) -> usize {
        self.seasonal.map(|s| s.period).unwrap_or(0)
    }

    /// Whether any seasonal order is active.
    pub fn is_seasonal(&self) -> bool {
        self.seasonal
            .map(|s| s.period > 1 && (s.cap_p > 0 || s.cap_d > 0 || s.cap_q > 0))
            .unwrap_or(false)
    }

    /// Longest backward reach of the recursion on the differenced scale.
    fn max_lag(&self) -> usize {
        let (cap_p, cap_q, s) = match self.seasonal {
            Some(so) => (so.cap_p, so.cap_q, so.period),
            None => (0, 0, 0),
        };
        self.p.max(self.q).max(cap_p * s).max(cap_q * s)
    }

    /// Minimum series length needed to fit this specification.
    pub fn min_observations(&self) -> usize {
        let cap_d_span = self.seasonal.map(|s| s.cap_d * s.period).unwrap_or(0);
        self.d + cap_d_span + self.max_lag() + 2
    }

    fn seasonal_orders(&self) -> (usize, usize, usize, usize) {
        match self.seasonal {
            Some(s) => (s.cap_p, s.cap_d, s.cap_q, s.period),
            None => (0, 0, 0, 0),
        }
    }
}

impl fmt::Display for SarimaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seasonal {
            Some(s) => write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, s.cap_p, s.cap_d, s.cap_q, s.period
            ),
            None => write!(f, "ARIMA({},{},{})", self.p, self.d, self.q),
        }
    }
}

/// Estimation budget and tolerance.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Optimizer iteration budget; exceeding it raises `NonConvergence`.
    pub max_iter: usize,
    /// Simplex convergence tolerance.
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Clone)]
struct Coefficients {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
}

impl Coefficients {
    fn from_params(params: &[f64], p: usize, q: usize, cap_p: usize, cap_q: usize) -> Self {
        let mut rest = &params[1..];
        let (ar, r) = rest.split_at(p);
        rest = r;
        let (ma, r) = rest.split_at(q);
        rest = r;
        let (sar, r) = rest.split_at(cap_p);
        let (sma, _) = r.split_at(cap_q);
        Self {
            intercept: params[0],
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            sar: sar.to_vec(),
            sma: sma.to_vec(),
        }
    }

    /// One-step prediction of the working series at index `t`.
    ///
    /// Assumes `t >= max_lag`, which fit-time length checks guarantee.
    fn predict_at(&self, working: &[f64], residuals: &[f64], t: usize, s: usize) -> f64 {
        let mut pred = self.intercept;
        for (i, phi) in self.ar.iter().enumerate() {
            pred += phi * (working[t - 1 - i] - self.intercept);
        }
        for (i, theta) in self.ma.iter().enumerate() {
            pred += theta * residuals[t - 1 - i];
        }
        for (j, phi_s) in self.sar.iter().enumerate() {
            pred += phi_s * (working[t - (j + 1) * s] - self.intercept);
        }
        for (j, theta_s) in self.sma.iter().enumerate() {
            pred += theta_s * residuals[t - (j + 1) * s];
        }
        pred
    }
}

/// A fitted seasonal ARIMA model.
///
/// Owns the specification, the learned coefficients, and a snapshot of the
/// series it was trained on. Never mutated after fitting; re-fitting
/// produces a new value.
#[derive(Debug, Clone)]
pub struct FittedSarima {
    spec: SarimaSpec,
    coef: Coefficients,
    residual_variance: f64,
    aic: f64,
    bic: f64,
    /// Training values on the original scale.
    original: Vec<f64>,
    /// After seasonal differencing, before regular differencing.
    seasonal_differenced: Vec<f64>,
    /// Fully differenced series the recursion runs on.
    working: Vec<f64>,
    /// Residuals on the working scale.
    residuals: Vec<f64>,
    last_month: Month,
}

impl FittedSarima {
    /// Estimate a model of the given specification on a monthly series.
    ///
    /// Parameters are found by minimizing the conditional sum of squares
    /// with a bounded simplex search. Fails with `NonConvergence` when the
    /// optimizer exhausts its budget, `InsufficientData` when the series is
    /// shorter than the specification requires.
    pub fn fit(series: &MonthlySeries, spec: SarimaSpec, config: &FitConfig) -> Result<Self> {
        let values = series.values();
        let needed = spec.min_observations();
        if values.len() < needed {
            return Err(SalescastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let (cap_p, cap_d, cap_q, s) = spec.seasonal_orders();
        let (p, d, q) = (spec.p, spec.d, spec.q);

        let seasonal_differenced = seasonal_difference(values, cap_d, s);
        let working = difference(&seasonal_differenced, d);
        let start = spec.max_lag();
        if working.len() < start + 2 {
            return Err(SalescastError::InsufficientData {
                needed: start + 2 + d + cap_d * s,
                got: values.len(),
            });
        }

        let level = mean(&working);
        let n_coefs = p + q + cap_p + cap_q;

        let params = if n_coefs == 0 {
            vec![level]
        } else {
            let mut initial = vec![0.0; 1 + n_coefs];
            initial[0] = level;
            for (i, slot) in initial[1..].iter_mut().enumerate() {
                *slot = 0.1 / (i + 1) as f64;
            }

            let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
            bounds.extend(std::iter::repeat((-0.99, 0.99)).take(n_coefs));

            let simplex = SimplexConfig {
                max_iter: config.max_iter,
                tolerance: config.tolerance,
                ..SimplexConfig::default()
            };

            let result = nelder_mead(
                |point| {
                    let coef = Coefficients::from_params(point, p, q, cap_p, cap_q);
                    conditional_sum_of_squares(&working, &coef, start, s)
                },
                &initial,
                Some(&bounds),
                &simplex,
            );

            if !result.converged {
                return Err(SalescastError::NonConvergence {
                    spec: spec.to_string(),
                    iterations: result.iterations,
                });
            }
            result.point
        };

        let coef = Coefficients::from_params(&params, p, q, cap_p, cap_q);

        // In-sample residuals on the working scale.
        let n = working.len();
        let mut residuals = vec![0.0; n];
        for t in start..n {
            let pred = coef.predict_at(&working, &residuals, t, s);
            residuals[t] = working[t] - pred;
        }

        let n_eff = (n - start) as f64;
        let residual_variance =
            residuals[start..].iter().map(|r| r * r).sum::<f64>() / n_eff;

        let k = spec.num_params() as f64;
        let log_likelihood = -0.5
            * n_eff
            * (1.0 + residual_variance.ln() + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n_eff.ln();

        Ok(Self {
            spec,
            coef,
            residual_variance,
            aic,
            bic,
            original: values.to_vec(),
            seasonal_differenced,
            working,
            residuals,
            last_month: series.last_month(),
        })
    }

    pub fn spec(&self) -> SarimaSpec {
        self.spec
    }

    pub fn intercept(&self) -> f64 {
        self.coef.intercept
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coef.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coef.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coef.sar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coef.sma
    }

    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Residuals on the differenced scale (zeros over the burn-in prefix).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Produce an N-step-ahead forecast with a confidence band.
    ///
    /// Future months strictly continue the training series' monthly
    /// cadence. The band comes from the forecast-error variance
    /// σ²·Σψ²ⱼ accumulated over the psi weights of the integrated model,
    /// so it widens monotonically with the step.
    pub fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(SalescastError::InvalidParameter(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if confidence_level <= 0.0 || confidence_level >= 1.0 {
            return Err(SalescastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {confidence_level}"
            )));
        }

        let (_, cap_d, _, s) = self.spec.seasonal_orders();
        let d = self.spec.d;

        // Recurse forward on the working scale with zero future shocks.
        let mut extended = self.working.clone();
        let mut residuals = self.residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let pred = self.coef.predict_at(&extended, &residuals, t, s);
            extended.push(pred);
            residuals.push(0.0);
        }
        let future_diff = extended[self.working.len()..].to_vec();

        // Undo regular then seasonal differencing.
        let on_seasonal_scale = if d > 0 {
            integrate(&future_diff, &self.seasonal_differenced, d)
        } else {
            future_diff
        };
        let point = if cap_d > 0 {
            seasonal_integrate(&on_seasonal_scale, &self.original, cap_d, s)
        } else {
            on_seasonal_scale
        };

        let psi = self.psi_weights(horizon);
        let z = normal_band_z(confidence_level);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for h in 0..horizon {
            cumulative += psi[h] * psi[h];
            let se = (self.residual_variance * cumulative).sqrt();
            lower.push(point[h] - z * se);
            upper.push(point[h] + z * se);
        }

        let mut months = Vec::with_capacity(horizon);
        let mut month = self.last_month;
        for _ in 0..horizon {
            month = month.succ();
            months.push(month);
        }

        ForecastResult::new(months, point, lower, upper, confidence_level)
    }

    /// Psi weights of the model on the original scale.
    ///
    /// The AR side is the product of the lag polynomial and the
    /// differencing polynomials (1-B)^d (1-B^s)^D, so the weights carry
    /// the growing uncertainty of integrated forecasts.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let (cap_p, cap_d, cap_q, s) = self.spec.seasonal_orders();
        let (p, d, q) = (self.spec.p, self.spec.d, self.spec.q);

        // phi(B) = 1 - Σ φ_i B^i - Σ Φ_j B^{js}
        let mut phi = vec![0.0; p.max(cap_p * s) + 1];
        phi[0] = 1.0;
        for (i, c) in self.coef.ar.iter().enumerate() {
            phi[i + 1] -= c;
        }
        for (j, c) in self.coef.sar.iter().enumerate() {
            phi[(j + 1) * s] -= c;
        }

        let mut full = phi;
        for _ in 0..d {
            full = poly_mul(&full, &[1.0, -1.0]);
        }
        if s > 0 {
            let mut seasonal = vec![0.0; s + 1];
            seasonal[0] = 1.0;
            seasonal[s] = -1.0;
            for _ in 0..cap_d {
                full = poly_mul(&full, &seasonal);
            }
        }

        // theta(B) = 1 + Σ θ_i B^i + Σ Θ_j B^{js}
        let mut theta = vec![0.0; q.max(cap_q * s) + 1];
        theta[0] = 1.0;
        for (i, c) in self.coef.ma.iter().enumerate() {
            theta[i + 1] += c;
        }
        for (j, c) in self.coef.sma.iter().enumerate() {
            theta[(j + 1) * s] += c;
        }

        // psi_0 = 1; psi_j = theta_j + Σ c_i psi_{j-i} with c_i = -full[i].
        let mut psi = vec![0.0; horizon];
        for j in 0..horizon {
            if j == 0 {
                psi[0] = 1.0;
                continue;
            }
            let mut value = *theta.get(j).unwrap_or(&0.0);
            for i in 1..full.len().min(j + 1) {
                value -= full[i] * psi[j - i];
            }
            psi[j] = value;
        }
        psi
    }
}

/// Product of two polynomials in the backshift operator.
fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Conditional sum of squared one-step errors over the estimation window.
fn conditional_sum_of_squares(working: &[f64], coef: &Coefficients, start: usize, s: usize) -> f64 {
    let n = working.len();
    if n <= start {
        return f64::MAX;
    }

    let mut residuals = vec![0.0; n];
    let mut css = 0.0;
    for t in start..n {
        let pred = coef.predict_at(working, &residuals, t, s);
        let error = working[t] - pred;
        residuals[t] = error;
        css += error * error;
    }
    css
}
