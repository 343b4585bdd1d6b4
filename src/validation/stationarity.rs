//! Augmented Dickey-Fuller unit-root test.
//!
//! Tests the null hypothesis that a series has a unit root (is
//! non-stationary). Rejection at the 5% level implies stationarity and
//! tells the order search that no further differencing is required.

use crate::core::MonthlySeries;
use crate::error::{Result, SalescastError};
use serde::Serialize;

/// Result of a unit-root test on a series snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationarityResult {
    /// t-statistic of the lagged-level coefficient.
    pub test_statistic: f64,
    /// Approximate p-value from the constant-only Dickey-Fuller tables.
    pub p_value: f64,
    /// Number of lagged differences included in the regression.
    pub lags: usize,
    /// True when the unit-root null is rejected (p < 0.05).
    pub is_stationary: bool,
}

/// Piecewise-linear anchors mapping the t-statistic to a p-value, built
/// around the MacKinnon constant-only critical values. The 5% anchor sits
/// exactly at -2.86 so `p < 0.05` coincides with t below the 5% critical
/// value.
const P_VALUE_ANCHORS: &[(f64, f64)] = &[
    (-4.5, 0.001),
    (-3.43, 0.01),
    (-2.86, 0.05),
    (-2.57, 0.10),
    (-1.94, 0.20),
    (-1.62, 0.30),
    (-1.28, 0.40),
    (-0.84, 0.50),
    (0.0, 0.70),
    (1.5, 0.95),
];

/// Run the ADF test on a monthly series.
pub fn test_stationarity(series: &MonthlySeries) -> Result<StationarityResult> {
    adf_test(series.values(), None)
}

/// Run the ADF test on raw values.
///
/// The regression is Δy_t = α + β·y_{t-1} + Σ γ_i·Δy_{t-i} + ε_t with the
/// lag order chosen by AIC over 0..=`max_lags` (default ⌊(n-1)^{1/3}⌋).
/// The t-statistic of β is mapped to a p-value through the Dickey-Fuller
/// tables; the series is called stationary when p < 0.05.
pub fn adf_test(values: &[f64], max_lags: Option<usize>) -> Result<StationarityResult> {
    let n = values.len();
    if n < 10 {
        return Err(SalescastError::InsufficientData { needed: 10, got: n });
    }

    let max_lags = max_lags
        .unwrap_or_else(|| ((n - 1) as f64).cbrt().floor() as usize)
        .min(n / 2);

    let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut best: Option<(usize, AdfRegression)> = None;
    let mut best_aic = f64::INFINITY;
    let mut saw_degenerate = false;
    for lag in 0..=max_lags {
        let Some(reg) = regress(values, &diff, lag) else {
            continue;
        };
        if reg.rss <= 0.0 {
            saw_degenerate = true;
            continue;
        }
        let n_eff = reg.n_obs as f64;
        let aic = n_eff * (reg.rss / n_eff).ln() + 2.0 * reg.n_params as f64;
        if aic < best_aic {
            best_aic = aic;
            best = Some((lag, reg));
        }
    }

    let Some((lags, reg)) = best else {
        if saw_degenerate {
            return Err(SalescastError::InvalidParameter(
                "series is numerically degenerate for the unit-root regression".to_string(),
            ));
        }
        return Err(SalescastError::InsufficientData {
            needed: 2 * (max_lags + 2) + 3,
            got: n,
        });
    };

    let t_stat = reg.beta_level / reg.se_level;
    if !t_stat.is_finite() {
        return Err(SalescastError::InvalidParameter(
            "series is numerically degenerate for the unit-root regression".to_string(),
        ));
    }

    let p_value = p_value_from_t(t_stat);
    Ok(StationarityResult {
        test_statistic: t_stat,
        p_value,
        lags,
        is_stationary: p_value < 0.05,
    })
}

struct AdfRegression {
    beta_level: f64,
    se_level: f64,
    rss: f64,
    n_obs: usize,
    n_params: usize,
}

/// Fit the augmented regression for one lag order via the normal equations.
fn regress(values: &[f64], diff: &[f64], lag: usize) -> Option<AdfRegression> {
    let n = diff.len();
    let start = lag;
    let rows = n - start;
    let k = lag + 2; // intercept + lagged level + lagged differences
    if rows < k + 3 {
        return None;
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    let mut row = vec![0.0; k];

    let fill_row = |row: &mut [f64], t: usize| {
        row[0] = 1.0;
        row[1] = values[t];
        for j in 1..=lag {
            row[1 + j] = diff[t - j];
        }
    };

    for t in start..n {
        fill_row(&mut row, t);
        let y = diff[t];
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    // Tiny ridge keeps the decomposition alive on near-collinear designs.
    for i in 0..k {
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty)?;

    let mut rss = 0.0;
    for t in start..n {
        fill_row(&mut row, t);
        let pred: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
        let e = diff[t] - pred;
        rss += e * e;
    }

    let dof = rows - k;
    let sigma2 = rss / dof as f64;

    let mut unit = vec![0.0; k];
    unit[1] = 1.0;
    let inv_col = solve_symmetric(&xtx, &unit)?;
    let se_level = (sigma2 * inv_col[1]).sqrt();

    Some(AdfRegression {
        beta_level: beta[1],
        se_level,
        rss,
        n_obs: rows,
        n_params: k,
    })
}

/// Solve a symmetric positive definite system via Cholesky decomposition.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

fn p_value_from_t(t: f64) -> f64 {
    let first = P_VALUE_ANCHORS[0];
    let last = P_VALUE_ANCHORS[P_VALUE_ANCHORS.len() - 1];
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in P_VALUE_ANCHORS.windows(2) {
        let (t0, p0) = pair[0];
        let (t1, p1) = pair[1];
        if t <= t1 {
            let frac = (t - t0) / (t1 - t0);
            return p0 + frac * (p1 - p0);
        }
    }
    last.1
}
