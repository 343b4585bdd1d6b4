//! Differencing and integration for seasonal ARIMA models.

/// Apply `d` rounds of first differencing.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `d` rounds of differencing at a seasonal lag.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 || series.len() <= period {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Reverse `d` rounds of first differencing on forecast continuations.
///
/// `original` is the undifferenced history; its tail supplies the starting
/// values at each integration level.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let base = difference(original, level);
        let init = *base.last().unwrap_or(&0.0);

        let mut cumsum = init;
        let mut integrated = Vec::with_capacity(result.len());
        for &step in &result {
            cumsum += step;
            integrated.push(cumsum);
        }
        result = integrated;
    }
    result
}

/// Reverse `d` rounds of seasonal differencing on forecast continuations.
///
/// At each level the last `period` values of the history supply the
/// same-season anchors for the first forecast cycle.
pub fn seasonal_integrate(
    differenced: &[f64],
    original: &[f64],
    d: usize,
    period: usize,
) -> Vec<f64> {
    if d == 0 || period == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let base = seasonal_difference(original, level, period);
        if base.len() < period {
            return result;
        }

        let mut integrated: Vec<f64> = Vec::with_capacity(result.len());
        for (h, &step) in result.iter().enumerate() {
            let anchor = if h >= period {
                integrated[h - period]
            } else {
                base[base.len() - period + h]
            };
            integrated.push(step + anchor);
        }
        result = integrated;
    }
    result
}
