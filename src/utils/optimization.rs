//! Bounded Nelder-Mead simplex minimization for parameter estimation.

/// Outcome of a simplex minimization.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed within tolerance before the budget ran out.
    pub converged: bool,
}

/// Nelder-Mead tuning parameters.
#[derive(Debug, Clone)]
pub struct SimplexConfig {
    pub max_iter: usize,
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Relative step used to seed the initial simplex.
    pub initial_step: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Minimize `objective` from `initial`, clamping every candidate to `bounds`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &SimplexConfig,
) -> SimplexResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return SimplexResult {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let clamp = |point: Vec<f64>| -> Vec<f64> {
        match bounds {
            None => point,
            Some(b) => point
                .into_iter()
                .enumerate()
                .map(|(i, x)| if i < b.len() { x.clamp(b[i].0, b[i].1) } else { x })
                .collect(),
        }
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial.to_vec()));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(clamp(vertex));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; n];
        for (i, vertex) in simplex.iter().enumerate() {
            if i != worst {
                for (c, x) in centroid.iter_mut().zip(vertex) {
                    *c += x;
                }
            }
        }
        for c in &mut centroid {
            *c /= n as f64;
        }

        let max_spread = simplex
            .iter()
            .map(|v| {
                v.iter()
                    .zip(&centroid)
                    .map(|(x, c)| (x - c).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max);
        if max_spread < config.tolerance {
            converged = true;
            break;
        }

        let toward = |from: &[f64], to: &[f64], coeff: f64| -> Vec<f64> {
            clamp(
                from.iter()
                    .zip(to)
                    .map(|(f, t)| f + coeff * (t - f))
                    .collect(),
            )
        };

        // Reflection of the worst vertex through the centroid.
        let reflected = toward(&centroid, &simplex[worst], -config.alpha);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            let expanded = toward(&centroid, &reflected, config.gamma);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        let contract_target = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = toward(&centroid, contract_target, config.rho);
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink everything toward the best vertex.
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                let shrunk = toward(&anchor, &simplex[i], config.sigma);
                values[i] = objective(&shrunk);
                simplex[i] = shrunk;
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    SimplexResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            &SimplexConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.point[1], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained minimum at 5 sits outside [0, 3].
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            &SimplexConfig::default(),
        );

        assert_relative_eq!(result.point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn handles_rosenbrock_with_bigger_budget() {
        let config = SimplexConfig {
            max_iter: 5000,
            tolerance: 1e-10,
            ..SimplexConfig::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            &config,
        );

        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn tiny_budget_reports_non_convergence() {
        let config = SimplexConfig {
            max_iter: 2,
            tolerance: 1e-12,
            ..SimplexConfig::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-1.5, 2.0],
            None,
            &config,
        );

        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn empty_initial_point() {
        let result = nelder_mead(|_| 0.0, &[], None, &SimplexConfig::default());
        assert!(!result.converged);
        assert!(result.value.is_nan());
    }

    #[test]
    fn starts_at_optimum() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2),
            &[2.0],
            None,
            &SimplexConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-4);
    }
}
