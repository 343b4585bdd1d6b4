//! Stepwise search over (p, d, q)(P, D, Q)[s] model specifications.

use crate::core::MonthlySeries;
use crate::error::{Result, SalescastError};
use crate::models::sarima::diff::{difference, seasonal_difference};
use crate::models::sarima::model::{FitConfig, FittedSarima, SarimaSpec, SeasonalOrder};
use crate::utils::stats::variance;
use crate::validation::adf_test;
use rayon::prelude::*;
use std::collections::HashSet;

/// Bounds and scoring knobs for the order search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Seasonal period (0 disables seasonal candidates).
    pub seasonal_period: usize,
    /// Maximum non-seasonal AR order.
    pub max_p: usize,
    /// Maximum non-seasonal MA order.
    pub max_q: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum non-seasonal differencing depth.
    pub max_d: usize,
    /// Maximum seasonal differencing depth.
    pub max_cap_d: usize,
    /// Budget of greedy moves before the search stops.
    pub max_steps: usize,
    /// Scores within this distance count as ties; ties prefer fewer parameters.
    pub tie_tolerance: f64,
    /// Score by AIC (true) or BIC (false).
    pub use_aic: bool,
    /// Estimation budget for each candidate fit.
    pub fit: FitConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 0,
            max_p: 5,
            max_q: 5,
            max_cap_p: 2,
            max_cap_q: 2,
            max_d: 2,
            max_cap_d: 1,
            max_steps: 25,
            tie_tolerance: 1e-4,
            use_aic: true,
            fit: FitConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Enable seasonal candidates at the given period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_cap_p: usize, max_cap_d: usize, max_cap_q: usize) -> Self {
        self.max_cap_p = max_cap_p;
        self.max_cap_d = max_cap_d;
        self.max_cap_q = max_cap_q;
        self
    }

    /// Score candidates by BIC instead of AIC.
    pub fn use_bic(mut self) -> Self {
        self.use_aic = false;
        self
    }
}

/// Result of a completed search: the winning model and the audit trail.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Winning specification.
    pub spec: SarimaSpec,
    /// The fitted winner.
    pub model: FittedSarima,
    /// Information-criterion score of the winner.
    pub score: f64,
    /// Every successfully fitted candidate, best score first.
    pub evaluated: Vec<(SarimaSpec, f64)>,
}

/// Stepwise order search engine.
///
/// Differencing depths are fixed up front (d by repeated unit-root
/// testing, D by a seasonal variance-ratio heuristic), then AR/MA orders
/// are explored greedily from a small seed set, moving to the best
/// improving ±1 neighbor until nothing improves or the step budget runs
/// out. Candidates within one round are independent and fitted in
/// parallel; failed fits are dropped from consideration and never retried.
#[derive(Debug, Clone)]
pub struct OrderSearch {
    config: SearchConfig,
}

impl OrderSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Search with default bounds at a given seasonal period.
    pub fn seasonal(period: usize) -> Self {
        Self::new(SearchConfig::default().with_seasonal_period(period))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Select the best specification for a series.
    pub fn search(&self, series: &MonthlySeries) -> Result<SearchOutcome> {
        let values = series.values();
        let s = self.config.seasonal_period;

        let min_required = if s > 1 { 3 * s } else { 10 };
        if values.len() < min_required {
            return Err(SalescastError::InsufficientData {
                needed: min_required,
                got: values.len(),
            });
        }

        let cap_d = if s > 1 && self.config.max_cap_d > 0 {
            suggest_seasonal_differencing(values, s).min(self.config.max_cap_d)
        } else {
            0
        };
        let d = self.select_differencing(values, cap_d, s);

        let mut visited: HashSet<SarimaSpec> = HashSet::new();
        let mut evaluated: Vec<(SarimaSpec, f64)> = Vec::new();
        let mut best: Option<Candidate> = None;

        let seeds = self.seed_candidates(d, cap_d, s);
        let fitted = self.evaluate_batch(series, seeds, &mut visited);
        for candidate in fitted {
            evaluated.push((candidate.spec, candidate.score));
            if self.improves(&candidate, best.as_ref()) {
                best = Some(candidate);
            }
        }

        let mut steps = 0;
        while steps < self.config.max_steps {
            let Some(current) = best.as_ref() else { break };
            let neighbors = self.neighbor_candidates(current.spec);
            let fitted = self.evaluate_batch(series, neighbors, &mut visited);
            if fitted.is_empty() {
                break;
            }

            let mut moved = false;
            for candidate in fitted {
                evaluated.push((candidate.spec, candidate.score));
                if self.improves(&candidate, best.as_ref()) {
                    best = Some(candidate);
                    moved = true;
                }
            }
            if !moved {
                break;
            }
            steps += 1;
        }

        let Some(winner) = best else {
            return Err(SalescastError::ModelSearchFailure {
                candidates_tried: visited.len(),
            });
        };

        evaluated.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(SearchOutcome {
            spec: winner.spec,
            score: winner.score,
            model: winner.model,
            evaluated,
        })
    }

    /// Difference until the unit-root test passes or the depth cap is hit.
    fn select_differencing(&self, values: &[f64], cap_d: usize, s: usize) -> usize {
        let mut working = seasonal_difference(values, cap_d, s);
        let mut d = 0;
        while d < self.config.max_d {
            match adf_test(&working, None) {
                Ok(result) if result.is_stationary => break,
                Ok(_) => {
                    working = difference(&working, 1);
                    d += 1;
                }
                // Too short or degenerate to keep testing; stop where we are.
                Err(_) => break,
            }
        }
        d
    }

    fn seed_candidates(&self, d: usize, cap_d: usize, s: usize) -> Vec<SarimaSpec> {
        let nonseasonal = [(0, 0), (1, 0), (0, 1), (2, 2)];
        let mut seeds = Vec::new();

        if s > 1 {
            let seasonal = [(0, 0), (1, 0), (0, 1), (1, 1)];
            for &(p, q) in &nonseasonal {
                for &(cap_p, cap_q) in &seasonal {
                    if p <= self.config.max_p
                        && q <= self.config.max_q
                        && cap_p <= self.config.max_cap_p
                        && cap_q <= self.config.max_cap_q
                    {
                        seeds.push(self.spec_for(p, d, q, cap_p, cap_d, cap_q, s));
                    }
                }
            }
        } else {
            for &(p, q) in &nonseasonal {
                if p <= self.config.max_p && q <= self.config.max_q {
                    seeds.push(SarimaSpec::new(p, d, q));
                }
            }
        }
        seeds
    }

    fn neighbor_candidates(&self, spec: SarimaSpec) -> Vec<SarimaSpec> {
        let (cap_p, cap_d, cap_q, s) = match spec.seasonal {
            Some(so) => (so.cap_p, so.cap_d, so.cap_q, so.period),
            None => (0, 0, 0, 0),
        };
        let (p, d, q) = (spec.p, spec.d, spec.q);

        let mut out = Vec::new();
        let mut push = |p: usize, q: usize, cap_p: usize, cap_q: usize| {
            out.push(self.spec_for(p, d, q, cap_p, cap_d, cap_q, s));
        };

        if p > 0 {
            push(p - 1, q, cap_p, cap_q);
        }
        if p < self.config.max_p {
            push(p + 1, q, cap_p, cap_q);
        }
        if q > 0 {
            push(p, q - 1, cap_p, cap_q);
        }
        if q < self.config.max_q {
            push(p, q + 1, cap_p, cap_q);
        }
        if s > 1 {
            if cap_p > 0 {
                push(p, q, cap_p - 1, cap_q);
            }
            if cap_p < self.config.max_cap_p {
                push(p, q, cap_p + 1, cap_q);
            }
            if cap_q > 0 {
                push(p, q, cap_p, cap_q - 1);
            }
            if cap_q < self.config.max_cap_q {
                push(p, q, cap_p, cap_q + 1);
            }
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn spec_for(
        &self,
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> SarimaSpec {
        if s > 1 {
            SarimaSpec::with_seasonal(
                p,
                d,
                q,
                SeasonalOrder {
                    cap_p,
                    cap_d,
                    cap_q,
                    period: s,
                },
            )
        } else {
            SarimaSpec::new(p, d, q)
        }
    }

    /// Fit a round of unseen candidates in parallel.
    ///
    /// Fit failures (non-convergence, insufficient data, non-finite
    /// scores) silently drop the candidate; it stays in `visited` so it is
    /// never retried.
    fn evaluate_batch(
        &self,
        series: &MonthlySeries,
        candidates: Vec<SarimaSpec>,
        visited: &mut HashSet<SarimaSpec>,
    ) -> Vec<Candidate> {
        let fresh: Vec<SarimaSpec> = candidates
            .into_iter()
            .filter(|spec| visited.insert(*spec))
            .collect();

        fresh
            .par_iter()
            .filter_map(|&spec| {
                let model = FittedSarima::fit(series, spec, &self.config.fit).ok()?;
                let score = if self.config.use_aic {
                    model.aic()
                } else {
                    model.bic()
                };
                score.is_finite().then_some(Candidate { spec, score, model })
            })
            .collect()
    }

    /// Whether a candidate beats the incumbent under the tie-break rule.
    fn improves(&self, candidate: &Candidate, incumbent: Option<&Candidate>) -> bool {
        let Some(incumbent) = incumbent else {
            return true;
        };
        let delta = candidate.score - incumbent.score;
        if delta < -self.config.tie_tolerance {
            return true;
        }
        delta.abs() <= self.config.tie_tolerance
            && candidate.spec.num_params() < incumbent.spec.num_params()
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    spec: SarimaSpec,
    score: f64,
    model: FittedSarima,
}

/// Suggest seasonal differencing when it removes most of the variance.
fn suggest_seasonal_differencing(values: &[f64], period: usize) -> usize {
    if period < 2 || values.len() < 2 * period {
        return 0;
    }

    let seasonal_diffs: Vec<f64> = (period..values.len())
        .map(|i| values[i] - values[i - period])
        .collect();

    let orig_var = variance(values);
    let diff_var = variance(&seasonal_diffs);
    if orig_var.is_finite() && diff_var.is_finite() && orig_var > 0.0 && diff_var < orig_var * 0.7 {
        1
    } else {
        0
    }
}
