//! src/fitness.rs
//!
//! Fitness evaluators sit one layer above the core: given a candidate tree,
//! optionally fit its coefficients via the coefficient optimizer, evaluate
//! it, and reduce prediction vs. target to a single scalar the outer
//! evolutionary search can rank individuals by. Thin by design, the real
//! weight of this crate is in `crate::interpreter` and `crate::optimize`.

use crate::dataset::Dataset;
use crate::interpreter::evaluate;
use crate::optimize::{self, OptimizerMode};
use crate::range::Range;
use crate::stats::{normalized_mean_squared_error, pearson_r2};
use crate::tree::Tree;

/// Per-evaluator observable counters. Monotonic within one evaluator's
/// lifetime; `Prepare` does not reset them (it is a stateless hook in this
/// release, per the design notes this crate implements).
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluatorCounters {
    fitness_evaluations: u64,
    local_evaluations: u64,
}

impl EvaluatorCounters {
    pub fn fitness_evaluations(&self) -> u64 {
        self.fitness_evaluations
    }

    pub fn local_evaluations(&self) -> u64 {
        self.local_evaluations
    }

    fn record(&mut self, iterations_performed: usize) {
        self.fitness_evaluations += 1;
        self.local_evaluations += iterations_performed as u64;
    }
}

/// Shared configuration for "optionally fit coefficients, then evaluate"
/// evaluators: how many CO iterations to spend per individual (zero skips
/// optimization entirely) and which Jacobian mode to drive it with.
#[derive(Clone, Copy, Debug)]
pub struct FitConfig {
    pub iterations: usize,
    pub mode: OptimizerMode,
}

impl FitConfig {
    pub fn none() -> Self {
        Self {
            iterations: 0,
            mode: OptimizerMode::Autodiff,
        }
    }
}

fn fit_then_predict(tree: &mut Tree, dataset: &Dataset, target: &[f64], range: Range, fit: FitConfig) -> (Vec<f64>, usize) {
    let iterations_performed = if fit.iterations > 0 {
        let summary = optimize::optimize(tree, dataset, target, range, fit.iterations, true, false, fit.mode);
        summary.iterations_performed
    } else {
        0
    };
    let prediction = evaluate::<f64>(tree, dataset, range, None);
    (prediction, iterations_performed)
}

/// Reduces prediction vs. target to a scalar, lower is better.
pub trait FitnessEvaluator {
    /// Stateless in this release: a hook for implementations that want to
    /// precompute per-generation statistics over the whole population.
    fn prepare(&mut self, _population: &[Tree]) {}

    fn evaluate(&mut self, tree: &mut Tree, dataset: &Dataset, target: &[f64], range: Range) -> f64;

    fn counters(&self) -> EvaluatorCounters;
}

/// Normalized mean squared error: `mse(prediction, target) / variance(target)`.
/// Non-finite results are replaced by `f64::MAX`, the worst admissible score.
pub struct NmseEvaluator {
    fit: FitConfig,
    counters: EvaluatorCounters,
}

impl NmseEvaluator {
    pub fn new(fit: FitConfig) -> Self {
        Self {
            fit,
            counters: EvaluatorCounters::default(),
        }
    }
}

impl FitnessEvaluator for NmseEvaluator {
    fn evaluate(&mut self, tree: &mut Tree, dataset: &Dataset, target: &[f64], range: Range) -> f64 {
        let (prediction, iterations_performed) = fit_then_predict(tree, dataset, target, range, self.fit);
        self.counters.record(iterations_performed);
        let nmse = normalized_mean_squared_error(&prediction, target);
        if nmse.is_finite() {
            nmse
        } else {
            f64::MAX
        }
    }

    fn counters(&self) -> EvaluatorCounters {
        self.counters
    }
}

/// `1 - r²`, where `r²` is clamped to `[0, 1]` before the subtraction so a
/// spuriously-large or negative correlation cannot produce a fitness
/// outside `[0, 1]`. Non-finite `r²` is treated as 0 (worst correlation),
/// yielding worst fitness `1`.
pub struct OneMinusR2Evaluator {
    fit: FitConfig,
    counters: EvaluatorCounters,
}

impl OneMinusR2Evaluator {
    pub fn new(fit: FitConfig) -> Self {
        Self {
            fit,
            counters: EvaluatorCounters::default(),
        }
    }
}

impl FitnessEvaluator for OneMinusR2Evaluator {
    fn evaluate(&mut self, tree: &mut Tree, dataset: &Dataset, target: &[f64], range: Range) -> f64 {
        let (prediction, iterations_performed) = fit_then_predict(tree, dataset, target, range, self.fit);
        self.counters.record(iterations_performed);
        let r2 = pearson_r2(&prediction, target);
        let r2 = if r2.is_finite() { r2.clamp(0.0, 1.0) } else { 0.0 };
        1.0 - r2
    }

    fn counters(&self) -> EvaluatorCounters {
        self.counters
    }
}
