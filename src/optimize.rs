//! src/optimize.rs
//!
//! The coefficient optimizer (CO): fits a tree's embedded `Constant` and
//! `Variable`-weight coefficients against a target by driving a
//! trust-region Levenberg-Marquardt solver over the residual functor. The
//! Jacobian comes from either forward-mode autodiff (`Dual`, exact) or
//! central finite differences (`f64`, approximate) depending on `mode`.
//!
//! Per the optimizer's guarantee, this module never panics on an
//! ill-conditioned problem or a singular Jacobian, those surface as a
//! `Termination` variant in the returned `OptimizeSummary` instead.

use levenberg_marquardt::{self as lm, LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, Owned};

use crate::dataset::Dataset;
use crate::dual::Dual;
use crate::range::Range;
use crate::residual::ResidualFunctor;
use crate::tree::Tree;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizerMode {
    Autodiff,
    Numeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// No coefficients to fit; the tree was returned unchanged.
    NoCoefficients,
    Converged,
    /// Iteration cap reached (or the solver otherwise stopped) without the
    /// solver's own convergence criteria being met.
    IterationLimit,
    /// The final objective is non-finite: an ill-conditioned or singular
    /// Jacobian. The tree's coefficients are left at their best-so-far
    /// (possibly original) values; the caller decides whether to trust them.
    SingularJacobian,
}

#[derive(Clone, Copy, Debug)]
pub struct OptimizeSummary {
    pub iterations_performed: usize,
    pub initial_cost: f64,
    pub final_cost: f64,
    pub termination: Termination,
}

impl OptimizeSummary {
    fn empty() -> Self {
        Self {
            iterations_performed: 0,
            initial_cost: 0.0,
            final_cost: 0.0,
            termination: Termination::NoCoefficients,
        }
    }
}

/// One step of finite-difference or autodiff residual/Jacobian evaluation,
/// adapted to `levenberg_marquardt::LeastSquaresProblem`. Borrows the tree,
/// dataset and target immutably for the duration of the solve; coefficient
/// write-back happens in `optimize` after the solve returns.
struct LmProblem<'a> {
    tree: &'a Tree,
    dataset: &'a Dataset,
    target: &'a [f64],
    range: Range,
    mode: OptimizerMode,
    params: DVector<f64>,
}

impl<'a> LmProblem<'a> {
    fn residual_functor(&self) -> ResidualFunctor<'a> {
        ResidualFunctor::new(self.tree, self.dataset, self.target, self.range)
    }

    fn residuals_f64(&self, params: &DVector<f64>) -> DVector<f64> {
        let p: Vec<f64> = params.iter().copied().collect();
        DVector::from_vec(self.residual_functor().residuals::<f64>(Some(&p)))
    }

    fn jacobian_autodiff(&self) -> DMatrix<f64> {
        let n = self.params.len();
        let m = self.range.size();
        let duals: Vec<Dual> = self
            .params
            .iter()
            .enumerate()
            .map(|(k, &v)| Dual::seeded(v, k, n))
            .collect();
        let residuals = self.residual_functor().residuals::<Dual>(Some(&duals));
        let mut jac = DMatrix::<f64>::zeros(m, n);
        for (row, d) in residuals.iter().enumerate() {
            for col in 0..n {
                jac[(row, col)] = if d.grad.is_empty() { 0.0 } else { d.grad[col] };
            }
        }
        jac
    }

    fn jacobian_numeric(&self) -> DMatrix<f64> {
        let n = self.params.len();
        let m = self.range.size();
        let mut jac = DMatrix::<f64>::zeros(m, n);
        for k in 0..n {
            let step = 1e-6 * self.params[k].abs().max(1.0);

            let mut plus = self.params.clone();
            plus[k] += step;
            let res_plus = self.residuals_f64(&plus);

            let mut minus = self.params.clone();
            minus[k] -= step;
            let res_minus = self.residuals_f64(&minus);

            for row in 0..m {
                jac[(row, k)] = (res_plus[row] - res_minus[row]) / (2.0 * step);
            }
        }
        jac
    }
}

impl<'a> LeastSquaresProblem<f64, Dyn, Dyn> for LmProblem<'a> {
    type ParameterStorage = Owned<f64, Dyn>;
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;

    fn set_params(&mut self, params: &DVector<f64>) {
        self.params.copy_from(params);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        Some(self.residuals_f64(&self.params))
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        Some(match self.mode {
            OptimizerMode::Autodiff => self.jacobian_autodiff(),
            OptimizerMode::Numeric => self.jacobian_numeric(),
        })
    }
}

/// Drive a bounded-iteration trust-region solve over `tree`'s coefficients.
///
/// `iterations` is the caller's iteration budget; the underlying solver is
/// configured with `max(0, iterations - 1)` to work around an off-by-one in
/// its patience counter (documented in the spec this implements). Passing
/// `iterations == 1` therefore yields `with_patience(0)`: the solver takes
/// no step before giving up, which is the spec's stated cap, not a bug in
/// this crate. A single worker is used throughout: the core assumes the
/// *outer* evolutionary loop is what parallelizes, not the per-tree solve.
pub fn optimize(
    tree: &mut Tree,
    dataset: &Dataset,
    target: &[f64],
    range: Range,
    iterations: usize,
    write_coefficients: bool,
    report: bool,
    mode: OptimizerMode,
) -> OptimizeSummary {
    let coefficients = tree.get_coefficients();
    if coefficients.is_empty() {
        return OptimizeSummary::empty();
    }

    let initial_cost = {
        let rf = ResidualFunctor::new(tree, dataset, target, range);
        let res0 = rf.residuals::<f64>(Some(&coefficients));
        0.5 * res0.iter().map(|r| r * r).sum::<f64>()
    };

    let problem = LmProblem {
        tree,
        dataset,
        target,
        range,
        mode,
        params: DVector::from_vec(coefficients),
    };

    let patience = iterations.saturating_sub(1) as u32;
    let solver = LevenbergMarquardt::new().with_patience(patience);
    let (solved, lm_report) = solver.minimize(problem);

    if report {
        tracing::info!(
            evaluations = lm_report.number_of_evaluations,
            objective = lm_report.objective_function,
            "coefficient optimization finished"
        );
    }

    let termination = if !lm_report.objective_function.is_finite() {
        Termination::SingularJacobian
    } else {
        match lm_report.termination {
            lm::TerminationReason::Converged { .. } => Termination::Converged,
            _ => Termination::IterationLimit,
        }
    };

    let final_params: Vec<f64> = solved.params.iter().copied().collect();
    drop(solved);

    if write_coefficients {
        tree.set_coefficients(&final_params);
    }

    OptimizeSummary {
        iterations_performed: lm_report.number_of_evaluations,
        initial_cost,
        final_cost: lm_report.objective_function,
        termination,
    }
}

pub fn optimize_autodiff(
    tree: &mut Tree,
    dataset: &Dataset,
    target: &[f64],
    range: Range,
    iterations: usize,
    write_coefficients: bool,
    report: bool,
) -> OptimizeSummary {
    optimize(
        tree,
        dataset,
        target,
        range,
        iterations,
        write_coefficients,
        report,
        OptimizerMode::Autodiff,
    )
}

pub fn optimize_numeric(
    tree: &mut Tree,
    dataset: &Dataset,
    target: &[f64],
    range: Range,
    iterations: usize,
    write_coefficients: bool,
    report: bool,
) -> OptimizeSummary {
    optimize(
        tree,
        dataset,
        target,
        range,
        iterations,
        write_coefficients,
        report,
        OptimizerMode::Numeric,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use approx::assert_abs_diff_eq;

    fn linear_dataset(n: usize) -> (Dataset, Vec<f64>) {
        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let target: Vec<f64> = xs.iter().map(|&x| 2.0 + 3.0 * x).collect();
        (Dataset::new(vec![xs], vec![1]), target)
    }

    #[test]
    fn linear_model_converges_to_known_coefficients() {
        let (ds, target) = linear_dataset(20);
        // tree = c0 + c1*x; a Variable's own `value` field *is* its
        // coefficient, so this already has exactly two free parameters.
        let mut tree = Tree::binary(NodeType::Add, Tree::constant(0.5), Tree::variable(1, 0.5));
        let range = Range::new(0, 20);
        let summary = optimize_autodiff(&mut tree, &ds, &target, range, 50, true, false);
        assert!(summary.final_cost < summary.initial_cost);

        // Node order places the Variable (the second operand) ahead of the
        // Constant (the first operand) in the flat array; see the binary
        // layout note in `crate::tree`.
        let coeffs = tree.get_coefficients();
        assert_abs_diff_eq!(coeffs[0], 3.0, epsilon = 1e-3); // c1, the slope
        assert_abs_diff_eq!(coeffs[1], 2.0, epsilon = 1e-3); // c0, the intercept
    }

    #[test]
    fn product_of_two_coefficients_converges_to_target_slope() {
        let (ds, _) = linear_dataset(20);
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let target: Vec<f64> = xs.iter().map(|&x| 5.0 * x).collect();

        let mut tree = Tree::binary(NodeType::Mul, Tree::constant(1.0), Tree::variable(1, 1.0));
        let range = Range::new(0, 20);
        let summary = optimize_autodiff(&mut tree, &ds, &target, range, 50, true, false);
        assert!(summary.final_cost < 1e-10);
    }

    #[test]
    fn write_coefficients_false_leaves_tree_unchanged() {
        let (ds, target) = linear_dataset(20);
        let mut tree = Tree::binary(NodeType::Add, Tree::constant(0.5), Tree::variable(1, 0.5));
        let original = tree.get_coefficients();
        let range = Range::new(0, 20);
        let summary = optimize_autodiff(&mut tree, &ds, &target, range, 50, false, false);
        assert!(summary.final_cost < summary.initial_cost);
        assert_eq!(tree.get_coefficients(), original);
    }
}
