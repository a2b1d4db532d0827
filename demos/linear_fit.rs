// demos/linear_fit.rs
//
// Drives the thin fitness-evaluator layer on top of the core: build a
// candidate tree, hand it to `OneMinusR2Evaluator` with a nonzero fitting
// budget, and compare its score before and after coefficient fitting.

use symreg_core::fitness::{FitConfig, FitnessEvaluator, OneMinusR2Evaluator};
use symreg_core::node::NodeType;
use symreg_core::optimize::OptimizerMode;
use symreg_core::range::Range;
use symreg_core::tree::Tree;
use symreg_core::Dataset;

const X_HASH: u64 = 1;

fn main() {
    let xs: Vec<f64> = (0..50).map(|i| i as f64).collect();
    let target: Vec<f64> = xs.iter().map(|&x| 2.0 + 3.0 * x).collect();
    let dataset = Dataset::new(vec![xs], vec![X_HASH]);
    let range = Range::new(0, 50);

    let mut tree = Tree::binary(
        NodeType::Add,
        Tree::constant(0.1),
        Tree::variable(X_HASH, 0.1),
    );

    let mut unfit = OneMinusR2Evaluator::new(FitConfig::none());
    let before = unfit.evaluate(&mut tree.clone(), &dataset, &target, range);
    println!("1 - r^2 before fitting: {before:.6}");

    let mut fitted = OneMinusR2Evaluator::new(FitConfig {
        iterations: 50,
        mode: OptimizerMode::Autodiff,
    });
    let after = fitted.evaluate(&mut tree, &dataset, &target, range);
    println!("1 - r^2 after fitting:  {after:.6}");
    println!("fitted coefficients: {:?}", tree.get_coefficients());
    println!(
        "fitness evaluations: {}, local evaluations: {}",
        fitted.counters().fitness_evaluations(),
        fitted.counters().local_evaluations(),
    );
}
