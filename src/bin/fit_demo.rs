// src/bin/fit_demo.rs
//
// End-to-end demo: build a dataset and a tree by hand, fit the tree's
// coefficients against noisy linear data with the autodiff-driven
// optimizer, and print what it converged to. Exercises exactly the path a
// host evolutionary loop drives per-candidate: construct → optimize →
// evaluate → score.

use anyhow::Result;
use rand::{thread_rng, Rng};
use tracing_subscriber::EnvFilter;

use symreg_core::node::NodeType;
use symreg_core::optimize::optimize_autodiff;
use symreg_core::range::Range;
use symreg_core::tree::Tree;
use symreg_core::{evaluate, Dataset};

const X_HASH: u64 = 0xA5A5_0001;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut rng = thread_rng();
    let n = 200;
    let xs: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
    let target: Vec<f64> = xs
        .iter()
        .map(|&x| 2.0 + 3.0 * x + rng.gen_range(-0.01..0.01))
        .collect();

    let dataset = Dataset::new(vec![xs], vec![X_HASH]);
    let range = Range::new(0, n);

    // tree = c0 + c1 * x
    let mut tree = Tree::binary(
        NodeType::Add,
        Tree::constant(0.0),
        Tree::variable(X_HASH, 1.0),
    );

    println!("initial coefficients: {:?}", tree.get_coefficients());

    let summary = optimize_autodiff(&mut tree, &dataset, &target, range, 50, true, true);

    println!(
        "fitted coefficients: {:?} (iterations={}, initial_cost={:.6}, final_cost={:.6e}, termination={:?})",
        tree.get_coefficients(),
        summary.iterations_performed,
        summary.initial_cost,
        summary.final_cost,
        summary.termination,
    );

    let prediction: Vec<f64> = evaluate(&tree, &dataset, range, None);
    println!(
        "first 5 predictions: {:?}",
        &prediction[..5.min(prediction.len())]
    );

    Ok(())
}
