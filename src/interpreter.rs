//! src/interpreter.rs
//!
//! The batched interpreter (BI): walks a `Tree` against a `Dataset` over a
//! `Range`, producing one output value per row. Generic over `Scalar` so
//! the same code path serves plain `f64` evaluation and `Dual`-typed
//! forward-mode autodiff (see `crate::residual` and `crate::optimize`).
//!
//! Rows are processed in batches of `batch_size` to amortize the per-node
//! dispatch overhead of the postfix walk; the reference default is 64, but
//! every batch size `>= 1` must agree (this is a tested property, not an
//! implementation detail callers can rely on differing).

use crate::dataset::Dataset;
use crate::node::NodeType;
use crate::range::Range;
use crate::scalar::Scalar;
use crate::tree::Tree;

pub const DEFAULT_BATCH_SIZE: usize = 64;

/// `Evaluate<T>(tree, dataset, range, parameters)`, allocating and
/// returning the result vector.
pub fn evaluate<T: Scalar>(tree: &Tree, dataset: &Dataset, range: Range, parameters: Option<&[T]>) -> Vec<T> {
    let mut out: Vec<T> = (0..range.size()).map(|_| T::from_constant(0.0)).collect();
    evaluate_into(tree, dataset, range, parameters, &mut out, DEFAULT_BATCH_SIZE);
    out
}

/// In-place variant writing into a caller-provided buffer of length
/// `range.size()`, with an explicit batch size (exposed mainly so tests can
/// check batch invariance; production callers should use `evaluate`).
pub fn evaluate_into<T: Scalar>(
    tree: &Tree,
    dataset: &Dataset,
    range: Range,
    parameters: Option<&[T]>,
    out: &mut [T],
    batch_size: usize,
) {
    assert_eq!(
        out.len(),
        range.size(),
        "output buffer length must equal range size"
    );
    let nodes = tree.nodes();
    let n = nodes.len();
    let batch = batch_size.max(1);

    // Setup pass: resolve dataset columns once, and seed the per-node
    // "weight" (literal value or supplied parameter) once. The parameter
    // cursor walks Constants and Variables in node order, matching the
    // layout `Tree::get_coefficients` produces.
    let mut dataset_column = vec![0usize; n];
    let mut weight: Vec<Option<T>> = (0..n).map(|_| None).collect();
    let mut param_cursor = 0usize;

    for (i, node) in nodes.iter().enumerate() {
        match node.node_type {
            NodeType::Constant => {
                let v = match parameters {
                    Some(p) => p[param_cursor].clone(),
                    None => T::from_constant(node.value),
                };
                weight[i] = Some(v);
                param_cursor += 1;
            }
            NodeType::Variable => {
                dataset_column[i] = dataset.get_index(node.hash_value);
                let w = match parameters {
                    Some(p) => p[param_cursor].clone(),
                    None => T::from_constant(node.value),
                };
                weight[i] = Some(w);
                param_cursor += 1;
            }
            _ => {}
        }
    }

    let mut scratch: Vec<Vec<T>> = (0..n).map(|_| (0..batch).map(|_| T::from_constant(0.0)).collect()).collect();

    let mut row = 0usize;
    while row < range.size() {
        let remaining = (range.size() - row).min(batch);

        for i in 0..n {
            let node_type = nodes[i].node_type;
            match node_type {
                NodeType::Add | NodeType::Sub | NodeType::Mul | NodeType::Div => {
                    let first_idx = i - 1;
                    let second_idx = i - 1 - nodes[first_idx].length - 1;
                    for r in 0..remaining {
                        let a = scratch[first_idx][r].clone();
                        let b = scratch[second_idx][r].clone();
                        scratch[i][r] = match node_type {
                            NodeType::Add => a + b,
                            NodeType::Sub => a - b,
                            NodeType::Mul => a * b,
                            NodeType::Div => a / b,
                            _ => unreachable!(),
                        };
                    }
                }
                NodeType::Log
                | NodeType::Exp
                | NodeType::Sin
                | NodeType::Cos
                | NodeType::Tan
                | NodeType::Sqrt
                | NodeType::Cbrt
                | NodeType::Square => {
                    let child_idx = i - 1;
                    for r in 0..remaining {
                        let x = &scratch[child_idx][r];
                        scratch[i][r] = match node_type {
                            NodeType::Log => x.ln(),
                            NodeType::Exp => x.exp(),
                            NodeType::Sin => x.sin(),
                            NodeType::Cos => x.cos(),
                            NodeType::Tan => x.tan(),
                            NodeType::Sqrt => x.sqrt(),
                            NodeType::Cbrt => x.cbrt(),
                            NodeType::Square => x.square(),
                            _ => unreachable!(),
                        };
                    }
                }
                NodeType::Constant => {
                    let v = weight[i].clone().expect("constant seeded during setup pass");
                    for r in 0..remaining {
                        scratch[i][r] = v.clone();
                    }
                }
                NodeType::Variable => {
                    let w = weight[i].clone().expect("variable weight seeded during setup pass");
                    let col = dataset_column[i];
                    let readings = dataset.values().col(col).segment(range.start() + row, remaining);
                    for r in 0..remaining {
                        scratch[i][r] = w.clone() * T::from_constant(readings[r]);
                    }
                }
            }
        }

        let root = n - 1;
        out[row..row + remaining].clone_from_slice(&scratch[root][..remaining]);
        row += remaining;
    }

    sanitize_non_finite(out);
}

/// Replace non-finite entries with the midpoint of the finite entries
/// (or 0.0, the midpoint of `f64`'s symmetric representable range, if none
/// are finite). Finite entries are, by construction, already within
/// `[min, max]` of the finite subset, so no separate clamp pass is needed.
fn sanitize_non_finite<T: Scalar>(out: &mut [T]) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in out.iter() {
        let f = v.to_f64();
        if f.is_finite() {
            min = min.min(f);
            max = max.max(f);
        }
    }

    if !min.is_finite() || !max.is_finite() {
        tracing::trace!("evaluate: no finite output in range, falling back to neutral 0.0");
        for v in out.iter_mut() {
            *v = v.replace_with(0.0);
        }
        return;
    }

    let mid = (min + max) / 2.0;
    for v in out.iter_mut() {
        if !v.to_f64().is_finite() {
            *v = v.replace_with(mid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    fn dataset_xy() -> Dataset {
        Dataset::new(
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 5.0, 5.0, 5.0]],
            vec![1, 2],
        )
    }

    #[test]
    fn scenario_constant_addition() {
        let tree = Tree::binary(NodeType::Add, Tree::constant(1.0), Tree::constant(2.0));
        let ds = Dataset::new(vec![], vec![]);
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 4), None);
        assert_eq!(out, vec![3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn scenario_weighted_variable_times_constant() {
        let ds = Dataset::new(vec![vec![1.0, 2.0, 3.0, 4.0]], vec![1]);
        let tree = Tree::binary(NodeType::Mul, Tree::variable(1, 2.0), Tree::constant(3.0));
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 4), None);
        assert_eq!(out, vec![6.0, 12.0, 18.0, 24.0]);
    }

    #[test]
    fn scenario_subtraction_of_two_variables() {
        let ds = dataset_xy();
        let tree = Tree::binary(NodeType::Sub, Tree::variable(2, 1.0), Tree::variable(1, 1.0));
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 3), None);
        assert_eq!(out, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn scenario_division_sanitizes_infinity_to_midrange() {
        let ds = Dataset::new(vec![vec![1.0, 0.0, -1.0]], vec![1]);
        let tree = Tree::binary(NodeType::Div, Tree::constant(1.0), Tree::variable(1, 1.0));
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 3), None);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(out[1], 0.0);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[2], -1.0);
    }

    #[test]
    fn scenario_square_of_variable() {
        let ds = Dataset::new(vec![vec![-2.0, -1.0, 0.0, 1.0, 2.0]], vec![1]);
        let tree = Tree::unary(NodeType::Square, Tree::variable(1, 1.0));
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 5), None);
        assert_eq!(out, vec![4.0, 1.0, 0.0, 1.0, 4.0]);
    }

    #[test]
    fn identity_tree_returns_raw_column() {
        let ds = Dataset::new(vec![vec![10.0, 20.0, 30.0]], vec![1]);
        let tree = Tree::variable(1, 1.0);
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 3), None);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn log_of_nonpositive_values_stays_finite() {
        let ds = Dataset::new(vec![vec![1.0, -1.0, 0.0, 2.0]], vec![1]);
        let tree = Tree::unary(NodeType::Log, Tree::variable(1, 1.0));
        let out: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 4), None);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn none_parameters_match_extracted_coefficients() {
        let ds = dataset_xy();
        let tree = Tree::binary(NodeType::Mul, Tree::variable(1, 2.0), Tree::constant(3.0));
        let via_literal: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 4), None);
        let coeffs = tree.get_coefficients();
        let via_params: Vec<f64> = evaluate(&tree, &ds, Range::new(0, 4), Some(&coeffs));
        assert_eq!(via_literal, via_params);
    }

    #[test]
    fn batch_size_does_not_change_output() {
        let ds = dataset_xy();
        let tree = Tree::binary(
            NodeType::Add,
            Tree::unary(NodeType::Square, Tree::variable(1, 1.0)),
            Tree::variable(2, 0.5),
        );
        let range = Range::new(0, 4);
        let mut out_b1 = vec![0.0f64; 4];
        let mut out_b3 = vec![0.0f64; 4];
        let mut out_b64 = vec![0.0f64; 4];
        evaluate_into(&tree, &ds, range, None, &mut out_b1, 1);
        evaluate_into(&tree, &ds, range, None, &mut out_b3, 3);
        evaluate_into(&tree, &ds, range, None, &mut out_b64, 64);
        assert_eq!(out_b1, out_b3);
        assert_eq!(out_b1, out_b64);
    }
}
