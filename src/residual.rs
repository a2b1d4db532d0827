//! src/residual.rs
//!
//! The residual functor (RF): wraps the batched interpreter to present
//! `residual[i] = predicted[i] - target[i]`, the shape a nonlinear
//! least-squares driver expects. Generic over `Scalar` so the coefficient
//! optimizer can ask for either plain residuals or autodiff-carrying ones
//! from the same call.

use crate::dataset::Dataset;
use crate::interpreter::evaluate;
use crate::range::Range;
use crate::scalar::Scalar;
use crate::tree::Tree;

pub struct ResidualFunctor<'a> {
    tree: &'a Tree,
    dataset: &'a Dataset,
    target: &'a [f64],
    range: Range,
}

impl<'a> ResidualFunctor<'a> {
    pub fn new(tree: &'a Tree, dataset: &'a Dataset, target: &'a [f64], range: Range) -> Self {
        assert_eq!(
            target.len(),
            range.size(),
            "target slice must cover exactly the evaluation range"
        );
        Self {
            tree,
            dataset,
            target,
            range,
        }
    }

    pub fn range(&self) -> Range {
        self.range
    }

    /// `predicted - target`, for whichever scalar type `parameters` (and
    /// therefore the interpreter) is running in.
    pub fn residuals<T: Scalar>(&self, parameters: Option<&[T]>) -> Vec<T> {
        let mut predicted = evaluate(self.tree, self.dataset, self.range, parameters);
        for (p, &t) in predicted.iter_mut().zip(self.target.iter()) {
            *p = p.clone() - T::from_constant(t);
        }
        predicted
    }
}
