//! src/lib.rs
//!
//! `symreg_core`: the numeric core of a symbolic-regression / genetic
//! programming framework - batched tree evaluation, forward-mode autodiff,
//! and Levenberg-Marquardt coefficient fitting. Tree construction, mutation,
//! crossover, selection, grammar sampling, dataset ingest and CLI/binding
//! front-ends are out of scope here; they are the outer evolutionary loop's
//! job and only interact with this crate through the types below.
//!
//! Module map, leaves first:
//! - [`node`] / [`tree`]: the postfix expression representation (LPR).
//! - [`range`] / [`dataset`]: the row-range and column-major dataset view (DV).
//! - [`scalar`] / [`dual`]: the arithmetic capability the interpreter is
//!   generic over, plus the forward-mode dual number that makes autodiff
//!   just another instantiation of the same code.
//! - [`interpreter`]: the batched interpreter (BI).
//! - [`residual`]: the residual functor (RF) the least-squares solver drives.
//! - [`optimize`]: the coefficient optimizer (CO).
//! - [`stats`] / [`fitness`]: statistics helpers and the thin fitness
//!   evaluators built on top of BI and CO.
//! - [`config`]: the handful of tunables the core exposes to its host.

pub mod config;
pub mod dataset;
pub mod dual;
pub mod fitness;
pub mod interpreter;
pub mod node;
pub mod optimize;
pub mod range;
pub mod residual;
pub mod scalar;
pub mod stats;
pub mod tree;

pub use config::CoreConfig;
pub use dataset::Dataset;
pub use dual::Dual;
pub use fitness::{EvaluatorCounters, FitConfig, FitnessEvaluator, NmseEvaluator, OneMinusR2Evaluator};
pub use interpreter::{evaluate, evaluate_into, DEFAULT_BATCH_SIZE};
pub use node::{Node, NodeType};
pub use optimize::{optimize, optimize_autodiff, optimize_numeric, OptimizeSummary, OptimizerMode, Termination};
pub use range::Range;
pub use residual::ResidualFunctor;
pub use tree::Tree;
