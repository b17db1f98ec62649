//! Evaluate trained models.
use crate::{base::Env, record::Record};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a model `M` in environment `E`.
pub trait Evaluator<E: Env, M> {
    /// Plays episodes with `model` and returns the aggregated results.
    fn evaluate(&mut self, model: &mut M) -> Result<Record>;
}
