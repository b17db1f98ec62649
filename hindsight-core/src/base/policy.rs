//! Policy.
use super::ActionId;
use crate::{pg::PgBatch, record::Record, ring_buffer::StackedState, shape::Element};
use anyhow::Result;

/// A stochastic policy trained by policy gradient.
pub trait Policy<T: Element> {
    /// Samples an action given a stacked state.
    fn select_action(&mut self, state: &StackedState<'_, T>) -> Result<ActionId>;

    /// Performs an optimization step on a batch of trajectories.
    fn fit(&mut self, batch: &PgBatch<T>, learning_rate: f64) -> Result<Record>;
}

/// State-value estimate subtracted from returns.
pub trait Baseline<T: Element> {
    /// Baseline values of `n` stacked states laid out back to back in `states`.
    fn compute_baseline(&mut self, states: &[T], n: usize) -> Result<Vec<f64>>;
}
