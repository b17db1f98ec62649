//! Value model.
use super::ActionId;
use crate::{
    record::Record, replay_buffer::TransitionBatch, ring_buffer::StackedState, shape::Element,
};
use anyhow::Result;

/// Action-value model trained by the DQN trainer.
///
/// The network, its optimizer and the target network live behind this trait.
pub trait QModel<T: Element> {
    /// Returns `Q(s, a)` for every action `a` of the given stacked state.
    fn predict(&mut self, state: &StackedState<'_, T>) -> Result<Vec<f64>>;

    /// Performs one optimization step on a batch.
    fn train(&mut self, batch: &TransitionBatch<T>, learning_rate: f64) -> Result<Record>;

    /// Copies the online parameters into the target network.
    fn update_target_net(&mut self) -> Result<()>;

    /// Greedy action, `argmax_a Q(s, a)`. Ties resolve to the lowest index.
    fn greedy_action(&mut self, state: &StackedState<'_, T>) -> Result<ActionId> {
        let q = self.predict(state)?;
        Ok(argmax(&q))
    }
}

pub(crate) fn argmax(values: &[f64]) -> ActionId {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
