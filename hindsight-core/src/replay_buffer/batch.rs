//! Batches of transitions sampled from [`ReplayBuffer`](super::ReplayBuffer).
use crate::{base::ActionId, shape::Element};

/// A batch of transitions `(s_t, a_t, s_t+1, r_t, done_t)`.
///
/// States are stacked histories laid out as `[batch_size, obs_shape.., k]`
/// in row-major order. The batch owns its data, so it stays valid after
/// further insertions into the buffer.
///
/// `is_done` is boolean. Consumers computing bootstrapped targets
/// `r + (1 - done) * gamma * Q(s_t+1)` convert it with [`TransitionBatch::done_mask`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch<T: Element> {
    /// Stacked states `s_t`.
    pub obs: Vec<T>,

    /// Actions `a_t`.
    pub act: Vec<ActionId>,

    /// Stacked next states `s_t+1`.
    pub next_obs: Vec<T>,

    /// Rewards `r_t`.
    pub reward: Vec<f64>,

    /// Done flags.
    pub is_done: Vec<bool>,

    /// Buffer slots the samples were drawn from.
    pub ix_sample: Vec<usize>,

    state_shape: Vec<usize>,
}

impl<T: Element> TransitionBatch<T> {
    pub(crate) fn with_capacity(batch_size: usize, state_shape: Vec<usize>) -> Self {
        let state_len: usize = state_shape.iter().product();
        Self {
            obs: vec![T::default(); batch_size * state_len],
            act: Vec::with_capacity(batch_size),
            next_obs: vec![T::default(); batch_size * state_len],
            reward: Vec::with_capacity(batch_size),
            is_done: Vec::with_capacity(batch_size),
            ix_sample: Vec::with_capacity(batch_size),
            state_shape,
        }
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Shape of a single stacked state, `[obs_shape.., k]`.
    pub fn state_shape(&self) -> &[usize] {
        &self.state_shape
    }

    /// Shape of [`TransitionBatch::obs`] and [`TransitionBatch::next_obs`].
    pub fn batch_shape(&self) -> Vec<usize> {
        let mut shape = vec![self.len()];
        shape.extend_from_slice(&self.state_shape);
        shape
    }

    /// The `i`-th stacked state.
    pub fn state(&self, i: usize) -> &[T] {
        let n = self.state_shape.iter().product::<usize>();
        &self.obs[i * n..(i + 1) * n]
    }

    /// The `i`-th stacked next state.
    pub fn next_state(&self, i: usize) -> &[T] {
        let n = self.state_shape.iter().product::<usize>();
        &self.next_obs[i * n..(i + 1) * n]
    }

    /// Done flags as `0.0`/`1.0`.
    pub fn done_mask(&self) -> Vec<f64> {
        self.is_done
            .iter()
            .map(|&d| if d { 1.0 } else { 0.0 })
            .collect()
    }

    /// Unpacks `(s_t, a_t, s_t+1, r_t, done_t)`.
    pub fn unpack(self) -> (Vec<T>, Vec<ActionId>, Vec<T>, Vec<f64>, Vec<bool>) {
        (self.obs, self.act, self.next_obs, self.reward, self.is_done)
    }
}
