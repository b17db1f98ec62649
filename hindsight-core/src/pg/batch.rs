//! Trajectories and batches of the policy-gradient pipeline.
use crate::{
    base::ActionId,
    ring_buffer::StackedState,
    shape::Element,
};

/// A single episode.
///
/// `states` holds the stacked states back to back, each `state_len` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<T: Element> {
    /// Stacked states.
    pub states: Vec<T>,

    /// Actions.
    pub actions: Vec<ActionId>,

    /// Rewards.
    pub rewards: Vec<f64>,

    /// Discounted returns.
    pub returns: Vec<f64>,

    /// Baseline values, zeros without a baseline.
    pub baseline: Vec<f64>,

    /// Advantages.
    pub advantages: Vec<f64>,

    state_len: usize,
}

impl<T: Element> Trajectory<T> {
    /// An empty trajectory of states with `state_len` elements.
    pub fn new(state_len: usize) -> Self {
        Self {
            states: vec![],
            actions: vec![],
            rewards: vec![],
            returns: vec![],
            baseline: vec![],
            advantages: vec![],
            state_len,
        }
    }

    /// Appends a step.
    pub fn push(&mut self, state: &StackedState<'_, T>, act: ActionId, reward: f64) {
        let start = self.states.len();
        self.states.resize(start + self.state_len, T::default());
        state.write_into(&mut self.states[start..]);
        self.actions.push(act);
        self.rewards.push(reward);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if no step was pushed.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Undiscounted return of the episode.
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

fn concat<T: Element, U: Copy>(
    trajectories: &[Trajectory<T>],
    field: impl Fn(&Trajectory<T>) -> &[U],
) -> Vec<U> {
    trajectories.iter().flat_map(|t| field(t).iter().copied()).collect()
}

/// Concatenation of trajectories fed to [`Policy::fit`](crate::Policy::fit).
#[derive(Debug, Clone, PartialEq)]
pub struct PgBatch<T: Element> {
    /// Stacked states, laid out back to back.
    pub states: Vec<T>,

    /// Actions.
    pub actions: Vec<ActionId>,

    /// Rewards.
    pub rewards: Vec<f64>,

    /// Discounted returns.
    pub returns: Vec<f64>,

    /// Advantages, normalized if configured.
    pub advantages: Vec<f64>,

    /// Baseline values.
    pub baseline: Vec<f64>,

    /// Regression targets of the baseline, i.e. the returns.
    pub baseline_targets: Vec<f64>,

    state_shape: Vec<usize>,
}

impl<T: Element> PgBatch<T> {
    /// Concatenates trajectories whose states have shape `state_shape`.
    pub fn from_trajectories(trajectories: &[Trajectory<T>], state_shape: Vec<usize>) -> Self {
        let returns = concat(trajectories, |t| t.returns.as_slice());
        Self {
            states: concat(trajectories, |t| t.states.as_slice()),
            actions: concat(trajectories, |t| t.actions.as_slice()),
            rewards: concat(trajectories, |t| t.rewards.as_slice()),
            advantages: concat(trajectories, |t| t.advantages.as_slice()),
            baseline: concat(trajectories, |t| t.baseline.as_slice()),
            baseline_targets: returns.clone(),
            returns,
            state_shape,
        }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the batch holds no step.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Shape of a single stacked state.
    pub fn state_shape(&self) -> &[usize] {
        &self.state_shape
    }

    /// The `i`-th stacked state.
    pub fn state(&self, i: usize) -> &[T] {
        let n: usize = self.state_shape.iter().product();
        &self.states[i * n..(i + 1) * n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ring_buffer::RingBuffer,
        shape::{Observation, Shape},
    };

    #[test]
    fn test_concatenation() {
        let shape = Shape::new(vec![1]).unwrap();
        let mut ring = RingBuffer::<f32>::new(shape.clone(), 2).unwrap();
        let mut trajs = vec![];
        for len in [2, 3] {
            ring.reset();
            let mut traj = Trajectory::new(2);
            for t in 0..len {
                ring.append(&Observation::new(shape.clone(), vec![t as f32 + 1.0]).unwrap())
                    .unwrap();
                traj.push(&ring.get_stack(), t, 1.0);
            }
            traj.returns = vec![1.0; len];
            traj.baseline = vec![0.0; len];
            traj.advantages = vec![1.0; len];
            trajs.push(traj);
        }

        let batch = PgBatch::from_trajectories(&trajs, vec![1, 2]);
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.actions, vec![0, 1, 0, 1, 2]);
        assert_eq!(batch.state(0), &[0.0, 1.0]);
        assert_eq!(batch.state(1), &[1.0, 2.0]);
        assert_eq!(batch.state(2), &[0.0, 1.0]);
        assert_eq!(batch.state(4), &[2.0, 3.0]);
        assert_eq!(batch.baseline_targets, batch.returns);
        assert_eq!(trajs[1].total_reward(), 3.0);
    }
}
