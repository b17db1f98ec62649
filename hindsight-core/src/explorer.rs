//! Exploration strategy of DQN.
use crate::{
    base::{ActionId, Env, QModel},
    ring_buffer::StackedState,
    schedule::{Schedule, ScheduleFn},
};
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy action selection.
///
/// With probability `epsilon(step)` a uniformly random action is drawn from
/// the environment's action space, otherwise the greedy action of the model.
/// The schedule is any [`ScheduleFn`]; configuration files use [`Schedule`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy<S = Schedule> {
    /// Exploration schedule.
    pub schedule: S,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            schedule: Schedule::Linear {
                start: 1.0,
                end: 0.02,
                steps: 100_000,
            },
        }
    }
}

impl<S: ScheduleFn> EpsilonGreedy<S> {
    /// Constructs an explorer following the given schedule.
    pub fn new(schedule: S) -> Self {
        Self { schedule }
    }

    /// Exploration rate at `step`, clamped into `[0, 1]`.
    pub fn epsilon(&self, step: usize) -> f64 {
        self.schedule.value(step).clamp(0.0, 1.0)
    }

    /// Takes an action for `state` at training step `step`.
    ///
    /// The model is queried only when the greedy branch is taken.
    pub fn action<E, M>(
        &self,
        step: usize,
        state: &StackedState<'_, E::Elem>,
        env: &mut E,
        model: &mut M,
        rng: &mut impl Rng,
    ) -> Result<ActionId>
    where
        E: Env,
        M: QModel<E::Elem>,
    {
        let eps = self.epsilon(step);
        if rng.gen::<f64>() < eps {
            Ok(env.sample_action())
        } else {
            model.greedy_action(state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{CountingModel, DummyEnv},
        ring_buffer::RingBuffer,
        shape::Shape,
    };
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_closure_schedule_switches_branch() -> Result<()> {
        let explorer = EpsilonGreedy::new(|step: usize| if step < 3 { 1.0 } else { 0.0 });
        let mut env = DummyEnv::new(5);
        let mut model = CountingModel::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        let ring = RingBuffer::<f32>::new(Shape::new(vec![1])?, 2)?;

        for step in 0..6 {
            explorer.action(step, &ring.get_stack(), &mut env, &mut model, &mut rng)?;
        }
        assert_eq!(env.n_sampled, 3);
        assert_eq!(model.n_predict, 3);
        Ok(())
    }

    #[test]
    fn test_epsilon_is_clamped() {
        let explorer = EpsilonGreedy::new(|step: usize| step as f64 - 1.0);
        assert_eq!(explorer.epsilon(0), 0.0);
        assert_eq!(explorer.epsilon(1), 0.0);
        assert_eq!(explorer.epsilon(5), 1.0);
        assert_eq!(EpsilonGreedy::<Schedule>::default().epsilon(0), 1.0);
    }
}
