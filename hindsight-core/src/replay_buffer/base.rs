//! Circular store of transitions.
use super::{
    window::{self, Cursor},
    ReplayBufferConfig, SamplingPolicy, TransitionBatch,
};
use crate::{
    base::{ActionId, ExperienceBufferBase, ReplayBufferBase, Transition},
    error::HindsightError,
    ring_buffer::StackedState,
    shape::{Element, Observation, Shape},
};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

/// A fixed-capacity circular replay buffer.
///
/// Observations, actions, rewards and done flags are kept in parallel arrays.
/// Insertion is O(1) and silently overwrites the oldest transition once the
/// buffer is full. Sampling is O(`batch_size`) and reconstructs the stacked
/// state and next state of every drawn slot, zero-padding history positions
/// that belong to a previous episode or precede the oldest stored entry.
///
/// A slot `i` can be drawn only if its successor has been written, so the
/// most recent transition is never sampled. Terminal transitions are drawn
/// like any other; their next state is the padded history of the following
/// slot and is meant to be masked out by `done`.
///
/// # Examples
///
/// ```rust
/// use hindsight_core::{
///     replay_buffer::{ReplayBuffer, ReplayBufferConfig},
///     shape::{Observation, Shape},
/// };
///
/// let config = ReplayBufferConfig::default()
///     .capacity(100)
///     .history_length(4)
///     .obs_shape(vec![2]);
/// let mut buffer = ReplayBuffer::<f32>::build(&config).unwrap();
/// let shape = Shape::new(vec![2]).unwrap();
/// for t in 0..10 {
///     let obs = Observation::new(shape.clone(), vec![t as f32; 2]).unwrap();
///     buffer.add(&obs, 0, 1.0, t == 9).unwrap();
/// }
/// let batch = buffer.sample(8).unwrap();
/// assert_eq!(batch.batch_shape(), vec![8, 2, 4]);
/// ```
pub struct ReplayBuffer<T: Element> {
    /// Shape of a raw observation.
    shape: Shape,

    /// Number of stacked frames.
    history: usize,

    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Current insertion index.
    next_idx: usize,

    /// Current number of stored transitions.
    size: usize,

    /// Total number of insertions.
    num_inserts: u64,

    /// Storage for observations, `capacity * numel` elements.
    obs: Vec<T>,

    /// Storage for actions.
    act: Vec<ActionId>,

    /// Storage for rewards.
    reward: Vec<f64>,

    /// Storage for done flags.
    done: Vec<bool>,

    sampling: SamplingPolicy,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<T: Element> ReplayBuffer<T> {
    /// Creates a replay buffer, failing fast on invalid parameters.
    pub fn build(config: &ReplayBufferConfig) -> Result<Self, HindsightError> {
        config.validate()?;
        let shape = Shape::new(config.obs_shape.clone())?;
        let capacity = config.capacity;

        Ok(Self {
            obs: vec![T::default(); capacity * shape.numel()],
            shape,
            history: config.history_length,
            capacity,
            next_idx: 0,
            size: 0,
            num_inserts: 0,
            act: vec![0; capacity],
            reward: vec![0.; capacity],
            done: vec![false; capacity],
            sampling: config.sampling,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Appends a transition at the write cursor, overwriting the oldest one when full.
    ///
    /// All fields are written before the cursor advances.
    pub fn add(
        &mut self,
        obs: &Observation<T>,
        act: ActionId,
        reward: f64,
        is_done: bool,
    ) -> Result<(), HindsightError> {
        self.shape.check(obs.shape())?;
        let numel = self.shape.numel();
        let i = self.next_idx;
        self.obs[i * numel..(i + 1) * numel].copy_from_slice(obs.data());
        self.act[i] = act;
        self.reward[i] = reward;
        self.done[i] = is_done;

        self.next_idx = (i + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
        self.num_inserts += 1;
        Ok(())
    }

    /// Geometry of the stored data.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            capacity: self.capacity,
            size: self.size,
            next_idx: self.next_idx,
        }
    }

    /// Number of stored transitions, never above the capacity.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` before the first insertion.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stacked frames.
    pub fn history_length(&self) -> usize {
        self.history
    }

    /// Shape of a raw observation.
    pub fn obs_shape(&self) -> &Shape {
        &self.shape
    }

    /// Total number of insertions, including overwritten ones.
    pub fn num_inserts(&self) -> u64 {
        self.num_inserts
    }

    /// Number of slots that can currently be drawn.
    pub fn num_sampleable(&self) -> usize {
        window::num_valid_samples(&self.cursor())
    }

    /// Whether `ix` can currently be drawn.
    pub fn is_valid_sample(&self, ix: usize) -> bool {
        window::is_valid_sample(&self.cursor(), ix)
    }

    /// Whether a batch of `batch_size` can be drawn under the configured policy.
    pub fn can_sample(&self, batch_size: usize) -> bool {
        let available = self.num_sampleable();
        match self.sampling {
            _ if batch_size == 0 => true,
            SamplingPolicy::WithReplacement => available > 0,
            SamplingPolicy::WithoutReplacement => available >= batch_size,
        }
    }

    /// Raw observation stored in slot `ix`.
    pub fn observation(&self, ix: usize) -> Option<&[T]> {
        let numel = self.shape.numel();
        (ix < self.size).then(|| &self.obs[ix * numel..(ix + 1) * numel])
    }

    /// Action stored in slot `ix`.
    pub fn action(&self, ix: usize) -> Option<ActionId> {
        (ix < self.size).then(|| self.act[ix])
    }

    /// Reward stored in slot `ix`.
    pub fn reward(&self, ix: usize) -> Option<f64> {
        (ix < self.size).then(|| self.reward[ix])
    }

    /// Done flag stored in slot `ix`.
    pub fn is_done(&self, ix: usize) -> Option<bool> {
        (ix < self.size).then(|| self.done[ix])
    }

    /// Stored slots from the oldest to the newest.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        let start = self.cursor().oldest().unwrap_or(0);
        (0..self.size).map(move |j| (start + j) % self.capacity)
    }

    /// Stacked state ending at the stored slot `ix`.
    pub fn stack_at(&self, ix: usize) -> Option<StackedState<'_, T>> {
        if ix >= self.size {
            return None;
        }
        let window = window::history_window(&self.cursor(), &self.done, ix, self.history);
        Some(self.view(&window))
    }

    fn view(&self, window: &[Option<usize>]) -> StackedState<'_, T> {
        let numel = self.shape.numel();
        let frames = window
            .iter()
            .map(|slot| slot.map(|i| &self.obs[i * numel..(i + 1) * numel]))
            .collect();
        StackedState::new(&self.shape, frames)
    }

    /// Draws `batch_size` sample slots under the configured policy.
    pub fn sample_indices(&mut self, batch_size: usize) -> Result<Vec<usize>, HindsightError> {
        if batch_size == 0 {
            return Ok(vec![]);
        }
        if !self.can_sample(batch_size) {
            return Err(HindsightError::InsufficientData {
                requested: batch_size,
                available: self.num_sampleable(),
            });
        }

        let cursor = self.cursor();
        let pool = window::num_valid_samples(&cursor);
        let ixs = match self.sampling {
            SamplingPolicy::WithReplacement => (0..batch_size)
                .map(|_| window::nth_valid_sample(&cursor, self.rng.gen_range(0..pool)))
                .collect(),
            SamplingPolicy::WithoutReplacement => index::sample(&mut self.rng, pool, batch_size)
                .into_iter()
                .map(|n| window::nth_valid_sample(&cursor, n))
                .collect(),
        };
        Ok(ixs)
    }

    /// Builds a batch from sample slots drawn by [`ReplayBuffer::sample_indices`].
    pub fn batch_from_indices(&self, ixs: &[usize]) -> Result<TransitionBatch<T>, HindsightError> {
        let cursor = self.cursor();
        let state_shape = self.shape.stacked(self.history);
        let state_len = self.shape.numel() * self.history;
        let mut batch = TransitionBatch::with_capacity(ixs.len(), state_shape);

        for (b, &ix) in ixs.iter().enumerate() {
            let (s, ns) = window::transition_windows(&cursor, &self.done, ix, self.history)
                .ok_or_else(|| {
                    HindsightError::config(format!("slot {} cannot be sampled", ix))
                })?;
            self.view(&s)
                .write_into(&mut batch.obs[b * state_len..(b + 1) * state_len]);
            self.view(&ns)
                .write_into(&mut batch.next_obs[b * state_len..(b + 1) * state_len]);
            batch.act.push(self.act[ix]);
            batch.reward.push(self.reward[ix]);
            batch.is_done.push(self.done[ix]);
            batch.ix_sample.push(ix);
        }

        Ok(batch)
    }

    /// Samples a batch of transitions with stacked states and next states.
    ///
    /// `sample(0)` returns an empty batch. Otherwise fails with
    /// [`HindsightError::InsufficientData`] when the configured policy cannot
    /// serve `batch_size` draws.
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch<T>, HindsightError> {
        let ixs = self.sample_indices(batch_size)?;
        self.batch_from_indices(&ixs)
    }
}

impl<T: Element> ExperienceBufferBase for ReplayBuffer<T> {
    type Item = Transition<T>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.add(&tr.obs, tr.act, tr.reward, tr.is_done)?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.size
    }
}

impl<T: Element> ReplayBufferBase for ReplayBuffer<T> {
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch<T>;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(ReplayBuffer::build(config)?)
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        Ok(self.sample(size)?)
    }

    fn can_sample(&self, size: usize) -> bool {
        ReplayBuffer::can_sample(self, size)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn history_length(&self) -> usize {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn scalar(v: f32) -> Observation<f32> {
        Observation::new(Shape::new(vec![1]).unwrap(), vec![v]).unwrap()
    }

    fn buffer(capacity: usize, k: usize, sampling: SamplingPolicy) -> ReplayBuffer<f32> {
        let config = ReplayBufferConfig::default()
            .capacity(capacity)
            .history_length(k)
            .obs_shape(vec![1])
            .sampling(sampling);
        ReplayBuffer::build(&config).unwrap()
    }

    /// Frame values of the `i`-th state; 0.0 is padding, tags start at 1.0.
    fn frames(states: &[f32], i: usize, k: usize) -> Vec<f32> {
        states[i * k..(i + 1) * k].to_vec()
    }

    fn assert_contiguous_history(frames: &[f32]) {
        let first_real = frames.iter().position(|&v| v != 0.0).unwrap();
        assert!(frames[first_real..].iter().all(|&v| v != 0.0), "{:?}", frames);
        for w in frames[first_real..].windows(2) {
            assert_eq!(w[1] - w[0], 1.0, "{:?}", frames);
        }
    }

    #[test]
    fn test_build_rejects_bad_config() {
        let config = ReplayBufferConfig::default().capacity(0);
        assert!(matches!(
            ReplayBuffer::<f32>::build(&config),
            Err(HindsightError::Configuration(_))
        ));
    }

    #[test]
    fn test_add_shape_mismatch() {
        let mut rb = buffer(10, 2, SamplingPolicy::WithReplacement);
        let obs = Observation::new(Shape::new(vec![2]).unwrap(), vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            rb.add(&obs, 0, 0.0, false),
            Err(HindsightError::StateShape { .. })
        ));
        assert_eq!(rb.len(), 0);
    }

    #[test]
    fn test_capacity_overwrites_oldest() {
        let c = 20;
        let mut rb = buffer(c, 4, SamplingPolicy::WithReplacement);
        for n in 0..c + 5 {
            rb.add(&scalar(n as f32 + 1.0), n % 3, n as f64, false).unwrap();
            assert!(rb.len() <= c);
        }
        assert_eq!(rb.len(), c);
        assert_eq!(rb.num_inserts(), (c + 5) as u64);

        let tags: Vec<f64> = rb.slots().map(|ix| rb.reward(ix).unwrap()).collect();
        let expected: Vec<f64> = (5..c + 5).map(|n| n as f64).collect();
        assert_eq!(tags, expected);
        for ix in rb.slots() {
            let n = rb.reward(ix).unwrap() as usize;
            assert_eq!(rb.observation(ix).unwrap(), &[n as f32 + 1.0]);
            assert_eq!(rb.action(ix).unwrap(), n % 3);
        }
    }

    #[test]
    fn test_episode_boundary_isolation() {
        let k = 4;
        let mut rb = buffer(50, k, SamplingPolicy::WithReplacement);
        // A short episode of length 2 < k, then a new one.
        let mut tag = 1.0;
        for t in 0..2 {
            rb.add(&scalar(tag), 0, 0.0, t == 1).unwrap();
            tag += 1.0;
        }
        for _ in 0..6 {
            rb.add(&scalar(tag), 0, 0.0, false).unwrap();
            tag += 1.0;
        }

        // Slot 2 starts the second episode.
        let stack = rb.stack_at(3).unwrap();
        assert_eq!(stack.num_padding(), 2);
        assert_eq!(stack.to_vec(), vec![0.0, 0.0, 3.0, 4.0]);

        let batch = rb.sample(200).unwrap();
        for i in 0..batch.len() {
            let s = frames(&batch.obs, i, k);
            let ns = frames(&batch.next_obs, i, k);
            assert_contiguous_history(&s);
            assert_contiguous_history(&ns);
            assert!(!(s.contains(&2.0) && s.contains(&3.0)));
            assert!(!(ns.contains(&2.0) && ns.contains(&3.0)));
        }
    }

    #[test]
    fn test_next_state_is_shifted_state() {
        let k = 3;
        let mut rb = buffer(10, k, SamplingPolicy::WithReplacement);
        for n in 0..6 {
            rb.add(&scalar(n as f32 + 1.0), n, 0.0, false).unwrap();
        }
        let batch = rb.batch_from_indices(&[0, 2, 4]).unwrap();
        assert_eq!(batch.state(0), &[0.0, 0.0, 1.0]);
        assert_eq!(batch.next_state(0), &[0.0, 1.0, 2.0]);
        assert_eq!(batch.state(1), &[1.0, 2.0, 3.0]);
        assert_eq!(batch.state(2), &[3.0, 4.0, 5.0]);
        assert_eq!(batch.next_state(2), &[4.0, 5.0, 6.0]);
        assert_eq!(batch.act, vec![0, 2, 4]);
        // The newest slot has no successor yet.
        assert!(rb.batch_from_indices(&[5]).is_err());
    }

    #[test]
    fn test_sampling_distribution_is_uniform() {
        let c = 20;
        let mut rb = buffer(c, 1, SamplingPolicy::WithReplacement);
        for n in 0..c + 7 {
            rb.add(&scalar(n as f32), 0, 0.0, false).unwrap();
        }
        let newest = rb.cursor().newest().unwrap();
        let draws = 40_000;
        let mut counts = vec![0usize; c];
        for _ in 0..draws {
            let ix = rb.sample_indices(1).unwrap()[0];
            counts[ix] += 1;
        }
        assert_eq!(counts[newest], 0);
        let expected = draws as f64 / (c - 1) as f64;
        let chi2: f64 = counts
            .iter()
            .enumerate()
            .filter(|(ix, _)| *ix != newest)
            .map(|(_, &n)| (n as f64 - expected).powi(2) / expected)
            .sum();
        // 18 degrees of freedom; the 0.999 quantile is about 42.3.
        assert!(chi2 < 42.3, "chi2 = {}", chi2);
    }

    #[test]
    fn test_shape_consistency_across_wrap() {
        let config = ReplayBufferConfig::default()
            .capacity(7)
            .history_length(3)
            .obs_shape(vec![2, 2]);
        let mut rb = ReplayBuffer::<u8>::build(&config).unwrap();
        let shape = Shape::new(vec![2, 2]).unwrap();
        for n in 0..25u8 {
            let obs = Observation::new(shape.clone(), vec![n; 4]).unwrap();
            rb.add(&obs, 0, 0.0, n % 5 == 4).unwrap();
            if rb.can_sample(5) {
                let batch = rb.sample(5).unwrap();
                assert_eq!(batch.batch_shape(), vec![5, 2, 2, 3]);
                assert_eq!(batch.obs.len(), 5 * 12);
                assert_eq!(batch.next_obs.len(), 5 * 12);
                assert_eq!(batch.is_done.len(), 5);
            }
        }
    }

    #[test]
    fn test_insufficient_data() {
        let mut rb = buffer(10, 2, SamplingPolicy::WithReplacement);
        assert!(matches!(
            rb.sample(1),
            Err(HindsightError::InsufficientData {
                requested: 1,
                available: 0
            })
        ));
        rb.add(&scalar(1.0), 0, 0.0, false).unwrap();
        // The only stored transition has no successor yet.
        assert!(rb.sample(1).is_err());
        rb.add(&scalar(2.0), 0, 0.0, false).unwrap();
        assert_eq!(rb.sample(3).unwrap().ix_sample, vec![0, 0, 0]);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (c, k) = (100, 4);
        let fill = |rb: &mut ReplayBuffer<f32>| {
            for n in 0..150 {
                rb.add(&scalar(n as f32 + 1.0), n % 4, n as f64, n == 60)
                    .unwrap();
            }
        };

        let mut rb = buffer(c, k, SamplingPolicy::WithReplacement);
        fill(&mut rb);
        assert_eq!(rb.len(), 100);

        for _ in 0..50 {
            let batch = rb.sample(10).unwrap();
            assert_eq!(batch.batch_shape(), vec![10, 1, 4]);
            for i in 0..batch.len() {
                for states in [&batch.obs, &batch.next_obs] {
                    let f = frames(states, i, k);
                    assert_contiguous_history(&f);
                    // Tag 61 closes the episode, tag 62 opens the next one.
                    assert!(!(f.contains(&61.0) && f.contains(&62.0)), "{:?}", f);
                    // Tag 150 is the newest entry, tag 51 the oldest.
                    assert!(!(f.contains(&150.0) && f.contains(&51.0)), "{:?}", f);
                }
            }
        }

        let empty = rb.sample(0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.obs.len(), 0);

        let batch = rb.sample(101).unwrap();
        assert_eq!(batch.len(), 101);
        let unique: HashSet<usize> = batch.ix_sample.iter().copied().collect();
        assert!(unique.len() < 101);

        let mut rb = buffer(c, k, SamplingPolicy::WithoutReplacement);
        fill(&mut rb);
        assert!(matches!(
            rb.sample(101),
            Err(HindsightError::InsufficientData {
                requested: 101,
                available: 99
            })
        ));
        let batch = rb.sample(99).unwrap();
        let unique: HashSet<usize> = batch.ix_sample.iter().copied().collect();
        assert_eq!(unique.len(), 99);
    }
}
