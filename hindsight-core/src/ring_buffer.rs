//! Episode-local cache of the most recent observations.
//!
//! [`RingBuffer`] keeps the last `k` raw frames of the current episode and
//! exposes them as a [`StackedState`], a borrowed view ordered from the oldest
//! to the newest frame. The view does not copy frames; [`StackedState::to_vec`]
//! materializes it into a contiguous array whose trailing dimension is the
//! history, copying every frame exactly once.
use crate::{
    error::HindsightError,
    shape::{Element, Observation, Shape},
};

/// Borrowed view of `k` stacked frames, oldest first.
///
/// A `None` frame stands for zero padding, i.e. a position before the start
/// of the episode.
#[derive(Debug, Clone)]
pub struct StackedState<'a, T: Element> {
    shape: &'a Shape,
    frames: Vec<Option<&'a [T]>>,
}

impl<'a, T: Element> StackedState<'a, T> {
    pub(crate) fn new(shape: &'a Shape, frames: Vec<Option<&'a [T]>>) -> Self {
        Self { shape, frames }
    }

    /// Number of stacked frames `k`.
    pub fn history_length(&self) -> usize {
        self.frames.len()
    }

    /// Shape of a single frame.
    pub fn frame_shape(&self) -> &Shape {
        self.shape
    }

    /// Shape of the stacked state: the frame shape followed by `k`.
    pub fn shape(&self) -> Vec<usize> {
        self.shape.stacked(self.frames.len())
    }

    /// The `h`-th frame counted from the oldest one. `None` means zero padding.
    pub fn frame(&self, h: usize) -> Option<&'a [T]> {
        self.frames[h]
    }

    /// Number of zero-padded frames at the oldest end.
    pub fn num_padding(&self) -> usize {
        self.frames.iter().filter(|f| f.is_none()).count()
    }

    /// Writes the stacked state into `out`, which must hold `numel * k` elements.
    ///
    /// Element `e` of frame `h` lands at `out[e * k + h]`.
    pub fn write_into(&self, out: &mut [T]) {
        let k = self.frames.len();
        let numel = self.shape.numel();
        debug_assert_eq!(out.len(), numel * k);
        for (h, frame) in self.frames.iter().enumerate() {
            match frame {
                Some(data) => {
                    for (e, v) in data.iter().enumerate() {
                        out[e * k + h] = *v;
                    }
                }
                None => {
                    for e in 0..numel {
                        out[e * k + h] = T::default();
                    }
                }
            }
        }
    }

    /// Materializes the stacked state as a contiguous array.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::default(); self.shape.numel() * self.frames.len()];
        self.write_into(&mut out);
        out
    }
}

/// Fixed-size circular cache of the last `k` observations of an episode.
///
/// [`RingBuffer::reset`] must be called at every episode boundary, after the
/// terminal transition was stored and before the first observation of the
/// next episode is appended. Otherwise frames of the terminated episode leak
/// into the history of the new one.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Element> {
    shape: Shape,
    history: usize,
    frames: Vec<T>,
    cursor: usize,
    filled: usize,
}

impl<T: Element> RingBuffer<T> {
    /// Creates a ring buffer of `history` zero frames of the given shape.
    pub fn new(shape: Shape, history: usize) -> Result<Self, HindsightError> {
        if history == 0 {
            return Err(HindsightError::config("history length must be positive"));
        }
        let frames = vec![T::default(); shape.numel() * history];
        Ok(Self {
            shape,
            history,
            frames,
            cursor: 0,
            filled: 0,
        })
    }

    /// Number of frames in a stacked state.
    pub fn history_length(&self) -> usize {
        self.history
    }

    /// Shape of a single frame.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Copies `obs` into the slot under the cursor and advances the cursor.
    pub fn append(&mut self, obs: &Observation<T>) -> Result<(), HindsightError> {
        self.shape.check(obs.shape())?;
        let numel = self.shape.numel();
        let start = self.cursor * numel;
        self.frames[start..start + numel].copy_from_slice(obs.data());
        self.cursor = (self.cursor + 1) % self.history;
        self.filled = (self.filled + 1).min(self.history);
        Ok(())
    }

    /// Returns the `k` most recent frames, oldest first.
    ///
    /// Before `k` appends since the last reset, the oldest `k - appends`
    /// positions are zero padding (`None`), as in
    /// [`ReplayBuffer::stack_at`](crate::replay_buffer::ReplayBuffer::stack_at).
    pub fn get_stack(&self) -> StackedState<'_, T> {
        let numel = self.shape.numel();
        let n_padding = self.history - self.filled;
        let frames = (0..self.history)
            .map(|h| {
                let slot = (self.cursor + h) % self.history;
                (h >= n_padding).then(|| &self.frames[slot * numel..(slot + 1) * numel])
            })
            .collect();
        StackedState::new(&self.shape, frames)
    }

    /// Zero-fills every slot and moves the cursor back to the start.
    pub fn reset(&mut self) {
        self.frames.iter_mut().for_each(|v| *v = T::default());
        self.cursor = 0;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_buffer::{ReplayBuffer, ReplayBufferConfig};

    fn obs(v: u8) -> Observation<u8> {
        Observation::new(Shape::new(vec![2]).unwrap(), vec![v, v]).unwrap()
    }

    fn ring(k: usize) -> RingBuffer<u8> {
        RingBuffer::new(Shape::new(vec![2]).unwrap(), k).unwrap()
    }

    #[test]
    fn test_zero_history_rejected() {
        let res = RingBuffer::<u8>::new(Shape::new(vec![2]).unwrap(), 0);
        assert!(matches!(res, Err(HindsightError::Configuration(_))));
    }

    #[test]
    fn test_stack_after_reset_is_zero() {
        let mut rb = ring(4);
        rb.append(&obs(7)).unwrap();
        rb.reset();
        let stack = rb.get_stack();
        assert_eq!(stack.history_length(), 4);
        assert_eq!(stack.num_padding(), 4);
        assert_eq!(stack.to_vec(), vec![0; 8]);
    }

    #[test]
    fn test_partial_fill_pads_oldest_positions() {
        for j in 0..4u8 {
            let mut rb = ring(4);
            for v in 1..=j {
                rb.append(&obs(v)).unwrap();
            }
            let stack = rb.get_stack();
            assert_eq!(stack.num_padding(), 4 - j as usize);
            let firsts: Vec<u8> = (0..4).map(|h| stack.frame(h).map_or(0, |f| f[0])).collect();
            let mut expected = vec![0u8; 4 - j as usize];
            expected.extend(1..=j);
            assert_eq!(firsts, expected);
        }
    }

    #[test]
    fn test_padding_matches_replay_buffer() -> anyhow::Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(10)
            .history_length(4)
            .obs_shape(vec![2]);
        for j in 1..=4u8 {
            let mut rb = ring(4);
            let mut replay = ReplayBuffer::<u8>::build(&config)?;
            for v in 1..=j {
                rb.append(&obs(v))?;
                replay.add(&obs(v), 0, 0.0, false)?;
            }
            let live = rb.get_stack();
            let stored = replay.stack_at(j as usize - 1).unwrap();
            assert_eq!(live.num_padding(), 4 - j as usize);
            assert_eq!(live.num_padding(), stored.num_padding());
            for h in 0..4 {
                assert_eq!(live.frame(h), stored.frame(h));
            }
            assert_eq!(live.to_vec(), stored.to_vec());
        }
        Ok(())
    }

    #[test]
    fn test_overwrite_keeps_latest_k_in_order() {
        let mut rb = ring(3);
        for v in 1..=5 {
            rb.append(&obs(v)).unwrap();
        }
        let stack = rb.get_stack();
        // Trailing dimension is the history: [e0h0, e0h1, e0h2, e1h0, ...]
        assert_eq!(stack.to_vec(), vec![3, 4, 5, 3, 4, 5]);
        assert_eq!(stack.shape(), vec![2, 3]);
    }

    #[test]
    fn test_append_shape_mismatch() {
        let mut rb = ring(2);
        let bad = Observation::new(Shape::new(vec![3]).unwrap(), vec![1u8, 2, 3]).unwrap();
        let err = rb.append(&bad).unwrap_err();
        assert_eq!(
            err,
            HindsightError::StateShape {
                expected: vec![2],
                got: vec![3]
            }
        );
    }
}
