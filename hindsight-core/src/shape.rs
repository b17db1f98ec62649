//! Shape descriptors and observations.
use crate::error::HindsightError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Scalar type of observation elements.
///
/// Image frames are typically `u8`, feature vectors `f32`.
pub trait Element: Copy + Default + PartialEq + Debug + 'static {}

impl<T> Element for T where T: Copy + Default + PartialEq + Debug + 'static {}

/// Shape of an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Creates a shape, rejecting empty shapes and zero-sized dimensions.
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self, HindsightError> {
        let dims = dims.into();
        if dims.is_empty() || dims.contains(&0) {
            return Err(HindsightError::config(format!(
                "shape must be non-empty with positive dimensions, got {:?}",
                dims
            )));
        }
        Ok(Self(dims))
    }

    /// Dimensions of the shape.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Shape of `k` stacked frames, with the history as the trailing dimension.
    pub fn stacked(&self, k: usize) -> Vec<usize> {
        let mut dims = self.0.clone();
        dims.push(k);
        dims
    }

    /// Shape of a batch of `batch_size` stacked states.
    pub fn batched(&self, batch_size: usize, k: usize) -> Vec<usize> {
        let mut dims = vec![batch_size];
        dims.extend(self.stacked(k));
        dims
    }

    /// Fails with [`HindsightError::StateShape`] unless `other` equals this shape.
    pub fn check(&self, other: &Shape) -> Result<(), HindsightError> {
        if self == other {
            Ok(())
        } else {
            Err(HindsightError::StateShape {
                expected: self.0.clone(),
                got: other.0.clone(),
            })
        }
    }
}

/// A single raw observation of an environment.
///
/// Observations are immutable once created; buffers copy the data in.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T: Element> {
    shape: Shape,
    data: Vec<T>,
}

impl<T: Element> Observation<T> {
    /// Creates an observation, checking that `data` fills `shape` exactly.
    pub fn new(shape: Shape, data: Vec<T>) -> Result<Self, HindsightError> {
        if data.len() != shape.numel() {
            return Err(HindsightError::StateShape {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self { shape, data })
    }

    /// An observation filled with `T::default()`.
    pub fn zeros(shape: Shape) -> Self {
        let data = vec![T::default(); shape.numel()];
        Self { shape, data }
    }

    /// Shape of the observation.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Flat row-major data.
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_rejects_zero_dims() {
        assert!(Shape::new(vec![]).is_err());
        assert!(Shape::new(vec![84, 0]).is_err());
        assert_eq!(Shape::new(vec![84, 84]).unwrap().numel(), 84 * 84);
    }

    #[test]
    fn test_stacked_and_batched_dims() {
        let shape = Shape::new(vec![3, 2]).unwrap();
        assert_eq!(shape.stacked(4), vec![3, 2, 4]);
        assert_eq!(shape.batched(8, 4), vec![8, 3, 2, 4]);
    }

    #[test]
    fn test_observation_length_mismatch() {
        let shape = Shape::new(vec![2, 2]).unwrap();
        let err = Observation::new(shape, vec![1u8, 2, 3]).unwrap_err();
        assert!(matches!(err, HindsightError::StateShape { .. }));
    }
}
