//! Step-dependent schedules for exploration rate and learning rate.
use crate::error::HindsightError;
use serde::{Deserialize, Serialize};

/// A pure function of the training step.
///
/// Implemented by [`Schedule`] and by any `Fn(usize) -> f64`, so closures can
/// be plugged in wherever a schedule is expected.
pub trait ScheduleFn {
    /// Value at `step`.
    fn value(&self, step: usize) -> f64;
}

impl<F> ScheduleFn for F
where
    F: Fn(usize) -> f64,
{
    fn value(&self, step: usize) -> f64 {
        self(step)
    }
}

/// Type-erased schedule held by the trainers.
///
/// `Box<dyn Fn(usize) -> f64>` is itself a [`ScheduleFn`], so a configured
/// [`Schedule`] and a user closure share this representation.
pub type BoxedSchedule = Box<dyn Fn(usize) -> f64>;

/// Erases the concrete type of a schedule.
pub fn boxed<S: ScheduleFn + 'static>(schedule: S) -> BoxedSchedule {
    Box::new(move |step| schedule.value(step))
}

/// Serializable schedules.
///
/// # Examples
///
/// ```rust
/// use hindsight_core::schedule::{Schedule, ScheduleFn};
///
/// // Exploration decaying from 1.0 to 0.1 over the first 1e6 steps,
/// // then to 0.01 by step 5e6.
/// let eps = Schedule::PiecewiseLinear {
///     endpoints: vec![(0, 1.0), (1_000_000, 0.1), (5_000_000, 0.01)],
///     outside_value: None,
/// };
/// assert!((eps.value(500_000) - 0.55).abs() < 1e-12);
/// assert_eq!(eps.value(10_000_000), 0.01);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum Schedule {
    /// The same value at every step.
    Constant(f64),

    /// Linear interpolation from `start` to `end` over `steps`, `end` afterwards.
    Linear {
        /// Value at step 0.
        start: f64,

        /// Value from `steps` on.
        end: f64,

        /// Length of the ramp.
        steps: usize,
    },

    /// Linear interpolation between consecutive `(step, value)` endpoints.
    PiecewiseLinear {
        /// Endpoints sorted by step.
        endpoints: Vec<(usize, f64)>,

        /// Value outside the covered range. When `None`, steps before the
        /// first endpoint take its value and steps after the last take the
        /// last endpoint value.
        outside_value: Option<f64>,
    },
}

impl Schedule {
    /// Linear interpolation between `l` and `r` with weight `alpha` on `r`.
    fn lerp(l: f64, r: f64, alpha: f64) -> f64 {
        l + alpha * (r - l)
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), HindsightError> {
        match self {
            Self::Constant(v) if !v.is_finite() => {
                Err(HindsightError::config(format!("non-finite constant {}", v)))
            }
            Self::Linear { steps: 0, .. } => {
                Err(HindsightError::config("linear schedule needs steps > 0"))
            }
            Self::PiecewiseLinear { endpoints, .. } if endpoints.is_empty() => {
                Err(HindsightError::config("piecewise schedule needs endpoints"))
            }
            Self::PiecewiseLinear { endpoints, .. }
                if endpoints.windows(2).any(|w| w[0].0 >= w[1].0) =>
            {
                Err(HindsightError::config(
                    "piecewise endpoints must be strictly increasing in step",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Checks that every value the schedule can produce lies in `[0, 1]`.
    pub fn validate_probability(&self) -> Result<(), HindsightError> {
        self.validate()?;
        let values: Vec<f64> = match self {
            Self::Constant(v) => vec![*v],
            Self::Linear { start, end, .. } => vec![*start, *end],
            Self::PiecewiseLinear {
                endpoints,
                outside_value,
            } => endpoints
                .iter()
                .map(|(_, v)| *v)
                .chain(outside_value.iter().copied())
                .collect(),
        };
        match values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            Some(v) => Err(HindsightError::config(format!(
                "probability schedule produces {}",
                v
            ))),
            None => Ok(()),
        }
    }
}

impl ScheduleFn for Schedule {
    fn value(&self, step: usize) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Linear { start, end, steps } => {
                let alpha = (step as f64 / *steps as f64).min(1.0);
                Self::lerp(*start, *end, alpha)
            }
            Self::PiecewiseLinear {
                endpoints,
                outside_value,
            } => {
                for w in endpoints.windows(2) {
                    let ((l_t, l), (r_t, r)) = (w[0], w[1]);
                    if l_t <= step && step < r_t {
                        let alpha = (step - l_t) as f64 / (r_t - l_t) as f64;
                        return Self::lerp(l, r, alpha);
                    }
                }
                match (outside_value, endpoints.first(), endpoints.last()) {
                    (Some(v), _, _) => *v,
                    (None, Some((t, v)), _) if step < *t => *v,
                    (None, _, Some((_, v))) => *v,
                    (None, _, None) => 0.0,
                }
            }
        }
    }
}

impl From<f64> for Schedule {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let s = Schedule::Linear {
            start: 1.0,
            end: 0.0,
            steps: 10,
        };
        assert_eq!(s.value(0), 1.0);
        assert_eq!(s.value(5), 0.5);
        assert_eq!(s.value(10), 0.0);
        assert_eq!(s.value(1000), 0.0);
    }

    #[test]
    fn test_piecewise_linear() {
        let s = Schedule::PiecewiseLinear {
            endpoints: vec![(0, 1.0), (100, 0.1), (200, 0.0)],
            outside_value: Some(0.05),
        };
        assert_eq!(s.value(0), 1.0);
        assert!((s.value(50) - 0.55).abs() < 1e-12);
        assert!((s.value(150) - 0.05).abs() < 1e-12);
        assert_eq!(s.value(200), 0.05);

        let s = Schedule::PiecewiseLinear {
            endpoints: vec![(10, 0.5), (20, 0.1)],
            outside_value: None,
        };
        assert_eq!(s.value(30), 0.1);
        assert_eq!(s.value(20), 0.1);
        // Before the first endpoint the schedule holds its first value.
        assert_eq!(s.value(0), 0.5);
        assert_eq!(s.value(9), 0.5);
        assert!((s.value(15) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_boxed_keeps_values() {
        let s = boxed(Schedule::Linear {
            start: 1.0,
            end: 0.0,
            steps: 10,
        });
        assert_eq!(s.value(5), 0.5);
        let c = boxed(|step: usize| step as f64 * 2.0);
        assert_eq!(c.value(3), 6.0);
    }

    #[test]
    fn test_validate() {
        assert!(Schedule::Constant(3e-4).validate().is_ok());
        assert!(Schedule::Linear {
            start: 1.0,
            end: 0.1,
            steps: 0
        }
        .validate()
        .is_err());
        assert!(Schedule::PiecewiseLinear {
            endpoints: vec![(10, 1.0), (5, 0.5)],
            outside_value: None
        }
        .validate()
        .is_err());
        assert!(Schedule::Constant(1.5).validate_probability().is_err());
        assert!(Schedule::Linear {
            start: 1.0,
            end: 0.02,
            steps: 100
        }
        .validate_probability()
        .is_ok());
    }

    #[test]
    fn test_closure_schedule() {
        let lr = |step: usize| 1e-3 / (1.0 + step as f64);
        assert_eq!(lr.value(0), 1e-3);
        assert_eq!(ScheduleFn::value(&Schedule::from(0.5), 42), 0.5);
    }
}
