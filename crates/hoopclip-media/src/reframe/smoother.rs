//! Weighted sliding-window smoothing of subject positions.

use std::collections::VecDeque;

use hoopclip_models::{Point2D, SmoothedPosition, SubjectObservation};

/// Oldest and newest weights of the linear ramp.
const OLDEST_WEIGHT: f64 = 0.5;
const NEWEST_WEIGHT: f64 = 1.0;

/// Weighted moving average over the last `capacity` positions.
///
/// Weights increase linearly from 0.5 for the oldest retained sample to 1.0
/// for the newest, so recent motion dominates while single-frame outliers
/// are damped. Memory is bounded by the capacity.
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    history: VecDeque<Point2D>,
    capacity: usize,
}

impl PositionSmoother {
    /// Create a smoother holding at most `capacity` positions (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of retained positions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of positions currently retained.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True before the first push.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Add an observation and return the smoothed position at its time.
    pub fn push(&mut self, observation: &SubjectObservation) -> SmoothedPosition {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(observation.position);

        SmoothedPosition::new(observation.time, self.weighted_mean())
    }

    fn weighted_mean(&self) -> Point2D {
        let n = self.history.len();
        let (mut sum_x, mut sum_y, mut total) = (0.0, 0.0, 0.0);
        for (i, p) in self.history.iter().enumerate() {
            let w = ramp_weight(i, n);
            sum_x += w * p.x as f64;
            sum_y += w * p.y as f64;
            total += w;
        }
        Point2D::new((sum_x / total).round() as i32, (sum_y / total).round() as i32)
    }
}

/// Weight of the `i`-th of `n` samples, oldest first.
fn ramp_weight(i: usize, n: usize) -> f64 {
    if n <= 1 {
        return NEWEST_WEIGHT;
    }
    OLDEST_WEIGHT + (NEWEST_WEIGHT - OLDEST_WEIGHT) * i as f64 / (n - 1) as f64
}
