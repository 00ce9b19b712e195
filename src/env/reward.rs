use serde::{Deserialize, Serialize};

/// Negative weighted sum of queued vehicles and lane delay.
///
/// Lane delay is `1 - mean_speed / max_speed`, zero for lanes without a
/// speed limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueDelayReward {
    pub alpha: f32,
    pub beta: f32,
}

impl Default for QueueDelayReward {
    fn default() -> Self {
        QueueDelayReward {
            alpha: 1.0,
            beta: 0.25,
        }
    }
}

impl QueueDelayReward {
    pub fn new(alpha: f32, beta: f32) -> Self {
        QueueDelayReward { alpha, beta }
    }

    pub fn lane_delay(mean_speed: f32, max_speed: f32) -> f32 {
        if max_speed > 0.0 {
            1.0 - mean_speed / max_speed
        } else {
            0.0
        }
    }

    pub fn reward(&self, total_queue: f32, total_delay: f32) -> f32 {
        -(self.alpha * total_queue + self.beta * total_delay)
    }
}
