//! 单帧时间增量
//! Per-frame time deltas

use std::time::Duration;

/// 一帧的时间源：缩放增量和未缩放增量（秒）
/// Time source for one frame: scaled and unscaled deltas, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// 经过应用时间缩放的增量
    /// Delta after the application time scale was applied
    pub delta: f32,
    /// 真实时间增量
    /// Real-time delta
    pub unscaled_delta: f32,
}

impl FrameTime {
    pub fn new(unscaled_delta: f32, time_scale: f32) -> Self {
        let unscaled_delta = unscaled_delta.max(0.0);
        Self {
            delta: unscaled_delta * time_scale.max(0.0),
            unscaled_delta,
        }
    }

    /// 缩放倍率为 1 的帧
    /// Frame with a time scale of 1
    pub fn uniform(delta: f32) -> Self {
        Self::new(delta, 1.0)
    }

    pub fn from_duration(unscaled: Duration, time_scale: f32) -> Self {
        Self::new(unscaled.as_secs_f32(), time_scale)
    }

    /// 按定时器的时间源标志选择增量
    /// Pick the delta matching a timer's time-source flag
    pub fn select(&self, unscaled_time: bool) -> f32 {
        if unscaled_time {
            self.unscaled_delta
        } else {
            self.delta
        }
    }
}
