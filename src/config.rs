//! 定义了调度器和帧驱动器的可配置参数。
//! Defines configurable parameters for the scheduler and the frame driver.

use std::time::Duration;

/// 包含所有可配置参数的结构体。
///
/// A structure containing all configurable parameters.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// 调度器相关参数。
    /// Scheduler-related parameters.
    pub scheduler: SchedulerConfig,

    /// 帧驱动相关参数。
    /// Frame driver-related parameters.
    pub driver: DriverConfig,
}

/// 调度器相关参数。
///
/// Scheduler-related parameters.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 每次tick复用的ID快照缓冲区的初始容量。
    /// Initial capacity of the id snapshot buffer reused on every tick.
    pub snapshot_capacity: usize,
    /// 注册表的初始容量。
    /// Initial capacity of the registry map.
    pub initial_capacity: usize,
}

/// 帧驱动相关参数。
///
/// Frame driver-related parameters.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// 两帧之间的目标间隔。
    /// Target interval between two frames.
    pub frame_interval: Duration,
    /// 应用于缩放时间的倍率。0 会冻结所有使用缩放时间的定时器。
    /// Multiplier applied to scaled time. 0 freezes every timer that uses
    /// scaled time while unscaled timers keep running.
    pub time_scale: f32,
    /// 单帧增量的上限，避免长时间卡顿后一次性推进过多。
    /// Upper bound on a single frame's delta, so a long hitch does not
    /// advance timers by an unbounded amount.
    pub maximum_delta: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            snapshot_capacity: 500,
            initial_capacity: 64,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_micros(16_667),
            time_scale: 1.0,
            maximum_delta: Duration::from_millis(333),
        }
    }
}
