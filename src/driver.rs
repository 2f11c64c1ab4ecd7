//! 基于 tokio 的帧驱动器
//! Frame driver built on tokio
//!
//! 没有自带帧循环的宿主可以用 `FrameDriver` 以固定间隔调用
//! [`Scheduler::tick`]。`FrameClock` 负责测量真实的帧间隔、应用时间缩放并
//! 钳制过长的帧。
//!
//! Hosts without their own frame loop can use `FrameDriver` to call
//! [`Scheduler::tick`] at a fixed interval. `FrameClock` measures the real
//! frame spacing, applies the time scale and clamps overly long frames.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::config::DriverConfig;
use crate::scheduler::Scheduler;
use crate::timer::FrameTime;

/// 帧时钟
/// Frame clock
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    time_scale: f32,
    maximum_delta: Duration,
}

impl FrameClock {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            last: None,
            time_scale: config.time_scale.max(0.0),
            maximum_delta: config.maximum_delta,
        }
    }

    /// 设置时间缩放，负值被钳制为 0
    /// Set the time scale; negative values are clamped to 0
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// 忘记上一帧的时间点，下一帧的增量为 0
    /// Forget the previous frame instant; the next frame has a zero delta
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// 测量自上一帧以来的时间并生成帧时间
    /// Measure the time since the previous frame and build the frame time
    pub fn frame(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = self
            .last
            .replace(now)
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));

        FrameTime::from_duration(elapsed.min(self.maximum_delta), self.time_scale)
    }
}

/// 帧驱动器
/// Frame driver
#[derive(Debug)]
pub struct FrameDriver {
    scheduler: Scheduler,
    clock: FrameClock,
    frame_interval: Duration,
    interval: Option<Interval>,
    frames: u64,
}

impl FrameDriver {
    /// 创建新的帧驱动器
    /// Create new frame driver
    pub fn new(scheduler: Scheduler, config: &DriverConfig) -> Self {
        Self {
            scheduler,
            clock: FrameClock::new(config),
            // tokio 的 interval 不接受零周期
            // tokio intervals reject a zero period
            frame_interval: config.frame_interval.max(Duration::from_millis(1)),
            interval: None,
            frames: 0,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// 已驱动的帧数
    /// Number of frames driven so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 立即驱动一帧，不等待
    /// Drive one frame right away without waiting
    pub fn step(&mut self) -> FrameTime {
        let frame = self.clock.frame();
        self.scheduler.tick(&frame);
        self.frames += 1;
        trace!(
            frame = self.frames,
            delta = frame.delta,
            unscaled_delta = frame.unscaled_delta,
            "Frame driven"
        );
        frame
    }

    async fn next_frame(&mut self) {
        let period = self.frame_interval;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }

    /// 按帧间隔驱动 `count` 帧
    /// Drive `count` frames at the frame interval
    pub async fn run_frames(&mut self, count: u64) {
        for _ in 0..count {
            self.next_frame().await;
            self.step();
        }
    }

    /// 持续驱动帧直到 `stop` 完成，返回本次驱动的帧数
    /// Keep driving frames until `stop` completes, returning how many frames ran
    pub async fn run_until<F>(&mut self, stop: F) -> u64
    where
        F: Future<Output = ()>,
    {
        debug!(frame_interval = ?self.frame_interval, "Frame driver started");
        let start = self.frames;
        tokio::pin!(stop);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = self.next_frame() => {
                    self.step();
                }
            }
        }

        let driven = self.frames - start;
        debug!(frames = driven, "Frame driver stopped");
        driven
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::Lifeline;
    use crate::scheduler::TimerOptions;
    use crate::timer::Action;
    use std::cell::Cell;
    use std::rc::Rc;

    fn config(frame_ms: u64) -> DriverConfig {
        DriverConfig {
            frame_interval: Duration::from_millis(frame_ms),
            ..DriverConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_frame_has_zero_delta() {
        let mut clock = FrameClock::new(&DriverConfig {
            maximum_delta: Duration::from_secs(1),
            ..config(250)
        });
        assert_eq!(clock.frame().delta, 0.0);

        tokio::time::advance(Duration::from_millis(500)).await;
        let frame = clock.frame();
        assert_eq!(frame.delta, 0.5);
        assert_eq!(frame.unscaled_delta, 0.5);

        clock.reset();
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(clock.frame().delta, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_frames_are_clamped() {
        let mut clock = FrameClock::new(&DriverConfig {
            maximum_delta: Duration::from_millis(250),
            ..DriverConfig::default()
        });
        clock.frame();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(clock.frame().unscaled_delta, 0.25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_scale_applies_to_scaled_delta() {
        let mut clock = FrameClock::new(&config(250));
        clock.set_time_scale(2.0);
        clock.frame();

        tokio::time::advance(Duration::from_millis(100)).await;
        let frame = clock.frame();
        assert_eq!(frame.unscaled_delta, 0.1);
        assert_eq!(frame.delta, 0.2);

        clock.set_time_scale(-3.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_fires_one_shot_after_interval() {
        let scheduler = Scheduler::default();
        let lifeline = Lifeline::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);

        scheduler.register_once(
            lifeline.handle(),
            1.0,
            Action::new(move || counter.set(counter.get() + 1)),
            TimerOptions::default(),
        );

        let mut driver = FrameDriver::new(scheduler.clone(), &config(250));
        // 第一帧增量为 0，之后每帧 0.25 秒
        // The first frame has a zero delta, then 0.25s per frame
        driver.run_frames(4).await;
        assert_eq!(count.get(), 0);

        driver.run_frames(1).await;
        assert_eq!(count.get(), 1);
        assert_eq!(driver.frames(), 5);
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_stops_on_signal() {
        let mut driver = FrameDriver::new(Scheduler::default(), &config(100));
        let frames = driver
            .run_until(tokio::time::sleep(Duration::from_millis(1_050)))
            .await;

        assert!(frames >= 10);
        assert_eq!(driver.scheduler().stats().ticks, frames);
    }

    #[test]
    fn test_step_without_runtime() {
        let config = crate::config::Config::default();
        let scheduler = Scheduler::new(config.scheduler.clone());
        let mut driver = FrameDriver::new(scheduler, &config.driver);
        assert_eq!(driver.clock().time_scale(), 1.0);

        let frame = driver.step();

        assert_eq!(frame.delta, 0.0);
        assert_eq!(driver.frames(), 1);
    }
}
