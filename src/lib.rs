#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the frame-driven timers library.
//! 帧驱动定时器库的根。
//!
//! 定时器由所有者注册，在每帧调用 [`Scheduler::tick`] 时推进，完成所有循环
//! 或所有者失效后自动移除。
//!
//! Timers are registered on behalf of an owner, advance whenever
//! [`Scheduler::tick`] is called once per frame, and are removed automatically
//! once every loop completed or the owner went away.

pub mod config;
pub mod driver;
pub mod error;
pub mod owner;
pub mod scheduler;
pub mod timer;

pub use config::Config;
pub use driver::{FrameClock, FrameDriver};
pub use error::{Error, RegistrationError, Result};
pub use owner::{Lifeline, Liveness, OwnerHandle, OwnerKey};
pub use scheduler::{Scheduler, SchedulerStats, TimerOptions, global};
pub use timer::{
    Action, Descriptor, EventBindings, FrameTime, INFINITE_LOOPS, NO_TIMER, Timer, TimerId,
    TimerSet, compare_frequency,
};
