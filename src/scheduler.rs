//! 帧驱动的定时器调度器
//! Frame-driven timer scheduler
//!
//! 调度器拥有所有已注册的定时器，每帧推进一次，在定时器完成或其所有者失效时
//! 将其移除，并提供按ID、回调或所有者进行查询和取消的接口。
//!
//! The scheduler owns every registered timer, advances them once per frame,
//! drops them once they complete or their owner goes away, and offers queries
//! and cancellation by id, callback or owner.

mod global;
mod registry;
mod stats;


pub use global::global;
pub use registry::{BatchRegistration, Scheduler, TimerIter, TimerOptions};
pub use stats::SchedulerStats;
