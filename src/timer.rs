//! 定时器模块
//! Timer Module
//!
//! 该模块定义了单个定时器的状态机、回调、帧时间源以及可序列化的定时器
//! 描述符。定时器本身不会主动推进，由调度器在每帧驱动。
//!
//! This module defines the state machine of a single timer, its callback, the
//! per-frame time source and the serializable timer descriptors. A timer never
//! advances by itself; the scheduler drives it once per frame.

mod action;
mod descriptor;
mod entry;
mod frame;


pub use action::Action;
pub use descriptor::{Descriptor, EventBindings, TimerSet};
pub use entry::{INFINITE_LOOPS, NO_TIMER, Timer, TimerId, compare_frequency};
pub use frame::FrameTime;
