//! 定时器条目及其更新状态机
//! Timer entry and its update state machine

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, warn};

use crate::owner::OwnerHandle;
use crate::timer::action::Action;
use crate::timer::descriptor::{Descriptor, EventBindings};
use crate::timer::frame::FrameTime;

/// 定时器ID，在进程内单调递增且不会复用
/// Timer ID, monotonically increasing within the process and never reused
pub type TimerId = u64;

/// 表示“没有创建定时器”的哨兵ID
/// Sentinel ID meaning "no timer was created"
pub const NO_TIMER: TimerId = 0;

/// 表示无限循环的保留循环次数
/// Reserved loop count meaning "loop forever"
pub const INFINITE_LOOPS: u32 = u32::MAX;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

fn next_timer_id() -> TimerId {
    NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed)
}

/// 一个定时器
/// A timer
///
/// 定时器只在被告知时推进：由调度器在每帧调用，或者在独立使用时由调用方
/// 调用 [`Timer::update`]。
///
/// A timer only advances when told to: by the scheduler once per frame, or by
/// the caller through [`Timer::update`] when used standalone.
///
/// # 状态 / States
/// - Accruing: 尚未完成所有循环 / has not completed all loops yet
/// - Completed: 有限循环且全部完成 / finite and every loop done
/// - Infinite: 永不自行完成 / never completes on its own
#[derive(Debug, Clone)]
pub struct Timer {
    id: TimerId,
    interval: f32,
    loops_count: u32,
    current_loops_count: u32,
    /// 总已用时间，以 f64 累加
    /// Total elapsed time, accumulated in f64
    elapsed_time: f64,
    /// 尚未结算到循环中的时间，每次触发减去一个间隔
    /// Time not yet settled into a cycle; one interval is taken off per firing
    cycle_progress: f64,
    current_cycle_elapsed_time: f32,
    unscaled_time: bool,
    paused: bool,
    owner: Option<OwnerHandle>,
    action: Option<Action>,
}

impl Timer {
    /// 创建新的定时器
    /// Create new timer
    ///
    /// 负的间隔被钳制为 0，循环次数至少为 1。缺少所有者是误用：记录错误日志并
    /// 返回一个永远不会被注册的惰性定时器。
    ///
    /// A negative interval is clamped to 0 and the loop count to at least 1.
    /// A missing owner is a misuse: it is logged and an inert timer that will
    /// never be registered is returned.
    pub fn new(
        owner: impl Into<Option<OwnerHandle>>,
        interval: f32,
        loops_count: u32,
        unscaled_time: bool,
        action: impl Into<Option<Action>>,
    ) -> Self {
        let Some(owner) = owner.into() else {
            error!("timer requires a valid owner, got none");
            return Self::inert();
        };

        Self {
            id: next_timer_id(),
            interval: interval.max(0.0),
            loops_count: loops_count.max(1),
            current_loops_count: 0,
            elapsed_time: 0.0,
            cycle_progress: 0.0,
            current_cycle_elapsed_time: 0.0,
            unscaled_time,
            paused: false,
            owner: Some(owner),
            action: action.into(),
        }
    }

    /// 根据描述符和事件绑定创建定时器
    /// Create a timer from a descriptor and its event bindings
    pub fn from_descriptor(
        owner: impl Into<Option<OwnerHandle>>,
        descriptor: &Descriptor,
        bindings: &EventBindings,
    ) -> Self {
        let action = bindings.resolve(descriptor);
        if action.is_none() {
            warn!(event = ?descriptor.event, "timer descriptor event has no binding");
        }

        Self::new(
            owner,
            descriptor.interval,
            descriptor.effective_loops_count(),
            descriptor.unscaled_time,
            action,
        )
    }

    fn inert() -> Self {
        Self {
            id: next_timer_id(),
            interval: 0.0,
            loops_count: 1,
            current_loops_count: 0,
            elapsed_time: 0.0,
            cycle_progress: 0.0,
            current_cycle_elapsed_time: 0.0,
            unscaled_time: false,
            paused: false,
            owner: None,
            action: None,
        }
    }

    /// 推进一帧，如果本帧完成了一个循环则返回 `true`
    /// Advance one frame, returning `true` if a cycle completed this frame
    ///
    /// 不调用回调；调度器在释放注册表借用之后再调用它。
    /// Does not invoke the callback; the scheduler does that after releasing
    /// its registry borrow.
    pub(crate) fn advance(&mut self, frame: &FrameTime) -> bool {
        if self.paused || !self.is_owner_alive() {
            return false;
        }

        if self.action.is_none() || self.interval < 0.0 {
            self.interval = 0.0;
            return false;
        }

        let total = self.total_span();
        let interval = f64::from(self.interval);
        if !self.is_infinite() && self.current_loops_count >= self.loops_count {
            self.elapsed_time = total;
            self.cycle_progress = 0.0;
            self.current_cycle_elapsed_time = self.interval;
            return false;
        }

        let delta = f64::from(frame.select(self.unscaled_time).max(0.0));
        self.elapsed_time += delta;
        self.cycle_progress += delta;
        if !self.is_infinite() {
            self.elapsed_time = self.elapsed_time.min(total);
            let owed = total - f64::from(self.current_loops_count) * interval;
            self.cycle_progress = self.cycle_progress.min(owed);
        }

        self.current_cycle_elapsed_time = self.cycle_progress.min(interval) as f32;

        // 有限定时器到达总时长时，剩余的循环必须依次触发，即使浮点误差让
        // 本循环的已用时间略小于间隔。
        // Once a finite timer reached its total span its owed cycles must still
        // fire, even if rounding left the cycle time just short of the interval.
        let span_reached = !self.is_infinite() && self.elapsed_time >= total;
        if self.cycle_progress >= interval || span_reached {
            // 超出的时间留给下一个循环，每次更新最多触发一次
            // Excess time carries into the next cycle; at most one firing per update
            self.cycle_progress = (self.cycle_progress - interval).max(0.0);
            self.current_loops_count = self.current_loops_count.saturating_add(1);
            self.current_cycle_elapsed_time = 0.0;
            return true;
        }

        false
    }

    /// 推进一帧并在完成循环时调用回调
    /// Advance one frame and invoke the callback when a cycle completes
    pub fn update(&mut self, frame: &FrameTime) -> bool {
        let fired = self.advance(frame);
        if fired {
            if let Some(action) = &self.action {
                action.invoke();
            }
        }
        fired
    }

    fn total_span(&self) -> f64 {
        f64::from(self.interval) * f64::from(self.loops_count)
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// 所有者句柄（使用空所有者构造时为 `None`）
    /// Owner handle (`None` when constructed with a null owner)
    pub fn owner(&self) -> Option<&OwnerHandle> {
        self.owner.as_ref()
    }

    pub fn is_owner_alive(&self) -> bool {
        self.owner.as_ref().is_some_and(OwnerHandle::is_alive)
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// 总循环次数（无限循环时为 `INFINITE_LOOPS`）
    /// Total loops count (`INFINITE_LOOPS` when looping forever)
    pub fn loops_count(&self) -> u32 {
        self.loops_count
    }

    pub fn is_infinite(&self) -> bool {
        self.loops_count == INFINITE_LOOPS
    }

    /// 已完成的循环次数
    /// How many loops were completed
    pub fn current_loops_count(&self) -> u32 {
        self.current_loops_count
    }

    /// 距离完成还剩多少循环
    /// How many loops remain until completion
    pub fn remaining_loops_count(&self) -> u32 {
        self.loops_count.saturating_sub(self.current_loops_count)
    }

    /// 总时长（无限循环时为 `f32::INFINITY`）
    /// Total duration (`f32::INFINITY` when looping forever)
    pub fn duration(&self) -> f32 {
        if self.is_infinite() {
            f32::INFINITY
        } else {
            self.total_span() as f32
        }
    }

    /// 总剩余时间
    /// Total remaining time
    pub fn remaining_time(&self) -> f32 {
        if self.is_infinite() && self.interval > 0.0 {
            f32::INFINITY
        } else {
            (self.total_span() - self.elapsed_time).max(0.0) as f32
        }
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time as f32
    }

    /// 当前循环内已经过的时间
    /// Elapsed time in the current loop
    pub fn current_cycle_elapsed_time(&self) -> f32 {
        self.current_cycle_elapsed_time
    }

    /// 当前循环内的剩余时间
    /// Remaining time in the current loop
    pub fn current_cycle_remaining_time(&self) -> f32 {
        (self.interval - self.current_cycle_elapsed_time).max(0.0)
    }

    pub fn uses_unscaled_time(&self) -> bool {
        self.unscaled_time
    }

    /// 此定时器是否可以被移除
    /// Whether this timer is ok to be removed
    ///
    /// 有限定时器只有在所有循环都触发后才会被移除，即使总时长已经用完。
    /// A finite timer is only removed once every loop fired, even when its
    /// total span has already elapsed.
    pub fn should_clear(&self) -> bool {
        self.action.is_none()
            || !self.is_owner_alive()
            || (!self.is_infinite() && self.current_loops_count >= self.loops_count)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// 按调用频率比较两个定时器
/// Compare two timers by call frequency
///
/// 间隔更小的定时器调用更频繁，返回 `Greater`。存在的定时器总是优先于缺失的
/// 定时器；两者都缺失时相等。这不是身份比较。
///
/// The timer with the smaller interval is called more often and compares as
/// `Greater`. A present timer always wins over a missing one; two missing
/// timers are equal. This is not an identity comparison.
///
/// Sorting most frequent first: `timers.sort_by(|a, b| compare_frequency(Some(b), Some(a)))`.
pub fn compare_frequency(a: Option<&Timer>, b: Option<&Timer>) -> CmpOrdering {
    match (a, b) {
        (Some(a), Some(b)) => b.interval.total_cmp(&a.interval),
        (Some(_), None) => CmpOrdering::Greater,
        (None, Some(_)) => CmpOrdering::Less,
        (None, None) => CmpOrdering::Equal,
    }
}
