//! 定时器注册表与tick驱动
//! Timer registry and tick driver
//!
//! 注册表按ID保存所有活跃的定时器。每次tick先把当前ID快照到一个复用的缓冲区，
//! 然后逐个推进仍然存在的定时器。回调总是在释放注册表借用之后调用，因此回调
//! 可以自由地注册或取消定时器：新注册的定时器从下一次tick开始推进，被取消的
//! 定时器会在本次tick中被直接跳过。
//!
//! The registry keeps every active timer keyed by id. Each tick first snapshots
//! the current ids into a reused buffer, then advances every timer that is
//! still present. Callbacks always run after the registry borrow is released,
//! so a callback may freely register or cancel timers: new registrations start
//! advancing on the next tick, cancelled timers are skipped within this one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::SchedulerConfig;
use crate::error::RegistrationError;
use crate::owner::OwnerHandle;
use crate::scheduler::stats::SchedulerStats;
use crate::timer::{
    Action, Descriptor, EventBindings, FrameTime, INFINITE_LOOPS, NO_TIMER, Timer, TimerId,
};

/// 注册选项
/// Registration options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerOptions {
    /// 使用未缩放（真实）时间，默认 `false`
    /// Use unscaled (real) time, `false` by default
    pub unscaled_time: bool,
    /// 移除指向同一回调的旧定时器，默认 `true`
    /// Remove older timers pointing at the same callback, `true` by default
    pub override_old: bool,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            unscaled_time: false,
            override_old: true,
        }
    }
}

impl TimerOptions {
    pub fn unscaled(mut self) -> Self {
        self.unscaled_time = true;
        self
    }

    /// 保留指向同一回调的旧定时器
    /// Keep older timers that point at the same callback
    pub fn keep_old(mut self) -> Self {
        self.override_old = false;
        self
    }
}

struct Registry {
    timers: HashMap<TimerId, Timer>,
    /// 每次tick复用的ID快照缓冲区
    /// Id snapshot buffer reused on every tick
    snapshot: Vec<TimerId>,
    /// 全局暂停标志，由宿主环境设置
    /// Global pause flag, set by the host environment
    suspended: bool,
    stats: SchedulerStats,
}

impl Registry {
    /// 移除所有满足条件的定时器并返回它们，调用方在释放借用后再丢弃
    /// Remove every matching timer and hand them back so the caller can drop
    /// them after releasing the borrow
    fn cancel_where(&mut self, mut predicate: impl FnMut(&Timer) -> bool) -> Vec<Timer> {
        let ids: Vec<TimerId> = self
            .timers
            .iter()
            .filter_map(|(id, timer)| predicate(timer).then_some(*id))
            .collect();

        let removed: Vec<Timer> = ids.iter().filter_map(|id| self.timers.remove(id)).collect();
        self.stats.cancelled += removed.len() as u64;
        removed
    }
}

fn validate(timer: &Timer) -> Result<(), RegistrationError> {
    if timer.owner().is_none() {
        return Err(RegistrationError::MissingOwner);
    }
    if timer.action().is_none() {
        return Err(RegistrationError::MissingCallback);
    }
    if timer.interval() <= 0.0 {
        return Err(RegistrationError::NonPositiveInterval(timer.interval()));
    }
    if timer.loops_count() == 0 {
        return Err(RegistrationError::ZeroLoops);
    }
    Ok(())
}

/// 定时器调度器
/// Timer scheduler
///
/// 调度器是一个廉价可克隆的单线程句柄，所有克隆共享同一个注册表。宿主环境每帧
/// 调用一次 [`Scheduler::tick`]。
///
/// The scheduler is a cheap-to-clone single-threaded handle; every clone
/// shares the same registry. The host environment calls [`Scheduler::tick`]
/// once per frame.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Registry>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(registry) => f
                .debug_struct("Scheduler")
                .field("timers", &registry.timers.len())
                .field("suspended", &registry.suspended)
                .finish(),
            Err(_) => f.debug_struct("Scheduler").finish_non_exhaustive(),
        }
    }
}

impl Scheduler {
    /// 创建新的调度器
    /// Create new scheduler
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                timers: HashMap::with_capacity(config.initial_capacity),
                snapshot: Vec::with_capacity(config.snapshot_capacity),
                suspended: false,
                stats: SchedulerStats::default(),
            })),
        }
    }

    // ─── Registration ──────────────────────────────────────────────────────

    /// 注册定时器，返回拒绝原因而不是哨兵ID
    /// Register a timer, returning the rejection reason instead of a sentinel id
    ///
    /// 同ID的旧条目总是被替换；当 `override_old` 为真时，所有指向同一回调的
    /// 其他条目也会被移除，保证每个回调最多只有一个活跃定时器。
    ///
    /// An existing entry with the same id is always replaced; when
    /// `override_old` is set every other entry pointing at the same callback is
    /// removed too, so at most one timer stays active per callback.
    pub fn try_register_timer(
        &self,
        timer: Timer,
        override_old: bool,
    ) -> Result<TimerId, RegistrationError> {
        let mut guard = self.inner.borrow_mut();
        let registry = &mut *guard;

        if let Err(err) = validate(&timer) {
            registry.stats.rejected += 1;
            return Err(err);
        }

        let id = timer.id();
        let replaced = registry.timers.remove(&id);
        let overridden = match (override_old, timer.action()) {
            (true, Some(action)) => registry.cancel_where(|other| other.action() == Some(action)),
            _ => Vec::new(),
        };

        trace!(
            timer_id = id,
            interval = timer.interval(),
            loops_count = timer.loops_count(),
            unscaled_time = timer.uses_unscaled_time(),
            overridden = overridden.len(),
            "Timer registered"
        );

        registry.timers.insert(id, timer);
        registry.stats.registered += 1;
        drop(guard);
        drop((replaced, overridden));

        Ok(id)
    }

    /// 注册定时器；校验失败时记录警告并返回 `NO_TIMER`
    /// Register a timer; on validation failure logs a warning and returns `NO_TIMER`
    pub fn register_timer(&self, timer: Timer, override_old: bool) -> TimerId {
        let timer_id = timer.id();
        match self.try_register_timer(timer, override_old) {
            Ok(id) => id,
            Err(err) => {
                warn!(timer_id, error = %err, "Timer registration rejected");
                NO_TIMER
            }
        }
    }

    /// 注册循环 `loops_count` 次的定时器
    /// Register a timer that loops `loops_count` times
    pub fn register(
        &self,
        owner: impl Into<Option<OwnerHandle>>,
        interval: f32,
        loops_count: u32,
        action: Action,
        options: TimerOptions,
    ) -> TimerId {
        let timer = Timer::new(
            owner,
            interval,
            loops_count.max(1),
            options.unscaled_time,
            action,
        );
        self.register_timer(timer, options.override_old)
    }

    /// 注册只触发一次的定时器
    /// Register a timer that fires only once
    pub fn register_once(
        &self,
        owner: impl Into<Option<OwnerHandle>>,
        interval: f32,
        action: Action,
        options: TimerOptions,
    ) -> TimerId {
        self.register(owner, interval, 1, action, options)
    }

    /// 注册无限循环的定时器
    /// Register an infinitely looping timer
    pub fn register_infinite(
        &self,
        owner: impl Into<Option<OwnerHandle>>,
        interval: f32,
        action: Action,
        options: TimerOptions,
    ) -> TimerId {
        self.register(owner, interval, INFINITE_LOOPS, action, options)
    }

    /// 从描述符批量注册定时器
    /// Batch register timers from descriptors
    ///
    /// 返回一个惰性迭代器：每次推进才注册下一个描述符。不消费迭代器就不会注册
    /// 任何定时器。
    ///
    /// Returns a lazy iterator: each step registers the next descriptor.
    /// Nothing is registered unless the iterator is consumed.
    pub fn register_batch<'a, I>(
        &self,
        owner: impl Into<Option<OwnerHandle>>,
        descriptors: I,
        bindings: &'a EventBindings,
        override_old: bool,
    ) -> BatchRegistration<'a, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<Descriptor>,
    {
        BatchRegistration {
            scheduler: self.clone(),
            owner: owner.into(),
            descriptors: descriptors.into_iter(),
            bindings,
            override_old,
        }
    }

    /// 立即注册一组已经构造好的定时器
    /// Eagerly register a list of already built timers
    pub fn register_timers(
        &self,
        timers: impl IntoIterator<Item = Timer>,
        override_old: bool,
    ) -> Vec<TimerId> {
        timers
            .into_iter()
            .map(|timer| self.register_timer(timer, override_old))
            .collect()
    }

    // ─── Cancellation ──────────────────────────────────────────────────────

    /// 按ID取消定时器，未知ID时不做任何事
    /// Cancel a timer by id; unknown ids are a no-op
    pub fn cancel(&self, id: TimerId) -> bool {
        let removed = {
            let mut registry = self.inner.borrow_mut();
            let removed = registry.timers.remove(&id);
            if removed.is_some() {
                registry.stats.cancelled += 1;
            }
            removed
        };

        if removed.is_some() {
            trace!(timer_id = id, "Timer cancelled");
        }
        removed.is_some()
    }

    /// 移除所有指向该回调的定时器（包括重复项）
    /// Remove every timer pointing at this callback, duplicates included
    pub fn cancel_action(&self, action: &Action) -> usize {
        let removed = self
            .inner
            .borrow_mut()
            .cancel_where(|timer| timer.action() == Some(action));

        if !removed.is_empty() {
            debug!(count = removed.len(), "Cancelled timers by action");
        }
        removed.len()
    }

    /// 移除该所有者的所有定时器
    /// Remove every timer of this owner
    pub fn cancel_owner(&self, owner: &OwnerHandle) -> usize {
        let removed = self
            .inner
            .borrow_mut()
            .cancel_where(|timer| timer.owner().is_some_and(|o| o.same_owner(owner)));

        if !removed.is_empty() {
            debug!(count = removed.len(), owner = owner.key(), "Cancelled timers by owner");
        }
        removed.len()
    }

    pub fn clear(&self) -> usize {
        let removed = self.inner.borrow_mut().cancel_where(|_| true);
        debug!(count = removed.len(), "Cleared all timers");
        removed.len()
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    /// 按ID获取定时器的快照
    /// Get a snapshot of a timer by id
    pub fn get(&self, id: TimerId) -> Option<Timer> {
        self.inner.borrow().timers.get(&id).cloned()
    }

    /// 该所有者的所有定时器
    /// Every timer of this owner
    ///
    /// 匹配的ID在调用时确定，定时器快照在迭代时获取；迭代期间被移除的定时器会被跳过。
    /// Matching ids are fixed at call time and snapshots are taken while
    /// iterating; timers removed in between are skipped.
    pub fn timers_by_owner(&self, owner: &OwnerHandle) -> TimerIter {
        self.matching(|timer| timer.owner().is_some_and(|o| o.same_owner(owner)))
    }

    /// 所有指向该回调的定时器
    /// Every timer pointing at this callback
    pub fn timers_by_action(&self, action: &Action) -> TimerIter {
        self.matching(|timer| timer.action() == Some(action))
    }

    fn matching(&self, predicate: impl Fn(&Timer) -> bool) -> TimerIter {
        let ids: Vec<TimerId> = self
            .inner
            .borrow()
            .timers
            .iter()
            .filter_map(|(id, timer)| predicate(timer).then_some(*id))
            .collect();

        TimerIter {
            scheduler: self.clone(),
            ids: ids.into_iter(),
        }
    }

    fn with_timer<R>(&self, id: TimerId, not_found: R, f: impl FnOnce(&Timer) -> R) -> R {
        self.inner.borrow().timers.get(&id).map_or(not_found, f)
    }

    /// 定时器间隔。未找到时返回 0。
    /// Timer interval. Returns 0 if not found.
    pub fn interval(&self, id: TimerId) -> f32 {
        self.with_timer(id, 0.0, Timer::interval)
    }

    /// 总循环次数（无限循环时为 `INFINITE_LOOPS`）。未找到时返回 0。
    /// Total loops count (`INFINITE_LOOPS` when looping forever). Returns 0 if not found.
    pub fn loops_count(&self, id: TimerId) -> u32 {
        self.with_timer(id, 0, Timer::loops_count)
    }

    /// 已完成的循环次数。未找到时返回 0。
    /// Completed loops. Returns 0 if not found.
    pub fn current_loops_count(&self, id: TimerId) -> u32 {
        self.with_timer(id, 0, Timer::current_loops_count)
    }

    /// 剩余循环次数。未找到时返回 0。
    /// Remaining loops. Returns 0 if not found.
    pub fn remaining_loops_count(&self, id: TimerId) -> u32 {
        self.with_timer(id, 0, Timer::remaining_loops_count)
    }

    /// 总剩余时间。未找到时返回 -1。
    /// Total remaining time. Returns -1 if not found.
    pub fn remaining_time(&self, id: TimerId) -> f32 {
        self.with_timer(id, -1.0, Timer::remaining_time)
    }

    /// 总已用时间。未找到时返回 -1。
    /// Total elapsed time. Returns -1 if not found.
    pub fn elapsed_time(&self, id: TimerId) -> f32 {
        self.with_timer(id, -1.0, Timer::elapsed_time)
    }

    /// 当前循环的已用时间。未找到时返回 -1。
    /// Elapsed time in the current loop. Returns -1 if not found.
    pub fn current_cycle_elapsed_time(&self, id: TimerId) -> f32 {
        self.with_timer(id, -1.0, Timer::current_cycle_elapsed_time)
    }

    /// 当前循环的剩余时间。未找到时返回 -1。
    /// Remaining time in the current loop. Returns -1 if not found.
    pub fn current_cycle_remaining_time(&self, id: TimerId) -> f32 {
        self.with_timer(id, -1.0, Timer::current_cycle_remaining_time)
    }

    /// 总时长（无限循环时为 `f32::INFINITY`）。未找到时返回 0。
    /// Total duration (`f32::INFINITY` when looping forever). Returns 0 if not found.
    pub fn duration(&self, id: TimerId) -> f32 {
        self.with_timer(id, 0.0, Timer::duration)
    }

    /// 定时器是否仍在注册表中。未找到时返回 false。
    /// Whether the timer is still registered. Returns false if not found.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.contains_key(&id)
    }

    /// 定时器是否暂停。未找到时返回 false。
    /// Whether the timer is paused. Returns false if not found.
    pub fn is_paused(&self, id: TimerId) -> bool {
        self.with_timer(id, false, Timer::is_paused)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().timers.is_empty()
    }

    pub fn stats(&self) -> SchedulerStats {
        let registry = self.inner.borrow();
        SchedulerStats {
            active_timers: registry.timers.len(),
            ..registry.stats.clone()
        }
    }

    // ─── Pause control ─────────────────────────────────────────────────────

    /// 暂停/恢复单个定时器，未知ID时不做任何事
    /// Pause / unpause a single timer; unknown ids are a no-op
    pub fn set_paused(&self, id: TimerId, paused: bool) {
        if let Some(timer) = self.inner.borrow_mut().timers.get_mut(&id) {
            timer.set_paused(paused);
        }
    }

    /// 宿主环境的全局暂停钩子：暂停期间tick不做任何事
    /// Host environment hook for application-wide pause: ticks do nothing while set
    pub fn notify_global_pause(&self, paused: bool) {
        let mut registry = self.inner.borrow_mut();
        if registry.suspended != paused {
            debug!(paused, "Global pause changed");
        }
        registry.suspended = paused;
    }

    pub fn is_globally_paused(&self) -> bool {
        self.inner.borrow().suspended
    }

    // ─── Tick ──────────────────────────────────────────────────────────────

    /// 推进所有定时器一帧
    /// Advance every timer by one frame
    pub fn tick(&self, frame: &FrameTime) {
        let mut snapshot = {
            let mut registry = self.inner.borrow_mut();
            if registry.suspended {
                return;
            }
            registry.stats.ticks += 1;

            let mut snapshot = std::mem::take(&mut registry.snapshot);
            snapshot.clear();
            snapshot.extend(registry.timers.keys().copied());
            snapshot
        };

        for &id in &snapshot {
            let fired = {
                let mut guard = self.inner.borrow_mut();
                let registry = &mut *guard;
                let Some(timer) = registry.timers.get_mut(&id) else {
                    continue;
                };

                if timer.advance(frame) {
                    registry.stats.fired += 1;
                    timer.action().cloned()
                } else {
                    None
                }
            };

            if let Some(action) = fired {
                trace!(timer_id = id, "Timer fired");
                action.invoke();
            }

            let cleared = {
                let mut registry = self.inner.borrow_mut();
                if registry.timers.get(&id).is_some_and(Timer::should_clear) {
                    registry.stats.expired += 1;
                    registry.timers.remove(&id)
                } else {
                    None
                }
            };

            if cleared.is_some() {
                trace!(timer_id = id, "Timer cleared");
            }
        }

        // 归还缓冲区以便下一次tick复用
        // Hand the buffer back for the next tick
        snapshot.clear();
        let mut registry = self.inner.borrow_mut();
        if registry.snapshot.capacity() < snapshot.capacity() {
            registry.snapshot = snapshot;
        }
    }
}

/// 惰性批量注册迭代器，由 [`Scheduler::register_batch`] 返回
/// Lazy batch registration iterator returned by [`Scheduler::register_batch`]
#[derive(Debug)]
pub struct BatchRegistration<'a, I> {
    scheduler: Scheduler,
    owner: Option<OwnerHandle>,
    descriptors: I,
    bindings: &'a EventBindings,
    override_old: bool,
}

impl<I> Iterator for BatchRegistration<'_, I>
where
    I: Iterator,
    I::Item: std::borrow::Borrow<Descriptor>,
{
    type Item = TimerId;

    fn next(&mut self) -> Option<TimerId> {
        let descriptor = self.descriptors.next()?;
        let descriptor = <I::Item as std::borrow::Borrow<Descriptor>>::borrow(&descriptor);
        let timer = Timer::from_descriptor(self.owner.clone(), descriptor, self.bindings);
        Some(self.scheduler.register_timer(timer, self.override_old))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.descriptors.size_hint()
    }
}

/// 按ID惰性获取定时器快照的迭代器
/// Iterator that lazily fetches timer snapshots by id
#[derive(Debug)]
pub struct TimerIter {
    scheduler: Scheduler,
    ids: std::vec::IntoIter<TimerId>,
}

impl Iterator for TimerIter {
    type Item = Timer;

    fn next(&mut self) -> Option<Timer> {
        self.ids.by_ref().find_map(|id| self.scheduler.get(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.ids.len()))
    }
}
