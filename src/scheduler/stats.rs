//! 调度器统计信息
//! Scheduler statistics

/// 调度器统计信息
/// Scheduler statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// 当前注册的定时器数
    /// Number of currently registered timers
    pub active_timers: usize,
    /// 成功注册的定时器数
    /// Number of accepted registrations
    pub registered: u64,
    /// 被拒绝的注册数
    /// Number of rejected registrations
    pub rejected: u64,
    /// 回调调用次数
    /// Number of callback invocations
    pub fired: u64,
    /// 在tick中被清理的定时器数（耗尽或所有者失效）
    /// Timers swept during a tick (exhausted or owner gone)
    pub expired: u64,
    /// 被显式取消或覆盖的定时器数
    /// Timers removed by explicit cancellation or override
    pub cancelled: u64,
    /// 实际处理过的tick数（全局暂停期间不计）
    /// Ticks actually processed (not counted while globally paused)
    pub ticks: u64,
}

impl std::fmt::Display for SchedulerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SchedulerStats {{ active: {}, registered: {}, rejected: {}, fired: {}, expired: {}, cancelled: {}, ticks: {} }}",
            self.active_timers,
            self.registered,
            self.rejected,
            self.fired,
            self.expired,
            self.cancelled,
            self.ticks
        )
    }
}
