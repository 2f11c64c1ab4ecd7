//! 线程本地的默认调度器
//! Thread-local default scheduler
//!
//! 大多数宿主只需要一个调度器：第一次访问时惰性创建，之后每次返回同一个
//! 注册表的句柄。需要隔离的调用方（例如测试）可以直接构造自己的 `Scheduler`。
//!
//! Most hosts only need one scheduler: it is created lazily on first access and
//! every later call returns a handle to the same registry. Callers that need
//! isolation (tests, for example) can build their own `Scheduler` instead.

use tracing::debug;

use super::registry::Scheduler;

thread_local! {
    static GLOBAL_SCHEDULER: Scheduler = {
        debug!("Creating thread-local default scheduler");
        Scheduler::default()
    };
}

/// 获取当前线程的默认调度器
/// Get the default scheduler of the current thread
pub fn global() -> Scheduler {
    GLOBAL_SCHEDULER.with(Scheduler::clone)
}
