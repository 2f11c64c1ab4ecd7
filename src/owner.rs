//! 定时器所有者的存活探测
//! Liveness probing for timer owners
//!
//! 定时器从不持有其所有者：它只保存一个 `OwnerHandle`，由一个身份键和一个
//! 存活探针组成。调度器在每次更新和每次清理检查时都会重新询问探针。
//!
//! A timer never keeps its owner alive: it only stores an `OwnerHandle`, made
//! of an identity key and a liveness probe. The scheduler asks the probe again
//! on every update and on every clear check.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// 所有者身份键，用于按所有者查询和取消定时器
/// Owner identity key, used to query and cancel timers by owner
pub type OwnerKey = usize;

/// 存活探针：回答“这个句柄是否仍然有效？”
/// Liveness probe: answers "is this handle still valid?"
pub trait Liveness {
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized> Liveness for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

struct LifelineFlag(Rc<Cell<bool>>);

impl Liveness for LifelineFlag {
    fn is_alive(&self) -> bool {
        self.0.get()
    }
}

/// 非拥有的所有者句柄
/// Non-owning owner handle
///
/// 克隆句柄是廉价的，所有克隆共享同一个身份键。
/// Cloning is cheap and every clone shares the same identity key.
#[derive(Clone)]
pub struct OwnerHandle {
    key: OwnerKey,
    probe: Rc<dyn Liveness>,
}

impl OwnerHandle {
    /// 从强引用创建句柄（内部降级为弱引用）
    /// Create a handle from a strong reference (downgraded internally)
    pub fn from_rc<T: 'static>(owner: &Rc<T>) -> Self {
        Self::from_weak(Rc::downgrade(owner))
    }

    /// 从弱引用创建句柄
    /// Create a handle from a weak reference
    pub fn from_weak<T: 'static>(owner: Weak<T>) -> Self {
        let key = Weak::as_ptr(&owner).cast::<()>() as OwnerKey;
        Self {
            key,
            probe: Rc::new(owner),
        }
    }

    /// 使用宿主对象模型提供的自定义探针创建句柄
    /// Create a handle around a custom probe supplied by the host object model
    ///
    /// `key` must identify the owner: handles built with the same key are
    /// treated as the same owner by `Scheduler::timers_by_owner` and
    /// `Scheduler::cancel_owner`.
    pub fn with_probe(key: OwnerKey, probe: impl Liveness + 'static) -> Self {
        Self {
            key,
            probe: Rc::new(probe),
        }
    }

    pub fn key(&self) -> OwnerKey {
        self.key
    }

    pub fn is_alive(&self) -> bool {
        self.probe.is_alive()
    }

    /// 两个句柄是否指向同一个所有者
    /// Whether both handles refer to the same owner
    pub fn same_owner(&self, other: &OwnerHandle) -> bool {
        self.key == other.key
    }
}

impl fmt::Debug for OwnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerHandle")
            .field("key", &format_args!("{:#x}", self.key))
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// 显式的所有者生命线
/// Explicit owner lifeline
///
/// 适用于没有 `Rc` 的所有者：所有者持有 `Lifeline`，定时器持有从它派生的
/// 句柄。调用 `invalidate` 或丢弃 `Lifeline` 都会让所有派生句柄失效。
///
/// For owners that do not live behind an `Rc`: the owner holds the `Lifeline`
/// and timers hold handles derived from it. Calling `invalidate` or dropping
/// the `Lifeline` invalidates every derived handle.
#[derive(Debug)]
pub struct Lifeline {
    alive: Rc<Cell<bool>>,
}

impl Lifeline {
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    pub fn handle(&self) -> OwnerHandle {
        OwnerHandle {
            key: Rc::as_ptr(&self.alive) as OwnerKey,
            probe: Rc::new(LifelineFlag(Rc::clone(&self.alive))),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// 标记所有者已销毁
    /// Mark the owner as destroyed
    pub fn invalidate(&self) {
        self.alive.set(false);
    }
}

impl Default for Lifeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Lifeline {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}
