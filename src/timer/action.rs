//! 定时器回调
//! Timer callback

use std::fmt;
use std::rc::Rc;

/// 定时器到期时调用的回调
/// Callback invoked when a timer cycle completes
///
/// 相等性基于身份：只有同一个 `Action` 的克隆才相等，两个行为相同的闭包
/// 仍然是不同的回调。覆盖注册和按回调取消都依赖这一点。
///
/// Equality is identity-based: only clones of the same `Action` compare equal,
/// two closures with the same body are still distinct callbacks. Override
/// registration and cancel-by-callback both rely on this.
#[derive(Clone)]
pub struct Action(Rc<dyn Fn()>);

impl Action {
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn invoke(&self) {
        (self.0)()
    }

    pub fn ptr_eq(&self, other: &Action) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Action {}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
