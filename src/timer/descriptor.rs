//! 定时器描述符和定时器集合
//! Timer descriptors and timer sets
//!
//! 描述符是可序列化的定时器模板：没有所有者也没有回调，只按名称引用一个
//! 事件。定时器集合是描述符的列表，可以从 TOML 文件加载，并在运行时附加到
//! 任意所有者上。
//!
//! A descriptor is a serializable timer template: no owner and no callback,
//! only an event referenced by name. A timer set is a list of descriptors that
//! can be loaded from a TOML file and attached to any owner at runtime.
//!
//! ```toml
//! [[timer]]
//! interval = 1.5
//! loops_count = 3
//! event = "spawn_wave"
//!
//! [[timer]]
//! interval = 0.25
//! infinite_loops = true
//! unscaled_time = true
//! event = "blink_cursor"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timer::action::Action;
use crate::timer::entry::INFINITE_LOOPS;

/// 定时器模板
/// Timer template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// 每个循环的间隔（秒）
    /// Interval between loops, in seconds
    pub interval: f32,

    /// 为 true 时忽略 `loops_count`，无限循环
    /// When true `loops_count` is ignored and the timer loops forever
    #[serde(default)]
    pub infinite_loops: bool,

    #[serde(default = "default_loops_count")]
    pub loops_count: u32,

    /// 使用未缩放（真实）时间
    /// Use unscaled (real) time
    #[serde(default)]
    pub unscaled_time: bool,

    /// 在 `EventBindings` 中查找回调所用的事件名
    /// Event name looked up in `EventBindings` to find the callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

fn default_loops_count() -> u32 {
    1
}

impl Descriptor {
    /// 单次触发的描述符
    /// Descriptor that fires once
    pub fn once(interval: f32, event: impl Into<String>) -> Self {
        Self::looping(interval, 1, event)
    }

    pub fn looping(interval: f32, loops_count: u32, event: impl Into<String>) -> Self {
        Self {
            interval,
            infinite_loops: false,
            loops_count,
            unscaled_time: false,
            event: Some(event.into()),
        }
    }

    pub fn infinite(interval: f32, event: impl Into<String>) -> Self {
        Self {
            infinite_loops: true,
            ..Self::once(interval, event)
        }
    }

    pub fn with_unscaled_time(mut self, unscaled_time: bool) -> Self {
        self.unscaled_time = unscaled_time;
        self
    }

    /// 实际使用的循环次数（无限循环时为 `INFINITE_LOOPS`）
    /// Effective loops count (`INFINITE_LOOPS` when looping forever)
    pub fn effective_loops_count(&self) -> u32 {
        if self.infinite_loops {
            INFINITE_LOOPS
        } else {
            self.loops_count
        }
    }
}

/// 事件名到回调的绑定表
/// Binding table from event names to callbacks
///
/// 同一个名称总是解析为同一个 `Action`，所以两个引用同一事件的描述符在覆盖
/// 注册时会互相替换。
///
/// A name always resolves to the same `Action`, so two descriptors that
/// reference the same event replace each other under override registration.
#[derive(Debug, Clone, Default)]
pub struct EventBindings {
    events: HashMap<String, Action>,
}

impl EventBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定事件，返回之前绑定的回调
    /// Bind an event, returning the previously bound callback
    pub fn bind(&mut self, event: impl Into<String>, action: Action) -> Option<Action> {
        self.events.insert(event.into(), action)
    }

    pub fn unbind(&mut self, event: &str) -> Option<Action> {
        self.events.remove(event)
    }

    pub fn get(&self, event: &str) -> Option<&Action> {
        self.events.get(event)
    }

    pub fn resolve(&self, descriptor: &Descriptor) -> Option<Action> {
        descriptor
            .event
            .as_deref()
            .and_then(|event| self.get(event))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// 声明式的定时器集合
/// Declarative timer set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSet {
    #[serde(default, rename = "timer")]
    pub timers: Vec<Descriptor>,
}

impl TimerSet {
    pub fn new(timers: Vec<Descriptor>) -> Self {
        Self { timers }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从 TOML 文件加载；文件不存在时返回空集合
    /// Load from a TOML file; a missing file yields an empty set
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// 保存到 TOML 文件，必要时创建父目录
    /// Save to a TOML file, creating parent directories if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.timers.iter()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<'a> IntoIterator for &'a TimerSet {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.timers.iter()
    }
}
