//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use std::path::PathBuf;
use thiserror::Error;

/// 定时器库的主要错误类型。
/// The primary error type for the timers library.
#[derive(Debug, Error)]
pub enum Error {
    /// 读写定时器集合文件时发生I/O错误。
    /// An I/O error occurred while reading or writing a timer set file.
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 定时器集合的TOML无法解析。
    /// A timer set could not be parsed from TOML.
    #[error("failed to parse timer set TOML")]
    ParseToml(#[from] toml::de::Error),

    /// 定时器集合无法序列化为TOML。
    /// A timer set could not be serialized to TOML.
    #[error("failed to serialize timer set TOML")]
    SerializeToml(#[from] toml::ser::Error),
}

/// 注册校验失败的原因。
/// Why a registration attempt failed validation.
///
/// 这些都是预期内的情况：调度器记录日志并返回 `NO_TIMER`，不会插入任何条目。
/// These are expected conditions: the scheduler logs them and hands back
/// `NO_TIMER` without inserting anything.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// 定时器在没有所有者的情况下构造。
    /// The timer was constructed without an owner.
    #[error("timer requires a valid owner")]
    MissingOwner,

    /// 定时器没有回调。
    /// The timer has no callback to invoke.
    #[error("timer has no callback")]
    MissingCallback,

    #[error("timer interval must be positive, got {0}")]
    NonPositiveInterval(f32),

    #[error("timer loop count must be at least 1")]
    ZeroLoops,
}

/// 本库专用的 `Result` 类型。
/// A specialized `Result` type for this library.
pub type Result<T> = std::result::Result<T, Error>;
