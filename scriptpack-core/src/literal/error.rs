//! 字面量解码错误
//!
//! 错误携带出错位置（字节偏移）以便在日志中定位元数据。

use thiserror::Error;

/// 错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence '{0}'")]
    InvalidEscape(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected input after literal")]
    TrailingInput,

    #[error("literal nested deeper than {0} levels")]
    TooDeep(usize),
}

/// 字面量解码错误，包含类型和位置
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at offset {offset}")]
pub struct LiteralError {
    pub kind: LiteralErrorKind,
    /// 相对于解码文本起点的字节偏移
    pub offset: usize,
}

impl LiteralError {
    /// 在指定位置创建错误
    pub fn at(kind: LiteralErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}
