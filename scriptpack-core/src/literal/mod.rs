//! JS 风格字面量解码
//!
//! 把依赖声明中出现的对象/数组字面量（单双引号字符串、裸词键、任意嵌套）
//! 转换为 `serde_json::Value`，无需完整的 ECMAScript 解析器。
//!
//! # 示例
//! ```
//! use scriptpack_core::literal::decode;
//! use serde_json::json;
//!
//! let value = decode("{grant: 'none', include: ['a*', \"b*\"]}").unwrap();
//! assert_eq!(value, json!({"grant": "none", "include": ["a*", "b*"]}));
//! ```

pub mod error;
pub mod parser;
pub mod scanner;

pub use error::{LiteralError, LiteralErrorKind};
pub use parser::Parser;

use serde_json::Value;
use tracing::warn;

/// 解码完整的字面量文本
pub fn decode(text: &str) -> Result<Value, LiteralError> {
    Parser::new(text).parse_complete()
}

/// 解码位于文本开头的字面量，返回值及其结束偏移
///
/// 字面量之后的内容不会被检查。
pub fn decode_prefix(text: &str) -> Result<(Value, usize), LiteralError> {
    Parser::new(text).parse_value()
}

/// 宽松解码：失败时记录警告并返回 `None`
pub fn decode_lenient(text: &str) -> Option<Value> {
    match decode(text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(target: "scriptpack::discovery", error = %err, "Ignoring malformed literal");
            None
        }
    }
}
