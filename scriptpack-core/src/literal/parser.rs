//! 字面量递归下降解析器
//!
//! 文法：
//! ```text
//! value  := object | array | string | number | bareword
//! object := '{' [ member (',' member)* [','] ] '}'
//! member := (string | bareword | number) ':' value
//! array  := '[' [ value (',' value)* [','] ] ']'
//! ```
//! 裸词 `true`/`false`/`null` 映射为对应 JSON 值，其他裸词视为字符串。

use serde_json::{Map, Value};

use super::error::{LiteralError, LiteralErrorKind};
use super::scanner::{Scanner, Token, TokenKind};

/// 最大嵌套深度
pub const MAX_DEPTH: usize = 64;

/// 字面量解析器
///
/// 只预读一个 token；预读失败的错误延迟到真正需要该 token 时才返回，
/// 因此可以从任意源码中截取前缀字面量而不被其后的内容干扰。
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Result<Token, LiteralError>,
    /// 最近一个完整值的结束偏移
    end: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            end: 0,
            depth: 0,
        }
    }

    /// 解析一个值，返回值和它结束处的字节偏移
    pub fn parse_value(&mut self) -> Result<(Value, usize), LiteralError> {
        let value = self.value()?;
        Ok((value, self.end))
    }

    /// 解析一个值并要求其后只剩空白或注释
    pub fn parse_complete(&mut self) -> Result<Value, LiteralError> {
        let value = self.value()?;
        if *self.kind()? != TokenKind::Eof {
            return Err(LiteralError::at(
                LiteralErrorKind::TrailingInput,
                self.offset(),
            ));
        }
        Ok(value)
    }

    fn kind(&self) -> Result<&TokenKind, LiteralError> {
        self.current.as_ref().map(|t| &t.kind).map_err(Clone::clone)
    }

    fn offset(&self) -> usize {
        match &self.current {
            Ok(token) => token.offset,
            Err(err) => err.offset,
        }
    }

    fn is(&self, kind: &TokenKind) -> Result<bool, LiteralError> {
        Ok(self.kind()? == kind)
    }

    fn bump(&mut self) -> Result<Token, LiteralError> {
        let next = self.scanner.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), LiteralError> {
        if self.is(&kind)? {
            self.bump()?;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> LiteralError {
        let kind = match self.kind() {
            Err(err) => return err,
            Ok(TokenKind::Eof) => LiteralErrorKind::UnexpectedEnd,
            Ok(found) => LiteralErrorKind::UnexpectedToken {
                expected,
                found: found.describe(),
            },
        };
        LiteralError::at(kind, self.offset())
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        match self.kind()? {
            TokenKind::LBrace => self.nested(Self::object),
            TokenKind::LBracket => self.nested(Self::array),
            TokenKind::Str(_) | TokenKind::Number(_) | TokenKind::Word(_) => {
                // 扫描器此时恰好停在当前 token 末尾
                self.end = self.scanner.offset();
                let token = self.bump()?;
                Ok(match token.kind {
                    TokenKind::Str(s) => Value::String(s),
                    TokenKind::Number(n) => Value::Number(n),
                    TokenKind::Word(w) => match w.as_str() {
                        "true" => Value::Bool(true),
                        "false" => Value::Bool(false),
                        "null" | "undefined" => Value::Null,
                        _ => Value::String(w),
                    },
                    _ => Value::Null,
                })
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::at(
                LiteralErrorKind::TooDeep(MAX_DEPTH),
                self.offset(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn object(&mut self) -> Result<Value, LiteralError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut map = Map::new();

        while !self.is(&TokenKind::RBrace)? {
            let key = match self.kind()? {
                TokenKind::Str(s) | TokenKind::Word(s) => s.clone(),
                TokenKind::Number(n) => n.to_string(),
                _ => return Err(self.unexpected("an object key")),
            };
            self.bump()?;
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.value()?;
            map.insert(key, value);

            if self.is(&TokenKind::Comma)? {
                self.bump()?;
            } else if !self.is(&TokenKind::RBrace)? {
                return Err(self.unexpected("',' or '}'"));
            }
        }

        self.close(TokenKind::RBrace)?;
        Ok(Value::Object(map))
    }

    fn array(&mut self) -> Result<Value, LiteralError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();

        while !self.is(&TokenKind::RBracket)? {
            items.push(self.value()?);

            if self.is(&TokenKind::Comma)? {
                self.bump()?;
            } else if !self.is(&TokenKind::RBracket)? {
                return Err(self.unexpected("',' or ']'"));
            }
        }

        self.close(TokenKind::RBracket)?;
        Ok(Value::Array(items))
    }

    /// 消费闭合括号，值的结束偏移定在括号之后
    fn close(&mut self, kind: TokenKind) -> Result<(), LiteralError> {
        self.end = self.offset() + 1;
        self.expect(kind, "a closing bracket")
    }
}
