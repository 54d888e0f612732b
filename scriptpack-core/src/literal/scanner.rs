//! 字面量词法扫描器
//!
//! 将 JS 风格的字面量文本切分为 token：括号、冒号、逗号、字符串、数字、裸词。
//! 空白与 `//`、`/* */` 注释被跳过。

use super::error::{LiteralError, LiteralErrorKind};

/// Token 类型
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    /// 已处理转义的字符串内容
    Str(String),
    Number(serde_json::Number),
    /// 未加引号的标识符（对象键、`true`/`false`/`null` 等）
    Word(String),
    Eof,
}

impl TokenKind {
    /// 用于错误信息的简短描述
    pub fn describe(&self) -> String {
        match self {
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Str(s) => format!("string {:?}", s),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Word(w) => format!("'{}'", w),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// Token 结构
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// token 起始字节偏移
    pub offset: usize,
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// 字面量扫描器
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// 当前字节偏移（已消费的字节数）
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), LiteralError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.source[self.pos..].find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => {
                            return Err(LiteralError::at(LiteralErrorKind::UnexpectedEnd, start))
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// 扫描下一个 token
    pub fn next_token(&mut self) -> Result<Token, LiteralError> {
        self.skip_trivia()?;
        let offset = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset,
            });
        };

        let kind = match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ':' => self.single(TokenKind::Colon),
            ',' => self.single(TokenKind::Comma),
            '"' | '\'' => TokenKind::Str(self.scan_string(c)?),
            '-' | '+' | '.' | '0'..='9' => TokenKind::Number(self.scan_number()?),
            c if is_identifier_start(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_identifier_continue) {
                    self.advance();
                }
                TokenKind::Word(self.source[start..self.pos].to_string())
            }
            other => return Err(LiteralError::at(LiteralErrorKind::UnexpectedChar(other), offset)),
        };

        Ok(Token { kind, offset })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// 扫描引号字符串
    ///
    /// 两种引号都识别标准转义；单引号字符串中未知转义保留反斜杠原样，
    /// 双引号字符串中未知转义只保留被转义的字符。
    fn scan_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.advance();
        let mut out = String::new();

        loop {
            let Some(c) = self.advance() else {
                return Err(LiteralError::at(LiteralErrorKind::UnterminatedString, start));
            };
            match c {
                '\n' | '\r' => {
                    return Err(LiteralError::at(LiteralErrorKind::UnterminatedString, start))
                }
                c if c == quote => return Ok(out),
                '\\' => {
                    let escape_at = self.pos - 1;
                    let Some(e) = self.advance() else {
                        return Err(LiteralError::at(LiteralErrorKind::UnterminatedString, start));
                    };
                    match e {
                        '"' | '\'' | '\\' | '/' => out.push(e),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => out.push(self.scan_unicode_escape(escape_at)?),
                        '\n' => {}
                        other if quote == '\'' => {
                            out.push('\\');
                            out.push(other);
                        }
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn scan_hex4(&mut self, escape_at: usize) -> Result<u32, LiteralError> {
        let end = self.pos + 4;
        let digits = self
            .source
            .get(self.pos..end)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| {
                let shown: String = self.source[escape_at..].chars().take(6).collect();
                LiteralError::at(LiteralErrorKind::InvalidEscape(shown), escape_at)
            })?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| {
            LiteralError::at(LiteralErrorKind::InvalidEscape(digits.to_string()), escape_at)
        })?;
        self.pos = end;
        Ok(value)
    }

    fn scan_unicode_escape(&mut self, escape_at: usize) -> Result<char, LiteralError> {
        let high = self.scan_hex4(escape_at)?;
        let code = if (0xD800..0xDC00).contains(&high) && self.source[self.pos..].starts_with("\\u") {
            self.pos += 2;
            let low = self.scan_hex4(escape_at)?;
            if !(0xDC00..0xE000).contains(&low) {
                let shown = self.source[escape_at..self.pos].to_string();
                return Err(LiteralError::at(LiteralErrorKind::InvalidEscape(shown), escape_at));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| {
            let shown = self.source[escape_at..self.pos].to_string();
            LiteralError::at(LiteralErrorKind::InvalidEscape(shown), escape_at)
        })
    }

    /// 扫描十进制数字（可带符号、小数与指数）
    fn scan_number(&mut self) -> Result<serde_json::Number, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.advance();
        }
        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('-' | '+')) {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }

        let text = &self.source[start..self.pos];
        let invalid = || LiteralError::at(LiteralErrorKind::InvalidNumber(text.to_string()), start);
        let unsigned = text.trim_start_matches('+');

        if !is_float {
            if let Ok(n) = unsigned.parse::<i64>() {
                return Ok(n.into());
            }
            if let Ok(n) = unsigned.parse::<u64>() {
                return Ok(n.into());
            }
        }
        unsigned
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .and_then(serde_json::Number::from_f64)
            .ok_or_else(invalid)
    }
}
