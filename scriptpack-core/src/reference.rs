//! 依赖引用
//!
//! 依赖声明中的单个引用写作 `[kind:][category<sep>]subId`，
//! `<sep>` 为 `/`、`_`、`.`、`-` 之一。例如 `0`、`lib-3`、`optional:ui/12`。

use std::fmt;

use scriptpack_config::Convention;
use thiserror::Error;

/// 依赖类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKind {
    /// 必须无环，排序时优先级最高
    Compile,
    /// 启动时需要，允许成环
    Launch,
    /// 存在则使用，缺失时静默丢弃
    Optional,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 3] = [
        DependencyKind::Compile,
        DependencyKind::Launch,
        DependencyKind::Optional,
    ];

    pub fn is_mandatory(self) -> bool {
        !matches!(self, DependencyKind::Optional)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::Compile => "compile",
            DependencyKind::Launch => "launch",
            DependencyKind::Optional => "optional",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "compile" => Some(DependencyKind::Compile),
            "launch" => Some(DependencyKind::Launch),
            "optional" => Some(DependencyKind::Optional),
            _ => None,
        }
    }

    /// 声明该类依赖的 setup 方法名
    pub fn method_name(self, convention: &Convention) -> &str {
        match self {
            DependencyKind::Compile => &convention.compile_method,
            DependencyKind::Launch => &convention.launch_method,
            DependencyKind::Optional => &convention.optional_method,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 分类内编号的模块标识
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId {
    pub category: String,
    pub sub_id: u32,
}

impl ModuleId {
    pub fn new(category: impl Into<String>, sub_id: u32) -> Self {
        Self {
            category: category.into(),
            sub_id,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.sub_id)
    }
}

/// 引用解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("dependency reference '{0}' does not end with a numeric id")]
    MissingId(String),

    #[error("dependency reference '{0}' has an empty category")]
    EmptyCategory(String),

    #[error("dependency reference '{0}' has an id that is out of range")]
    IdOutOfRange(String),

    #[error("dependency reference '{reference}' has an unknown kind prefix '{prefix}'")]
    UnknownKind { reference: String, prefix: String },

    #[error("dependency reference must be a string or a non-negative integer, found {0}")]
    NotAReference(String),
}

/// 解析后的依赖引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// `kind:` 前缀指定的类型，会覆盖声明方法的类型
    pub kind: Option<DependencyKind>,
    pub id: ModuleId,
}

impl DependencySpec {
    /// 解析文本引用，未写分类时使用默认分类
    pub fn parse(text: &str, convention: &Convention) -> Result<Self, SpecError> {
        let text = text.trim();
        let (kind, rest) = match text.split_once(':') {
            Some((prefix, rest)) => match DependencyKind::parse(prefix.trim()) {
                Some(kind) => (Some(kind), rest.trim()),
                None => {
                    return Err(SpecError::UnknownKind {
                        reference: text.to_string(),
                        prefix: prefix.trim().to_string(),
                    })
                }
            },
            None => (None, text),
        };

        let digits_start = rest
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(0);
        let digits = &rest[digits_start..];
        if digits.is_empty() {
            return Err(SpecError::MissingId(text.to_string()));
        }
        let sub_id = digits
            .parse::<u32>()
            .map_err(|_| SpecError::IdOutOfRange(text.to_string()))?;

        let head = &rest[..digits_start];
        let category = if head.is_empty() {
            convention.default_category.as_str()
        } else {
            let category = head
                .strip_suffix(&['/', '_', '.', '-'][..])
                .ok_or_else(|| SpecError::MissingId(text.to_string()))?;
            if category.is_empty() {
                return Err(SpecError::EmptyCategory(text.to_string()));
            }
            convention.canonical_category(category)
        };

        Ok(Self {
            kind,
            id: ModuleId::new(category, sub_id),
        })
    }

    /// 从解码后的 JSON 标量解析
    pub fn from_value(value: &serde_json::Value, convention: &Convention) -> Result<Self, SpecError> {
        match value {
            serde_json::Value::String(s) => Self::parse(s, convention),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(id) => {
                    let sub_id = u32::try_from(id).map_err(|_| SpecError::IdOutOfRange(n.to_string()))?;
                    Ok(Self {
                        kind: None,
                        id: ModuleId::new(convention.default_category.as_str(), sub_id),
                    })
                }
                None => Err(SpecError::NotAReference(n.to_string())),
            },
            other => Err(SpecError::NotAReference(other.to_string())),
        }
    }
}
