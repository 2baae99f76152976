//! Engine Error Types
//!
//! 解析错误与语法构建错误

use thiserror::Error;

/// 解析错误
///
/// 语义回调通过 [`crate::ParseContext::error`] 构造并以 `Err` 返回，
/// 引擎立即终止整个解析，不再尝试其它备选分支。
/// 文本形式固定为 `ERROR <message>`。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ERROR {message}")]
pub struct ParseError {
    /// 错误消息（不含 `ERROR ` 前缀）
    pub message: String,
    /// 源码字节偏移（如果已知）
    pub offset: Option<usize>,
}

impl ParseError {
    /// 创建不带位置的解析错误
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    /// 创建带源码偏移的解析错误
    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

/// 语法构建错误
///
/// `Grammar::from_lines` 在规则文本非法时立即失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// 规则体无法解析
    #[error("rule '{rule}': {message}")]
    BadRuleExpr { rule: String, message: String },

    /// 重复的规则名
    #[error("duplicate rule name '{0}'")]
    DuplicateRule(String),

    /// 引用了未定义的规则
    #[error("rule '{rule}' references unknown rule '{target}'")]
    UnknownReference { rule: String, target: String },

    /// 语法没有任何规则
    #[error("grammar '{0}' has no rules")]
    Empty(String),
}
