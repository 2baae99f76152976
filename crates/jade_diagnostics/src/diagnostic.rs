//! Diagnostic - 诊断信息
//!
//! 表示一条面向用户的诊断，可由 [`ParseError`] 直接转换

use jade_peg::ParseError;

use crate::level::Level;
use crate::span::Span;

/// 诊断信息
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: Level,
    /// 主要消息
    pub message: String,
    /// 源码位置（可选）
    pub span: Option<Span>,
    /// 补充注释
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// 创建新的诊断
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            span: None,
            notes: Vec::new(),
        }
    }

    /// 创建错误诊断
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// 创建注释诊断
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Level::Note, message)
    }

    /// 设置位置信息
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// 添加注释
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// 解析错误转诊断：消息原样保留，偏移折成点位置
    pub fn from_parse_error(err: &ParseError) -> Self {
        let mut diagnostic = Self::error(err.message.clone());
        if let Some(offset) = err.offset {
            diagnostic.span = Some(Span::at(offset));
        }
        diagnostic
    }
}
