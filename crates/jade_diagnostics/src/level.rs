//! Level - 诊断级别

use colored::*;
use std::fmt;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// 错误 - 解析失败
    Error,
    /// 注释 - 补充说明
    Note,
    /// 建议 - 修改提示
    Help,
}

impl Level {
    /// 级别名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Note => "note",
            Self::Help => "help",
        }
    }

    /// 带颜色的级别名称
    pub fn colored_name(&self) -> ColoredString {
        match self {
            Self::Error => self.name().red().bold(),
            Self::Note => self.name().bright_black().bold(),
            Self::Help => self.name().green().bold(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
