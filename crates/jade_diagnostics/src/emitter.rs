//! Emitter - 诊断输出器
//!
//! 负责把诊断格式化到终端；有源码时画出错位置的插入符

use colored::*;

use crate::diagnostic::Diagnostic;

/// 诊断输出器
pub struct Emitter {
    /// 是否使用颜色
    use_colors: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    /// 创建新的输出器
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// 创建无颜色的输出器
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// 输出单个诊断
    pub fn emit(&self, diagnostic: &Diagnostic) {
        let level = if self.use_colors {
            diagnostic.level.colored_name().to_string()
        } else {
            diagnostic.level.name().to_string()
        };
        eprintln!("{}: {}", level, diagnostic.message);
        if let Some(span) = &diagnostic.span {
            eprintln!("  --> offset {}", span.start);
        }
        for note in &diagnostic.notes {
            eprintln!("  = note: {}", note);
        }
    }

    /// 输出所有诊断
    pub fn emit_all(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    /// 带源码行与插入符输出
    pub fn emit_with_source(&self, diagnostic: &Diagnostic, source: &str) {
        let level = if self.use_colors {
            diagnostic.level.colored_name().to_string()
        } else {
            diagnostic.level.name().to_string()
        };
        eprintln!("{}: {}", level, diagnostic.message);

        if let Some(span) = &diagnostic.span {
            let (line, column) = span.line_column(source);
            let text = source.lines().nth(line - 1).unwrap_or("");
            let arrow = if self.use_colors {
                "-->".blue().bold().to_string()
            } else {
                "-->".to_string()
            };
            eprintln!("  {} {}:{}", arrow, line, column);
            eprintln!("  {} {}", "|", text);
            eprintln!("  {} {}{}", "|", " ".repeat(column.saturating_sub(1)), "^");
        }
        for note in &diagnostic.notes {
            eprintln!("  = note: {}", note);
        }
    }
}
