//! Jade Syntax
//!
//! Jade 表达式解析器：源码 → 记号流 → PEG 文法 → 带规范文本形式的 AST。
//!
//! # 流程
//!
//! 1. [`lexer::tokenize`] 按形式语法分词（宽容扫描，行尾补分号）
//! 2. [`lexer::stream`] 把记号拼回工作文本
//! 3. 进程级惰性文法在工作文本上运行，语义动作折出 [`Expr`]
//!
//! # 示例
//!
//! ```rust
//! use jade_syntax::parse_expression;
//!
//! let ast = parse_expression("math.Atan2(x, y)").unwrap();
//! assert_eq!(
//!     ast.to_string(),
//!     "math<VPUverse(0)>.Atan2(x<VPUverse(0)>, y<VPUverse(0)>)"
//! );
//!
//! let err = parse_expression(r"'\400'").unwrap_err();
//! assert_eq!(err.to_string(), "ERROR illegal: octal value over 255");
//! ```
//!
//! 文法编译一次后只读，多线程可并发解析；`TRACE=grammar,stack`
//! 打开引擎的调试输出。

mod actions;
mod floatfmt;
mod rules;

pub mod ast;
pub mod lexer;

use std::fmt;

use once_cell::sync::Lazy;

use jade_peg::Grammar;

pub use ast::{ChanDir, Expr, VerseTag, Word};
pub use jade_peg::ParseError;

/// 进程级文法：首次使用时编译，之后只读
static GRAMMAR: Lazy<Grammar<Expr>> = Lazy::new(|| {
    Grammar::from_lines("jade-expressions", rules::lines()).expect("builtin grammar must compile")
});

/// 解析一个表达式。
///
/// 空白输入返回 [`Expr::Blank`] 哨兵（渲染为空串）。分词失败、
/// 无法匹配或语义动作报错都以 [`ParseError`] 返回。
pub fn parse_expression(text: &str) -> Result<Expr, ParseError> {
    if text.trim().is_empty() {
        return Ok(Expr::Blank);
    }
    let tokens = lexer::tokenize(text)?;
    let stream = lexer::stream(&tokens);
    if stream.work().is_empty() {
        return Ok(Expr::Blank);
    }
    let value = GRAMMAR.parse(&stream)?;
    value
        .into_node()
        .ok_or_else(|| ParseError::new("input is not an expression"))
}

/// printf 风格的解析入口（[`parse_expr!`] 的实现）。
///
/// # Panics
///
/// 空白输入是调用方用法错误，不是解析错误：直接 panic。
pub fn parse_expression_fmt(args: fmt::Arguments<'_>) -> Result<Expr, ParseError> {
    let text = args.to_string();
    assert!(!text.trim().is_empty(), "input cannot be blank");
    parse_expression(&text)
}

/// 按模板拼一个表达式再解析：`parse_expr!("{} + {}", lhs, rhs)`
#[macro_export]
macro_rules! parse_expr {
    ($($arg:tt)*) => {
        $crate::parse_expression_fmt(::core::format_args!($($arg)*))
    };
}

/// 解析结果的文本形式：成功是规范形式，失败是 `ERROR <message>`
pub fn render(result: &Result<Expr, ParseError>) -> String {
    match result {
        Ok(expr) => expr.to_string(),
        Err(err) => err.to_string(),
    }
}
