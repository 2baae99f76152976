//! AST Module
//!
//! 表达式节点与规范文本形式

pub mod expr;

pub use expr::{ChanDir, Expr, VerseTag, Word};
