//! Jade PEG Engine
//!
//! 通用的 PEG 语法引擎：规则以字符串 DSL 声明，一次编译，多次解析。
//!
//! # 核心类型
//!
//! - [`Grammar`] - 编译后的语法，线程安全，可跨线程共享
//! - [`Line`] / [`o`] / [`i`] / [`named`] - 声明式规则行
//! - [`Value`] - 匹配结果（文本 / 序列 / 标签捕获 / 语义节点）
//! - [`ParseContext`] - 回调可见的解析上下文
//! - [`ParseError`] / [`GrammarError`] - 解析错误与构建错误
//!
//! # 示例
//!
//! ```rust
//! use jade_peg::{Grammar, TokenStream, named, o, i};
//!
//! let lines: Vec<jade_peg::Line<String>> = vec![
//!     o(named("List", "'[' digit*',' ']'")),
//!     i(named("digit", "[0-9]")),
//! ];
//! let grammar = Grammar::from_lines("demo", lines).unwrap();
//! let stream = TokenStream::raw("[1,2,3]");
//! let value = grammar.parse(&stream).unwrap();
//! assert_eq!(value.text(), "123");
//! ```
//!
//! 匹配引擎按 `(规则, 位置)` 记忆化，左递归规则通过种子生长（seed-grow）
//! 算法求最长匹配。语义回调返回 `Err(ParseError)` 时整个解析立即终止，
//! 不再回溯其它备选分支。

pub mod dsl;
pub mod engine;
pub mod error;
pub mod expr;
pub mod grammar;
pub mod stream;
pub mod trace;
pub mod value;

pub use engine::ParseContext;
pub use error::{GrammarError, ParseError};
pub use grammar::{i, named, o, Grammar, Line, NamedRule, RuleBody};
pub use stream::TokenStream;
pub use trace::TraceOpts;
pub use value::Value;
