//! Jade Diagnostics
//!
//! 统一的诊断系统，为 Jade 工具链提供清晰的错误报告。
//!
//! # 核心类型
//!
//! - [`Diagnostic`] - 诊断信息主体
//! - [`Level`] - 诊断级别（Error/Note/Help）
//! - [`DiagnosticSink`] - 诊断收集器
//! - [`Emitter`] - 诊断输出器
//! - [`Span`] - 源码位置信息
//!
//! # 示例
//!
//! ```rust
//! use jade_diagnostics::{Diagnostic, DiagnosticSink, Emitter, Span};
//!
//! let mut sink = DiagnosticSink::new();
//! sink.add(
//!     Diagnostic::error("illegal: octal value over 255")
//!         .span(Span::at(1))
//!         .with_note("octal escapes are limited to one byte"),
//! );
//!
//! if sink.has_errors() {
//!     let emitter = Emitter::without_colors();
//!     emitter.emit_all(sink.diagnostics());
//! }
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod level;
pub mod sink;
pub mod span;

pub use diagnostic::Diagnostic;
pub use emitter::Emitter;
pub use level::Level;
pub use sink::DiagnosticSink;
pub use span::Span;
