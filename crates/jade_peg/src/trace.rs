//! Trace Options
//!
//! `TRACE` 环境变量选择调试输出类别，逗号分隔：
//! `grammar` 打印编译后的规则，`stack` 打印解析时的规则栈。
//! 追踪只写 stderr，从不影响解析结果。

/// 追踪类别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceOpts {
    pub grammar: bool,
    pub stack: bool,
}

impl TraceOpts {
    /// 读取 `TRACE` 环境变量
    pub fn from_env() -> Self {
        match std::env::var("TRACE") {
            Ok(spec) => Self::from_spec(&spec),
            Err(_) => Self::default(),
        }
    }

    /// 解析类别列表，未知类别忽略
    pub fn from_spec(spec: &str) -> Self {
        let mut opts = Self::default();
        for part in spec.split(',') {
            match part.trim() {
                "grammar" => opts.grammar = true,
                "stack" => opts.stack = true,
                _ => {}
            }
        }
        opts
    }
}
