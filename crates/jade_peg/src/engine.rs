//! Matching Engine
//!
//! 工作文本上的 PEG 求值器：按 `(规则, 位置)` 记忆化，左递归规则用
//! 种子生长求最长匹配。每次解析新建一个 [`ParseContext`]，编译好的
//! [`Grammar`](crate::Grammar) 本身只读，可跨线程复用。

use std::collections::HashMap;
use std::sync::Arc;

use colored::Colorize;

use crate::error::ParseError;
use crate::expr::PegExpr;
use crate::grammar::{Action, GrammarCore, RuleDef};
use crate::stream::TokenStream;
use crate::value::Value;

/// 一次成功匹配：终点与捕获值
#[derive(Debug, Clone)]
pub struct MatchResult<N> {
    pub end: usize,
    pub value: Value<N>,
}

/// 记忆化表项
enum MemoEntry<N> {
    /// 求值中。`seed` 是当前种子；左递归重入时返回种子并打上 `involved`
    InProgress {
        seed: Option<MatchResult<N>>,
        involved: bool,
    },
    Done(Option<MatchResult<N>>),
}

/// 单次解析的全部可变状态。
/// 语义回调经由它报告错误、读取本条规则匹配到的文本。
pub struct ParseContext<N> {
    core: Arc<GrammarCore<N>>,
    stream: TokenStream,
    memo: HashMap<(usize, usize), MemoEntry<N>>,
    /// 终结符失败的最远位置，用于报错
    furthest: usize,
    depth: usize,
    /// 正在归约的规则所匹配的 [start, end) 区间
    reduce_span: (usize, usize),
}

impl<N: Clone> ParseContext<N> {
    pub(crate) fn new(core: Arc<GrammarCore<N>>, stream: TokenStream) -> Self {
        Self {
            core,
            stream,
            memo: HashMap::new(),
            furthest: 0,
            depth: 0,
            reduce_span: (0, 0),
        }
    }

    /// 在当前归约位置构造一个解析错误
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(message, self.stream.source_offset(self.reduce_span.0))
    }

    /// 正在归约的规则匹配到的工作文本
    pub fn matched_text(&self) -> &str {
        &self.stream.work()[self.reduce_span.0..self.reduce_span.1]
    }

    pub(crate) fn furthest(&self) -> usize {
        self.furthest
    }

    fn work(&self) -> &str {
        self.stream.work()
    }

    /// 应用具名规则（记忆化入口）
    pub(crate) fn apply(
        &mut self,
        id: usize,
        pos: usize,
    ) -> Result<Option<MatchResult<N>>, ParseError> {
        if let Some(entry) = self.memo.get_mut(&(id, pos)) {
            match entry {
                MemoEntry::Done(result) => return Ok(result.clone()),
                MemoEntry::InProgress { seed, involved } => {
                    // 左递归重入：交出当前种子
                    *involved = true;
                    return Ok(seed.clone());
                }
            }
        }

        let rule = Arc::clone(&self.core.rules[id]);
        let trace = self.core.trace.stack;
        if trace {
            self.trace_enter(&rule.name, pos);
        }
        self.depth += 1;

        self.memo.insert(
            (id, pos),
            MemoEntry::InProgress {
                seed: None,
                involved: false,
            },
        );

        // 种子生长：只要匹配还在变长且确有左递归重入，就再来一轮
        let mut best: Option<MatchResult<N>> = None;
        loop {
            let result = self.eval_rule(&rule, pos)?;
            let improved = match (&result, &best) {
                (Some(new), Some(old)) => new.end > old.end,
                (Some(_), None) => true,
                _ => false,
            };
            if !improved {
                break;
            }
            best = result;
            let involved = matches!(
                self.memo.get(&(id, pos)),
                Some(MemoEntry::InProgress { involved: true, .. })
            );
            self.memo.insert(
                (id, pos),
                MemoEntry::InProgress {
                    seed: best.clone(),
                    involved,
                },
            );
            if !involved {
                break;
            }
        }

        self.depth -= 1;
        if trace {
            self.trace_exit(&rule.name, pos, &best);
        }
        self.memo.insert((id, pos), MemoEntry::Done(best.clone()));
        Ok(best)
    }

    /// 依次尝试规则的备选分支，套用分支回调与规则回调
    fn eval_rule(
        &mut self,
        rule: &RuleDef<N>,
        pos: usize,
    ) -> Result<Option<MatchResult<N>>, ParseError> {
        for alt in &rule.alts {
            if let Some(mut m) = self.eval(&alt.expr, pos)? {
                if let Some(action) = &alt.action {
                    let action = Arc::clone(action);
                    m.value = self.reduce(&action, m.value, pos, m.end)?;
                }
                if let Some(action) = &rule.action {
                    let action = Arc::clone(action);
                    m.value = self.reduce(&action, m.value, pos, m.end)?;
                }
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    /// 调用语义回调；`Err` 直接穿透整个解析
    fn reduce(
        &mut self,
        action: &Action<N>,
        value: Value<N>,
        start: usize,
        end: usize,
    ) -> Result<Value<N>, ParseError> {
        let saved = self.reduce_span;
        self.reduce_span = (start, end);
        let result = (**action)(value, self);
        self.reduce_span = saved;
        result
    }

    fn eval(&mut self, expr: &PegExpr, pos: usize) -> Result<Option<MatchResult<N>>, ParseError> {
        match expr {
            PegExpr::Str(s) => {
                if self.work()[pos..].starts_with(s.as_str()) {
                    Ok(Some(MatchResult {
                        end: pos + s.len(),
                        value: Value::Text(s.clone()),
                    }))
                } else {
                    self.furthest = self.furthest.max(pos);
                    Ok(None)
                }
            }
            PegExpr::Class(class) => match self.work()[pos..].chars().next() {
                Some(ch) if class.matches(ch) => Ok(Some(MatchResult {
                    end: pos + ch.len_utf8(),
                    value: Value::Text(ch.to_string()),
                })),
                _ => {
                    self.furthest = self.furthest.max(pos);
                    Ok(None)
                }
            },
            PegExpr::Ref(name) => match self.core.index.get(name).copied() {
                Some(id) => self.apply(id, pos),
                // from_lines 已校验引用，这里只兜底
                None => Err(ParseError::new(format!("unknown rule '{}'", name))),
            },
            PegExpr::Seq(items) => {
                let has_label = items.iter().any(|item| item.label.is_some());
                let mut at = pos;
                let mut labeled: Vec<(String, Value<N>)> = Vec::new();
                let mut captured: Vec<Value<N>> = Vec::new();
                for item in items {
                    match self.eval(&item.expr, at)? {
                        None => return Ok(None),
                        Some(m) => {
                            if let Some(label) = &item.label {
                                labeled.push((label.clone(), m.value));
                            } else if item.captured {
                                captured.push(m.value);
                            }
                            at = m.end;
                        }
                    }
                }
                let value = if has_label {
                    Value::Tagged(labeled)
                } else if captured.len() == 1 {
                    captured.remove(0)
                } else if captured.is_empty() {
                    Value::Text(self.work()[pos..at].to_string())
                } else {
                    Value::Seq(captured)
                };
                Ok(Some(MatchResult { end: at, value }))
            }
            PegExpr::Choice(alts) => {
                for alt in alts {
                    if let Some(m) = self.eval(alt, pos)? {
                        return Ok(Some(m));
                    }
                }
                Ok(None)
            }
            PegExpr::Opt(inner) => Ok(Some(self.eval(inner, pos)?.unwrap_or(MatchResult {
                end: pos,
                value: Value::Nothing,
            }))),
            PegExpr::Look(inner) => Ok(self.eval(inner, pos)?.map(|_| MatchResult {
                end: pos,
                value: Value::Nothing,
            })),
            PegExpr::Not(inner) => Ok(match self.eval(inner, pos)? {
                Some(_) => None,
                None => Some(MatchResult {
                    end: pos,
                    value: Value::Nothing,
                }),
            }),
            PegExpr::Rep {
                expr: item,
                min,
                max,
                sep,
            } => {
                let mut at = pos;
                let mut values = Vec::new();
                loop {
                    if let Some(max) = max {
                        if values.len() >= *max {
                            break;
                        }
                    }
                    let mut next = at;
                    if !values.is_empty() {
                        if let Some(sep) = sep {
                            match self.eval(sep, next)? {
                                Some(s) => next = s.end,
                                None => break,
                            }
                        }
                    }
                    match self.eval(item, next)? {
                        Some(m) => {
                            // 一轮下来寸步未进则停，防止空匹配循环
                            if !values.is_empty() && m.end == at {
                                break;
                            }
                            values.push(m.value);
                            at = m.end;
                        }
                        None => break,
                    }
                }
                if values.len() < *min {
                    return Ok(None);
                }
                Ok(Some(MatchResult {
                    end: at,
                    value: Value::Seq(values),
                }))
            }
        }
    }

    fn trace_enter(&self, name: &str, pos: usize) {
        eprintln!(
            "{}{} {} {}",
            "  ".repeat(self.depth),
            "?".cyan(),
            name,
            format!("@{}", pos).bright_black(),
        );
    }

    fn trace_exit(&self, name: &str, pos: usize, result: &Option<MatchResult<N>>) {
        match result {
            Some(m) => eprintln!(
                "{}{} {} {}",
                "  ".repeat(self.depth),
                "✓".green(),
                name,
                format!("@{}..{}", pos, m.end).bright_black(),
            ),
            None => eprintln!(
                "{}{} {} {}",
                "  ".repeat(self.depth),
                "✗".red(),
                name,
                format!("@{}", pos).bright_black(),
            ),
        }
    }
}
