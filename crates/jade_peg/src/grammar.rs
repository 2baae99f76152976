//! Grammar Construction
//!
//! 规则行的声明式写法，仿照语法引用文法的排版：
//!
//! - `o(...)` 有序行：父规则的一个备选分支
//! - `i(...)` 内部行：只定义具名规则，不作为分支
//! - `named(name, body)` 绑定规则名；body 是 DSL 字符串或嵌套规则表
//! - `.with(action)` 附加语义回调
//!
//! 名字以 `_` 开头的规则在父序列中不捕获。
//! 顶层规则表编译为入口 rank，第一条 `o` 行优先。

use std::collections::HashMap;
use std::sync::Arc;

use colored::Colorize;

use crate::dsl;
use crate::engine::ParseContext;
use crate::error::{GrammarError, ParseError};
use crate::expr::PegExpr;
use crate::stream::TokenStream;
use crate::trace::TraceOpts;
use crate::value::Value;

/// 语义回调：拿到捕获值与上下文，产出新值或解析错误
pub type Action<N> =
    Arc<dyn Fn(Value<N>, &mut ParseContext<N>) -> Result<Value<N>, ParseError> + Send + Sync>;

/// 具名规则：名字 + 规则体
pub struct NamedRule<N> {
    name: String,
    body: RuleBody<N>,
}

/// 规则体：DSL 表达式或嵌套规则表
pub enum RuleBody<N> {
    Expr(String),
    Rules(Vec<Line<N>>),
}

impl<N> From<&str> for RuleBody<N> {
    fn from(src: &str) -> Self {
        RuleBody::Expr(src.to_string())
    }
}

impl<N> From<String> for RuleBody<N> {
    fn from(src: String) -> Self {
        RuleBody::Expr(src)
    }
}

impl<N> From<Vec<Line<N>>> for RuleBody<N> {
    fn from(lines: Vec<Line<N>>) -> Self {
        RuleBody::Rules(lines)
    }
}

/// 绑定规则名
pub fn named<N>(name: impl Into<String>, body: impl Into<RuleBody<N>>) -> NamedRule<N> {
    NamedRule {
        name: name.into(),
        body: body.into(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Ordered,
    Inner,
}

/// 行内容：匿名表达式或具名规则
pub enum LineContent<N> {
    Expr(String),
    Named(NamedRule<N>),
}

impl<N> From<&str> for LineContent<N> {
    fn from(src: &str) -> Self {
        LineContent::Expr(src.to_string())
    }
}

impl<N> From<String> for LineContent<N> {
    fn from(src: String) -> Self {
        LineContent::Expr(src)
    }
}

impl<N> From<NamedRule<N>> for LineContent<N> {
    fn from(rule: NamedRule<N>) -> Self {
        LineContent::Named(rule)
    }
}

/// 一条规则行
pub struct Line<N> {
    kind: LineKind,
    content: LineContent<N>,
    action: Option<Action<N>>,
}

/// 有序行：父规则的备选分支
pub fn o<N>(content: impl Into<LineContent<N>>) -> Line<N> {
    Line {
        kind: LineKind::Ordered,
        content: content.into(),
        action: None,
    }
}

/// 内部行：只定义规则
pub fn i<N>(content: impl Into<LineContent<N>>) -> Line<N> {
    Line {
        kind: LineKind::Inner,
        content: content.into(),
        action: None,
    }
}

impl<N> Line<N> {
    /// 附加语义回调
    pub fn with<F>(mut self, action: F) -> Self
    where
        F: Fn(Value<N>, &mut ParseContext<N>) -> Result<Value<N>, ParseError>
            + Send
            + Sync
            + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }
}

/// 编译后的规则
pub(crate) struct RuleDef<N> {
    pub name: String,
    pub alts: Vec<RuleAlt<N>>,
    pub action: Option<Action<N>>,
}

/// 规则的一个备选分支
pub(crate) struct RuleAlt<N> {
    pub expr: PegExpr,
    pub action: Option<Action<N>>,
}

/// 语法的只读核心；解析上下文经 `Arc` 共享
pub(crate) struct GrammarCore<N> {
    pub name: String,
    pub rules: Vec<Arc<RuleDef<N>>>,
    pub index: HashMap<String, usize>,
    pub trace: TraceOpts,
}

/// 编译好的语法。构建一次，只读共享；每次 `parse` 的状态独立。
pub struct Grammar<N> {
    core: Arc<GrammarCore<N>>,
}

impl<N: Clone> Grammar<N> {
    /// 编译规则表；规则文本非法、重名或引用缺失时报错
    pub fn from_lines(name: impl Into<String>, lines: Vec<Line<N>>) -> Result<Self, GrammarError> {
        let name = name.into();
        let mut builder = Builder {
            rules: Vec::new(),
            index: HashMap::new(),
        };
        builder.add_rank(name.clone(), lines)?;
        let core = GrammarCore {
            name,
            rules: builder.rules.into_iter().map(Arc::new).collect(),
            index: builder.index,
            trace: TraceOpts::from_env(),
        };
        validate(&core)?;
        if core.trace.grammar {
            dump(&core);
        }
        Ok(Grammar {
            core: Arc::new(core),
        })
    }

    /// 运行入口规则；必须吃掉整个工作文本
    pub fn parse(&self, stream: &TokenStream) -> Result<Value<N>, ParseError> {
        let mut ctx = ParseContext::new(Arc::clone(&self.core), stream.clone());
        match ctx.apply(0, 0)? {
            Some(m) if m.end == stream.work().len() => Ok(m.value),
            Some(m) => {
                let offset = stream.source_offset(m.end);
                Err(ParseError::at(
                    format!("unconsumed input at offset {}", offset),
                    offset,
                ))
            }
            None => {
                let offset = stream.source_offset(ctx.furthest());
                Err(ParseError::at(
                    format!("expected {} at offset {}", self.core.name, offset),
                    offset,
                ))
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }
}

fn validate<N>(core: &GrammarCore<N>) -> Result<(), GrammarError> {
    if core.rules.is_empty() || core.rules[0].alts.is_empty() {
        return Err(GrammarError::Empty(core.name.clone()));
    }
    for rule in &core.rules {
        for alt in &rule.alts {
            let mut missing = None;
            alt.expr.for_each_ref(&mut |name| {
                if missing.is_none() && !core.index.contains_key(name) {
                    missing = Some(name.to_string());
                }
            });
            if let Some(target) = missing {
                return Err(GrammarError::UnknownReference {
                    rule: rule.name.clone(),
                    target,
                });
            }
        }
    }
    Ok(())
}

/// TRACE=grammar 时打印编译结果
fn dump<N>(core: &GrammarCore<N>) {
    eprintln!("{} {}", "grammar".cyan().bold(), core.name.bold());
    for rule in &core.rules {
        for (idx, alt) in rule.alts.iter().enumerate() {
            let marker = if idx == 0 { "=" } else { "|" };
            eprintln!("  {} {} {}", rule.name.green(), marker, alt.expr);
        }
    }
}

struct Builder<N> {
    rules: Vec<RuleDef<N>>,
    index: HashMap<String, usize>,
}

impl<N> Builder<N> {
    /// 把一张规则表编译成一条 rank 规则：o 行为分支，i 行注册定义
    fn add_rank(&mut self, rank_name: String, lines: Vec<Line<N>>) -> Result<usize, GrammarError> {
        let id = self.reserve(rank_name.clone())?;
        let mut alts = Vec::new();
        for line in lines {
            match (line.kind, line.content) {
                (LineKind::Ordered, LineContent::Expr(src)) => {
                    let expr = self.compile_expr(&rank_name, &src)?;
                    alts.push(RuleAlt {
                        expr,
                        action: line.action,
                    });
                }
                (LineKind::Ordered, LineContent::Named(rule)) => {
                    let child = self.add_named(rule, line.action)?;
                    alts.push(RuleAlt {
                        expr: PegExpr::Ref(child),
                        action: None,
                    });
                }
                (LineKind::Inner, LineContent::Named(rule)) => {
                    self.add_named(rule, line.action)?;
                }
                (LineKind::Inner, LineContent::Expr(src)) => {
                    return Err(GrammarError::BadRuleExpr {
                        rule: rank_name.clone(),
                        message: format!("inner line must be named: '{}'", src),
                    });
                }
            }
        }
        self.rules[id].alts = alts;
        Ok(id)
    }

    fn add_named(
        &mut self,
        rule: NamedRule<N>,
        action: Option<Action<N>>,
    ) -> Result<String, GrammarError> {
        let NamedRule { name, body } = rule;
        match body {
            RuleBody::Expr(src) => {
                let id = self.reserve(name.clone())?;
                let expr = self.compile_expr(&name, &src)?;
                self.rules[id].alts = vec![RuleAlt { expr, action: None }];
                self.rules[id].action = action;
            }
            RuleBody::Rules(lines) => {
                let id = self.add_rank(name.clone(), lines)?;
                self.rules[id].action = action;
            }
        }
        Ok(name)
    }

    fn reserve(&mut self, name: String) -> Result<usize, GrammarError> {
        if self.index.contains_key(&name) {
            return Err(GrammarError::DuplicateRule(name));
        }
        let id = self.rules.len();
        self.rules.push(RuleDef {
            name: name.clone(),
            alts: Vec::new(),
            action: None,
        });
        self.index.insert(name, id);
        Ok(id)
    }

    fn compile_expr(&self, rule: &str, src: &str) -> Result<PegExpr, GrammarError> {
        dsl::parse_rule_expr(src).map_err(|message| GrammarError::BadRuleExpr {
            rule: rule.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试语法的语义节点
    #[derive(Debug, Clone, PartialEq)]
    enum Node {
        Num(i64),
        Add(Box<Node>, Box<Node>),
    }

    fn parse_with(grammar: &Grammar<Node>, text: &str) -> Result<Value<Node>, ParseError> {
        grammar.parse(&TokenStream::raw(text))
    }

    #[test]
    fn test_literals_and_sequences() {
        let grammar: Grammar<Node> =
            Grammar::from_lines("seq", vec![o("'foo' 'bar'")]).expect("grammar");
        let value = parse_with(&grammar, "foobar").expect("parse");
        // 没有任何捕获成员时取整段文本
        assert_eq!(value.text(), "foobar");
        assert!(parse_with(&grammar, "foo").is_err());
        assert!(parse_with(&grammar, "foobarbaz").is_err());
    }

    #[test]
    fn test_choice_order_is_first_match() {
        let grammar: Grammar<Node> =
            Grammar::from_lines("choice", vec![o("'ab' 'c' | 'a' 'bc'")]).expect("grammar");
        assert!(parse_with(&grammar, "abc").is_ok());
    }

    #[test]
    fn test_repetition_and_separator() {
        let grammar: Grammar<Node> = Grammar::from_lines(
            "list",
            vec![o(named("List", "'[' digit+',' ']'")), i(named("digit", "[0-9]"))],
        )
        .expect("grammar");
        assert_eq!(parse_with(&grammar, "[1,2,3]").expect("parse").text(), "123");
        assert_eq!(parse_with(&grammar, "[7]").expect("parse").text(), "7");
        assert!(parse_with(&grammar, "[]").is_err());
        assert!(parse_with(&grammar, "[1,,2]").is_err());
    }

    #[test]
    fn test_count_ranges() {
        let grammar: Grammar<Node> = Grammar::from_lines(
            "hex",
            vec![o(named("Pair", "hex{2,2}")), i(named("hex", "[0-9a-f]"))],
        )
        .expect("grammar");
        assert!(parse_with(&grammar, "3d").is_ok());
        assert!(parse_with(&grammar, "3").is_err());
        assert!(parse_with(&grammar, "3d4").is_err());
    }

    #[test]
    fn test_lookahead_consumes_nothing() {
        let grammar: Grammar<Node> =
            Grammar::from_lines("look", vec![o("(?[0-9]) [0-9] [0-9]")]).expect("grammar");
        assert!(parse_with(&grammar, "42").is_ok());
        assert!(parse_with(&grammar, "x2").is_err());
    }

    #[test]
    fn test_negative_lookahead() {
        let grammar: Grammar<Node> =
            Grammar::from_lines("neg", vec![o("(![0-9] [a-z])+")]).expect("grammar");
        assert!(parse_with(&grammar, "abc").is_ok());
        assert!(parse_with(&grammar, "a1c").is_err());
    }

    #[test]
    fn test_labels_reach_actions() {
        let grammar: Grammar<Node> = Grammar::from_lines(
            "labels",
            vec![o(named("Pair", "k:[a-z] ':' v:[0-9]")).with(|value, _ctx| {
                let key = value.get("k").map(Value::text);
                let val = value.get("v").map(Value::text);
                assert_eq!(key.as_deref(), Some("a"));
                assert_eq!(val.as_deref(), Some("7"));
                Ok(value)
            })],
        )
        .expect("grammar");
        assert!(parse_with(&grammar, "a:7").is_ok());
    }

    #[test]
    fn test_direct_left_recursion_grows_left() {
        // Sum = Sum '+' Num | Num，种子生长应产出左结合链
        let grammar: Grammar<Node> = Grammar::from_lines(
            "sum",
            vec![
                o(named("Sum", "s:(Sum '+' Num) | Num")).with(|value, _ctx| {
                    let pair = value.get("s").map(|pair| {
                        let items = pair.items();
                        (
                            items.first().and_then(Value::node).cloned(),
                            items.get(1).and_then(Value::node).cloned(),
                        )
                    });
                    match pair {
                        Some((Some(lhs), Some(rhs))) => Ok(Value::Node(Node::Add(
                            Box::new(lhs),
                            Box::new(rhs),
                        ))),
                        _ => Ok(value),
                    }
                }),
                i(named("Num", "[0-9]")).with(|value, ctx| {
                    value
                        .text()
                        .parse::<i64>()
                        .map(|n| Value::Node(Node::Num(n)))
                        .map_err(|_| ctx.error("bad number"))
                }),
            ],
        )
        .expect("grammar");

        let value = parse_with(&grammar, "1+2+3").expect("parse");
        let expected = Node::Add(
            Box::new(Node::Add(
                Box::new(Node::Num(1)),
                Box::new(Node::Num(2)),
            )),
            Box::new(Node::Num(3)),
        );
        assert_eq!(value.into_node(), Some(expected));
    }

    #[test]
    fn test_memoization_does_not_change_outcome() {
        // 同一规则在同一位置反复引用，结果应与首次一致
        let grammar: Grammar<Node> = Grammar::from_lines(
            "memo",
            vec![
                o("(?Word) Word"),
                i(named("Word", "[a-z]+")),
            ],
        )
        .expect("grammar");
        assert_eq!(parse_with(&grammar, "abc").expect("parse").text(), "abc");
    }

    #[test]
    fn test_action_error_aborts_parse() {
        // 第一分支命中后回调报错，第二分支本可匹配，但不得再被尝试
        let grammar: Grammar<Node> = Grammar::from_lines(
            "abort",
            vec![
                o(named("Bad", "[0-9]+")).with(|_value, ctx| Err(ctx.error("value out of range"))),
                o(named("Any", "[0-9a-z]+")),
            ],
        )
        .expect("grammar");
        let err = parse_with(&grammar, "123").expect_err("must abort");
        assert_eq!(err.to_string(), "ERROR value out of range");
    }

    #[test]
    fn test_unknown_reference_fails_at_build() {
        let result: Result<Grammar<Node>, _> =
            Grammar::from_lines("bad", vec![o("Missing 'x'")]);
        assert!(matches!(
            result,
            Err(GrammarError::UnknownReference { target, .. }) if target == "Missing"
        ));
    }

    #[test]
    fn test_malformed_rule_fails_at_build() {
        let result: Result<Grammar<Node>, _> = Grammar::from_lines("bad", vec![o("(unclosed")]);
        assert!(matches!(result, Err(GrammarError::BadRuleExpr { .. })));
    }

    #[test]
    fn test_duplicate_rule_name() {
        let result: Result<Grammar<Node>, _> = Grammar::from_lines(
            "dup",
            vec![o(named("R", "'a'")), i(named("R", "'b'"))],
        );
        assert!(matches!(result, Err(GrammarError::DuplicateRule(name)) if name == "R"));
    }

    #[test]
    fn test_underscore_rules_not_captured() {
        let grammar: Grammar<Node> = Grammar::from_lines(
            "unders",
            vec![
                o(named("Pair", "Word _sep Word")).with(|value, _ctx| {
                    // 两个捕获成员：分隔符被剔除
                    assert_eq!(value.items().len(), 2);
                    Ok(value)
                }),
                i(named("Word", "[a-z]+")),
                i(named("_sep", "','")),
            ],
        )
        .expect("grammar");
        assert!(parse_with(&grammar, "ab,cd").is_ok());
    }
}
