//! Parser Expression Tree
//!
//! DSL 编译产物：引擎直接在这棵树上求值。

use std::fmt;

/// 序列成员
#[derive(Debug, Clone, PartialEq)]
pub struct SeqItem {
    /// `label:expr` 捕获标签
    pub label: Option<String>,
    pub expr: PegExpr,
    /// 是否参与父序列的捕获聚合
    pub captured: bool,
}

/// 解析表达式
#[derive(Debug, Clone, PartialEq)]
pub enum PegExpr {
    /// 字符串字面量 `'...'`
    Str(String),
    /// 字符类 `[...]`
    Class(CharClass),
    /// 具名规则引用
    Ref(String),
    /// 顺序组合
    Seq(Vec<SeqItem>),
    /// 有序选择 `a | b`
    Choice(Vec<PegExpr>),
    /// 可选 `e?`
    Opt(Box<PegExpr>),
    /// 重复 `e*` / `e+` / `e{n,m}`，可带分隔符 `e*sep`
    Rep {
        expr: Box<PegExpr>,
        min: usize,
        max: Option<usize>,
        sep: Option<Box<PegExpr>>,
    },
    /// 正前瞻 `(?e)`：只测试，不消费
    Look(Box<PegExpr>),
    /// 负前瞻 `!e`
    Not(Box<PegExpr>),
}

impl PegExpr {
    /// 该表达式在父序列中是否被捕获。
    /// 字面量、前瞻与下划线规则引用不捕获；可选/重复看内部表达式。
    pub fn is_captured(&self) -> bool {
        match self {
            PegExpr::Str(_) | PegExpr::Look(_) | PegExpr::Not(_) => false,
            PegExpr::Ref(name) => !name.starts_with('_'),
            PegExpr::Opt(inner) => inner.is_captured(),
            PegExpr::Rep { expr, .. } => expr.is_captured(),
            PegExpr::Class(_) | PegExpr::Seq(_) | PegExpr::Choice(_) => true,
        }
    }

    /// 遍历所有规则引用名（构建期校验用）
    pub fn for_each_ref(&self, f: &mut impl FnMut(&str)) {
        match self {
            PegExpr::Ref(name) => f(name),
            PegExpr::Seq(items) => {
                for item in items {
                    item.expr.for_each_ref(f);
                }
            }
            PegExpr::Choice(alts) => {
                for alt in alts {
                    alt.for_each_ref(f);
                }
            }
            PegExpr::Opt(e) | PegExpr::Look(e) | PegExpr::Not(e) => e.for_each_ref(f),
            PegExpr::Rep { expr, sep, .. } => {
                expr.for_each_ref(f);
                if let Some(sep) = sep {
                    sep.for_each_ref(f);
                }
            }
            PegExpr::Str(_) | PegExpr::Class(_) => {}
        }
    }
}

/// 字符类成员
#[derive(Debug, Clone, PartialEq)]
pub enum ClassItem {
    /// 单个字符
    Char(char),
    /// 闭区间 `a-z`
    Range(char, char),
    /// `\s` 空白
    Space,
    /// `\S` 非空白
    NotSpace,
    /// `\p{L}` Unicode 字母或下划线
    Letter,
}

impl ClassItem {
    fn matches(&self, ch: char) -> bool {
        match self {
            ClassItem::Char(c) => ch == *c,
            ClassItem::Range(lo, hi) => (*lo..=*hi).contains(&ch),
            ClassItem::Space => ch.is_whitespace(),
            ClassItem::NotSpace => !ch.is_whitespace(),
            ClassItem::Letter => ch.is_alphabetic() || ch == '_',
        }
    }
}

/// 字符类：任一成员命中即匹配；`negated` 取反
#[derive(Debug, Clone, PartialEq)]
pub struct CharClass {
    pub negated: bool,
    pub items: Vec<ClassItem>,
}

impl CharClass {
    pub fn matches(&self, ch: char) -> bool {
        let hit = self.items.iter().any(|item| item.matches(ch));
        hit != self.negated
    }
}

// Display 还原出近似的 DSL 文本，TRACE=grammar 时用来打印编译结果。

impl fmt::Display for PegExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PegExpr::Str(s) => write!(f, "'{}'", s.escape_debug()),
            PegExpr::Class(c) => write!(f, "{}", c),
            PegExpr::Ref(name) => write!(f, "{}", name),
            PegExpr::Seq(items) => {
                let mut first = true;
                for item in items {
                    if !first {
                        write!(f, " ")?;
                    }
                    first = false;
                    if let Some(label) = &item.label {
                        write!(f, "{}:", label)?;
                    }
                    match &item.expr {
                        e @ (PegExpr::Choice(_) | PegExpr::Seq(_)) => write!(f, "({})", e)?,
                        e => write!(f, "{}", e)?,
                    }
                }
                Ok(())
            }
            PegExpr::Choice(alts) => {
                let mut first = true;
                for alt in alts {
                    if !first {
                        write!(f, " | ")?;
                    }
                    first = false;
                    match alt {
                        e @ PegExpr::Choice(_) => write!(f, "({})", e)?,
                        e => write!(f, "{}", e)?,
                    }
                }
                Ok(())
            }
            PegExpr::Opt(e) => write!(f, "{}?", Grouped(e)),
            PegExpr::Rep {
                expr,
                min,
                max,
                sep,
            } => {
                write!(f, "{}", Grouped(expr))?;
                match (min, max) {
                    (0, None) => write!(f, "*")?,
                    (1, None) => write!(f, "+")?,
                    (n, None) => write!(f, "{{{},}}", n)?,
                    (n, Some(m)) => write!(f, "{{{},{}}}", n, m)?,
                }
                if let Some(sep) = sep {
                    write!(f, "{}", Grouped(sep))?;
                }
                Ok(())
            }
            PegExpr::Look(e) => write!(f, "(?{})", e),
            PegExpr::Not(e) => write!(f, "!{}", Grouped(e)),
        }
    }
}

/// 复合子表达式打印时加括号
struct Grouped<'a>(&'a PegExpr);

impl fmt::Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            e @ (PegExpr::Choice(_) | PegExpr::Seq(_)) => write!(f, "({})", e),
            e => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if self.negated {
            write!(f, "^")?;
        }
        for item in &self.items {
            match item {
                ClassItem::Char(c) => write!(f, "{}", c.escape_debug())?,
                ClassItem::Range(lo, hi) => {
                    write!(f, "{}-{}", lo.escape_debug(), hi.escape_debug())?
                }
                ClassItem::Space => write!(f, r"\s")?,
                ClassItem::NotSpace => write!(f, r"\S")?,
                ClassItem::Letter => write!(f, r"\p{{L}}")?,
            }
        }
        write!(f, "]")
    }
}
