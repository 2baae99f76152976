//! Rule Expression DSL
//!
//! 把规则体字符串（如 `"bx:(Expression binary_op Expression) | ux:UnaryExpr"`）
//! 解析为 [`PegExpr`] 树。语法：
//!
//! - 空白分隔序列，`|` 选择，`(...)` 分组
//! - 后缀 `?` `*` `+` `{n,m}`；`*sep` / `+sep` 重复带分隔符
//! - `label:expr` 标签捕获；`(?expr)` 正前瞻；`!expr` 负前瞻
//! - `'...'` 字面量；`[...]` 字符类（区间、取反、`\x{..}`、`\s` `\S` `\p{L}`）

use chumsky::prelude::*;

use crate::expr::{CharClass, ClassItem, PegExpr, SeqItem};

/// 后缀算子
#[derive(Clone)]
enum Postfix {
    Opt,
    Rep {
        min: usize,
        max: Option<usize>,
        sep: Option<PegExpr>,
    },
}

impl Postfix {
    fn rep(
        min: usize,
        max: Option<usize>,
        sep: Option<PegExpr>,
        range: Option<(usize, Option<usize>)>,
    ) -> Self {
        match range {
            Some((lo, hi)) => Postfix::Rep { min: lo, max: hi, sep },
            None => Postfix::Rep { min, max, sep },
        }
    }

    fn apply(self, expr: PegExpr) -> PegExpr {
        match self {
            Postfix::Opt => PegExpr::Opt(Box::new(expr)),
            Postfix::Rep { min, max, sep } => PegExpr::Rep {
                expr: Box::new(expr),
                min,
                max,
                sep: sep.map(Box::new),
            },
        }
    }
}

/// 解析一条规则体
pub fn parse_rule_expr(src: &str) -> Result<PegExpr, String> {
    parser().parse(src).map_err(|errs| {
        errs.into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    })
}

fn parser() -> impl Parser<char, PegExpr, Error = Simple<char>> {
    rule_expr().padded().then_ignore(end())
}

fn rule_expr() -> impl Parser<char, PegExpr, Error = Simple<char>> {
    recursive(|expr| {
        let ident = filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
            .chain::<char, _, _>(
                filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_').repeated(),
            )
            .collect::<String>()
            .boxed();

        // '...' 字面量
        let str_escape = just('\\').ignore_then(choice((
            just('\\').to('\\'),
            just('\'').to('\''),
            just('"').to('"'),
            just('n').to('\n'),
            just('t').to('\t'),
            just('r').to('\r'),
        )));
        let quoted = just('\'')
            .ignore_then(
                choice((str_escape, filter(|c: &char| *c != '\'' && *c != '\\'))).repeated(),
            )
            .then_ignore(just('\''))
            .collect::<String>()
            .boxed();

        // [...] 字符类：先按转义对收集原文，再细解
        let class_chunk = choice((
            just('\\').chain(any()),
            none_of("]").map(|c| vec![c]),
        ));
        let class = just('[')
            .ignore_then(just('^').or_not())
            .then(
                class_chunk
                    .repeated()
                    .map(|chunks: Vec<Vec<char>>| chunks.into_iter().flatten().collect::<String>()),
            )
            .then_ignore(just(']'))
            .try_map(|(negated, body), span| {
                parse_class_body(&body)
                    .map(|items| {
                        PegExpr::Class(CharClass {
                            negated: negated.is_some(),
                            items,
                        })
                    })
                    .map_err(|msg| Simple::custom(span, msg))
            });

        let number = filter(|c: &char| c.is_ascii_digit())
            .repeated()
            .at_least(1)
            .collect::<String>()
            .try_map(|s: String, span| {
                s.parse::<usize>()
                    .map_err(|e| Simple::custom(span, e.to_string()))
            })
            .boxed();

        // {n,m} / {n,} / {n}
        let count_range = just('{')
            .ignore_then(number.clone())
            .then(just(',').ignore_then(number.or_not()).or_not())
            .then_ignore(just('}'))
            .map(|(min, rest)| match rest {
                None => (min, Some(min)),
                Some(None) => (min, None),
                Some(Some(max)) => (min, Some(max)),
            })
            .boxed();

        let group_look = just('(')
            .ignore_then(just('?'))
            .ignore_then(expr.clone())
            .then_ignore(just(')'))
            .map(|e| PegExpr::Look(Box::new(e)));
        let group = expr.clone().delimited_by(just('('), just(')'));

        let atom = choice((
            group_look,
            group,
            quoted.clone().map(PegExpr::Str),
            class,
            ident.clone().map(PegExpr::Ref),
        ));

        // 重复分隔符紧跟在 * / + 之后，不允许空白
        let sep_ref = choice((
            quoted.clone().map(PegExpr::Str),
            ident.clone().map(PegExpr::Ref),
        ))
        .boxed();

        let postfix = choice((
            just('?').to(Postfix::Opt).boxed(),
            just('*')
                .ignore_then(sep_ref.clone().or_not())
                .then(count_range.clone().or_not())
                .map(|(sep, range)| Postfix::rep(0, None, sep, range))
                .boxed(),
            just('+')
                .ignore_then(sep_ref.or_not())
                .then(count_range.clone().or_not())
                .map(|(sep, range)| Postfix::rep(1, None, sep, range))
                .boxed(),
            count_range
                .map(|(min, max)| Postfix::Rep { min, max, sep: None })
                .boxed(),
        ));

        let postfixed = atom
            .then(postfix.repeated())
            .foldl(|expr, p: Postfix| p.apply(expr));

        let prefixed = just('!').or_not().then(postfixed).map(|(neg, e)| {
            if neg.is_some() {
                PegExpr::Not(Box::new(e))
            } else {
                e
            }
        });

        let seq_item = ident
            .then_ignore(just(':'))
            .or_not()
            .then(prefixed)
            .padded()
            .map(|(label, expr)| {
                let captured = expr.is_captured();
                SeqItem {
                    label,
                    expr,
                    captured,
                }
            });

        let sequence = seq_item
            .repeated()
            .at_least(1)
            .map(|mut items: Vec<SeqItem>| {
                if items.len() == 1 && items[0].label.is_none() {
                    items.remove(0).expr
                } else {
                    PegExpr::Seq(items)
                }
            });

        sequence
            .separated_by(just('|').padded())
            .at_least(1)
            .map(|mut alts: Vec<PegExpr>| {
                if alts.len() == 1 {
                    alts.remove(0)
                } else {
                    PegExpr::Choice(alts)
                }
            })
    })
}

/// 细解字符类正文（`[` `]` 与取反号已剥掉）
fn parse_class_body(body: &str) -> Result<Vec<ClassItem>, String> {
    // (成员, 是否转义而来)：转义的 '-' 不作区间算子
    let mut elems: Vec<(ClassItem, bool)> = Vec::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            elems.push((ClassItem::Char(c), false));
            continue;
        }
        let item = match chars.next() {
            Some('n') => ClassItem::Char('\n'),
            Some('t') => ClassItem::Char('\t'),
            Some('r') => ClassItem::Char('\r'),
            Some('\\') => ClassItem::Char('\\'),
            Some(']') => ClassItem::Char(']'),
            Some('^') => ClassItem::Char('^'),
            Some('-') => ClassItem::Char('-'),
            Some('\'') => ClassItem::Char('\''),
            Some('s') => ClassItem::Space,
            Some('S') => ClassItem::NotSpace,
            Some('p') => {
                let name = braced_group(&mut chars, "\\p")?;
                if name != "L" {
                    return Err(format!("unsupported class \\p{{{}}}", name));
                }
                ClassItem::Letter
            }
            Some('x') => {
                let hex = braced_group(&mut chars, "\\x")?;
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("bad code point '{}'", hex))?;
                char::from_u32(code)
                    .map(ClassItem::Char)
                    .ok_or_else(|| format!("bad code point '{}'", hex))?
            }
            Some(other) => ClassItem::Char(other),
            None => return Err("dangling escape in character class".to_string()),
        };
        elems.push((item, true));
    }

    // X-Y 区间；首尾或转义的 '-' 保持字面量
    let mut items = Vec::new();
    let mut idx = 0;
    while idx < elems.len() {
        if idx + 2 < elems.len() && matches!(elems[idx + 1], (ClassItem::Char('-'), false)) {
            if let ((ClassItem::Char(lo), _), (ClassItem::Char(hi), _)) =
                (&elems[idx], &elems[idx + 2])
            {
                items.push(ClassItem::Range(*lo, *hi));
                idx += 3;
                continue;
            }
        }
        items.push(elems[idx].0.clone());
        idx += 1;
    }
    Ok(items)
}

fn braced_group(chars: &mut std::str::Chars<'_>, what: &str) -> Result<String, String> {
    if chars.next() != Some('{') {
        return Err(format!("expected '{{' after {}", what));
    }
    let mut body = String::new();
    for c in chars {
        if c == '}' {
            return Ok(body);
        }
        body.push(c);
    }
    Err(format!("unterminated {}{{...}}", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> PegExpr {
        match parse_rule_expr(src) {
            Ok(e) => e,
            Err(e) => panic!("failed to parse {:?}: {}", src, e),
        }
    }

    #[test]
    fn test_sequence_and_refs() {
        let e = parse("SimpleStmt _semicolon?");
        match e {
            PegExpr::Seq(items) => {
                assert_eq!(items.len(), 2);
                assert!(items[0].captured);
                assert!(!items[1].captured); // 下划线规则不捕获
            }
            other => panic!("expected Seq, got {:?}", other),
        }
    }

    #[test]
    fn test_alternation_of_literals() {
        let e = parse("'>='|'>'|'<='|'<'|'!='|'=='");
        match e {
            PegExpr::Choice(alts) => assert_eq!(alts.len(), 6),
            other => panic!("expected Choice, got {:?}", other),
        }
    }

    #[test]
    fn test_labels() {
        let e = parse("bx:(Expression binary_op Expression) | ux:UnaryExpr");
        match e {
            PegExpr::Choice(alts) => {
                assert!(matches!(&alts[0], PegExpr::Seq(items) if items[0].label.as_deref() == Some("bx")));
                assert!(matches!(&alts[1], PegExpr::Seq(items) if items[0].label.as_deref() == Some("ux")));
            }
            other => panic!("expected Choice, got {:?}", other),
        }
    }

    #[test]
    fn test_repetition_with_separator_and_range() {
        let e = parse("(Expression?)*':'{2,3}");
        match e {
            PegExpr::Rep { min, max, sep, .. } => {
                assert_eq!(min, 2);
                assert_eq!(max, Some(3));
                assert_eq!(sep.as_deref(), Some(&PegExpr::Str(":".to_string())));
            }
            other => panic!("expected Rep, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_separator() {
        let e = parse("Statement*_semicolon");
        match e {
            PegExpr::Rep { min, sep, .. } => {
                assert_eq!(min, 0);
                assert_eq!(sep.as_deref(), Some(&PegExpr::Ref("_semicolon".to_string())));
            }
            other => panic!("expected Rep, got {:?}", other),
        }
    }

    #[test]
    fn test_lookahead_and_negation() {
        assert!(matches!(parse("(?[0-9.])"), PegExpr::Look(_)));
        assert!(matches!(parse("!'\"'"), PegExpr::Not(_)));
        assert!(matches!(
            parse(r"a:'\\' (?octal_digit{4,})"),
            PegExpr::Seq(_)
        ));
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(parse(r"'\''"), PegExpr::Str("'".to_string()));
        assert_eq!(parse(r"'\\'"), PegExpr::Str("\\".to_string()));
        assert_eq!(parse(r"'\\x'"), PegExpr::Str("\\x".to_string()));
        assert_eq!(parse("'\\t'"), PegExpr::Str("\t".to_string()));
    }

    #[test]
    fn test_class_items() {
        let e = parse(r"[^0-9 \t\n\r+(){}[\]<>-]");
        match e {
            PegExpr::Class(c) => {
                assert!(c.negated);
                assert!(!c.matches('5'));
                assert!(!c.matches(' '));
                assert!(!c.matches('('));
                assert!(!c.matches(']'));
                assert!(!c.matches('-'));
                assert!(c.matches('a'));
                assert!(c.matches('本'));
            }
            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_code_point_and_perl() {
        assert!(matches!(parse(r"[\x{0a}]"), PegExpr::Class(c) if c.matches('\n')));
        assert!(matches!(parse(r"[\s\S]"), PegExpr::Class(c) if c.matches('x') && c.matches(' ')));
        assert!(matches!(parse(r"[\p{L}_]"), PegExpr::Class(c) if c.matches('ä') && c.matches('_')));
    }

    #[test]
    fn test_malformed_is_rejected() {
        assert!(parse_rule_expr("(unclosed").is_err());
        assert!(parse_rule_expr("[unclosed").is_err());
        assert!(parse_rule_expr("").is_err());
    }
}
