//! Lexer - 记号流适配层
//!
//! 形式语法分词：logos 扫描 Go 族记号，适配层按 Go 规则在行尾/文件尾
//! 补分号，然后把记号重新拼成引擎要的工作文本。
//!
//! 拼接规则只有一条：两个记号相邻的字符都是词形字符（字母/数字/下划线）
//! 时补一个空格，其余一律紧贴。于是 `math . Atan2` 还原成 `math.Atan2`，
//! `- 1234` 还原成 `-1234`，而 `chan int` 保住分隔。语法按字符匹配
//! 工作文本，错误位置经映射表折回源码偏移。
//!
//! 扫描是宽容的：`'\400'` 这类非法转义保留原文交给语法层，
//! 由语义动作给出稳定的错误消息。

use jade_peg::{ParseError, TokenStream};
use logos::Logos;

/// 记号种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword,
    Int,
    Float,
    Imag,
    Rune,
    Str,
    Punct,
    Semicolon,
}

/// 一个记号：种类、原文、源码字节偏移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

/// Go 关键字表；词法上它们也是标识符，适配层只标种类
const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    #[token("\n")]
    Newline,

    // 含换行的块注释等价于一个换行（分号插入用）
    #[regex(r"/\*([^*]+|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,

    #[regex(r"0[bB]_?[01](_?[01])*|0[oO]_?[0-7](_?[0-7])*|0[xX]_?[0-9a-fA-F](_?[0-9a-fA-F])*|[0-9](_?[0-9])*")]
    Int,

    #[regex(r"([0-9](_?[0-9])*)?\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?|[0-9](_?[0-9])*\.([0-9](_?[0-9])*)?([eE][+-]?[0-9](_?[0-9])*)?|[0-9](_?[0-9])*[eE][+-]?[0-9](_?[0-9])*|0[xX][0-9a-fA-F_]*\.?[0-9a-fA-F_]*[pP][+-]?[0-9](_?[0-9])*")]
    Float,

    #[regex(r"(([0-9](_?[0-9])*)?\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?|[0-9](_?[0-9])*\.([0-9](_?[0-9])*)?([eE][+-]?[0-9](_?[0-9])*)?|[0-9](_?[0-9])*[eE][+-]?[0-9](_?[0-9])*|0[xX][0-9a-fA-F_]*\.?[0-9a-fA-F_]*[pP][+-]?[0-9](_?[0-9])*|0[bB]_?[01](_?[01])*|0[oO]_?[0-7](_?[0-7])*|0[xX]_?[0-9a-fA-F](_?[0-9a-fA-F])*|[0-9](_?[0-9])*)i")]
    Imag,

    // 宽容的字符字面量；`'''` 整体收下，内容合法性由语法层裁决
    #[regex(r"'''|'(\\[^\n]+|[^\n'])*'")]
    Rune,

    #[regex(r"`[^`]*`")]
    RawString,

    #[regex(r#""(\\[^\n]|[^"\\\n])*""#)]
    InterpString,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&^")]
    AmpCaret,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<-")]
    Arrow,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("=")]
    Assign,
    #[token(":=")]
    Define,
    #[token("!")]
    Bang,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
}

/// 把源码扫成记号序列；扫不动的字符立刻报错
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                return Err(ParseError::at(
                    format!("invalid token at offset {}", span.start),
                    span.start,
                ))
            }
        };
        match raw {
            RawToken::Newline => maybe_insert_semicolon(&mut tokens, span.start),
            RawToken::BlockComment => {
                if lexer.slice().contains('\n') {
                    maybe_insert_semicolon(&mut tokens, span.start);
                }
            }
            _ => tokens.push(Token {
                kind: classify(raw, lexer.slice()),
                text: lexer.slice().to_string(),
                offset: span.start,
            }),
        }
    }
    maybe_insert_semicolon(&mut tokens, source.len());
    Ok(tokens)
}

/// 组装工作文本与偏移映射
pub fn stream(tokens: &[Token]) -> TokenStream {
    let mut work = String::new();
    let mut map = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (Some(prev), Some(next)) = (work.chars().last(), token.text.chars().next()) {
            if is_wordlike(prev) && is_wordlike(next) {
                work.push(' ');
            }
        }
        map.push((work.len(), token.offset));
        work.push_str(&token.text);
    }
    TokenStream::new(work, map)
}

fn classify(raw: RawToken, text: &str) -> TokenKind {
    match raw {
        RawToken::Ident => {
            if KEYWORDS.contains(&text) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            }
        }
        RawToken::Int => TokenKind::Int,
        RawToken::Float => TokenKind::Float,
        RawToken::Imag => TokenKind::Imag,
        RawToken::Rune => TokenKind::Rune,
        RawToken::RawString | RawToken::InterpString => TokenKind::Str,
        RawToken::Semicolon => TokenKind::Semicolon,
        _ => TokenKind::Punct,
    }
}

/// Go 的分号插入规则：行尾/文件尾，且末记号能结束语句
fn maybe_insert_semicolon(tokens: &mut Vec<Token>, offset: usize) {
    let insert = match tokens.last() {
        Some(last) => match last.kind {
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Rune
            | TokenKind::Str => true,
            TokenKind::Keyword => matches!(
                last.text.as_str(),
                "break" | "continue" | "fallthrough" | "return"
            ),
            TokenKind::Punct => matches!(last.text.as_str(), ")" | "]" | "}" | "++" | "--"),
            TokenKind::Semicolon => false,
        },
        None => false,
    };
    if insert {
        tokens.push(Token {
            kind: TokenKind::Semicolon,
            text: ";".to_string(),
            offset,
        });
    }
}

fn is_wordlike(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
