//! Expression Nodes
//!
//! 解析器产出的表达式节点。类型表达式也是表达式（与 Go AST 一致），
//! 因此一个枚举同时覆盖值表达式与类型位置。
//!
//! 每个节点的 `Display` 是它的规范文本形式：测试以字符串相等断言结构，
//! 规范形式经解析必须得到同一棵树（verse 标记除外）。

use std::fmt;

/// 字面量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Int,
    Float,
    Imag,
    Char,
    String,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Word::Int => "INT",
            Word::Float => "FLOAT",
            Word::Imag => "IMAG",
            Word::Char => "CHAR",
            Word::String => "STRING",
        };
        write!(f, "{}", name)
    }
}

/// 标识符的来源标记。解析器只造新名字，恒为 0；
/// 文本形式 `<VPUverse(0)>` 是外部解析层留下的排印约定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerseTag(pub u32);

impl fmt::Display for VerseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<VPUverse({})>", self.0)
    }
}

/// 信道方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// 解析自 `chan<- T`
    Send,
    /// 解析自 `<-chan T`
    Recv,
}

/// 表达式节点
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 空输入哨兵，渲染为空串
    Blank,
    /// 字面量；`value` 是规范化文本（小写进制前缀、去下划线等）
    BasicLit { kind: Word, value: String },
    /// 标识符引用
    Name { name: String, verse: VerseTag },
    /// 前缀 `+ - ! ^ <-`
    Unary { op: String, x: Box<Expr> },
    /// 二元运算
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// 前缀 `*`：解引用与指针类型共用
    Star { x: Box<Expr> },
    /// 前缀 `&`
    Ref { x: Box<Expr> },
    /// `x.sel`
    Selector { x: Box<Expr>, sel: String },
    /// 调用；`variadic` 表示实参列表带 `...`
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        variadic: bool,
    },
    /// `x[i]`
    Index { x: Box<Expr>, index: Box<Expr> },
    /// 二或三下标切片
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    /// `x.(T)`
    TypeAssert { x: Box<Expr>, typ: Box<Expr> },
    /// 复合字面量；`typ` 为空表示嵌套的裸 `{...}`
    CompositeLit {
        typ: Option<Box<Expr>>,
        elts: Vec<Expr>,
    },
    /// 复合字面量元素 `k: v`
    KeyValue { key: Box<Expr>, value: Box<Expr> },
    /// 预声明标量类型引用
    ConstType { name: String },
    /// `[N]T`；`len` 为空表示 `[...]T`
    ArrayType {
        len: Option<Box<Expr>>,
        elt: Box<Expr>,
    },
    /// `[]T`
    SliceType { elt: Box<Expr> },
    /// `map[K]V`
    MapType { key: Box<Expr>, value: Box<Expr> },
    /// 信道类型
    ChanType { dir: ChanDir, elt: Box<Expr> },
    /// 函数签名；成员都是 `FieldType`
    FuncType {
        params: Vec<Expr>,
        results: Vec<Expr>,
    },
    /// 结构体类型；成员都是 `FieldType`
    StructType { fields: Vec<Expr> },
    /// 参数/字段声明组
    FieldType {
        names: Vec<String>,
        typ: Box<Expr>,
        variadic: bool,
    },
}

impl Expr {
    /// 空输入哨兵判定（parsesAsNil）
    pub fn is_blank(&self) -> bool {
        matches!(self, Expr::Blank)
    }

    /// 字面量种类（如果是字面量）
    pub fn lit_kind(&self) -> Option<Word> {
        match self {
            Expr::BasicLit { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

fn join(items: &[Expr], sep: &str) -> String {
    items
        .iter()
        .map(Expr::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Blank => Ok(()),
            Expr::BasicLit { value, .. } => write!(f, "{}", value),
            Expr::Name { name, verse } => write!(f, "{}{}", name, verse),
            Expr::Unary { op, x } => write!(f, "{}{}", op, x),
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Expr::Star { x } => write!(f, "*{}", x),
            Expr::Ref { x } => write!(f, "&{}", x),
            Expr::Selector { x, sel } => write!(f, "{}.{}", x, sel),
            Expr::Call {
                func,
                args,
                variadic,
            } => {
                write!(f, "{}({}", func, join(args, ", "))?;
                if *variadic {
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
            Expr::Index { x, index } => write!(f, "{}[{}]", x, index),
            Expr::Slice { x, low, high, max } => {
                write!(f, "{}[", x)?;
                if let Some(low) = low {
                    write!(f, "{}", low)?;
                }
                write!(f, ":")?;
                if let Some(high) = high {
                    write!(f, "{}", high)?;
                }
                if let Some(max) = max {
                    write!(f, ":{}", max)?;
                }
                write!(f, "]")
            }
            Expr::TypeAssert { x, typ } => write!(f, "{}.({})", x, typ),
            Expr::CompositeLit { typ, elts } => {
                if let Some(typ) = typ {
                    write!(f, "{}", typ)?;
                }
                write!(f, "{{{}}}", join(elts, ", "))
            }
            Expr::KeyValue { key, value } => write!(f, "{}: {}", key, value),
            Expr::ConstType { name } => write!(f, "(const-type {})", name),
            Expr::ArrayType { len, elt } => match len {
                Some(len) => write!(f, "[{}]{}", len, elt),
                None => write!(f, "[...]{}", elt),
            },
            Expr::SliceType { elt } => write!(f, "[]{}", elt),
            Expr::MapType { key, value } => write!(f, "map[{}] {}", key, value),
            // 方向互换是既定排印：<-chan 解析进来印成 chan<-，反之亦然
            Expr::ChanType { dir, elt } => match dir {
                ChanDir::Both => write!(f, "chan {}", elt),
                ChanDir::Recv => write!(f, "chan<- {}", elt),
                ChanDir::Send => write!(f, "<-chan {}", elt),
            },
            Expr::FuncType { params, results } => {
                write!(f, "func({})", join(params, ", "))?;
                match results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", results[0]),
                    _ => write!(f, " ({})", join(results, ", ")),
                }
            }
            Expr::StructType { fields } => {
                if fields.is_empty() {
                    write!(f, "struct {{}}")
                } else {
                    write!(f, "struct {{ {} }}", join(fields, "; "))
                }
            }
            Expr::FieldType {
                names,
                typ,
                variadic,
            } => {
                if !names.is_empty() {
                    write!(f, "{} ", names.join(", "))?;
                }
                if *variadic {
                    write!(f, "...")?;
                }
                write!(f, "{}", typ)
            }
        }
    }
}
