//! Semantic Actions
//!
//! 规则回调：把匹配值折成 AST 节点。命名与规则对应（`f_xxx` 直接挂在
//! 规则上，`ff_xxx` 是带参的回调工厂）。数值动作只看 `ctx.matched_text()`
//! 拿整段原文，结构动作按标签读捕获值。
//!
//! 任何 `Err(ctx.error(..))` 都立即终止整个解析；字面量合法性检查的
//! 错误消息是对外契约，一字不差。

use jade_peg::{ParseContext, ParseError, Value};

use crate::ast::{ChanDir, Expr, VerseTag, Word};
use crate::floatfmt;

type V = Value<Expr>;
type Ctx = ParseContext<Expr>;
type ActionResult = Result<V, ParseError>;

/// 预声明标量类型：类型位置渲染成 `(const-type <name>)`
const CONST_TYPES: &[&str] = &[
    "bool", "byte", "error", "float32", "float64", "int", "int8", "int16", "int32", "int64",
    "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
];

fn tagged_node(value: &V, label: &str) -> Option<Expr> {
    value.get(label).and_then(Value::node).cloned()
}

// ---------------------------------------------------------------------------
// 表达式骨架
// ---------------------------------------------------------------------------

/// 运算符优先级（Go 的五级表）
fn precedence(op: &str) -> u8 {
    match op {
        "*" | "/" | "%" | "<<" | ">>" | "&" | "&^" => 5,
        "+" | "-" | "|" | "^" => 4,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "&&" => 2,
        "||" => 1,
        _ => 0,
    }
}

/// 左递归生长出的右倾链按优先级重结合：右孩子是不高于当前算子的
/// 二元节点时左旋，先沿它的左脊递归折叠，同级左结合。
fn fold_binary(lhs: Expr, op: String, rhs: Expr) -> Expr {
    match rhs {
        Expr::Binary {
            op: rop,
            lhs: rlhs,
            rhs: rrhs,
        } if precedence(&rop) <= precedence(&op) => {
            let folded = fold_binary(lhs, op, *rlhs);
            fold_binary(folded, rop, *rrhs)
        }
        rhs => Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    }
}

pub(crate) fn f_expression(value: V, ctx: &mut Ctx) -> ActionResult {
    if let Some(bx) = value.get("bx") {
        let items = bx.items();
        let lhs = items.first().and_then(Value::node);
        let op = items.get(1).map(Value::text);
        let rhs = items.get(2).and_then(Value::node);
        return match (lhs, op, rhs) {
            (Some(lhs), Some(op), Some(rhs)) => {
                Ok(Value::Node(fold_binary(lhs.clone(), op, rhs.clone())))
            }
            _ => Err(ctx.error("malformed binary expression")),
        };
    }
    if let Some(ux) = value.get("ux") {
        return match ux.node() {
            Some(node) => Ok(Value::Node(node.clone())),
            None => Err(ctx.error("malformed expression")),
        };
    }
    Ok(value)
}

pub(crate) fn f_unary(value: V, ctx: &mut Ctx) -> ActionResult {
    let parts = value.get("ux").map(|ux| {
        let items = ux.items();
        (
            items.first().map(Value::text).unwrap_or_default(),
            items.get(1).and_then(Value::node).cloned(),
        )
    });
    let Some((op, operand)) = parts else {
        return Ok(value); // PrimaryExpr 分支原样通过
    };
    let Some(x) = operand else {
        return Err(ctx.error("malformed unary expression"));
    };
    let x = Box::new(x);
    Ok(Value::Node(match op.as_str() {
        "*" => Expr::Star { x },
        "&" => Expr::Ref { x },
        _ => Expr::Unary { op, x },
    }))
}

// ---------------------------------------------------------------------------
// PrimaryExpr 链
// ---------------------------------------------------------------------------

pub(crate) fn f_primary_arguments(value: V, ctx: &mut Ctx) -> ActionResult {
    let Some(func) = tagged_node(&value, "p") else {
        return Err(ctx.error("malformed call expression"));
    };
    let mut args = Vec::new();
    let mut variadic = false;
    if let Some(arguments) = value.get("a") {
        if !arguments.is_nothing() {
            if let Some(list) = arguments.get("Args") {
                for item in list.items() {
                    match item.node() {
                        Some(node) => args.push(node.clone()),
                        None => return Err(ctx.error("malformed call argument")),
                    }
                }
            }
            variadic = matches!(arguments.get("Varg"), Some(v) if !v.is_nothing());
        }
    }
    Ok(Value::Node(Expr::Call {
        func: Box::new(func),
        args,
        variadic,
    }))
}

pub(crate) fn f_primary_index(value: V, ctx: &mut Ctx) -> ActionResult {
    match (tagged_node(&value, "p"), tagged_node(&value, "i")) {
        (Some(x), Some(index)) => Ok(Value::Node(Expr::Index {
            x: Box::new(x),
            index: Box::new(index),
        })),
        _ => Err(ctx.error("malformed index expression")),
    }
}

pub(crate) fn f_primary_slice(value: V, ctx: &mut Ctx) -> ActionResult {
    let Some(x) = tagged_node(&value, "p") else {
        return Err(ctx.error("malformed slice expression"));
    };
    let parts: Vec<Option<Expr>> = value
        .get("s")
        .map(|s| s.items().iter().map(|v| v.node().cloned()).collect())
        .unwrap_or_default();
    if !(2..=3).contains(&parts.len()) {
        return Err(ctx.error("malformed slice expression"));
    }
    let boxed = |part: &Option<Expr>| part.clone().map(Box::new);
    Ok(Value::Node(Expr::Slice {
        x: Box::new(x),
        low: boxed(&parts[0]),
        high: boxed(&parts[1]),
        max: parts.get(2).and_then(boxed),
    }))
}

pub(crate) fn f_primary_type_assert(value: V, ctx: &mut Ctx) -> ActionResult {
    match (tagged_node(&value, "p"), tagged_node(&value, "t")) {
        (Some(x), Some(typ)) => Ok(Value::Node(Expr::TypeAssert {
            x: Box::new(x),
            typ: Box::new(typ),
        })),
        _ => Err(ctx.error("malformed type assertion")),
    }
}

pub(crate) fn f_primary_selector(value: V, ctx: &mut Ctx) -> ActionResult {
    let Some(x) = tagged_node(&value, "p") else {
        return Err(ctx.error("malformed selector expression"));
    };
    match value.get("s").and_then(Value::node) {
        Some(Expr::Name { name, .. }) => Ok(Value::Node(Expr::Selector {
            x: Box::new(x),
            sel: name.clone(),
        })),
        _ => Err(ctx.error("malformed selector expression")),
    }
}

/// 包限定名在这一层就是选择子表达式
pub(crate) fn f_qualified_ident(value: V, ctx: &mut Ctx) -> ActionResult {
    let package = tagged_node(&value, "p");
    let ident = value.get("i").and_then(Value::node);
    match (package, ident) {
        (Some(package), Some(Expr::Name { name, .. })) => Ok(Value::Node(Expr::Selector {
            x: Box::new(package),
            sel: name.clone(),
        })),
        _ => Err(ctx.error("malformed qualified identifier")),
    }
}

pub(crate) fn f_identifier(_value: V, ctx: &mut Ctx) -> ActionResult {
    Ok(Value::Node(Expr::Name {
        name: ctx.matched_text().to_string(),
        verse: VerseTag::default(),
    }))
}

// ---------------------------------------------------------------------------
// 数值字面量
// ---------------------------------------------------------------------------

fn strip_int_prefix(text: &str) -> &str {
    let mut chars = text.chars();
    if chars.next() == Some('0')
        && matches!(chars.next(), Some('b' | 'B' | 'o' | 'O' | 'x' | 'X'))
    {
        &text[2..]
    } else {
        text
    }
}

/// 整数字面量：按基数取值，以最小规范前缀重排印。
/// 超出 64 位无符号范围报 `value out of range`。
pub(crate) fn ff_int(base: u32) -> impl Fn(V, &mut Ctx) -> ActionResult + Send + Sync {
    move |_value, ctx| {
        let text = ctx.matched_text().to_string();
        let digits = strip_int_prefix(&text).replace('_', "");
        let parsed =
            u64::from_str_radix(&digits, base).map_err(|_| ctx.error("value out of range"))?;
        let value = match base {
            2 => format!("0b{:b}", parsed),
            8 => format!("0o{:o}", parsed),
            16 => format!("0x{:x}", parsed),
            _ => parsed.to_string(),
        };
        Ok(Value::Node(Expr::BasicLit {
            kind: Word::Int,
            value,
        }))
    }
}

pub(crate) fn f_decimal_float(_value: V, ctx: &mut Ctx) -> ActionResult {
    let text = ctx.matched_text().replace('_', "");
    let parsed: f64 = text
        .parse()
        .map_err(|_| ctx.error("malformed float literal"))?;
    Ok(Value::Node(Expr::BasicLit {
        kind: Word::Float,
        value: floatfmt::go_g(parsed),
    }))
}

pub(crate) fn f_hex_float(_value: V, ctx: &mut Ctx) -> ActionResult {
    let text = ctx.matched_text().replace('_', "");
    let parsed = floatfmt::parse_hex_float(&text)
        .ok_or_else(|| ctx.error("malformed hexadecimal float literal"))?;
    Ok(Value::Node(Expr::BasicLit {
        kind: Word::Float,
        value: floatfmt::go_x(parsed),
    }))
}

/// 虚数沿用内层数值的规范形式再缀 `i`，所以 `0123i` 走八进制路径
/// printed 成 `0o123i`
pub(crate) fn f_imaginary(value: V, ctx: &mut Ctx) -> ActionResult {
    let items = value.items();
    let base = match items.first() {
        Some(Value::Node(Expr::BasicLit { value, .. })) => value.clone(),
        Some(other) => {
            // 裸 decimal_digits 分支
            let digits = other.text().replace('_', "");
            let parsed: u64 = digits.parse().map_err(|_| ctx.error("value out of range"))?;
            parsed.to_string()
        }
        None => return Err(ctx.error("malformed imaginary literal")),
    };
    Ok(Value::Node(Expr::BasicLit {
        kind: Word::Imag,
        value: format!("{}i", base),
    }))
}

// ---------------------------------------------------------------------------
// 字符与字符串字面量
// ---------------------------------------------------------------------------

pub(crate) fn f_rune_lit(_value: V, ctx: &mut Ctx) -> ActionResult {
    Ok(Value::Node(Expr::BasicLit {
        kind: Word::Char,
        value: ctx.matched_text().to_string(),
    }))
}

pub(crate) fn f_raw_string_lit(_value: V, ctx: &mut Ctx) -> ActionResult {
    Ok(Value::Node(Expr::BasicLit {
        kind: Word::String,
        value: ctx.matched_text().to_string(),
    }))
}

pub(crate) fn f_interpreted_string_lit(_value: V, ctx: &mut Ctx) -> ActionResult {
    Ok(Value::Node(Expr::BasicLit {
        kind: Word::String,
        value: ctx.matched_text().to_string(),
    }))
}

/// 匹配即报错的规则工厂（数位个数检查）
pub(crate) fn ff_error(message: &'static str) -> impl Fn(V, &mut Ctx) -> ActionResult + Send + Sync {
    move |_value, ctx| Err(ctx.error(message))
}

/// 三位八进制转义还得落在字节范围内
pub(crate) fn f_octal_byte_value(value: V, ctx: &mut Ctx) -> ActionResult {
    let digits = value.get("b").map(Value::text).unwrap_or_default();
    let parsed = u32::from_str_radix(&digits, 8)
        .map_err(|_| ctx.error("illegal: too few octal digits"))?;
    if parsed > 255 {
        return Err(ctx.error("illegal: octal value over 255"));
    }
    Ok(Value::Text(ctx.matched_text().to_string()))
}

/// `\u` 要恰好 4 个十六进制位、`\U` 要 8 个；代理区半区单独拒绝
pub(crate) fn ff_u_value(
    name: &'static str,
    width: usize,
) -> impl Fn(V, &mut Ctx) -> ActionResult + Send + Sync {
    move |value, ctx| {
        let digits = value.get("b").map(Value::text).unwrap_or_default();
        if digits.chars().count() != width {
            return Err(ctx.error(format!("{} requires {} hex", name, width)));
        }
        let code = u32::from_str_radix(&digits, 16)
            .map_err(|_| ctx.error(format!("{} requires {} hex", name, width)))?;
        if (0xD800..=0xDFFF).contains(&code) {
            return Err(ctx.error("illegal: surrogate half"));
        }
        Ok(Value::Text(ctx.matched_text().to_string()))
    }
}

// ---------------------------------------------------------------------------
// 类型表达式
// ---------------------------------------------------------------------------

pub(crate) fn f_type_name(value: V, _ctx: &mut Ctx) -> ActionResult {
    if let Value::Node(Expr::Name { name, .. }) = &value {
        if CONST_TYPES.contains(&name.as_str()) {
            return Ok(Value::Node(Expr::ConstType { name: name.clone() }));
        }
    }
    Ok(value)
}

pub(crate) fn f_channel_type(value: V, ctx: &mut Ctx) -> ActionResult {
    let (dir, elt) = if let Some(elt) = value.get("recv") {
        (ChanDir::Recv, elt)
    } else if let Some(elt) = value.get("send") {
        (ChanDir::Send, elt)
    } else if let Some(elt) = value.get("both") {
        (ChanDir::Both, elt)
    } else {
        return Err(ctx.error("malformed channel type"));
    };
    match elt.node() {
        Some(elt) => Ok(Value::Node(Expr::ChanType {
            dir,
            elt: Box::new(elt.clone()),
        })),
        None => Err(ctx.error("malformed channel type")),
    }
}

pub(crate) fn f_pointer_type(value: V, ctx: &mut Ctx) -> ActionResult {
    match value.into_node() {
        Some(elt) => Ok(Value::Node(Expr::Star { x: Box::new(elt) })),
        None => Err(ctx.error("malformed pointer type")),
    }
}

pub(crate) fn f_slice_type(value: V, ctx: &mut Ctx) -> ActionResult {
    match value.into_node() {
        Some(elt) => Ok(Value::Node(Expr::SliceType { elt: Box::new(elt) })),
        None => Err(ctx.error("malformed slice type")),
    }
}

/// `[N]T` 与复合字面量里的 `[...]T` 共用：首项是节点就是长度
pub(crate) fn f_array_type(value: V, ctx: &mut Ctx) -> ActionResult {
    let items = value.items();
    let Some(elt) = items.get(1).and_then(Value::node).cloned() else {
        return Err(ctx.error("malformed array type"));
    };
    let len = match items.first() {
        Some(Value::Node(len)) => Some(Box::new(len.clone())),
        _ => None,
    };
    Ok(Value::Node(Expr::ArrayType {
        len,
        elt: Box::new(elt),
    }))
}

pub(crate) fn f_map_type(value: V, ctx: &mut Ctx) -> ActionResult {
    let items = value.items();
    match (
        items.first().and_then(Value::node),
        items.get(1).and_then(Value::node),
    ) {
        (Some(key), Some(val)) => Ok(Value::Node(Expr::MapType {
            key: Box::new(key.clone()),
            value: Box::new(val.clone()),
        })),
        _ => Err(ctx.error("malformed map type")),
    }
}

fn field_list(value: Option<&V>, ctx: &Ctx) -> Result<Vec<Expr>, ParseError> {
    let mut fields = Vec::new();
    if let Some(value) = value {
        if !value.is_nothing() {
            for item in value.items() {
                match item.node() {
                    Some(node) => fields.push(node.clone()),
                    None => return Err(ctx.error("malformed field list")),
                }
            }
        }
    }
    Ok(fields)
}

/// 签名：参数组装好之后检查结果位的 `...`
pub(crate) fn f_signature(value: V, ctx: &mut Ctx) -> ActionResult {
    let params = field_list(value.get("params"), ctx)?;
    let results = match value.get("res") {
        None => Vec::new(),
        Some(Value::Nothing) => Vec::new(),
        Some(Value::Node(single)) => vec![Expr::FieldType {
            names: Vec::new(),
            typ: Box::new(single.clone()),
            variadic: false,
        }],
        Some(list) => field_list(Some(list), ctx)?,
    };
    for field in &results {
        if matches!(field, Expr::FieldType { variadic: true, .. }) {
            return Err(ctx.error("function results can not be variadic"));
        }
    }
    Ok(Value::Node(Expr::FuncType { params, results }))
}

fn collect_names(value: &V, ctx: &Ctx) -> Result<Vec<String>, ParseError> {
    let mut names = Vec::new();
    for item in value.items() {
        match item.node() {
            Some(Expr::Name { name, .. }) => names.push(name.clone()),
            _ => return Err(ctx.error("malformed identifier list")),
        }
    }
    Ok(names)
}

pub(crate) fn f_parameter_decl(value: V, ctx: &mut Ctx) -> ActionResult {
    let names = match value.get("ids") {
        Some(list) => collect_names(list, ctx)?,
        None => Vec::new(),
    };
    let variadic = matches!(value.get("varg"), Some(v) if !v.is_nothing());
    let Some(typ) = tagged_node(&value, "t") else {
        return Err(ctx.error("malformed parameter declaration"));
    };
    Ok(Value::Node(Expr::FieldType {
        names,
        typ: Box::new(typ),
        variadic,
    }))
}

pub(crate) fn f_struct_type(value: V, ctx: &mut Ctx) -> ActionResult {
    let fields = field_list(Some(&value), ctx)?;
    Ok(Value::Node(Expr::StructType { fields }))
}

pub(crate) fn f_field_decl(value: V, ctx: &mut Ctx) -> ActionResult {
    let names = match value.get("ids") {
        Some(list) => collect_names(list, ctx)?,
        None => Vec::new(),
    };
    let Some(typ) = tagged_node(&value, "t") else {
        return Err(ctx.error("malformed field declaration"));
    };
    Ok(Value::Node(Expr::FieldType {
        names,
        typ: Box::new(typ),
        variadic: false,
    }))
}

// ---------------------------------------------------------------------------
// 复合字面量
// ---------------------------------------------------------------------------

pub(crate) fn f_composite_lit(value: V, ctx: &mut Ctx) -> ActionResult {
    let Some(typ) = tagged_node(&value, "t") else {
        return Err(ctx.error("malformed composite literal"));
    };
    match value.get("v").and_then(Value::node) {
        Some(Expr::CompositeLit { elts, .. }) => Ok(Value::Node(Expr::CompositeLit {
            typ: Some(Box::new(typ)),
            elts: elts.clone(),
        })),
        _ => Err(ctx.error("malformed composite literal")),
    }
}

/// 裸 `{...}`：嵌套元素位置直接可用，带类型的外层再补类型
pub(crate) fn f_literal_value(value: V, ctx: &mut Ctx) -> ActionResult {
    let mut elts = Vec::new();
    if !value.is_nothing() {
        for item in value.items() {
            match item.node() {
                Some(node) => elts.push(node.clone()),
                None => return Err(ctx.error("malformed composite literal element")),
            }
        }
    }
    Ok(Value::Node(Expr::CompositeLit { typ: None, elts }))
}

pub(crate) fn f_keyed_element(value: V, ctx: &mut Ctx) -> ActionResult {
    let Some(element) = tagged_node(&value, "v") else {
        return Err(ctx.error("malformed composite literal element"));
    };
    match value.get("k") {
        None | Some(Value::Nothing) => Ok(Value::Node(element)),
        Some(key) => match key.node() {
            Some(key) => Ok(Value::Node(Expr::KeyValue {
                key: Box::new(key.clone()),
                value: Box::new(element),
            })),
            None => Err(ctx.error("malformed composite literal key")),
        },
    }
}
