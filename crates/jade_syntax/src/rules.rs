//! Grammar Rules
//!
//! Jade 的 PEG 文法，按形式语法（带 `;` 终结符的记号流）书写。
//! 规则名沿用语言规范的产生式名；规范之外的辅助规则加 `_` 前缀，
//! 它们不会被父序列捕获。
//!
//! 注意 (?...) 是前瞻：能提前剪掉不可能的分支，但不消费输入。
//! PEG 忌讳贪婪正则，字符类是唯一的例外。

use jade_peg::{i, named, o, Line};

use crate::actions::*;
use crate::ast::Expr;

/// 按空格切开、倒序、加引号、用 `|` 连起来。
/// 倒序让长算子排前，避免 PEG 前缀吞噬（`<=` 先于 `<`）。
///
/// `"* / %"` 变成 `"'%'|'/'|'*'"`。
fn rev_quote(ops: &str) -> String {
    let mut parts: Vec<&str> = ops.split_whitespace().collect();
    parts.reverse();
    parts
        .iter()
        .map(|op| format!("'{}'", op))
        .collect::<Vec<_>>()
        .join("|")
}

pub(crate) fn lines() -> Vec<Line<Expr>> {
    vec![
        o(named("Input", "SimpleStmt _semicolon?")),
        o(named(
            "Block",
            vec![
                o("'{' Statement*_semicolon '}'"),
                i(named("Statement", "SimpleStmt")),
                i(named("SimpleStmt", "ExpressionStmt")),
                i(named("ExpressionStmt", "Expression")),
                i(named(
                    "Expression",
                    vec![
                        o("bx:(Expression binary_op Expression) | ux:UnaryExpr"),
                        o(named("UnaryExpr", "PrimaryExpr | ux:(unary_op UnaryExpr)"))
                            .with(f_unary),
                        o(named("unary_op", rev_quote("+ - ! ^ * & <-"))),
                        // && 与 || 先试，否则 mul_op 的 '&' 会吞掉 '&&' 的前半
                        o(named("binary_op", "'&&' | '||' | mul_op | add_op | rel_op")),
                        o(named("mul_op", rev_quote("* / % << >> & &^"))),
                        o(named("add_op", rev_quote("+ - | ^"))),
                        o(named("rel_op", rev_quote("== != < <= > >="))),
                        o(named(
                            "PrimaryExpr",
                            vec![
                                // 左递归脊柱：调用/下标/切片/类型断言/选择子
                                o("p:PrimaryExpr a:Arguments").with(f_primary_arguments), // math.Atan2(x, y)
                                o("p:PrimaryExpr i:Index").with(f_primary_index),         // something[1]
                                o("p:PrimaryExpr s:Slice").with(f_primary_slice),         // a[23 : 87]
                                o("p:PrimaryExpr t:TypeAssertion").with(f_primary_type_assert), // x.(int)
                                o("p:PrimaryExpr s:Selector").with(f_primary_selector),   // x.f
                                o("Operand"),
                                i(named(
                                    "Operand",
                                    vec![
                                        o("Literal | OperandName | '(' Expression ')'"),
                                        i(named(
                                            "Literal",
                                            vec![
                                                o("BasicLit | CompositeLit"),
                                                i(named(
                                                    "BasicLit",
                                                    vec![
                                                        o(r#"(?'\'') rune_lit | (?["`]) string_lit | (?[0-9.]) imaginary_lit | (?[0-9.]) float_lit | (?[0-9]) int_lit"#),
                                                        i(named("rune_lit", r"'\'' ( byte_value | unicode_value | [^\n] ) '\''")).with(f_rune_lit),
                                                        i(named(
                                                            "string_lit",
                                                            vec![
                                                                o(named("raw_string_lit", "'`' [^`]* '`'")).with(f_raw_string_lit),
                                                                o(named("interpreted_string_lit", r#"'"' (!'"' ('\\' [\s\S] | unicode_value | byte_value))* '"'"#)).with(f_interpreted_string_lit),
                                                            ],
                                                        )),
                                                        i(named(
                                                            "int_lit",
                                                            vec![
                                                                o(named("binary_lit", "('0b'|'0B') '_'? binary_digits")).with(ff_int(2)),
                                                                o(named("hex_lit", "('0x'|'0X') '_'? hex_digits")).with(ff_int(16)),
                                                                o(named("octal_lit", "[0] [oO]? '_'? octal_digit octal_digits?")).with(ff_int(8)),
                                                                o(named("decimal_lit", "[0] | [1-9] ( '_'? decimal_digits)?")).with(ff_int(10)),
                                                            ],
                                                        )),
                                                        i(named(
                                                            "float_lit",
                                                            vec![
                                                                o("decimal_float_lit | hex_float_lit"),
                                                                i(named(
                                                                    "decimal_float_lit",
                                                                    "DOT decimal_digits decimal_exponent? | \
                                                                     decimal_digits DOT decimal_digits? decimal_exponent? | \
                                                                     decimal_digits decimal_exponent",
                                                                ))
                                                                .with(f_decimal_float),
                                                                i(named("hex_float_lit", "[0] [xX] hex_mantissa hex_exponent")).with(f_hex_float),
                                                                i(named("decimal_exponent", "[eE] [+-]? decimal_digits")),
                                                                i(named(
                                                                    "hex_mantissa",
                                                                    "'_'? hex_digits DOT hex_digits? | '_'? hex_digits | DOT hex_digits",
                                                                )),
                                                                i(named("hex_exponent", "[pP] [+-]? decimal_digits")),
                                                            ],
                                                        )),
                                                        i(named("imaginary_lit", "(float_lit | int_lit | decimal_digits ) [i]")).with(f_imaginary),
                                                        i(named("decimal_digits", "decimal_digit ( '_'? decimal_digit )*")),
                                                        i(named("binary_digits", "binary_digit ( '_'? binary_digit )*")),
                                                        i(named("octal_digits", "octal_digit ( '_'? octal_digit )*")),
                                                        i(named("hex_digits", "hex_digit ( '_'? hex_digit )*")),
                                                        i(named("decimal_digit", "[0-9]")),
                                                        i(named("binary_digit", "[01]")),
                                                        i(named("octal_digit", "[0-7]")),
                                                        i(named("hex_digit", "[0-9a-fA-F]")),
                                                        i(named(
                                                            "byte_value",
                                                            vec![
                                                                o(r"(?'\\' octal_digit) (octal_byte_value_err1 | octal_byte_value | octal_byte_value_err2) | (?'\\x') (hex_byte_value_err1 | hex_byte_value | hex_byte_value_err2)"),
                                                                i(named("octal_byte_value_err1", r"a:'\\' (?octal_digit{4,})")).with(ff_error("illegal: too many octal digits")),
                                                                i(named("octal_byte_value", r"a:'\\' b:octal_digit{3,3}")).with(f_octal_byte_value),
                                                                i(named("octal_byte_value_err2", r"a:'\\' (?octal_digit{1,})")).with(ff_error("illegal: too few octal digits")),
                                                                i(named("hex_byte_value_err1", r"a:'\\x' b:hex_digit{3,}")).with(ff_error("illegal: too many hexadecimal digits")),
                                                                i(named("hex_byte_value", r"a:'\\x' b:hex_digit{2,2}")),
                                                                i(named("hex_byte_value_err2", r"a:'\\x' b:hex_digit{0,1}")).with(ff_error("illegal: too few hexadecimal digits")),
                                                            ],
                                                        )),
                                                        i(named(
                                                            "unicode_value",
                                                            vec![
                                                                o("escaped_char | little_u_value | big_u_value | unicode_char"),
                                                                i(named("escaped_char", r#"esc:'\\' char:[abfnrtv\\\'"]"#)),
                                                                i(named("little_u_value", r"a:'\\u' b:hex_digit*")).with(ff_u_value("little_u_value", 4)),
                                                                i(named("big_u_value", r"a:'\\U' b:hex_digit*")).with(ff_u_value("big_u_value", 8)),
                                                            ],
                                                        )),
                                                    ],
                                                )),
                                                i(named("CompositeLit", "t:LiteralType v:LiteralValue")).with(f_composite_lit),
                                                i(named("LiteralType", "StructType | EllipsisArrayType | SliceType | ArrayType | MapType | TypeName")),
                                                i(named("EllipsisArrayType", "'[' THREEDOTS ']' Type")).with(f_array_type),
                                                i(named("LiteralValue", "'{' _ (ElementList _ ','?)? _ '}'")).with(f_literal_value),
                                                i(named("ElementList", "KeyedElement+_COMMA")),
                                                i(named("KeyedElement", "k:(Key _ ':' _)? v:Element")).with(f_keyed_element),
                                                i(named("Key", "Expression")),
                                                i(named("Element", "Expression | LiteralValue")),
                                            ],
                                        )),
                                        i(named(
                                            "OperandName",
                                            vec![
                                                o("QualifiedIdent | identifier"),
                                                i(named("QualifiedIdent", "p:PackageName DOT i:identifier")).with(f_qualified_ident),
                                            ],
                                        )),
                                    ],
                                )),
                                i(named("Arguments", "'(' (Args:(ExpressionList) Varg:THREEDOTS? ','? )? ')'")),
                                i(named("Index", "'[' Expression ','? ']'")),
                                i(named("Slice", "'[' (Expression?)*':'{2,3} ']'")),
                                i(named("TypeAssertion", "'.' '(' _ Type _ ')'")),
                                i(named("Selector", "'.' identifier")),
                            ],
                        )),
                    ],
                ))
                .with(f_expression),
                i(named("ExpressionList", "Expression+_COMMA")),
            ],
        )),
        // 类型文法：TypeAssertion 与 CompositeLit 共用
        i(named(
            "Type",
            vec![
                o("TypeLit | '(' _ Type _ ')' | TypeName"),
                i(named("TypeLit", "ChannelType | FunctionType | StructType | MapType | PointerType | SliceType | ArrayType")),
                i(named("TypeName", "QualifiedIdent | identifier")).with(f_type_name),
                i(named("ChannelType", "recv:('<-chan' _ Type) | send:('chan<-' _ Type) | both:('chan' _ Type)")).with(f_channel_type),
                i(named("PointerType", "'*' Type")).with(f_pointer_type),
                i(named("SliceType", "'[' ']' Type")).with(f_slice_type),
                i(named("ArrayType", "'[' Expression ']' Type")).with(f_array_type),
                i(named("MapType", "'map' '[' Type ']' Type")).with(f_map_type),
                i(named("FunctionType", "'func' _ Signature")),
                i(named("Signature", "params:Parameters _ res:Result?")).with(f_signature),
                i(named("Result", "Parameters | Type")),
                i(named("Parameters", "'(' _ (ParameterList _ ','?)? _ ')'")),
                i(named("ParameterList", "ParameterDecl+_COMMA")),
                // 命名形式先试；PEG 有序选择下 `func(chan int)` 会把
                // chan 读成参数名，与 Go 规范文法同样的歧义
                i(named(
                    "ParameterDecl",
                    vec![
                        o("ids:IdentifierList _ varg:THREEDOTS? _ t:Type"),
                        o("varg:THREEDOTS? _ t:Type"),
                    ],
                ))
                .with(f_parameter_decl),
                i(named("StructType", "'struct' _ '{' _ FieldDecl*_fieldsep _ ';'? _ '}'")).with(f_struct_type),
                i(named("FieldDecl", "ids:IdentifierList _ t:Type")).with(f_field_decl),
            ],
        )),
        i(named("PackageName", "identifier")),
        i(named("identifier", "letter (letter | unicode_digit)*")).with(f_identifier),
        i(named("IdentifierList", "identifier+','")),
        // 前瞻排掉不可能的字头，再吃一个字母。保持这个排除类：
        // 它决定了哪些高位码点算标识符
        i(named("letter", r"(?[^0-9 \t\n\r+(){}[\]<>-]) [\p{L}_]")),
        i(named("unicode_char", r"[^\x{0a}]")), // 换行以外的任意码点
        i(named("unicode_digit", "[0-9]")),
        i(named("_COMMA", "_ ','")),
        i(named("_", r"( ' ' | '\t' | '\n' | '\r' )*")),
        i(named("DOT", "'.'")), // 需要捕获时用 DOT（序列里的 '.' 不捕获）
        i(named("THREEDOTS", "'...'")),
        i(named("_semicolon", r"';' '\n'?")),
        i(named("_fieldsep", "_ ';' _")),
    ]
}
