//! Expression Corpus
//!
//! 端到端语料：字面量规范化、运算符优先级、主表达式链、类型断言、
//! 复合字面量与稳定错误消息。断言都走规范文本形式；字符串/字符
//! 字面量先经 unquote 解码再比较（等价于 strconv.Unquote）。

use jade_syntax::{parse_expression, Expr, Word};

// ---------------------------------------------------------------------------
// 断言助手
// ---------------------------------------------------------------------------

fn parses_as(input: &str, expected: &str) {
    match parse_expression(input) {
        Ok(ast) => assert_eq!(ast.to_string(), expected, "input {:?}", input),
        Err(err) => panic!("{:?} failed to parse: {}", input, err),
    }
}

fn is_basic_lit(input: &str, kind: Word) {
    match parse_expression(input) {
        Ok(ast) => assert_eq!(ast.lit_kind(), Some(kind), "input {:?} parsed as {}", input, ast),
        Err(err) => panic!("{:?} failed to parse: {}", input, err),
    }
}

fn parses_as_string(input: &str, expected: &str) {
    match parse_expression(input) {
        Ok(Expr::BasicLit { kind: Word::String, value }) => {
            let unquoted = unquote(&value)
                .unwrap_or_else(|| panic!("{:?}: cannot unquote {:?}", input, value));
            assert_eq!(unquoted, expected, "input {:?}", input);
        }
        Ok(other) => panic!("{:?} parsed as {:?}, expected a string literal", input, other),
        Err(err) => panic!("{:?} failed to parse: {}", input, err),
    }
}

fn parses_as_char(input: &str, expected: char) {
    match parse_expression(input) {
        Ok(Expr::BasicLit { kind: Word::Char, value }) => {
            let unquoted = unquote_char(&value)
                .unwrap_or_else(|| panic!("{:?}: cannot unquote rune {:?}", input, value));
            assert_eq!(unquoted, expected, "input {:?}", input);
        }
        Ok(other) => panic!("{:?} parsed as {:?}, expected a rune literal", input, other),
        Err(err) => panic!("{:?} failed to parse: {}", input, err),
    }
}

fn error_is(input: &str, expected: &str) {
    match parse_expression(input) {
        Err(err) => {
            assert_eq!(err.message, expected, "input {:?}", input);
            assert_eq!(err.to_string(), format!("ERROR {}", expected));
        }
        Ok(ast) => panic!("{:?} parsed as {}, expected error {:?}", input, ast, expected),
    }
}

fn error_contains(input: &str, needle: &str) {
    match parse_expression(input) {
        Err(err) => assert!(
            err.message.contains(needle),
            "input {:?}: error {:?} does not contain {:?}",
            input,
            err.message,
            needle
        ),
        Ok(ast) => panic!("{:?} parsed as {}, expected an error", input, ast),
    }
}

fn is_parse_error(input: &str) -> bool {
    parse_expression(input).is_err()
}

/// 规范形式是不动点：再解析得到同一棵树
fn round_trips(input: &str) {
    let first = parse_expression(input)
        .unwrap_or_else(|err| panic!("{:?} failed to parse: {}", input, err));
    let canonical = first.to_string();
    let second = parse_expression(&canonical)
        .unwrap_or_else(|err| panic!("canonical {:?} failed to reparse: {}", canonical, err));
    assert_eq!(first, second, "round-trip changed structure for {:?}", input);
    assert_eq!(second.to_string(), canonical, "canonical form drifted for {:?}", input);
}

// ---------------------------------------------------------------------------
// strconv.Unquote 的等价实现（仅测试用）
// ---------------------------------------------------------------------------

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn unquote(lit: &str) -> Option<String> {
    if lit.len() >= 2 && lit.starts_with('`') && lit.ends_with('`') {
        return Some(lit[1..lit.len() - 1].to_string());
    }
    if lit.len() < 2 || !lit.starts_with('"') || !lit.ends_with('"') {
        return None;
    }
    let mut bytes = Vec::new();
    let mut chars = lit[1..lit.len() - 1].chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut bytes, c);
            continue;
        }
        match chars.next()? {
            'a' => bytes.push(0x07),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0c),
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'v' => bytes.push(0x0b),
            '\\' => bytes.push(b'\\'),
            '\'' => bytes.push(b'\''),
            '"' => bytes.push(b'"'),
            // \xHH 是字节转义，\u/\U 是码点转义
            'x' => bytes.push(take_hex(&mut chars, 2)? as u8),
            'u' => push_char(&mut bytes, char::from_u32(take_hex(&mut chars, 4)?)?),
            'U' => push_char(&mut bytes, char::from_u32(take_hex(&mut chars, 8)?)?),
            d @ '0'..='7' => {
                let mut value = d.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                bytes.push(u8::try_from(value).ok()?);
            }
            _ => return None,
        }
    }
    String::from_utf8(bytes).ok()
}

fn unquote_char(lit: &str) -> Option<char> {
    let inner = lit.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars().peekable();
    let first = chars.next()?;
    let decoded = if first != '\\' {
        first
    } else {
        match chars.next()? {
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => char::from_u32(take_hex(&mut chars, 2)?)?,
            'u' => char::from_u32(take_hex(&mut chars, 4)?)?,
            'U' => char::from_u32(take_hex(&mut chars, 8)?)?,
            d @ '0'..='7' => {
                let mut value = d.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                char::from_u32(value)?
            }
            _ => return None,
        }
    };
    if chars.next().is_some() {
        return None;
    }
    Some(decoded)
}

// ---------------------------------------------------------------------------
// 整数字面量
// ---------------------------------------------------------------------------

#[test]
fn integer_literals_normalize() {
    let cases = [
        ("2398", "2398"),
        ("0", "0"),
        ("0b0", "0b0"),
        ("0B1", "0b1"),
        ("0B_1", "0b1"),
        ("0B_10", "0b10"),
        ("0O777", "0o777"),
        ("0o1", "0o1"),
        ("0123", "0o123"),
        ("0xBadFace", "0xbadface"),
        ("0xBadAce", "0xbadace"),
        ("0xdE_A_d_faC_e", "0xdeadface"),
        ("0x_67_7a_2f_cc_40_c6", "0x677a2fcc40c6"),
    ];
    for (input, expected) in cases {
        parses_as(input, expected);
        is_basic_lit(input, Word::Int);
    }
}

#[test]
fn integer_out_of_range() {
    error_contains("170141183460469231731687303715884105727", "value out of range");
    error_contains(
        "170_141183_460469_231731_687303_715884_105727",
        "value out of range",
    );
}

// ---------------------------------------------------------------------------
// 浮点字面量
// ---------------------------------------------------------------------------

#[test]
fn float_literals_normalize() {
    let cases = [
        ("0.", "0"),
        ("72.40", "72.4"),
        ("072.40", "72.4"),
        ("2.71828", "2.71828"),
        ("1.e+0", "1"),
        ("6.67428e-11", "6.67428e-11"),
        ("1E6", "1e+06"),
        (".25", "0.25"),
        (".12345E+5", "12345"),
        ("1_5.", "15"),
        ("0.15e+0_2", "15"),
        ("0x1p-2", "0x1p-02"),
        ("0x2.p10", "0x1p+11"),
        ("0x1.Fp+0", "0x1.fp+00"),
        ("0X.8p-0", "0x1p-01"),
        ("0X_1FFFP-16", "0x1.fffp-04"),
    ];
    for (input, expected) in cases {
        parses_as(input, expected);
        is_basic_lit(input, Word::Float);
    }
}

// ---------------------------------------------------------------------------
// 虚数字面量
// ---------------------------------------------------------------------------

#[test]
fn imaginary_literals_normalize() {
    let cases = [
        ("0i", "0i"),
        ("0123i", "0o123i"), // 兼容旧写法：八进制路径再缀 i
        ("0.i", "0i"),
        ("0o123i", "0o123i"),
        ("0xabci", "0xabci"),
        ("2.71828i", "2.71828i"),
        ("1.e+0i", "1i"),
        ("6.67428e-11i", "6.67428e-11i"),
        ("1E6i", "1e+06i"),
        (".25i", "0.25i"),
        (".12345E+5i", "12345i"),
        ("0x1p-2i", "0x1p-02i"),
    ];
    for (input, expected) in cases {
        parses_as(input, expected);
        is_basic_lit(input, Word::Imag);
    }
}

// ---------------------------------------------------------------------------
// 一元与二元表达式
// ---------------------------------------------------------------------------

#[test]
fn unary_and_binary_expressions() {
    parses_as("0x15e-2", "0x15e - 2"); // 最长吞噬：0x15e 后面是减法
    parses_as("123 + 345", "123 + 345");
    parses_as("-1234", "-1234");
    parses_as("- 1234", "-1234");
    parses_as("+ 1234", "+1234");
    parses_as("!0", "!0");
    parses_as("^0", "^0");
    parses_as("-7 -2", "-7 - 2");
    parses_as("&x", "&x<VPUverse(0)>");
    parses_as("*p", "*p<VPUverse(0)>");
    parses_as("<-ch", "<-ch<VPUverse(0)>");
    parses_as("a && b", "a<VPUverse(0)> && b<VPUverse(0)>");
    parses_as("a || b", "a<VPUverse(0)> || b<VPUverse(0)>");
}

/// 对解析出的树做整数求值，核对五级优先级与左结合
fn eval_int(expr: &Expr) -> i64 {
    match expr {
        Expr::BasicLit { kind: Word::Int, value } => value.parse().expect("decimal literal"),
        Expr::Unary { op, x } => match op.as_str() {
            "+" => eval_int(x),
            "-" => -eval_int(x),
            "^" => !eval_int(x),
            "!" => (eval_int(x) == 0) as i64,
            other => panic!("unexpected unary operator {:?}", other),
        },
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_int(lhs);
            let rhs = eval_int(rhs);
            match op.as_str() {
                "*" => lhs * rhs,
                "/" => lhs / rhs,
                "%" => lhs % rhs,
                "<<" => lhs << rhs,
                ">>" => lhs >> rhs,
                "&" => lhs & rhs,
                "&^" => lhs & !rhs,
                "+" => lhs + rhs,
                "-" => lhs - rhs,
                "|" => lhs | rhs,
                "^" => lhs ^ rhs,
                "==" => (lhs == rhs) as i64,
                "!=" => (lhs != rhs) as i64,
                "<" => (lhs < rhs) as i64,
                "<=" => (lhs <= rhs) as i64,
                ">" => (lhs > rhs) as i64,
                ">=" => (lhs >= rhs) as i64,
                "&&" => (lhs != 0 && rhs != 0) as i64,
                "||" => (lhs != 0 || rhs != 0) as i64,
                other => panic!("unexpected binary operator {:?}", other),
            }
        }
        other => panic!("not an integer expression: {:?}", other),
    }
}

#[test]
fn binary_precedence_and_associativity() {
    let cases = [
        ("2+3*4", 14),
        ("2*3+4", 10),
        ("10-2-3", 5),   // 左结合
        ("1<<2+1", 5),   // 移位在加法之上：(1<<2)+1
        ("100>>2&7", 1), // 同级左结合：(100>>2)&7
        ("6&3|1", 3),
        ("8&^2", 8),
        ("2*3==6", 1),
        ("4-2<3", 1),
        ("1==1&&2==2", 1),
        ("0&&1||1", 1),
        ("1||0&&0", 1),
        ("2+3*4==14&&1<2", 1),
    ];
    for (input, expected) in cases {
        let ast = parse_expression(input)
            .unwrap_or_else(|err| panic!("{:?} failed to parse: {}", input, err));
        assert_eq!(eval_int(&ast), expected, "input {:?} parsed as {}", input, ast);
    }
}

// ---------------------------------------------------------------------------
// 字符字面量
// ---------------------------------------------------------------------------

#[test]
fn rune_literals() {
    parses_as_char(r"'\125'", 'U');
    parses_as_char(r"'\x3d'", '=');
    parses_as_char(r"'\x3D'", '=');
    parses_as_char(r"'\a'", '\u{7}');
    parses_as_char(r"'\b'", '\u{8}');
    parses_as_char(r"'\f'", '\u{c}');
    parses_as_char(r"'\n'", '\n');
    parses_as_char(r"'\r'", '\r');
    parses_as_char(r"'\t'", '\t');
    parses_as_char(r"'\v'", '\u{b}');
    parses_as_char(r"'\u13F8'", 'ᏸ');
    parses_as_char("'ä'", 'ä');
    parses_as_char("'本'", '本');
    parses_as_char(r"'\000'", '\0');
    parses_as_char(r"'\007'", '\u{7}');
    parses_as_char("'''", '\''); // 字面单引号
    is_basic_lit(r"'\UFFeeFFee'", Word::Char);
}

#[test]
fn rune_literal_errors() {
    error_is(r"'\0'", "illegal: too few octal digits");
    error_is(r"'\12'", "illegal: too few octal digits");
    error_is(r"'\400'", "illegal: octal value over 255");
    error_is(r"'\1234'", "illegal: too many octal digits");
    error_is(r"'\xa'", "illegal: too few hexadecimal digits");
    error_is(r"'\xabc'", "illegal: too many hexadecimal digits");
    error_is(r"'\u13a'", "little_u_value requires 4 hex");
    error_is(r"'\u1a248'", "little_u_value requires 4 hex");
    error_is(r"'\UFFeeFFe'", "big_u_value requires 8 hex");
    error_is(r"'\UFFeeFFeeA'", "big_u_value requires 8 hex");
    error_is(r"'\uDFFF'", "illegal: surrogate half");
    assert!(is_parse_error("'aa'"));
}

// ---------------------------------------------------------------------------
// 字符串字面量
// ---------------------------------------------------------------------------

#[test]
fn string_literals() {
    parses_as_string("`abc`", "abc");
    parses_as_string("`\\n`", "\\n"); // 原始字符串不解转义
    parses_as_string(r#""abc""#, "abc");
    parses_as_string(r#""\"""#, "\"");
    parses_as_string(r#""Hello, world!\n""#, "Hello, world!\n");
    parses_as_string(r#""日本語""#, "日本語");
    parses_as_string(r#""\u65e5本\U00008a9e""#, "日本語");
    parses_as_string(r#""\U000065e5\U0000672c\U00008a9e""#, "日本語");
    parses_as_string(r#""\xe6\x97\xa5\xe6\x9c\xac\xe8\xaa\x9e""#, "日本語");
    is_basic_lit(r#""\xffÿ""#, Word::String); // 字节转义不必凑成 UTF-8
}

// ---------------------------------------------------------------------------
// 标识符
// ---------------------------------------------------------------------------

#[test]
fn identifiers() {
    parses_as("x", "x<VPUverse(0)>");
    parses_as("_foo", "_foo<VPUverse(0)>");
    parses_as("a9", "a9<VPUverse(0)>");
    parses_as("αβ", "αβ<VPUverse(0)>");
    parses_as("Σ", "Σ<VPUverse(0)>");
    parses_as("㭪", "㭪<VPUverse(0)>");
    parses_as("本", "本<VPUverse(0)>");
    parses_as("ä", "ä<VPUverse(0)>");
}

#[test]
fn symbol_codepoints_are_not_identifiers() {
    assert!(is_parse_error("😀"));
    assert!(is_parse_error("⽔"));
}

// ---------------------------------------------------------------------------
// 主表达式链
// ---------------------------------------------------------------------------

#[test]
fn calls_and_selectors() {
    parses_as(
        "math.Atan2(x, y)",
        "math<VPUverse(0)>.Atan2(x<VPUverse(0)>, y<VPUverse(0)>)",
    );
    parses_as("f()", "f<VPUverse(0)>()");
    parses_as("f(a, b,)", "f<VPUverse(0)>(a<VPUverse(0)>, b<VPUverse(0)>)");
    parses_as("f(xs...)", "f<VPUverse(0)>(xs<VPUverse(0)>...)");
    parses_as("x.f", "x<VPUverse(0)>.f");
    parses_as("a.b.c", "a<VPUverse(0)>.b.c");
}

#[test]
fn index_and_slice() {
    parses_as("something[1]", "something<VPUverse(0)>[1]");
    parses_as("a[i,]", "a<VPUverse(0)>[i<VPUverse(0)>]");
    parses_as("a[23 : 87]", "a<VPUverse(0)>[23:87]");
    parses_as("a[:]", "a<VPUverse(0)>[:]");
    parses_as("a[1:2:3]", "a<VPUverse(0)>[1:2:3]");
    parses_as(
        "s[: i : (314*10)-6]",
        "s<VPUverse(0)>[:i<VPUverse(0)>:314 * 10 - 6]",
    );
}

#[test]
fn primary_chains_are_left_associative() {
    parses_as(
        "a.b(c)[0]",
        "a<VPUverse(0)>.b(c<VPUverse(0)>)[0]",
    );
    parses_as(
        "m.f(1)(2)",
        "m<VPUverse(0)>.f(1)(2)",
    );
}

// ---------------------------------------------------------------------------
// 类型断言与类型表达式
// ---------------------------------------------------------------------------

#[test]
fn type_assertions() {
    parses_as("x.(int)", "x<VPUverse(0)>.((const-type int))");
    parses_as("x.(T)", "x<VPUverse(0)>.(T<VPUverse(0)>)");
    parses_as("x.(pkg.T)", "x<VPUverse(0)>.(pkg<VPUverse(0)>.T)");
    parses_as("x.(*int)", "x<VPUverse(0)>.(*(const-type int))");
    parses_as("x.([]string)", "x<VPUverse(0)>.([](const-type string))");
    parses_as("x.([4]byte)", "x<VPUverse(0)>.([4](const-type byte))");
    parses_as(
        "x.(map[string]bool)",
        "x<VPUverse(0)>.(map[(const-type string)] (const-type bool))",
    );
}

#[test]
fn channel_types_swap_direction_markers() {
    parses_as("x.(chan int)", "x<VPUverse(0)>.(chan (const-type int))");
    parses_as("x.(<-chan int)", "x<VPUverse(0)>.(chan<- (const-type int))");
    parses_as("x.(chan<- int)", "x<VPUverse(0)>.(<-chan (const-type int))");
    parses_as(
        "x.(<-chan chan<- chan []<-chan int)",
        "x<VPUverse(0)>.(chan<- <-chan chan []chan<- (const-type int))",
    );
}

#[test]
fn function_signature_types() {
    parses_as(
        "x.(func(a int) int)",
        "x<VPUverse(0)>.(func(a (const-type int)) (const-type int))",
    );
    parses_as(
        "x.(func(a, b int) (int, error))",
        "x<VPUverse(0)>.(func(a, b (const-type int)) ((const-type int), (const-type error)))",
    );
    parses_as(
        "x.(func(xs ...int) bool)",
        "x<VPUverse(0)>.(func(xs ...(const-type int)) (const-type bool))",
    );
    parses_as("x.(func())", "x<VPUverse(0)>.(func())");
}

#[test]
fn variadic_results_are_rejected() {
    error_is(
        "x.(func() (...int))",
        "function results can not be variadic",
    );
    error_is(
        "x.(func(a int) (b int, c ...int))",
        "function results can not be variadic",
    );
}

#[test]
fn struct_types() {
    parses_as(
        "x.(struct{ a int; b string })",
        "x<VPUverse(0)>.(struct { a (const-type int); b (const-type string) })",
    );
    parses_as("x.(struct{})", "x<VPUverse(0)>.(struct {})");
}

// ---------------------------------------------------------------------------
// 复合字面量
// ---------------------------------------------------------------------------

#[test]
fn composite_literals() {
    parses_as("T{}", "T<VPUverse(0)>{}");
    parses_as("foo{1, 2}", "foo<VPUverse(0)>{1, 2}");
    parses_as("foo{1, 2,}", "foo<VPUverse(0)>{1, 2}");
    parses_as(
        "foo{a: 1, b: 2}",
        "foo<VPUverse(0)>{a<VPUverse(0)>: 1, b<VPUverse(0)>: 2}",
    );
    parses_as("pkg.T{1}", "pkg<VPUverse(0)>.T{1}");
    parses_as("[]int{1, 2, 3}", "[](const-type int){1, 2, 3}");
    parses_as("[3]string{}", "[3](const-type string){}");
    parses_as("[...]int{1, 2}", "[...](const-type int){1, 2}");
    parses_as(
        "map[string]int{`a`: 1, `b`: 2}",
        "map[(const-type string)] (const-type int){`a`: 1, `b`: 2}",
    );
    parses_as("[][]int{{1}, {2, 3}}", "[][](const-type int){{1}, {2, 3}}");
    parses_as("Point{1, 2}.X", "Point<VPUverse(0)>{1, 2}.X");
}

// ---------------------------------------------------------------------------
// 不动点与杂项
// ---------------------------------------------------------------------------

#[test]
fn canonical_forms_are_fixed_points() {
    let inputs = [
        "2398",
        "0B_10",
        "0xBadFace",
        "0o777",
        "072.40",
        "6.67428e-11",
        "1E6",
        "0x1.Fp+0",
        "0123i",
        "2.71828i",
        r"'\125'",
        r"'\x3d'",
        "'本'",
        "`abc`",
        r#""日本語""#,
        "123 + 345",
        "-1234",
        "0x15e-2",
        "1<<2+1",
        "2+3*4==14&&1<2",
    ];
    for input in inputs {
        round_trips(input);
    }
}

#[test]
fn parenthesized_grouping_is_structural_only() {
    // 括号只分组，不进树：规范形式不保留它们
    parses_as("(314*10)-6", "314 * 10 - 6");
    parses_as("((42))", "42");
}

#[test]
fn unconsumed_input_is_an_error() {
    assert!(is_parse_error("x y"));
    assert!(is_parse_error("1 2"));
}

#[test]
fn tokenizer_failures_become_parse_errors() {
    assert!(is_parse_error("@"));
    assert!(is_parse_error("\"unterminated"));
}
