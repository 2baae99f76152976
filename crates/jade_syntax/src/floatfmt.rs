//! Float Canonical Forms
//!
//! 浮点字面量的规范文本。十进制用最短往返数字，指数形式阈值与
//! go/strconv 的 shortest-%g 一致（十进制指数 < -4 或 >= 6 时转科学
//! 计数，指数两位起步带符号）；十六进制浮点对应 %x：`0x1.fffp-04`。

/// 最短 %g 形式
pub(crate) fn go_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // Rust 的 {:e} 已是最短往返数字，如 "7.24e1" / "6.67428e-11"
    let sci = format!("{:e}", value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exp: i32 = match exp.parse() {
        Ok(exp) => exp,
        Err(_) => return sci,
    };
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    if (-4..6).contains(&exp) {
        format_fixed(&digits, exp, negative)
    } else {
        format_sci(&digits, exp, negative)
    }
}

fn format_fixed(digits: &str, exp: i32, negative: bool) -> String {
    let count = digits.len() as i32;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if exp >= count - 1 {
        out.push_str(digits);
        for _ in 0..(exp - (count - 1)) {
            out.push('0');
        }
    } else if exp >= 0 {
        let split = (exp + 1) as usize;
        out.push_str(&digits[..split]);
        out.push('.');
        out.push_str(&digits[split..]);
    } else {
        out.push_str("0.");
        for _ in 0..(-exp - 1) {
            out.push('0');
        }
        out.push_str(digits);
    }
    out
}

fn format_sci(digits: &str, exp: i32, negative: bool) -> String {
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&digits[..1]);
    if digits.len() > 1 {
        out.push('.');
        out.push_str(&digits[1..]);
    }
    out.push('e');
    push_exponent(&mut out, exp);
    out
}

/// 带符号、至少两位的指数尾巴
fn push_exponent(out: &mut String, exp: i32) {
    out.push(if exp >= 0 { '+' } else { '-' });
    let abs = exp.unsigned_abs();
    if abs < 10 {
        out.push('0');
    }
    out.push_str(&abs.to_string());
}

/// %x 形式：规格化为 0x1.<hex>p±ee
pub(crate) fn go_x(value: f64) -> String {
    if value == 0.0 {
        return "0x0p+00".to_string();
    }
    let bits = value.to_bits();
    let negative = (bits >> 63) != 0;
    let raw_exp = ((bits >> 52) & 0x7ff) as i64;
    let mut frac = bits & ((1u64 << 52) - 1);
    let exp;
    if raw_exp == 0 {
        // 次正规数左移归一
        let mut shifted = -1022i64;
        while frac & (1u64 << 52) == 0 {
            frac <<= 1;
            shifted -= 1;
        }
        frac &= (1u64 << 52) - 1;
        exp = shifted;
    } else {
        exp = raw_exp - 1023;
    }
    let hex = format!("{:013x}", frac);
    let hex = hex.trim_end_matches('0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str("0x1");
    if !hex.is_empty() {
        out.push('.');
        out.push_str(hex);
    }
    out.push('p');
    push_exponent(&mut out, exp as i32);
    out
}

/// 解析十六进制浮点文本（已去下划线，形如 `0x1.8p-2`）
pub(crate) fn parse_hex_float(text: &str) -> Option<f64> {
    let rest = text.get(2..)?;
    let (mantissa, exp) = rest.split_once(['p', 'P'])?;
    let exp: i32 = exp.parse().ok()?;
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let mut significand = 0f64;
    for c in int_part.chars().chain(frac_part.chars()) {
        significand = significand * 16.0 + c.to_digit(16)? as f64;
    }
    Some(significand * 2f64.powi(exp - 4 * frac_part.len() as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_g_fixed_forms() {
        assert_eq!(go_g(0.0), "0");
        assert_eq!(go_g(72.4), "72.4");
        assert_eq!(go_g(2.71828), "2.71828");
        assert_eq!(go_g(1.0), "1");
        assert_eq!(go_g(0.25), "0.25");
        assert_eq!(go_g(12345.0), "12345");
        assert_eq!(go_g(15.0), "15");
        assert_eq!(go_g(100000.0), "100000");
    }

    #[test]
    fn test_g_scientific_forms() {
        assert_eq!(go_g(6.67428e-11), "6.67428e-11");
        assert_eq!(go_g(1e6), "1e+06");
        assert_eq!(go_g(1.234567e6), "1.234567e+06");
        assert_eq!(go_g(1e-5), "1e-05");
    }

    #[test]
    fn test_x_forms() {
        assert_eq!(go_x(0.25), "0x1p-02");
        assert_eq!(go_x(2048.0), "0x1p+11");
        assert_eq!(go_x(1.9375), "0x1.fp+00");
        assert_eq!(go_x(0.5), "0x1p-01");
        assert_eq!(go_x(0.1249847412109375), "0x1.fffp-04");
        assert_eq!(go_x(0.0), "0x0p+00");
    }

    #[test]
    fn test_parse_hex_float() {
        assert_eq!(parse_hex_float("0x1p-2"), Some(0.25));
        assert_eq!(parse_hex_float("0x2.p10"), Some(2048.0));
        assert_eq!(parse_hex_float("0x1.Fp+0"), Some(1.9375));
        assert_eq!(parse_hex_float("0X.8p-0"), Some(0.5));
        assert_eq!(parse_hex_float("0X1FFFP-16"), Some(0.1249847412109375));
        assert_eq!(parse_hex_float("0xp1"), None);
    }
}
