//! Host literal formatting.

/// Formats a real the way the simulator front-ends expect: six fractional
/// digits, a signed exponent with at least two digits (`2.000000e+00`).
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        // Verilog-A has no literal for these; `inf` is accepted by Spectre.
        return if value.is_nan() {
            "(0.0/0.0)".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let text = format!("{value:.6e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

pub fn format_integer(value: i64) -> String {
    value.to_string()
}

pub fn format_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Double-quoted string literal with `\` and `"` escaped.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
