//! Number and string formatting shared by descriptions, instructions and compilers.

use machina_geometry::{round_to, Vector};

/// Decimal places for lengths in millimeters.
pub const MM_DECIMALS: u32 = 3;
/// Decimal places for lengths in meters.
pub const M_DECIMALS: u32 = 6;
/// Decimal places for angles in degrees.
pub const DEG_DECIMALS: u32 = 3;
/// Decimal places for angles in radians.
pub const RAD_DECIMALS: u32 = 6;
/// Decimal places for quaternion components.
pub const QUAT_DECIMALS: u32 = 6;
/// Decimal places for analog values.
pub const VOLTAGE_DECIMALS: u32 = 3;
/// Decimal places for temperatures.
pub const TEMPERATURE_DECIMALS: u32 = 0;
/// Decimal places for durations in seconds.
pub const TIME_DECIMALS: u32 = 3;

/// `value` rounded to `decimals` and printed in shortest form (`100`, `0.5`).
pub fn num(value: f64, decimals: u32) -> String {
    round_to(value, decimals).to_string()
}

/// Join already formatted values with `separator`.
pub fn join_nums(values: &[f64], decimals: u32, separator: &str) -> String {
    values.iter().map(|v| num(*v, decimals)).collect::<Vec<_>>().join(separator)
}

/// Components of `vector` scaled by `scale`, rounded and comma-joined.
pub fn xyz(vector: &Vector, scale: f64, decimals: u32) -> String {
    join_nums(&[vector.x() * scale, vector.y() * scale, vector.z() * scale], decimals, ",")
}

/// A variable-name friendly form of a number: `2.5` becomes `2_5`.
pub fn name_safe(value: f64, decimals: u32) -> String {
    num(value, decimals).replace('.', "_").replace('-', "m")
}

/// Double-quoted string with embedded quotes and backslashes escaped.
pub fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Truncate `text` to at most `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_shortest_form() {
        assert_eq!(num(100.0, MM_DECIMALS), "100");
        assert_eq!(num(0.1 + 0.2, MM_DECIMALS), "0.3");
        assert_eq!(num(-0.0004, MM_DECIMALS), "0");
        assert_eq!(num(199.6, TEMPERATURE_DECIMALS), "200");
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(quoted("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(join_nums(&[1.0, 2.5, 3.0], 3, ","), "1,2.5,3");
    }
}
