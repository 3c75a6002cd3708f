//! String normalization helpers shared by the extractors and the writer.

/// Derives a normalized identifier from a display string.
///
/// The input is trimmed and lowercased; every maximal run of
/// non-alphanumeric characters collapses into a single `_`, and leading or
/// trailing separators are dropped. `"GDP per capita (US$)"` becomes
/// `"gdp_per_capita_us"`.
pub fn to_concept_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut gap = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if gap && !id.is_empty() {
                id.push('_');
            }
            gap = false;
            id.extend(c.to_lowercase());
        } else {
            gap = true;
        }
    }
    id
}

/// Formats a float keeping `sigfig` significant digits.
///
/// The value is rounded to `sigfig` digits (ties to even, like Rust's
/// scientific formatting) and rendered positionally, never in scientific
/// notation. Trailing fractional zeros and a bare trailing point are
/// trimmed, so whole results come out as plain integers:
/// `1234.5678` at 4 digits is `"1235"`, at 5 digits `"1234.6"`, and
/// `123456.789` at 5 digits is `"123460"`.
///
/// # Arguments
/// * `value` - The number to format
/// * `sigfig` - Significant digits to keep (values below 1 are clamped to 1)
///
/// # Returns
/// The formatted decimal string. Non-finite values fall back to their
/// plain `to_string` rendering.
pub fn format_float_sigfig(value: f64, sigfig: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Let the scientific formatter do the rounding, then lay the digits
    // out positionally.
    let sci = format!("{:.*e}", sigfig.max(1) - 1, value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = match exponent.parse() {
        Ok(e) => e,
        Err(_) => return sci,
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let ndigits = digits.len() as i32;

    let mut out = String::new();
    if mantissa.starts_with('-') {
        out.push('-');
    }
    if exponent >= ndigits - 1 {
        // Whole number, zero-padded up to its magnitude.
        out.push_str(&digits);
        for _ in 0..(exponent - (ndigits - 1)) {
            out.push('0');
        }
    } else if exponent >= 0 {
        // Point sits inside the significant digits.
        let split = (exponent + 1) as usize;
        out.push_str(&digits[..split]);
        let frac = digits[split..].trim_end_matches('0');
        if !frac.is_empty() {
            out.push('.');
            out.push_str(frac);
        }
    } else {
        // All digits behind the point.
        let frac = format!("{}{}", "0".repeat(-(exponent + 1) as usize), digits);
        let frac = frac.trim_end_matches('0');
        out.push_str("0.");
        out.push_str(frac);
    }
    out
}
