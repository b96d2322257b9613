//! Significant-digit number formatting for the console report
//!
//! Reproduces printf `%g`: fixed notation for exponents in `[-4, digits)`,
//! scientific otherwise, trailing zeros removed.

/// Format `value` with `digits` significant digits, `%g` style
pub fn sig(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return format!("{value}");
    }
    let digits = digits.max(1);

    // round first so 99999.5 at 5 digits moves to the next exponent
    let sci = format!("{:.*e}", digits - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::sig;

    #[test]
    fn fixed_range() {
        assert_eq!(sig(0.1, 5), "0.1");
        assert_eq!(sig(1.0, 5), "1");
        assert_eq!(sig(12.0, 5), "12");
        assert_eq!(sig(3.14159265, 5), "3.1416");
        assert_eq!(sig(-2.5, 5), "-2.5");
        assert_eq!(sig(12345.0, 5), "12345");
        assert_eq!(sig(0.00012345, 5), "0.00012345");
    }

    #[test]
    fn scientific_range() {
        assert_eq!(sig(123456.0, 5), "1.2346e+05");
        assert_eq!(sig(99999.5, 5), "1e+05");
        assert_eq!(sig(1.5e-5, 5), "1.5e-05");
        assert_eq!(sig(6.67259e-11, 5), "6.6726e-11");
        assert_eq!(sig(-4.0e120, 5), "-4e+120");
    }

    #[test]
    fn special_values() {
        assert_eq!(sig(0.0, 5), "0");
        assert_eq!(sig(f64::INFINITY, 5), "inf");
        assert_eq!(sig(f64::NAN, 5), "NaN");
    }
}
