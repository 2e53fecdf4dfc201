//! Helper functions shared by the importers (positions, endpoints).

/// Parse the first two numeric tokens of a position list like
/// `"[100, 50, 130, 80]"` or `"[100 50 130 80]"`.
///
/// Returns `(0.0, 0.0)` when fewer than two tokens are present or either
/// of them is not a number.
pub fn parse_position(s: &str) -> (f64, f64) {
    let mut tokens = s
        .split(|c: char| c == '[' || c == ']' || c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    match (tokens.next(), tokens.next()) {
        (Some(x), Some(y)) => match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(xv), Ok(yv)) if xv.is_finite() && yv.is_finite() => (xv, yv),
            _ => (0.0, 0.0),
        },
        _ => (0.0, 0.0),
    }
}

/// Strip the port part of an endpoint like `"18#out:1"`, leaving the block
/// reference (`"18"`). Plain references are returned trimmed.
pub fn endpoint_block(s: &str) -> &str {
    match s.split_once('#') {
        Some((block, _port)) => block.trim(),
        None => s.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_takes_first_two_tokens() {
        assert_eq!(parse_position("[100, 50, 130, 80]"), (100.0, 50.0));
        assert_eq!(parse_position("[-15 22.5 0 0]"), (-15.0, 22.5));
    }

    #[test]
    fn position_defaults_on_garbage() {
        assert_eq!(parse_position(""), (0.0, 0.0));
        assert_eq!(parse_position("[12]"), (0.0, 0.0));
        assert_eq!(parse_position("[a, b]"), (0.0, 0.0));
    }

    #[test]
    fn endpoint_strips_port() {
        assert_eq!(endpoint_block("2::28#out:1"), "2::28");
        assert_eq!(endpoint_block(" 7 "), "7");
    }
}
