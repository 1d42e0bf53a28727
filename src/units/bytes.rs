use thiserror::Error;

/// 1024-based units, largest first.
const BYTE_UNITS: &[(&str, usize)] = &[
    ("GB", 1024 * 1024 * 1024),
    ("MB", 1024 * 1024),
    ("KB", 1024),
    ("B", 1),
];

#[derive(Debug, Error, PartialEq)]
pub enum ByteSizeError {
    #[error("invalid byte size number '{0}'")]
    InvalidNumber(String),
    #[error("unknown unit {0}")]
    UnknownUnit(String),
}

/// Renders a byte count with the largest unit that does not exceed it.
pub fn pretty_byte_size(bytes: usize) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let (unit, factor) = BYTE_UNITS
        .iter()
        .find(|(_, factor)| bytes >= *factor)
        .copied()
        .unwrap_or(("B", 1));

    format!("{:.2} {}", bytes as f64 / factor as f64, unit)
}

/// Parses strings such as `512`, `10KB`, `1.5 mb` into a byte count.
pub fn parse_byte_size(text: &str) -> Result<usize, ByteSizeError> {
    let text = text.trim();
    let (number, unit) = match text.find(|c: char| c.is_alphabetic()) {
        Some(i) => (text[..i].trim(), text[i..].trim()),
        None => (text, "B"),
    };

    let number: f64 = number
        .parse()
        .map_err(|_| ByteSizeError::InvalidNumber(number.to_string()))?;
    if !number.is_finite() || number < 0.0 {
        return Err(ByteSizeError::InvalidNumber(number.to_string()));
    }

    let unit = unit.to_uppercase();
    BYTE_UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| (number * *factor as f64) as usize)
        .ok_or(ByteSizeError::UnknownUnit(unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_picks_largest_unit() {
        assert_eq!(pretty_byte_size(0), "0 B");
        assert_eq!(pretty_byte_size(10), "10.00 B");
        assert_eq!(pretty_byte_size(1024), "1.00 KB");
        assert_eq!(pretty_byte_size(1536 * 1024), "1.50 MB");
        assert_eq!(pretty_byte_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn parse_accepts_units_and_fractions() {
        assert_eq!(parse_byte_size("512"), Ok(512));
        assert_eq!(parse_byte_size("10KB"), Ok(10 * 1024));
        assert_eq!(parse_byte_size(" 1.5 mb "), Ok(1536 * 1024));
        assert_eq!(parse_byte_size("2b"), Ok(2));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            parse_byte_size("12TB"),
            Err(ByteSizeError::UnknownUnit("TB".to_string()))
        );
        assert!(matches!(
            parse_byte_size("KB"),
            Err(ByteSizeError::InvalidNumber(_))
        ));
    }
}
