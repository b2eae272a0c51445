//! Price differential computation.

use crate::error::PriceError;

/// Compute `estimated - listed` from two numeric strings.
///
/// Both inputs must parse as integers; anything else is an error and the
/// caller leaves the differential unset.
pub fn differential(listed: &str, estimated: &str) -> Result<String, PriceError> {
    let listed = parse_price(listed)?;
    let estimated = parse_price(estimated)?;

    estimated
        .checked_sub(listed)
        .map(|diff| diff.to_string())
        .ok_or(PriceError::Overflow)
}

fn parse_price(raw: &str) -> Result<i64, PriceError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| PriceError::NotNumeric(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differential_positive() {
        assert_eq!(differential("185000", "201500").unwrap(), "16500");
    }

    #[test]
    fn test_differential_negative() {
        assert_eq!(differential("120000", "99000").unwrap(), "-21000");
    }

    #[test]
    fn test_differential_rejects_empty_estimate() {
        assert_eq!(
            differential("185000", ""),
            Err(PriceError::NotNumeric(String::new()))
        );
    }

    #[test]
    fn test_differential_rejects_text() {
        assert!(matches!(
            differential("185 000 kr", "201500"),
            Err(PriceError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_differential_overflow() {
        assert_eq!(
            differential("-1", &i64::MAX.to_string()),
            Err(PriceError::Overflow)
        );
    }
}
