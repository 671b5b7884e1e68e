//! Postal code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input contains no digits at all.
    #[error("postal code cannot be empty")]
    Empty,
    /// The input does not contain exactly 8 digits.
    #[error("postal code must have exactly 8 digits (got {got})")]
    WrongLength {
        /// Number of digits found in the input.
        got: usize,
    },
}

/// A normalized 8-digit postal code.
///
/// Parsing strips every non-digit character, so user-friendly forms like
/// `01001-000` normalize to `01001000`. Anything that does not leave exactly
/// 8 digits is rejected.
///
/// ## Examples
///
/// ```
/// use mangaba_core::PostalCode;
///
/// let code = PostalCode::parse("01001-000").unwrap();
/// assert_eq!(code.as_str(), "01001000");
///
/// assert!(PostalCode::parse("0100100").is_err()); // 7 digits
/// assert!(PostalCode::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    /// Number of digits in a postal code.
    pub const LENGTH: usize = 8;

    /// Parse a `PostalCode` from a string, stripping non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has no digits or does not normalize to
    /// exactly 8 digits.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(PostalCodeError::Empty);
        }

        if digits.len() != Self::LENGTH {
            return Err(PostalCodeError::WrongLength { got: digits.len() });
        }

        Ok(Self(digits))
    }

    /// Get the normalized digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_formatting() {
        let code = PostalCode::parse("01001-000").expect("valid code");
        assert_eq!(code.as_str(), "01001000");

        let spaced = PostalCode::parse(" 30130 010 ").expect("valid code");
        assert_eq!(spaced.as_str(), "30130010");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            PostalCode::parse("0100100"),
            Err(PostalCodeError::WrongLength { got: 7 })
        );
        assert_eq!(
            PostalCode::parse("010010001"),
            Err(PostalCodeError::WrongLength { got: 9 })
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(PostalCode::parse(""), Err(PostalCodeError::Empty));
        assert_eq!(PostalCode::parse("abc-def"), Err(PostalCodeError::Empty));
    }
}
