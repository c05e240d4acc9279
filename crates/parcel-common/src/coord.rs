//! Grid coordinates and their canonical string keys.
//!
//! Coordinates travel through query strings as `"x,y"` tokens and lists of
//! tokens separated by `;`. The same `"x,y"` form is used as the join key
//! between parcels and publications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the two components of a coordinate token.
pub const COORDINATE_SEPARATOR: char = ',';

/// Separator between coordinate tokens in a list.
pub const LIST_SEPARATOR: char = ';';

/// A cell of the parcel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Canonical key for joining and set membership.
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::from(*self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.x, COORDINATE_SEPARATOR, self.y)
    }
}

impl FromStr for Coordinate {
    type Err = CoordParseError;

    /// Parse a `"x,y"` token. Exactly two components are required and each
    /// must start with an integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(COORDINATE_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(CoordParseError::InvalidFormat(s.to_string()));
        }

        let x = parse_int(parts[0])
            .ok_or_else(|| CoordParseError::InvalidNumber(parts[0].to_string()))?;
        let y = parse_int(parts[1])
            .ok_or_else(|| CoordParseError::InvalidNumber(parts[1].to_string()))?;

        Ok(Self {
            x: saturate_i32(x),
            y: saturate_i32(y),
        })
    }
}

/// Canonical string form of a [`Coordinate`].
///
/// Two coordinates are equal iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateKey(String);

impl CoordinateKey {
    pub fn new(x: i32, y: i32) -> Self {
        Coordinate::new(x, y).into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the coordinate this key was built from.
    pub fn coordinate(&self) -> Result<Coordinate, CoordParseError> {
        self.0.parse()
    }
}

impl From<Coordinate> for CoordinateKey {
    fn from(coord: Coordinate) -> Self {
        CoordinateKey(coord.to_string())
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a `"x1,y1;x2,y2"` list. A single malformed member fails the list.
pub fn parse_coordinate_list(s: &str) -> Result<Vec<Coordinate>, CoordParseError> {
    s.split(LIST_SEPARATOR).map(Coordinate::from_str).collect()
}

/// Lenient leading-integer parse.
///
/// Leading whitespace and a sign are accepted, then as many decimal digits as
/// follow. Anything after the digits is ignored (`"12px"` is 12). Returns
/// `None` when no digit is found. Magnitudes beyond `i64` saturate.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        let digit = (b - b'0') as i64;
        value = value
            .saturating_mul(10)
            .saturating_add(if negative { -digit } else { digit });
    }

    seen_digit.then_some(value)
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordParseError {
    #[error("Invalid coordinate format: {0}. Expected 'x,y'")]
    InvalidFormat(String),

    #[error("Invalid number in coordinate: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_lenient() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("  -7"), Some(-7));
        assert_eq!(parse_int("+3"), Some(3));
        assert_eq!(parse_int("12px"), Some(12));
        assert_eq!(parse_int("3.9"), Some(3));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
    }

    #[test]
    fn test_parse_int_saturates() {
        assert_eq!(parse_int("99999999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_int("-99999999999999999999999"), Some(i64::MIN));
    }

    #[test]
    fn test_coordinate_round_trip_through_key() {
        let coord = Coordinate::new(-12, 40);
        let key = coord.key();
        assert_eq!(key.as_str(), "-12,40");
        assert_eq!(key.coordinate().unwrap(), coord);
    }

    #[test]
    fn test_coordinate_wrong_token_count() {
        assert!(matches!(
            "1".parse::<Coordinate>(),
            Err(CoordParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "1,2,3".parse::<Coordinate>(),
            Err(CoordParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_coordinate_list_rejects_bad_member() {
        assert!(parse_coordinate_list("1,2;x,y").is_err());
        assert_eq!(
            parse_coordinate_list("1,2;3,-4").unwrap(),
            vec![Coordinate::new(1, 2), Coordinate::new(3, -4)]
        );
    }
}
