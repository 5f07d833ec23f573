//! Country identity: coordinates, ISO 3166-1 alpha-2 codes, and the lookup seam between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Device position as reported by the platform. Longitude first, matching GeoJSON order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// True if both axes are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// `[lon, lat]` pair as taken by boundary lookups.
    pub fn as_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// ISO 3166-1 alpha-2 code. Always two ASCII letters; case is kept exactly as produced
/// by the lookup so the remote service sees the same string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        // Both bytes are ASCII letters (checked in from_str).
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(CountryCodeError::Length(s.len()));
        }
        if !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(CountryCodeError::NotAlphabetic(s.to_string()));
        }
        Ok(CountryCode([bytes[0], bytes[1]]))
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CountryCodeError {
    #[error("country code must be 2 characters, got {0}")]
    Length(usize),
    #[error("country code must be ASCII letters: {0:?}")]
    NotAlphabetic(String),
}

/// Pure coordinate → country mapping. `None` means no territory matched (open sea, poles).
pub trait CountryLookup {
    fn lookup(&self, coordinate: Coordinate) -> Option<CountryCode>;
}

impl<T: CountryLookup + ?Sized> CountryLookup for &T {
    fn lookup(&self, coordinate: Coordinate) -> Option<CountryCode> {
        (**self).lookup(coordinate)
    }
}

impl<T: CountryLookup + ?Sized> CountryLookup for std::sync::Arc<T> {
    fn lookup(&self, coordinate: Coordinate) -> Option<CountryCode> {
        (**self).lookup(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_letter_codes() {
        let code: CountryCode = "DE".parse().unwrap();
        assert_eq!(code.as_str(), "DE");
        assert_eq!(code.to_string(), "DE");
    }

    #[test]
    fn keeps_case_as_given() {
        let code: CountryCode = "gb".parse().unwrap();
        assert_eq!(code.as_str(), "gb");
        assert_ne!(code, "GB".parse::<CountryCode>().unwrap());
    }

    #[test]
    fn rejects_empty_and_long_codes() {
        assert_eq!("".parse::<CountryCode>(), Err(CountryCodeError::Length(0)));
        assert_eq!("DEU".parse::<CountryCode>(), Err(CountryCodeError::Length(3)));
    }

    #[test]
    fn rejects_non_letters() {
        assert!(matches!(
            "D1".parse::<CountryCode>(),
            Err(CountryCodeError::NotAlphabetic(_))
        ));
        // Two bytes but one char: still rejected.
        assert!("é".parse::<CountryCode>().is_err());
    }

    #[test]
    fn serde_uses_plain_string() {
        let code: CountryCode = "JP".parse().unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"JP\"");
        let back: CountryCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<CountryCode>("\"\"").is_err());
    }

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinate::new(13.4, 52.5).is_valid());
        assert!(!Coordinate::new(181.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
        assert_eq!(Coordinate::new(1.0, 2.0).as_lon_lat(), [1.0, 2.0]);
    }
}
