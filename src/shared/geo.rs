//! Coordinate parsing for project locations.
//!
//! Projects carry their map position as a `"lat,lng"` string. This module turns
//! that string into a validated [`Coordinates`] value.

use crate::shared::error::CoordinateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Movement smaller than this (in degrees, per axis) is treated as float noise.
pub const POSITION_EPSILON: f64 = 0.001;

/// A validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::OutOfRange { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    /// Parse a `"lat,lng"` string.
    ///
    /// Both parts are trimmed and parsed as `f64`. Anything other than exactly
    /// two comma-separated numbers is malformed.
    pub fn parse(raw: &str) -> Result<Self, CoordinateError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoordinateError::Missing);
        }

        let mut parts = raw.split(',');
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoordinateError::Malformed(raw.to_string()));
        };

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Malformed(raw.to_string()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Malformed(raw.to_string()))?;

        Self::new(lat, lng)
    }

    /// Parse an optional coordinate string, treating `None` as missing
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, CoordinateError> {
        raw.map_or(Err(CoordinateError::Missing), Self::parse)
    }

    /// Whether `other` lies within `epsilon` degrees on both axes
    pub fn approx_eq(&self, other: &Coordinates, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lng - other.lng).abs() <= epsilon
    }
}

impl FromStr for Coordinates {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}
