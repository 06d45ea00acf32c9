//! Filter predicates - admit or reject a message
//!
//! A route with a `source_filter` stores only the messages its predicate
//! accepts. The predicate is tested against the top-level fields of the
//! message.
//!
//! # Configuration
//!
//! | `test` | Options | True when |
//! |--------|---------|-----------|
//! | `=` (default) | `key`, `value` | `key` holds a string equal to `value` |
//! | `inside` | `lat_key`, `lng_key`, `points` | the point lies inside the polygon |
//! | `in` | `key`, `values` | `key` holds a string equal to one of `values` |
//!
//! `lat_key` and `lng_key` default to `acp_lat` / `acp_lng`. Coordinates are
//! read as numbers, or as strings holding a number.
//!
//! # TOML Examples
//!
//! ```toml
//! [routes.vix_one_bus]
//! source_filter = { test = "=", key = "VehicleRef", value = "SCNH-35224" }
//! ```
//!
//! ```toml
//! [routes.vix_city_centre]
//! source_filter = { test = "inside", points = [
//!     { lat = 52.21411510, lng = 0.09916394948 },
//!     { lat = 52.20885583, lng = 0.14877408742 },
//!     { lat = 52.19170630, lng = 0.13778775930 },
//!     { lat = 52.19496839, lng = 0.10053724050 },
//! ] }
//! ```
//!
//! # Rust Example
//!
//! ```
//! use civic_transform::Predicate;
//!
//! let p = Predicate::member_of("acp_id", ["elsys-eye-044504", "elsys-eye-044505"]);
//! let msg = serde_json::json!({ "acp_id": "elsys-eye-044505" });
//! assert!(p.evaluate(msg.as_object().unwrap()));
//! ```

mod config;
mod polygon;

pub use polygon::{Point, inside};

use civic_protocol::Document;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Compiled admission predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// String field equals a value
    Equals {
        /// Field tested
        field: String,
        /// Expected string
        value: String,
    },
    /// Coordinate pair lies inside a closed polygon
    InsidePolygon {
        /// Latitude field
        lat_field: String,
        /// Longitude field
        lng_field: String,
        /// Vertices in order; the last connects back to the first
        polygon: Vec<Point>,
    },
    /// String field equals one of a set of values
    MemberOf {
        /// Field tested
        field: String,
        /// Accepted strings
        values: Vec<String>,
    },
}

impl Predicate {
    /// Create an `Equals` predicate
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an `InsidePolygon` predicate over `acp_lat` / `acp_lng`
    pub fn inside_polygon(polygon: Vec<Point>) -> Self {
        Self::InsidePolygon {
            lat_field: "acp_lat".into(),
            lng_field: "acp_lng".into(),
            polygon,
        }
    }

    /// Create a `MemberOf` predicate
    pub fn member_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MemberOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name of the predicate kind, as configured
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Equals { .. } => "=",
            Self::InsidePolygon { .. } => "inside",
            Self::MemberOf { .. } => "in",
        }
    }

    /// Test a message
    ///
    /// Missing fields and values of the wrong type give `false`.
    pub fn evaluate(&self, message: &Document) -> bool {
        match self {
            Self::Equals { field, value } => get_str(message, field) == Some(value.as_str()),

            Self::InsidePolygon {
                lat_field,
                lng_field,
                polygon,
            } => {
                let (Some(lat), Some(lng)) = (get_f64(message, lat_field), get_f64(message, lng_field))
                else {
                    return false;
                };
                inside(Point::new(lat, lng), polygon)
            }

            Self::MemberOf { field, values } => match get_str(message, field) {
                Some(s) => values.iter().any(|v| v == s),
                None => false,
            },
        }
    }
}

/// String value of a field; numbers are not converted
fn get_str<'a>(message: &'a Document, field: &str) -> Option<&'a str> {
    message.get(field)?.as_str()
}

/// Numeric value of a field, parsing strings when needed
fn get_f64(message: &Document, field: &str) -> Option<f64> {
    match message.get(field)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
