//! Predicate compilation from `source_filter` tables

use civic_config::SourceFilterConfig;

use super::{Point, Predicate};
use crate::TransformError;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

impl TryFrom<&SourceFilterConfig> for Predicate {
    type Error = TransformError;

    fn try_from(config: &SourceFilterConfig) -> Result<Self, Self::Error> {
        match config.test.as_str() {
            "=" => {
                let field = required_key(config)?;
                let value = config
                    .value
                    .clone()
                    .ok_or_else(|| TransformError::config("'=' filter needs a value"))?;
                Ok(Self::Equals { field, value })
            }

            "inside" => {
                if config.points.len() < 3 {
                    return Err(TransformError::config(format!(
                        "'inside' filter needs at least 3 points, got {}",
                        config.points.len()
                    )));
                }
                Ok(Self::InsidePolygon {
                    lat_field: config.lat_key.clone(),
                    lng_field: config.lng_key.clone(),
                    polygon: config
                        .points
                        .iter()
                        .map(|p| Point::new(p.lat, p.lng))
                        .collect(),
                })
            }

            "in" => Ok(Self::MemberOf {
                field: required_key(config)?,
                values: config.values.clone(),
            }),

            other => Err(TransformError::UnknownTest(other.to_string())),
        }
    }
}

fn required_key(config: &SourceFilterConfig) -> Result<String, TransformError> {
    match config.key.as_deref() {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(TransformError::config(format!(
            "'{}' filter needs a key",
            config.test
        ))),
    }
}
