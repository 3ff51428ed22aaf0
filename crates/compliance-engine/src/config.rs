//! Check configuration
//!
//! One immutable [`CheckConfig`] is passed explicitly into every entry point.
//! Missing JSON fields fall back to the defaults below, so a request can
//! override just the threshold it cares about.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns;

/// Largest accepted `max_block_depth`
pub const MAX_BLOCK_DEPTH: usize = 8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Minimum room area in m² (1 drawing unit = 1 m)
    pub min_area_m2: f64,
    /// Case-insensitive substring a room layer must contain
    pub room_layer_contains: String,
    /// Exact layer name of site boundary polylines
    pub site_boundary_layer: String,
    /// Exact layer name of exit markers
    pub exit_layer: String,
    /// Exact layer name of entrance markers
    pub enter_layer: String,
    pub door_name_keywords: Vec<String>,
    pub door_layer_keywords: Vec<String>,
    /// On-edge and ray-crossing tolerance
    pub eps: f64,
    /// Distance within which a point near a room edge counts as contained
    pub edge_eps: f64,
    /// How many levels of nested inserts are followed
    pub max_block_depth: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            min_area_m2: 2.0,
            room_layer_contains: patterns::ROOM_LAYER_MUST_INCLUDE.to_string(),
            site_boundary_layer: patterns::SITE_BOUNDARY_LAYER.to_string(),
            exit_layer: patterns::EXIT_LAYER.to_string(),
            enter_layer: patterns::ENTER_LAYER.to_string(),
            door_name_keywords: to_owned(patterns::DOOR_NAME_KEYWORDS),
            door_layer_keywords: to_owned(patterns::DOOR_LAYER_KEYWORDS),
            eps: 0.05,
            edge_eps: 0.40,
            max_block_depth: 2,
        }
    }
}

fn to_owned(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| k.to_string()).collect()
}

impl CheckConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CheckConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Apply a partial JSON object on top of this config
    ///
    /// Only the keys present in `overrides` change; the result is validated.
    pub fn merged_with(&self, overrides: &serde_json::Value) -> Result<Self, ConfigError> {
        let mut base = serde_json::to_value(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let (Some(base_map), Some(patch)) = (base.as_object_mut(), overrides.as_object()) else {
            return Err(ConfigError::Parse(
                "config overrides must be a JSON object".to_string(),
            ));
        };
        for (key, value) in patch {
            base_map.insert(key.clone(), value.clone());
        }
        let merged: CheckConfig =
            serde_json::from_value(base).map_err(|e| ConfigError::Parse(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("min_area_m2", self.min_area_m2)?;
        check_non_negative("eps", self.eps)?;
        check_non_negative("edge_eps", self.edge_eps)?;
        if self.room_layer_contains.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "room_layer_contains",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_block_depth > MAX_BLOCK_DEPTH {
            return Err(ConfigError::InvalidValue {
                field: "max_block_depth",
                reason: format!("must be at most {} (got {})", MAX_BLOCK_DEPTH, self.max_block_depth),
            });
        }
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("expected a finite, non-negative number (got {})", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CheckConfig::default();
        assert_eq!(config.min_area_m2, 2.0);
        assert_eq!(config.room_layer_contains, "tent");
        assert_eq!(config.eps, 0.05);
        assert_eq!(config.edge_eps, 0.40);
        assert_eq!(config.max_block_depth, 2);
        assert!(config.door_name_keywords.contains(&"DOOR".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CheckConfig::from_json_str(r#"{"min_area_m2": 4.5}"#).unwrap();
        assert_eq!(config.min_area_m2, 4.5);
        assert_eq!(config.room_layer_contains, "tent");
        assert_eq!(config.max_block_depth, 2);
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let err = CheckConfig::from_json_str(r#"{"edge_eps": -1.0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "edge_eps",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_empty_room_filter() {
        let err = CheckConfig::from_json_str(r#"{"room_layer_contains": "  "}"#).unwrap_err();
        assert!(err.to_string().contains("room_layer_contains"));
    }

    #[test]
    fn test_depth_limit_is_bounded() {
        let err = CheckConfig::from_json_str(r#"{"max_block_depth": 1000000}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "max_block_depth",
                ..
            }
        ));

        let deepest = CheckConfig::from_json_str(r#"{"max_block_depth": 8}"#).unwrap();
        assert_eq!(deepest.max_block_depth, MAX_BLOCK_DEPTH);
        assert!(CheckConfig::default()
            .merged_with(&serde_json::json!({ "max_block_depth": 9 }))
            .is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            CheckConfig::from_json_str("{min_area"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_merged_with_overrides_only_named_keys() {
        let base = CheckConfig {
            exit_layer: "EXITS".to_string(),
            ..CheckConfig::default()
        };
        let merged = base
            .merged_with(&serde_json::json!({ "max_block_depth": 4 }))
            .unwrap();
        assert_eq!(merged.max_block_depth, 4);
        assert_eq!(merged.exit_layer, "EXITS");
    }

    #[test]
    fn test_merged_with_rejects_non_object() {
        let base = CheckConfig::default();
        assert!(base.merged_with(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            CheckConfig::from_file("/nonexistent/plancheck.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
