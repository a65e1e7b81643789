//! Simulation configuration.
//!
//! All fields have defaults, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "tick_rate": 120, "quadtree": { "capacity": 8 } }
//! ```

use std::fmt;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::aabb::Aabb;

/// Subdivision limits for the broadphase quad-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Elements a leaf holds before it splits.
    pub capacity: usize,
    /// Deepest level a node may split to. The root is level 0.
    pub max_depth: u32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            capacity: 6,
            max_depth: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second.
    pub tick_rate: u32,
    /// Most ticks one `advance` call may run. Excess time is dropped.
    pub max_ticks_per_advance: u32,
    pub world_width: f32,
    pub world_height: f32,
    pub quadtree: QuadTreeConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_ticks_per_advance: 8,
            world_width: 1280.0,
            world_height: 720.0,
            quadtree: QuadTreeConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::invalid("tick_rate", "must be at least 1"));
        }
        if self.max_ticks_per_advance == 0 {
            return Err(ConfigError::invalid(
                "max_ticks_per_advance",
                "must be at least 1",
            ));
        }
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return Err(ConfigError::invalid(
                "world_width/world_height",
                "must be positive",
            ));
        }
        if self.quadtree.capacity == 0 {
            return Err(ConfigError::invalid("quadtree.capacity", "must be at least 1"));
        }
        if self.quadtree.max_depth > 16 {
            log::warn!(
                "quadtree.max_depth {} is unusually deep",
                self.quadtree.max_depth
            );
        }
        Ok(())
    }

    /// Seconds per tick.
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// The quad-tree root region, anchored at the origin.
    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(self.world_width, self.world_height))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read config {path}: {source}"),
            Self::Json(e) => write!(f, "malformed config: {e}"),
            Self::Invalid { field, reason } => write!(f, "invalid config: {field} {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
