//! Identity and world types shared by every part of the arena layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of an arena, as written in the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub String);

impl ArenaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a player.
///
/// Ordered so that roster snapshots come out in a stable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A point in a game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:.1},{:.1},{:.1}", self.world, self.x, self.y, self.z)
    }
}

/// Interaction mode a player is switched into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Normal mode outside of a match.
    Survival,
    /// Active play: the map cannot be modified.
    Adventure,
    /// Free-flying observer.
    Spectator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(ArenaId::new("oitc1").to_string(), "oitc1");
    }

    #[test]
    fn test_location_deserializes_without_rotation() {
        let loc: Location =
            serde_json::from_str(r#"{"world":"map","x":1.0,"y":64.0,"z":-3.5}"#)
                .unwrap();
        assert_eq!(loc, Location::new("map", 1.0, 64.0, -3.5));
    }
}
