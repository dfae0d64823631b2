use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Lane, Stat};

/// Static level geometry shared by every room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Playable area.
    pub arena: Arena,
    /// Axis-aligned walls enemies are pushed out of.
    #[serde(default)]
    pub walls: Vec<WallRect>,
    /// Waypoint sequences enemies follow before heading for the base.
    pub lanes: Lanes,
    /// Player spawn points; their count bounds room capacity.
    pub spawn_points: Vec<Vec2>,
    /// Upgrade pads.
    pub pads: Pads,
    /// Base enemies try to reach.
    pub base: BaseConfig,
    /// Enemy entry used when a lane has no waypoints.
    pub gate: Gate,
}

impl LevelConfig {
    /// Maximum number of players a room accepts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.spawn_points.len()
    }

    /// Waypoints of the provided lane.
    #[must_use]
    pub fn lane(&self, lane: Lane) -> &[Vec2] {
        match lane {
            Lane::Left => &self.lanes.left,
            Lane::Right => &self.lanes.right,
        }
    }

    /// Pad that upgrades the provided stat.
    #[must_use]
    pub const fn pad(&self, stat: Stat) -> &Pad {
        match stat {
            Stat::Armor => &self.pads.armor,
            Stat::Attack => &self.pads.attack,
        }
    }

    /// Checks the geometry for values the simulation cannot work with.
    pub fn validate(&self) -> Result<(), LevelError> {
        if !(self.arena.width > 0.0 && self.arena.height > 0.0) {
            return Err(LevelError::EmptyArena);
        }
        if self.spawn_points.is_empty() {
            return Err(LevelError::NoSpawnPoints);
        }
        let points = self
            .lanes
            .left
            .iter()
            .chain(&self.lanes.right)
            .chain(&self.spawn_points)
            .chain([&self.base.position, &self.gate.position]);
        for point in points {
            if !point.is_finite() {
                return Err(LevelError::NonFinitePoint {
                    x: point.x,
                    y: point.y,
                });
            }
        }
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        let width = 1600.0;
        let height = 900.0;
        let center = width / 2.0;
        Self {
            arena: Arena {
                width,
                height,
                padding: 20.0,
            },
            walls: vec![
                WallRect::new(100.0, 80.0, 1400.0, 40.0),
                WallRect::new(100.0, 80.0, 40.0, 740.0),
                WallRect::new(1460.0, 80.0, 40.0, 740.0),
                WallRect::new(300.0, 280.0, 1000.0, 40.0),
                WallRect::new(300.0, 580.0, 1000.0, 40.0),
            ],
            lanes: Lanes {
                left: vec![
                    Vec2::new(center, 150.0),
                    Vec2::new(350.0, 200.0),
                    Vec2::new(200.0, 350.0),
                    Vec2::new(200.0, 650.0),
                    Vec2::new(center - 100.0, 750.0),
                ],
                right: vec![
                    Vec2::new(center, 150.0),
                    Vec2::new(1250.0, 200.0),
                    Vec2::new(1400.0, 350.0),
                    Vec2::new(1400.0, 650.0),
                    Vec2::new(center + 100.0, 750.0),
                ],
            },
            spawn_points: vec![
                Vec2::new(640.0, 720.0),
                Vec2::new(960.0, 720.0),
                Vec2::new(560.0, 760.0),
                Vec2::new(1040.0, 760.0),
            ],
            pads: Pads {
                armor: Pad {
                    position: Vec2::new(width * 0.25, height * 0.75),
                    radius: 50.0,
                },
                attack: Pad {
                    position: Vec2::new(width * 0.75, height * 0.75),
                    radius: 50.0,
                },
            },
            base: BaseConfig {
                position: Vec2::new(center, height - 80.0),
                max_hp: 100,
            },
            gate: Gate {
                position: Vec2::new(center, 40.0),
                spread: 120.0,
            },
        }
    }
}

/// Dimensions of the playable area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
    /// Inset from the edges used when constraining enemies.
    #[serde(default)]
    pub padding: f32,
}

impl Arena {
    /// Reports whether the point lies inside the arena, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

/// Axis-aligned wall rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl WallRect {
    /// Creates a wall from its top-left corner and extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reports whether a point padded by `buffer` on every side overlaps the wall.
    #[must_use]
    pub fn overlaps(&self, point: Vec2, buffer: f32) -> bool {
        point.x + buffer > self.x
            && point.x - buffer < self.x + self.width
            && point.y + buffer > self.y
            && point.y - buffer < self.y + self.height
    }
}

/// The two enemy lanes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lanes {
    /// Waypoints of the left lane.
    #[serde(default)]
    pub left: Vec<Vec2>,
    /// Waypoints of the right lane.
    #[serde(default)]
    pub right: Vec<Vec2>,
}

/// The two upgrade pads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pads {
    /// Pad raising armor.
    pub armor: Pad,
    /// Pad raising attack.
    pub attack: Pad,
}

/// Stationary circular upgrade zone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    /// Center of the zone.
    pub position: Vec2,
    /// Radius of the zone.
    pub radius: f32,
}

impl Pad {
    /// Reports whether the point stands inside the pad, edge included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_squared(self.position) <= self.radius * self.radius
    }
}

/// Base placement and durability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseConfig {
    /// Center of the base.
    pub position: Vec2,
    /// Health the base starts each run with.
    pub max_hp: u32,
}

/// Enemy entry point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Center of the gate.
    pub position: Vec2,
    /// Width of the horizontal jitter applied to spawns.
    #[serde(default)]
    pub spread: f32,
}

/// Problems detected while validating a [`LevelConfig`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum LevelError {
    /// The arena has no area.
    #[error("arena must have a positive width and height")]
    EmptyArena,
    /// No player spawn points were provided.
    #[error("level must define at least one player spawn point")]
    NoSpawnPoints,
    /// A configured point was NaN or infinite.
    #[error("level point ({x}, {y}) is not finite")]
    NonFinitePoint {
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_valid() {
        let level = LevelConfig::default();
        assert_eq!(level.validate(), Ok(()));
        assert_eq!(level.capacity(), 4);
        assert_eq!(level.lane(Lane::Left).len(), 5);
    }

    #[test]
    fn level_without_spawn_points_is_rejected() {
        let level = LevelConfig {
            spawn_points: Vec::new(),
            ..LevelConfig::default()
        };
        assert_eq!(level.validate(), Err(LevelError::NoSpawnPoints));
    }

    #[test]
    fn pad_contains_its_edge() {
        let pad = Pad {
            position: Vec2::new(10.0, 10.0),
            radius: 5.0,
        };
        assert!(pad.contains(Vec2::new(15.0, 10.0)));
        assert!(!pad.contains(Vec2::new(15.1, 10.0)));
    }

    #[test]
    fn wall_overlap_honours_buffer() {
        let wall = WallRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(wall.overlaps(Vec2::new(25.0, 5.0), 20.0));
        assert!(!wall.overlaps(Vec2::new(30.0, 5.0), 20.0));
    }
}
