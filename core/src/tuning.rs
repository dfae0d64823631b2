//! Gameplay tuning shared by the world and the systems.
//!
//! Distances are expressed in world units, speeds in world units per second.

use std::time::Duration;

/// Health every player starts a run with.
pub const PLAYER_MAX_HP: u32 = 100;
/// Health every enemy spawns with.
pub const ENEMY_MAX_HP: u32 = 10;

/// Distance at which an enemy hurts a player.
pub const MELEE_HIT_RADIUS: f32 = 30.0;
/// Damage contributed by each enemy in melee range per tick, before armor.
pub const MELEE_HIT_DAMAGE: u32 = 5;

/// Enemy movement speed.
pub const ENEMY_SPEED: f32 = 80.0;
/// Enemies still in play after this long are removed.
pub const ENEMY_LIFETIME: Duration = Duration::from_secs(30);

/// Projectile speed.
pub const PROJECTILE_SPEED: f32 = 320.0;
/// Distance a projectile covers before it expires.
pub const PROJECTILE_RANGE: f32 = 600.0;
/// Projectile damage at attack level one; scales linearly with the level.
pub const PROJECTILE_DAMAGE_BASE: u32 = 5;
/// Distance at which a projectile connects with an enemy.
pub const PROJECTILE_HIT_DISTANCE: f32 = 20.0;

/// Last wave of a run.
pub const MAX_WAVE: u32 = 5;
/// Enemies spawned per wave number.
pub const ENEMIES_PER_WAVE: u32 = 2;
/// Upper bound on the enemies spawned in a single wave.
pub const MAX_WAVE_SIZE: u32 = 20;

/// Coins spent per pad upgrade.
pub const UPGRADE_COST: u32 = 5;
/// Highest level a stat can reach.
pub const MAX_STAT_LEVEL: u32 = 5;
/// Value of a coin dropped by a killed enemy.
pub const COIN_VALUE: u32 = 1;
/// Distance at which a player picks up a coin.
pub const PICKUP_RADIUS: f32 = 30.0;

/// Distance at which an enemy notices a player.
pub const DETECT_RADIUS: f32 = 200.0;
/// Distance beyond which a chasing enemy gives up.
pub const LOSE_RADIUS: f32 = 260.0;
/// Squared distance under which a waypoint counts as reached.
pub const WAYPOINT_REACHED_DISTANCE_SQ: f32 = 100.0;
/// Distance at which an enemy is in contact with the base.
pub const BASE_CONTACT_DISTANCE: f32 = 40.0;
/// Damage a contacting enemy deals to the base before it is removed.
pub const BASE_DAMAGE_PER_TICK: u32 = 3;

/// Extra inset from the arena padding that enemies may not cross.
pub const ENEMY_BOUNDS_MARGIN: f32 = 50.0;
/// Clearance enemies keep from lane walls.
pub const WALL_BUFFER: f32 = 20.0;

/// Number of enemies spawned for the provided one-based wave.
#[must_use]
pub fn wave_size(wave: u32) -> u32 {
    wave.saturating_mul(ENEMIES_PER_WAVE).min(MAX_WAVE_SIZE)
}

/// Damage dealt by projectiles fired at the provided attack level.
#[must_use]
pub const fn projectile_damage(attack_level: u32) -> u32 {
    PROJECTILE_DAMAGE_BASE.saturating_mul(attack_level)
}

/// Time a projectile may stay in flight.
#[must_use]
pub fn projectile_lifetime() -> Duration {
    Duration::from_secs_f32(PROJECTILE_RANGE / PROJECTILE_SPEED)
}

/// Melee damage taken from `contacts` simultaneous enemies at `armor_level`.
///
/// Returns zero when nothing touched the player; otherwise the stacked damage
/// divided by armor, rounded, and never less than one.
#[must_use]
pub fn melee_damage(contacts: u32, armor_level: u32) -> u32 {
    if contacts == 0 {
        return 0;
    }
    let raw = contacts.saturating_mul(MELEE_HIT_DAMAGE) as f32;
    let reduced = (raw / armor_level.max(1) as f32).round() as u32;
    reduced.max(1)
}
