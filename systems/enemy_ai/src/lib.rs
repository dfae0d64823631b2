#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure enemy behaviour system deciding how every enemy moves each combat tick.
//!
//! Each enemy follows a small state machine: it walks its lane's waypoints,
//! breaks off to chase the nearest living player that comes within
//! [`DETECT_RADIUS`], gives up once that player is dead, gone or further than
//! [`LOSE_RADIUS`], and heads for the base when its lane is exhausted. An enemy
//! touching the base in goal mode is sacrificed against it.

use std::time::Duration;

use rampart_core::{
    tuning::{
        BASE_CONTACT_DISTANCE, DETECT_RADIUS, ENEMY_SPEED, LOSE_RADIUS,
        WAYPOINT_REACHED_DISTANCE_SQ,
    },
    Command, EnemyMode, EnemySnapshot, EnemyView, Event, LevelConfig, PlayerSnapshot, PlayerView,
    Vec2,
};

/// Enemy AI system that turns enemy and player snapshots into steering commands.
#[derive(Debug, Default)]
pub struct EnemyAi {
    scratch: Vec<Command>,
}

impl EnemyAi {
    /// Creates a new enemy AI system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one `MoveEnemy` or `StrikeBase` command per enemy.
    ///
    /// Nothing is emitted unless the events contain a `TimeAdvanced` entry;
    /// its `enemy_dt` scales how far enemies travel. A zero delta still emits
    /// steering commands so mode changes are recorded without moving.
    pub fn handle(
        &mut self,
        events: &[Event],
        level: &LevelConfig,
        enemies: &EnemyView,
        players: &PlayerView,
        out: &mut Vec<Command>,
    ) {
        let Some(enemy_dt) = events.iter().rev().find_map(|event| match event {
            Event::TimeAdvanced { enemy_dt, .. } => Some(*enemy_dt),
            _ => None,
        }) else {
            return;
        };

        if enemies.is_empty() {
            return;
        }

        self.scratch.clear();
        for enemy in enemies.iter() {
            self.scratch.push(decide(enemy, level, players, enemy_dt));
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn decide(
    enemy: &EnemySnapshot,
    level: &LevelConfig,
    players: &PlayerView,
    enemy_dt: Duration,
) -> Command {
    let base = level.base.position;
    if enemy.mode == EnemyMode::Goal
        && enemy.position.distance_squared(base) <= BASE_CONTACT_DISTANCE * BASE_CONTACT_DISTANCE
    {
        return Command::StrikeBase { enemy: enemy.id };
    }

    let lane = level.lane(enemy.lane);
    let mut waypoint = enemy.waypoint;
    let mut mode = match nearest_within(players, enemy.position, DETECT_RADIUS) {
        Some(player) => EnemyMode::Chase { target: player.id },
        None => enemy.mode,
    };

    // Every fallback either settles or strictly advances `waypoint`.
    let destination = loop {
        match mode {
            EnemyMode::Chase { target } => {
                let tracked = players.get(target).filter(|player| {
                    player.alive
                        && player.position.distance_squared(enemy.position)
                            <= LOSE_RADIUS * LOSE_RADIUS
                });
                match tracked {
                    Some(player) => break player.position,
                    None => mode = fallback_mode(waypoint, lane.len()),
                }
            }
            EnemyMode::Path => {
                let Some(&node) = lane.get(waypoint) else {
                    mode = EnemyMode::Goal;
                    continue;
                };
                if enemy.position.distance_squared(node) < WAYPOINT_REACHED_DISTANCE_SQ {
                    waypoint += 1;
                    continue;
                }
                break node;
            }
            EnemyMode::Goal => break base,
        }
    };

    Command::MoveEnemy {
        enemy: enemy.id,
        mode,
        waypoint,
        to: step_towards(enemy.position, destination, ENEMY_SPEED * enemy_dt.as_secs_f32()),
    }
}

fn fallback_mode(waypoint: usize, lane_len: usize) -> EnemyMode {
    if waypoint < lane_len {
        EnemyMode::Path
    } else {
        EnemyMode::Goal
    }
}

/// Nearest living player within `radius`; ties go to the earliest joiner.
fn nearest_within(players: &PlayerView, point: Vec2, radius: f32) -> Option<&PlayerSnapshot> {
    let mut best: Option<(&PlayerSnapshot, f32)> = None;
    for player in players.alive() {
        let distance = player.position.distance_squared(point);
        if distance > radius * radius {
            continue;
        }
        if best.map_or(true, |(_, closest)| distance < closest) {
            best = Some((player, distance));
        }
    }
    best.map(|(player, _)| player)
}

fn step_towards(from: Vec2, to: Vec2, max_distance: f32) -> Vec2 {
    let offset = to - from;
    let length = offset.length();
    if length <= f32::EPSILON || max_distance <= 0.0 {
        return from;
    }
    if length <= max_distance {
        return to;
    }
    from + offset / length * max_distance
}
