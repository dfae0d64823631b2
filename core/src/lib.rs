#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart simulation.
//!
//! This crate defines the message surface that connects the room actor, the
//! authoritative world, and pure systems. The actor submits [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values for systems and
//! the broadcaster to react to. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

mod level;
pub mod tuning;

pub use level::{Arena, BaseConfig, Gate, LevelConfig, LevelError, Lanes, Pad, Pads, WallRect};

/// Commands that express all permissible room mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the room clock to the provided instant.
    Tick {
        /// Time elapsed since the room was created.
        now: Duration,
    },
    /// Moves every projectile by one fixed step and expires spent ones.
    AdvanceProjectiles,
    /// Seats a newly connected player in the room.
    AddPlayer {
        /// Identifier of the joining player.
        player: PlayerId,
        /// Display name chosen by the player.
        name: String,
    },
    /// Removes a player from the room.
    RemovePlayer {
        /// Identifier of the departing player.
        player: PlayerId,
    },
    /// Updates a player's lobby ready flag.
    SetReady {
        /// Player toggling readiness.
        player: PlayerId,
        /// Requested ready state.
        ready: bool,
    },
    /// Requests that a fresh run begins.
    StartRun {
        /// Player issuing the request; must be the host.
        requested_by: PlayerId,
    },
    /// Requests that a finished run restarts with every player ready.
    RestartRun {
        /// Player issuing the request; must be the host.
        requested_by: PlayerId,
    },
    /// Moves a player to a client-reported position.
    MovePlayer {
        /// Player that moved.
        player: PlayerId,
        /// Reported position in world units.
        position: Vec2,
    },
    /// Fires a projectile from the player's position.
    Shoot {
        /// Player pulling the trigger.
        player: PlayerId,
        /// Aim direction; need not be normalised but must be non-zero.
        direction: Vec2,
    },
    /// Advances to the next wave and enters the spawn grace window.
    BeginWave,
    /// Places a single enemy of the current wave.
    SpawnEnemy {
        /// Lane the enemy will follow.
        lane: Lane,
        /// Initial position of the enemy.
        position: Vec2,
    },
    /// Ends the spawn grace window and unfreezes enemies.
    ResumeCombat,
    /// Applies the AI decision for one enemy this tick.
    MoveEnemy {
        /// Enemy being steered.
        enemy: EnemyId,
        /// Mode the enemy settled on.
        mode: EnemyMode,
        /// Index of the next lane waypoint.
        waypoint: usize,
        /// Proposed position before lane constraints are applied.
        to: Vec2,
    },
    /// Sacrifices an enemy in contact with the base.
    StrikeBase {
        /// Enemy touching the base.
        enemy: EnemyId,
    },
    /// Applies accumulated melee damage to a player.
    DamagePlayer {
        /// Player receiving damage.
        player: PlayerId,
        /// Damage after armor reduction.
        amount: u32,
    },
    /// Resolves a projectile striking an enemy.
    HitEnemy {
        /// Projectile that connected.
        projectile: ProjectileId,
        /// Enemy that was struck.
        enemy: EnemyId,
    },
    /// Transfers a coin into a player's balance.
    CollectCoin {
        /// Coin being collected.
        coin: CoinId,
        /// Player collecting the coin.
        player: PlayerId,
    },
    /// Spends coins to raise one of a player's stats.
    PurchaseUpgrade {
        /// Player standing on the pad.
        player: PlayerId,
        /// Stat the pad upgrades.
        stat: Stat,
    },
    /// Enters the shop window after a cleared wave.
    OpenShop,
    /// Ends the current run and returns the room to the lobby.
    EndRun {
        /// Why the run ended.
        reason: GameOverReason,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the room clock advanced.
    TimeAdvanced {
        /// Time elapsed since the room was created.
        now: Duration,
        /// Time enemies may move for during this tick.
        enemy_dt: Duration,
    },
    /// Confirms a player took a seat.
    PlayerJoined {
        /// Identifier of the player.
        player: PlayerId,
        /// Spawn slot assigned to the player.
        slot: usize,
    },
    /// Confirms a player left.
    PlayerLeft {
        /// Identifier of the player.
        player: PlayerId,
    },
    /// Announces a change of host.
    HostChanged {
        /// New host, or `None` once the room is empty.
        host: Option<PlayerId>,
    },
    /// Reports that the last player left.
    RoomEmptied,
    /// Confirms a ready flag change.
    ReadyChanged {
        /// Player whose flag changed.
        player: PlayerId,
        /// New ready state.
        ready: bool,
    },
    /// Announces that a run started and per-run state was reset.
    RunStarted,
    /// Announces that a new wave began.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Announces a phase transition.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Confirms an enemy was placed.
    EnemySpawned {
        /// Identifier of the enemy.
        enemy: EnemyId,
    },
    /// Reports an enemy removed after exceeding its lifetime.
    EnemyDespawned {
        /// Identifier of the enemy.
        enemy: EnemyId,
    },
    /// Reports an enemy losing health.
    EnemyDamaged {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Remaining health.
        hp: u32,
    },
    /// Reports an enemy reduced to zero health.
    EnemyKilled {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Last position of the enemy.
        position: Vec2,
    },
    /// Reports an enemy sacrificing itself against the base.
    EnemyReachedBase {
        /// Identifier of the enemy.
        enemy: EnemyId,
    },
    /// Reports the base losing health.
    BaseDamaged {
        /// Remaining base health.
        hp: u32,
        /// Maximum base health.
        max_hp: u32,
    },
    /// Confirms an accepted movement intent.
    PlayerMoved {
        /// Player that moved.
        player: PlayerId,
        /// New position.
        position: Vec2,
    },
    /// Reports a player's health after damage.
    PlayerHpChanged {
        /// Player that was hurt.
        player: PlayerId,
        /// Remaining health.
        hp: u32,
        /// Maximum health.
        max_hp: u32,
    },
    /// Reports that a player died. Emitted exactly once per death.
    PlayerDied {
        /// Player that died.
        player: PlayerId,
    },
    /// Confirms a projectile was fired.
    ProjectileFired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Player that fired it.
        owner: PlayerId,
    },
    /// Reports a projectile leaving the arena or exceeding its range.
    ProjectileExpired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports a coin dropped by a killed enemy.
    CoinDropped {
        /// Identifier of the coin.
        coin: CoinId,
        /// Position of the coin.
        position: Vec2,
    },
    /// Reports a coin being picked up.
    CoinCollected {
        /// Identifier of the coin.
        coin: CoinId,
        /// Player that collected it.
        player: PlayerId,
    },
    /// Reports a player's economy after a pickup or purchase.
    StatsChanged {
        /// Player whose stats changed.
        player: PlayerId,
        /// Coin balance.
        coins: u32,
        /// Armor level.
        armor_level: u32,
        /// Attack level.
        attack_level: u32,
    },
    /// Announces that the current wave was cleared.
    WaveCleared {
        /// Wave that was cleared.
        wave: u32,
    },
    /// Announces the end of a run.
    RunEnded {
        /// Why the run ended.
        reason: GameOverReason,
        /// Last wave reached.
        wave: u32,
    },
    /// Reports a client command the world refused.
    CommandRejected {
        /// Player that issued the command.
        player: PlayerId,
        /// Reason for the rejection.
        error: RoomError,
    },
}

/// Lifecycle phase of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Players gather; no simulation runs.
    Lobby,
    /// A wave was placed and enemies are frozen.
    Spawning,
    /// Enemies are active.
    Combat,
    /// The wave was cleared and pads remain open before the next wave.
    Shop,
    /// The run just ended; the room returns to the lobby immediately.
    GameOver,
}

/// Behaviour an enemy is currently following.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum EnemyMode {
    /// Following the waypoints of its lane.
    Path,
    /// Pursuing a player.
    Chase {
        /// Player being pursued.
        target: PlayerId,
    },
    /// Heading straight for the base.
    Goal,
}

/// Lane an enemy is assigned to at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lane {
    /// Left lane.
    Left,
    /// Right lane.
    Right,
}

impl Lane {
    /// Lane used after this one when alternating spawns.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Player stat that can be upgraded on a pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stat {
    /// Divides incoming melee damage.
    Armor,
    /// Multiplies projectile damage.
    Attack,
}

/// Reason a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameOverReason {
    /// The final wave was cleared.
    WavesCleared,
    /// The base was reduced to zero health.
    BaseDestroyed,
    /// Every player was dead at the same time.
    AllDead,
}

/// Errors reported back to the client that issued a rejected request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RoomError {
    /// No room with the provided code exists.
    #[error("Room not found")]
    RoomNotFound,
    /// Every spawn slot in the room is taken.
    #[error("Room is full")]
    RoomFull,
    /// The action requires host privileges.
    #[error("Only the host can do that")]
    NotHost,
    /// A run was started while nobody was ready.
    #[error("No players are ready")]
    NoReadyPlayers,
    /// The intent payload could not be used.
    #[error("Invalid request: {0}")]
    InvalidIntent(IntentFault),
}

/// Specific problem found in a client intent payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum IntentFault {
    /// The payload was missing fields or had the wrong shape.
    #[error("malformed payload")]
    Malformed,
    /// A coordinate was NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NonFiniteCoordinate,
    /// A shoot direction had zero length.
    #[error("shoot direction must be non-zero")]
    ZeroDirection,
}

/// Identifier of a connected player, allocated by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier assigned to an enemy within its room.
    EnemyId
);
entity_id!(
    /// Unique identifier assigned to a projectile within its room.
    ProjectileId
);
entity_id!(
    /// Unique identifier assigned to a coin within its room.
    CoinId
);

/// Short human-shareable room code made of uppercase ASCII letters and digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a generated code.
    pub const LENGTH: usize = 4;

    /// Alphabet codes are drawn from.
    pub const ALPHABET: &'static [u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    /// Parses a user-supplied code, accepting lowercase input.
    ///
    /// Returns `None` when the code is empty or contains characters outside
    /// [`RoomCode::ALPHABET`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() || !code.bytes().all(|byte| Self::ALPHABET.contains(&byte)) {
            return None;
        }
        Some(Self(code))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(RoomError::RoomNotFound)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// Immutable representation of a single player's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Identifier of the player.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Spawn slot occupied by the player.
    pub slot: usize,
    /// Current position.
    pub position: Vec2,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
    /// Whether the player is alive.
    pub alive: bool,
    /// Coin balance.
    pub coins: u32,
    /// Armor level in `1..=MAX_STAT_LEVEL`.
    pub armor_level: u32,
    /// Attack level in `1..=MAX_STAT_LEVEL`.
    pub attack_level: u32,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the player hosts the room.
    pub host: bool,
}

impl PlayerSnapshot {
    /// Level of the requested stat.
    #[must_use]
    pub const fn level(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Armor => self.armor_level,
            Stat::Attack => self.attack_level,
        }
    }
}

/// Read-only snapshot describing every player, in join order.
#[derive(Clone, Debug, Default)]
pub struct PlayerView {
    snapshots: Vec<PlayerSnapshot>,
}

impl PlayerView {
    /// Creates a new player view, preserving the provided join order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<PlayerSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured players in join order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the players that are alive.
    pub fn alive(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.snapshots.iter().filter(|player| player.alive)
    }

    /// Looks up a player by identifier.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&PlayerSnapshot> {
        self.snapshots.iter().find(|player| player.id == id)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PlayerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Current position.
    pub position: Vec2,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
    /// Wave the enemy belongs to.
    pub wave: u32,
    /// Lane the enemy follows.
    pub lane: Lane,
    /// Current AI mode.
    pub mode: EnemyMode,
    /// Index of the next lane waypoint.
    pub waypoint: usize,
    /// Room time at which the enemy spawned.
    pub spawned_at: Duration,
}

/// Read-only snapshot describing every enemy, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemies in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Player that fired the projectile.
    pub owner: PlayerId,
    /// Current position.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Damage fixed when the projectile was fired.
    pub damage: u32,
    /// Time the projectile has been in flight.
    pub age: Duration,
}

/// Read-only snapshot describing every projectile, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectiles in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a coin lying in the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoinSnapshot {
    /// Identifier of the coin.
    pub id: CoinId,
    /// Position of the coin.
    pub position: Vec2,
    /// Coins granted on pickup.
    pub value: u32,
}

/// Read-only snapshot describing every coin, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct CoinView {
    snapshots: Vec<CoinSnapshot>,
}

impl CoinView {
    /// Creates a new coin view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CoinSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured coins in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CoinSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CoinSnapshot> {
        self.snapshots
    }
}

/// Aggregate room counters used by phase checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomStatus {
    /// Active phase.
    pub phase: Phase,
    /// Whether a run is in progress.
    pub running: bool,
    /// Current wave number; zero before the first wave.
    pub wave: u32,
    /// Remaining base health.
    pub base_hp: u32,
    /// Maximum base health.
    pub base_max_hp: u32,
    /// Number of seated players.
    pub players: usize,
    /// Number of players still alive.
    pub living_players: usize,
    /// Number of enemies in play.
    pub enemies: usize,
}
