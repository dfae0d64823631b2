//! JSON wire format exchanged with clients.
//!
//! Inbound intents and outbound messages are internally tagged by a `type`
//! field carrying the camelCase event name.

use rampart_core::{
    tuning::MAX_WAVE, CoinSnapshot, CoinView, Command, EnemyMode, EnemySnapshot, EnemyView,
    GameOverReason, IntentFault, Phase, PlayerId, PlayerSnapshot, PlayerView, ProjectileSnapshot,
    ProjectileView, RoomCode, RoomError, RoomStatus, Vec2,
};
use serde::{Deserialize, Serialize};

/// Request sent by a client.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientIntent {
    /// Opens a new room hosted by the sender.
    CreateRoom {
        /// Display name of the host.
        #[serde(default)]
        name: String,
    },
    /// Joins an existing room.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        /// Code of the room to join.
        room_id: String,
        /// Display name of the joining player.
        #[serde(default)]
        name: String,
    },
    /// Toggles the lobby ready flag.
    PlayerReady {
        /// Requested ready state.
        ready: bool,
    },
    /// Starts a run; host only.
    StartGame,
    /// Restarts after a run ended; host only.
    RestartGame,
    /// Reports the sender's position.
    PlayerMovement {
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
    /// Fires a projectile in the given direction.
    #[serde(rename_all = "camelCase")]
    PlayerShoot {
        /// Horizontal aim component.
        dir_x: f32,
        /// Vertical aim component.
        dir_y: f32,
    },
}

impl ClientIntent {
    /// Decodes an intent, reporting any shape problem as a malformed request.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RoomError> {
        serde_json::from_value(value).map_err(|_| RoomError::InvalidIntent(IntentFault::Malformed))
    }

    /// Translates an in-room intent into the world command it requests.
    ///
    /// Returns `None` for room membership intents, which the registry handles.
    #[must_use]
    pub fn into_command(self, player: PlayerId) -> Option<Command> {
        let command = match self {
            Self::CreateRoom { .. } | Self::JoinRoom { .. } => return None,
            Self::PlayerReady { ready } => Command::SetReady { player, ready },
            Self::StartGame => Command::StartRun {
                requested_by: player,
            },
            Self::RestartGame => Command::RestartRun {
                requested_by: player,
            },
            Self::PlayerMovement { x, y } => Command::MovePlayer {
                player,
                position: Vec2::new(x, y),
            },
            Self::PlayerShoot { dir_x, dir_y } => Command::Shoot {
                player,
                direction: Vec2::new(dir_x, dir_y),
            },
        };
        Some(command)
    }
}

/// Message sent to one client or to every member of a room.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Confirms room membership to the joining player.
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        /// Code of the joined room.
        room_id: RoomCode,
    },
    /// Full lobby and run snapshot.
    #[serde(rename_all = "camelCase")]
    RoomState {
        /// Code of the room.
        room_id: RoomCode,
        /// Active phase.
        phase: Phase,
        /// Whether a run is in progress.
        running: bool,
        /// Current wave.
        wave: u32,
        /// Last wave of a run.
        max_wave: u32,
        /// Remaining base health.
        base_hp: u32,
        /// Maximum base health.
        base_max_hp: u32,
        /// Current host.
        host: Option<PlayerId>,
        /// Seated players in join order.
        players: Vec<PlayerState>,
    },
    /// Every enemy in play.
    EnemiesUpdated {
        /// Enemy list.
        enemies: Vec<EnemyState>,
    },
    /// Every projectile in flight.
    ProjectilesUpdated {
        /// Projectile list.
        projectiles: Vec<ProjectileState>,
    },
    /// Every coin lying in the arena.
    CoinsUpdated {
        /// Coin list.
        coins: Vec<CoinState>,
    },
    /// Health of the players hurt during one update.
    PlayerHpUpdated {
        /// Health entries.
        players: Vec<HpUpdate>,
    },
    /// A player died.
    PlayerDied {
        /// Player that died.
        id: PlayerId,
    },
    /// A player moved.
    PlayerMoved {
        /// Player that moved.
        id: PlayerId,
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
    /// A new wave spawned.
    WaveUpdated {
        /// Wave number.
        wave: u32,
    },
    /// The wave was cleared and the shop opened.
    #[serde(rename_all = "camelCase")]
    WaveCleared {
        /// Cleared wave.
        wave: u32,
        /// Time until the next wave spawns.
        next_wave_in_ms: u64,
        /// Last wave of a run.
        max_wave: u32,
    },
    /// Base health changed.
    #[serde(rename_all = "camelCase")]
    BaseHpUpdated {
        /// Remaining base health.
        base_hp: u32,
        /// Maximum base health.
        base_max_hp: u32,
    },
    /// Economy of players whose coins or levels changed.
    PlayerStatsUpdated {
        /// Stat entries.
        players: Vec<StatsUpdate>,
    },
    /// A run started.
    GameStarted {
        /// First wave of the run.
        wave: u32,
    },
    /// A run ended.
    GameOver {
        /// Last wave reached.
        wave: u32,
        /// Why the run ended.
        reason: GameOverReason,
    },
    /// A request from this client was rejected.
    ErrorMessage {
        /// Human readable reason.
        message: String,
        /// Machine readable reason.
        error: RoomError,
    },
}

impl ServerMessage {
    /// Builds the rejection notice for a failed request.
    #[must_use]
    pub fn error(error: RoomError) -> Self {
        Self::ErrorMessage {
            message: error.to_string(),
            error,
        }
    }

    /// Builds the room snapshot broadcast after membership or phase changes.
    #[must_use]
    pub fn room_state(
        code: &RoomCode,
        status: &RoomStatus,
        host: Option<PlayerId>,
        players: &PlayerView,
    ) -> Self {
        Self::RoomState {
            room_id: code.clone(),
            phase: status.phase,
            running: status.running,
            wave: status.wave,
            max_wave: MAX_WAVE,
            base_hp: status.base_hp,
            base_max_hp: status.base_max_hp,
            host,
            players: players.iter().map(PlayerState::from).collect(),
        }
    }

    /// Builds the enemy list broadcast.
    #[must_use]
    pub fn enemies(view: &EnemyView) -> Self {
        Self::EnemiesUpdated {
            enemies: view.iter().map(EnemyState::from).collect(),
        }
    }

    /// Builds the projectile list broadcast.
    #[must_use]
    pub fn projectiles(view: &ProjectileView) -> Self {
        Self::ProjectilesUpdated {
            projectiles: view.iter().map(ProjectileState::from).collect(),
        }
    }

    /// Builds the coin list broadcast.
    #[must_use]
    pub fn coins(view: &CoinView) -> Self {
        Self::CoinsUpdated {
            coins: view.iter().map(CoinState::from).collect(),
        }
    }
}

/// Player entry of a room snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
    /// Whether the player is dead.
    pub is_dead: bool,
    /// Coin balance.
    pub coins: u32,
    /// Armor level.
    pub armor_level: u32,
    /// Attack level.
    pub attack_level: u32,
    /// Lobby ready flag.
    pub ready: bool,
    /// Whether the player hosts the room.
    pub is_host: bool,
}

impl From<&PlayerSnapshot> for PlayerState {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            x: player.position.x,
            y: player.position.y,
            hp: player.hp,
            max_hp: player.max_hp,
            is_dead: !player.alive,
            coins: player.coins,
            armor_level: player.armor_level,
            attack_level: player.attack_level,
            ready: player.ready,
            is_host: player.host,
        }
    }
}

/// Enemy entry of an enemy list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyState {
    /// Enemy identifier.
    pub id: u32,
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
    /// Wave the enemy belongs to.
    pub wave: u32,
    /// Behaviour; chasing enemies also carry their target.
    #[serde(flatten)]
    pub mode: EnemyMode,
}

impl From<&EnemySnapshot> for EnemyState {
    fn from(enemy: &EnemySnapshot) -> Self {
        Self {
            id: enemy.id.get(),
            x: enemy.position.x,
            y: enemy.position.y,
            hp: enemy.hp,
            max_hp: enemy.max_hp,
            wave: enemy.wave,
            mode: enemy.mode,
        }
    }
}

/// Projectile entry of a projectile list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileState {
    /// Projectile identifier.
    pub id: u32,
    /// Player that fired it.
    pub owner_id: PlayerId,
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// Horizontal velocity.
    pub vx: f32,
    /// Vertical velocity.
    pub vy: f32,
}

impl From<&ProjectileSnapshot> for ProjectileState {
    fn from(projectile: &ProjectileSnapshot) -> Self {
        Self {
            id: projectile.id.get(),
            owner_id: projectile.owner,
            x: projectile.position.x,
            y: projectile.position.y,
            vx: projectile.velocity.x,
            vy: projectile.velocity.y,
        }
    }
}

/// Coin entry of a coin list.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CoinState {
    /// Coin identifier.
    pub id: u32,
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// Coins granted on pickup.
    pub value: u32,
}

impl From<&CoinSnapshot> for CoinState {
    fn from(coin: &CoinSnapshot) -> Self {
        Self {
            id: coin.id.get(),
            x: coin.position.x,
            y: coin.position.y,
            value: coin.value,
        }
    }
}

/// Health entry of a `playerHpUpdated` message.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HpUpdate {
    /// Player that was hurt.
    pub id: PlayerId,
    /// Remaining health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
}

/// Economy entry of a `playerStatsUpdated` message.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    /// Player whose stats changed.
    pub id: PlayerId,
    /// Coin balance.
    pub coins: u32,
    /// Armor level.
    pub armor_level: u32,
    /// Attack level.
    pub attack_level: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intents_decode_from_camel_case_tags() {
        let intent = ClientIntent::from_value(json!({
            "type": "joinRoom",
            "roomId": "ab12",
            "name": "Ada",
        }));
        assert_eq!(
            intent,
            Ok(ClientIntent::JoinRoom {
                room_id: "ab12".into(),
                name: "Ada".into(),
            })
        );

        let intent = ClientIntent::from_value(json!({"type": "playerShoot", "dirX": 1, "dirY": 0}));
        assert_eq!(
            intent,
            Ok(ClientIntent::PlayerShoot {
                dir_x: 1.0,
                dir_y: 0.0
            })
        );
        assert_eq!(
            ClientIntent::from_value(json!({"type": "startGame"})),
            Ok(ClientIntent::StartGame)
        );
    }

    #[test]
    fn missing_or_non_numeric_coordinates_are_malformed() {
        let malformed = Err(RoomError::InvalidIntent(IntentFault::Malformed));
        assert_eq!(
            ClientIntent::from_value(json!({"type": "playerMovement", "x": 3})),
            malformed
        );
        assert_eq!(
            ClientIntent::from_value(json!({"type": "playerMovement", "x": "3", "y": 4})),
            malformed
        );
        assert_eq!(ClientIntent::from_value(json!({"type": "dance"})), malformed);
    }

    #[test]
    fn membership_intents_carry_no_world_command() {
        let player = PlayerId::new(3);
        assert_eq!(
            ClientIntent::CreateRoom {
                name: "Ada".into()
            }
            .into_command(player),
            None
        );
        assert_eq!(
            ClientIntent::PlayerMovement { x: 1.0, y: 2.0 }.into_command(player),
            Some(Command::MovePlayer {
                player,
                position: Vec2::new(1.0, 2.0),
            })
        );
    }

    #[test]
    fn messages_serialize_with_type_tags() {
        let message = ServerMessage::WaveCleared {
            wave: 2,
            next_wave_in_ms: 5000,
            max_wave: MAX_WAVE,
        };
        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({"type": "waveCleared", "wave": 2, "nextWaveInMs": 5000, "maxWave": 5})
        );

        let message = ServerMessage::error(RoomError::RoomFull);
        assert_eq!(
            serde_json::to_value(&message).expect("serialize")["message"],
            json!("Room is full")
        );
    }

    #[test]
    fn chasing_enemies_expose_their_target() {
        let state = EnemyState {
            id: 4,
            x: 1.0,
            y: 2.0,
            hp: 10,
            max_hp: 10,
            wave: 1,
            mode: EnemyMode::Chase {
                target: PlayerId::new(9),
            },
        };
        let value = serde_json::to_value(state).expect("serialize");
        assert_eq!(value["mode"], json!("chase"));
        assert_eq!(value["target"], json!(9));
    }
}
