//! Process-wide table of live rooms and of which room each player sits in.

use std::sync::{Arc, Mutex};

use dashmap::{mapref::entry::Entry, DashMap};
use rampart_core::{LevelConfig, PlayerId, RoomCode, RoomError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    broadcast::Broadcaster,
    config::{ServerConfig, TimingConfig},
    protocol::{ClientIntent, ServerMessage},
    room::RoomHandle,
};

/// Owns every room of the process and routes players to them.
///
/// Each room runs as its own actor task; the registry only holds handles, so
/// rooms never share mutable state.
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, RoomHandle>,
    members: DashMap<PlayerId, RoomCode>,
    level: Arc<LevelConfig>,
    timing: TimingConfig,
    seed: u64,
    broadcaster: Arc<dyn Broadcaster>,
    codes: Mutex<ChaCha8Rng>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: &ServerConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            rooms: DashMap::new(),
            members: DashMap::new(),
            level: Arc::new(config.level.clone()),
            timing: config.timing,
            seed: config.seed,
            broadcaster,
            codes: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
        }
    }

    /// Opens a room hosted by `player`, who leaves any room they were in.
    pub async fn create_room(&self, player: PlayerId, name: String) -> Result<RoomCode, RoomError> {
        self.leave(player).await;

        let (code, handle) = loop {
            let code = self.generate_code();
            if let Entry::Vacant(entry) = self.rooms.entry(code.clone()) {
                let handle = RoomHandle::spawn(
                    code.clone(),
                    Arc::clone(&self.level),
                    self.timing,
                    self.seed,
                    Arc::clone(&self.broadcaster),
                );
                let _ = entry.insert(handle.clone());
                break (code, handle);
            }
        };
        info!(room = %code, host = %player, "room created");

        handle.join(player, name).await?;
        let _ = self.members.insert(player, code.clone());
        Ok(code)
    }

    /// Seats `player` in an existing room.
    ///
    /// The player keeps their current seat until the new room accepts them; a
    /// refused join leaves every room untouched.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        player: PlayerId,
        name: String,
    ) -> Result<(), RoomError> {
        let previous = self.room_of(player);
        if previous.as_ref() == Some(code) {
            return Ok(());
        }
        let handle = self.handle(code).ok_or(RoomError::RoomNotFound)?;

        handle.join(player, name).await?;
        if let Some(previous) = previous {
            self.depart(&previous, player).await;
        }
        let _ = self.members.insert(player, code.clone());
        info!(room = %code, %player, "player joined");
        Ok(())
    }

    /// Removes `player` from their room; the last departure closes the room.
    pub async fn leave(&self, player: PlayerId) {
        if let Some((_, code)) = self.members.remove(&player) {
            self.depart(&code, player).await;
        }
    }

    /// Routes a client intent; any rejection is reported to that player only.
    pub async fn dispatch(&self, player: PlayerId, intent: ClientIntent) {
        let outcome = match intent {
            ClientIntent::CreateRoom { name } => self.create_room(player, name).await.map(drop),
            ClientIntent::JoinRoom { room_id, name } => match RoomCode::parse(&room_id) {
                Some(code) => self.join_room(&code, player, name).await,
                None => Err(RoomError::RoomNotFound),
            },
            intent => self.forward(player, intent).await,
        };
        if let Err(error) = outcome {
            self.reject(player, error);
        }
    }

    /// Reports a rejected request back to the player who made it.
    pub fn reject(&self, player: PlayerId, error: RoomError) {
        debug!(%player, %error, "request rejected");
        self.broadcaster.send(player, ServerMessage::error(error));
    }

    /// Number of open rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Room the player currently sits in.
    #[must_use]
    pub fn room_of(&self, player: PlayerId) -> Option<RoomCode> {
        self.members.get(&player).map(|entry| entry.value().clone())
    }

    /// Closes every room.
    pub async fn shutdown(&self) {
        let handles: Vec<(RoomCode, RoomHandle)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        self.rooms.clear();
        self.members.clear();
        for (code, handle) in handles {
            handle.shutdown().await;
            debug!(room = %code, "room shut down");
        }
    }

    async fn depart(&self, code: &RoomCode, player: PlayerId) {
        let Some(handle) = self.handle(code) else {
            return;
        };
        let outcome = handle.leave(player).await;
        info!(room = %code, %player, "player left");
        if outcome.emptied {
            let removed = self
                .rooms
                .remove_if(code, |_, current| current.same_room(&handle));
            if removed.is_some() {
                info!(room = %code, "room deleted");
            }
        }
    }

    async fn forward(&self, player: PlayerId, intent: ClientIntent) -> Result<(), RoomError> {
        let code = self.room_of(player).ok_or(RoomError::RoomNotFound)?;
        let handle = self.handle(&code).ok_or(RoomError::RoomNotFound)?;
        let Some(command) = intent.into_command(player) else {
            return Ok(());
        };
        handle.command(command).await
    }

    fn handle(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.value().clone())
    }

    fn generate_code(&self) -> RoomCode {
        let mut rng = match self.codes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        loop {
            let raw: String = (0..RoomCode::LENGTH)
                .map(|_| {
                    let index = rng.gen_range(0..RoomCode::ALPHABET.len());
                    char::from(RoomCode::ALPHABET[index])
                })
                .collect();
            if let Some(code) = RoomCode::parse(&raw) {
                return code;
            }
        }
    }
}
