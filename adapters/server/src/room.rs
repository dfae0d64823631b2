//! Room actor: the single task that owns a room's simulation and timers.

use std::{sync::Arc, time::Duration};

use rampart_core::{
    tuning::MAX_WAVE, Command, Event, LevelConfig, Phase, PlayerId, RoomCode, RoomError,
};
use rampart_world::query;
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, info};

use crate::{
    broadcast::Broadcaster,
    config::TimingConfig,
    protocol::{HpUpdate, ServerMessage, StatsUpdate},
    scheduler::{DelayedAction, RoomScheduler, SchedulerFire},
    simulation::RoomSimulation,
};

const REQUEST_QUEUE: usize = 256;

/// Work submitted to a room actor.
#[derive(Debug)]
pub(crate) enum RoomRequest {
    Join {
        player: PlayerId,
        name: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<LeaveOutcome>,
    },
    Command(Command),
    Shutdown,
}

/// What a departure did to the room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LeaveOutcome {
    pub(crate) emptied: bool,
}

/// Cheap handle used to reach a running room actor.
#[derive(Clone, Debug)]
pub(crate) struct RoomHandle {
    tx: mpsc::Sender<RoomRequest>,
}

impl RoomHandle {
    /// Spawns the actor for a new room and returns its handle.
    pub(crate) fn spawn(
        code: RoomCode,
        level: Arc<LevelConfig>,
        timing: TimingConfig,
        seed: u64,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let actor = RoomActor {
            simulation: RoomSimulation::new(code, level, timing.tick_interval(), seed),
            scheduler: RoomScheduler::new(),
            timing,
            broadcaster,
            requests: rx,
            epoch: Instant::now(),
        };
        let _ = tokio::spawn(actor.run());
        Self { tx }
    }

    pub(crate) async fn join(&self, player: PlayerId, name: String) -> Result<(), RoomError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(RoomRequest::Join {
                player,
                name,
                reply,
            })
            .await
            .map_err(|_| RoomError::RoomNotFound)?;
        response.await.map_err(|_| RoomError::RoomNotFound)?
    }

    /// Removes a player; a room that already closed counts as emptied.
    pub(crate) async fn leave(&self, player: PlayerId) -> LeaveOutcome {
        let (reply, response) = oneshot::channel();
        if self
            .tx
            .send(RoomRequest::Leave { player, reply })
            .await
            .is_err()
        {
            return LeaveOutcome { emptied: true };
        }
        response.await.unwrap_or(LeaveOutcome { emptied: true })
    }

    pub(crate) async fn command(&self, command: Command) -> Result<(), RoomError> {
        self.tx
            .send(RoomRequest::Command(command))
            .await
            .map_err(|_| RoomError::RoomNotFound)
    }

    pub(crate) async fn shutdown(&self) {
        let _ = self.tx.send(RoomRequest::Shutdown).await;
    }

    pub(crate) fn same_room(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

struct RoomActor {
    simulation: RoomSimulation,
    scheduler: RoomScheduler,
    timing: TimingConfig,
    broadcaster: Arc<dyn Broadcaster>,
    requests: mpsc::Receiver<RoomRequest>,
    epoch: Instant,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room = %self.simulation.code(), "room opened");
        loop {
            tokio::select! {
                request = self.requests.recv() => {
                    let Some(request) = request else { break };
                    if !self.handle_request(request) {
                        break;
                    }
                }
                fire = self.scheduler.fired() => self.handle_fire(fire),
            }
        }
        self.scheduler.stop();
        info!(room = %self.simulation.code(), "room closed");
    }

    /// Returns `false` once the actor should exit.
    fn handle_request(&mut self, request: RoomRequest) -> bool {
        match request {
            RoomRequest::Join {
                player,
                name,
                reply,
            } => {
                let events = self
                    .simulation
                    .dispatch(Command::AddPlayer { player, name });
                // A refused seat changes nothing; the registry reports the error.
                if let Some(error) = rejection_for(&events, player) {
                    let _ = reply.send(Err(error));
                    return true;
                }
                self.broadcaster.send(
                    player,
                    ServerMessage::RoomJoined {
                        room_id: self.simulation.code().clone(),
                    },
                );
                let _ = reply.send(Ok(()));
                self.publish(&events, false);
                true
            }
            RoomRequest::Leave { player, reply } => {
                let events = self.simulation.dispatch(Command::RemovePlayer { player });
                let emptied = events.contains(&Event::RoomEmptied);
                self.publish(&events, false);
                let _ = reply.send(LeaveOutcome { emptied });
                !emptied
            }
            RoomRequest::Command(command) => {
                let now = self.epoch.elapsed();
                let events = self.simulation.dispatch_at(now, command);
                self.publish(&events, false);
                true
            }
            RoomRequest::Shutdown => false,
        }
    }

    fn handle_fire(&mut self, fire: SchedulerFire) {
        let events = match fire {
            SchedulerFire::Tick(at) => {
                let now = at.saturating_duration_since(self.epoch);
                self.simulation.tick(now)
            }
            SchedulerFire::Delay(action) => {
                debug!(room = %self.simulation.code(), ?action, "phase delay elapsed");
                self.simulation.dispatch(action.command())
            }
        };
        self.publish(&events, matches!(fire, SchedulerFire::Tick(_)));
    }

    /// Re-arms timers for the reported events and notifies clients.
    ///
    /// Discrete notifications go out in event order; snapshots of whatever
    /// changed follow. Ticks always refresh enemies and projectiles.
    fn publish(&mut self, events: &[Event], ticked: bool) {
        let code = self.simulation.code().clone();
        let mut room_dirty = false;
        let mut enemies_dirty = ticked;
        let mut projectiles_dirty = ticked;
        let mut coins_dirty = false;
        let mut hp_updates = Vec::new();
        let mut stats_updates = Vec::new();

        for event in events {
            match event {
                Event::RunStarted => {
                    self.scheduler.start_ticks(self.timing.tick_interval());
                    let wave = query::status(self.simulation.world()).wave.max(1);
                    info!(room = %code, wave, "run started");
                    self.broadcaster
                        .broadcast(&code, ServerMessage::GameStarted { wave });
                    room_dirty = true;
                    enemies_dirty = true;
                    projectiles_dirty = true;
                    coins_dirty = true;
                }
                Event::PhaseChanged { phase } => {
                    match phase {
                        Phase::Spawning => self
                            .scheduler
                            .schedule(self.timing.spawn_grace(), DelayedAction::ResumeCombat),
                        Phase::Shop => self
                            .scheduler
                            .schedule(self.timing.shop_window(), DelayedAction::NextWave),
                        Phase::Lobby | Phase::Combat | Phase::GameOver => {}
                    }
                    room_dirty = true;
                }
                Event::WaveStarted { wave } => {
                    self.broadcaster
                        .broadcast(&code, ServerMessage::WaveUpdated { wave: *wave });
                }
                Event::WaveCleared { wave } => {
                    self.broadcaster.broadcast(
                        &code,
                        ServerMessage::WaveCleared {
                            wave: *wave,
                            next_wave_in_ms: duration_ms(self.timing.shop_window()),
                            max_wave: MAX_WAVE,
                        },
                    );
                }
                Event::RunEnded { reason, wave } => {
                    self.scheduler.stop();
                    info!(room = %code, ?reason, wave, "run ended");
                    self.broadcaster.broadcast(
                        &code,
                        ServerMessage::GameOver {
                            wave: *wave,
                            reason: *reason,
                        },
                    );
                    room_dirty = true;
                    enemies_dirty = true;
                    projectiles_dirty = true;
                    coins_dirty = true;
                }
                Event::RoomEmptied => self.scheduler.stop(),
                Event::HostChanged { host } => {
                    info!(room = %code, host = ?host, "host changed");
                    room_dirty = true;
                }
                Event::PlayerJoined { .. } | Event::PlayerLeft { .. } | Event::ReadyChanged { .. } => {
                    room_dirty = true;
                }
                Event::BaseDamaged { hp, max_hp } => {
                    self.broadcaster.broadcast(
                        &code,
                        ServerMessage::BaseHpUpdated {
                            base_hp: *hp,
                            base_max_hp: *max_hp,
                        },
                    );
                }
                Event::PlayerHpChanged { player, hp, max_hp } => hp_updates.push(HpUpdate {
                    id: *player,
                    hp: *hp,
                    max_hp: *max_hp,
                }),
                Event::PlayerDied { player } => {
                    self.broadcaster
                        .broadcast(&code, ServerMessage::PlayerDied { id: *player });
                }
                Event::PlayerMoved { player, position } => {
                    // The mover already knows where they are.
                    self.broadcaster.broadcast_except(
                        &code,
                        *player,
                        ServerMessage::PlayerMoved {
                            id: *player,
                            x: position.x,
                            y: position.y,
                        },
                    );
                }
                Event::StatsChanged {
                    player,
                    coins,
                    armor_level,
                    attack_level,
                } => stats_updates.push(StatsUpdate {
                    id: *player,
                    coins: *coins,
                    armor_level: *armor_level,
                    attack_level: *attack_level,
                }),
                Event::EnemySpawned { .. }
                | Event::EnemyDespawned { .. }
                | Event::EnemyDamaged { .. }
                | Event::EnemyKilled { .. }
                | Event::EnemyReachedBase { .. } => enemies_dirty = true,
                Event::ProjectileFired { .. } | Event::ProjectileExpired { .. } => {
                    projectiles_dirty = true;
                }
                Event::CoinDropped { .. } | Event::CoinCollected { .. } => coins_dirty = true,
                Event::CommandRejected { player, error } => {
                    debug!(room = %code, %player, %error, "request rejected");
                    self.broadcaster.send(*player, ServerMessage::error(*error));
                }
                Event::TimeAdvanced { .. } => {}
            }
        }

        if !hp_updates.is_empty() {
            self.broadcaster.broadcast(
                &code,
                ServerMessage::PlayerHpUpdated {
                    players: hp_updates,
                },
            );
        }
        if !stats_updates.is_empty() {
            self.broadcaster.broadcast(
                &code,
                ServerMessage::PlayerStatsUpdated {
                    players: stats_updates,
                },
            );
        }

        let world = self.simulation.world();
        if room_dirty {
            self.broadcaster.broadcast(
                &code,
                ServerMessage::room_state(
                    &code,
                    &query::status(world),
                    query::host(world),
                    &query::player_view(world),
                ),
            );
        }
        if enemies_dirty {
            self.broadcaster
                .broadcast(&code, ServerMessage::enemies(&query::enemy_view(world)));
        }
        if projectiles_dirty {
            self.broadcaster.broadcast(
                &code,
                ServerMessage::projectiles(&query::projectile_view(world)),
            );
        }
        if coins_dirty {
            self.broadcaster
                .broadcast(&code, ServerMessage::coins(&query::coin_view(world)));
        }
    }
}

fn rejection_for(events: &[Event], player: PlayerId) -> Option<RoomError> {
    events.iter().find_map(|event| match event {
        Event::CommandRejected {
            player: rejected,
            error,
        } if *rejected == player => Some(*error),
        _ => None,
    })
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
