#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative room state management for Rampart.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use rampart_core::{
    tuning::{
        self, BASE_CONTACT_DISTANCE, BASE_DAMAGE_PER_TICK, COIN_VALUE, ENEMY_LIFETIME,
        ENEMY_MAX_HP, MAX_STAT_LEVEL, MAX_WAVE, PICKUP_RADIUS, PLAYER_MAX_HP,
        PROJECTILE_HIT_DISTANCE, PROJECTILE_SPEED, UPGRADE_COST,
    },
    CoinId, Command, EnemyId, EnemyMode, Event, GameOverReason, IntentFault, Lane, LevelConfig,
    Phase, PlayerId, ProjectileId, RoomError, Stat, Vec2,
};

mod geometry;

/// Slack allowed when re-validating distances proposed by systems.
const DISTANCE_TOLERANCE: f32 = 1e-3;

/// Represents the authoritative state of a single room.
#[derive(Debug)]
pub struct World {
    level: Arc<LevelConfig>,
    projectile_step: Duration,
    phase: Phase,
    running: bool,
    wave: u32,
    base_hp: u32,
    host: Option<PlayerId>,
    players: Vec<Player>,
    enemies: BTreeMap<EnemyId, Enemy>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    coins: BTreeMap<CoinId, Coin>,
    next_enemy: u32,
    next_projectile: u32,
    next_coin: u32,
    clock: Duration,
    enemy_clock: Option<Duration>,
}

impl World {
    /// Creates an empty room in the lobby.
    ///
    /// `projectile_step` is the fixed time projectiles advance by per tick,
    /// independent of how late the tick actually fired.
    #[must_use]
    pub fn new(level: Arc<LevelConfig>, projectile_step: Duration) -> Self {
        let base_hp = level.base.max_hp;
        Self {
            level,
            projectile_step,
            phase: Phase::Lobby,
            running: false,
            wave: 0,
            base_hp,
            host: None,
            players: Vec::new(),
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            coins: BTreeMap::new(),
            next_enemy: 0,
            next_projectile: 0,
            next_coin: 0,
            clock: Duration::ZERO,
            enemy_clock: None,
        }
    }

    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    fn add_player(&mut self, id: PlayerId, name: String, out_events: &mut Vec<Event>) {
        if self.player(id).is_some() {
            return;
        }
        let Some(slot) = self.free_slot() else {
            out_events.push(Event::CommandRejected {
                player: id,
                error: RoomError::RoomFull,
            });
            return;
        };

        let position = self.level.spawn_points[slot];
        self.players.push(Player::new(id, name, slot, position));
        out_events.push(Event::PlayerJoined { player: id, slot });

        if self.host.is_none() {
            self.host = Some(id);
            out_events.push(Event::HostChanged { host: Some(id) });
        }
    }

    fn free_slot(&self) -> Option<usize> {
        (0..self.level.capacity()).find(|slot| self.players.iter().all(|p| p.slot != *slot))
    }

    fn remove_player(&mut self, id: PlayerId, out_events: &mut Vec<Event>) {
        let Some(index) = self.players.iter().position(|player| player.id == id) else {
            return;
        };
        let _ = self.players.remove(index);
        out_events.push(Event::PlayerLeft { player: id });

        if self.host == Some(id) {
            self.host = self.players.first().map(|player| player.id);
            out_events.push(Event::HostChanged { host: self.host });
        }

        if self.players.is_empty() {
            self.running = false;
            self.phase = Phase::Lobby;
            out_events.push(Event::RoomEmptied);
        }
    }

    fn request_run(&mut self, requested_by: PlayerId, restart: bool, out_events: &mut Vec<Event>) {
        if self.host != Some(requested_by) {
            out_events.push(Event::CommandRejected {
                player: requested_by,
                error: RoomError::NotHost,
            });
            return;
        }
        if self.running {
            return;
        }
        if !restart && !self.players.iter().any(|player| player.ready) {
            out_events.push(Event::CommandRejected {
                player: requested_by,
                error: RoomError::NoReadyPlayers,
            });
            return;
        }

        self.reset_run_state();
        for player in &mut self.players {
            player.position = self.level.spawn_points[player.slot];
            player.ready = restart;
        }
        self.running = true;
        self.phase = Phase::Combat;
        out_events.push(Event::RunStarted);
        out_events.push(Event::PhaseChanged {
            phase: Phase::Combat,
        });
    }

    fn reset_run_state(&mut self) {
        self.wave = 0;
        self.base_hp = self.level.base.max_hp;
        self.enemies.clear();
        self.projectiles.clear();
        self.coins.clear();
        self.enemy_clock = None;
        for player in &mut self.players {
            player.reset_for_run();
        }
    }

    fn end_run(&mut self, reason: GameOverReason, out_events: &mut Vec<Event>) {
        let wave = self.wave;
        self.running = false;
        self.phase = Phase::GameOver;
        out_events.push(Event::PhaseChanged {
            phase: Phase::GameOver,
        });
        out_events.push(Event::RunEnded { reason, wave });

        self.reset_run_state();
        for player in &mut self.players {
            player.ready = false;
        }
        self.phase = Phase::Lobby;
        out_events.push(Event::PhaseChanged {
            phase: Phase::Lobby,
        });
    }

    fn advance_clock(&mut self, now: Duration, out_events: &mut Vec<Event>) {
        self.clock = now;
        if !self.running {
            return;
        }

        let expired: Vec<EnemyId> = self
            .enemies
            .values()
            .filter(|enemy| now.saturating_sub(enemy.spawned_at) >= ENEMY_LIFETIME)
            .map(|enemy| enemy.id)
            .collect();
        for enemy in expired {
            let _ = self.enemies.remove(&enemy);
            out_events.push(Event::EnemyDespawned { enemy });
        }

        let enemy_dt = if self.phase == Phase::Combat {
            let dt = self
                .enemy_clock
                .map_or(Duration::ZERO, |last| now.saturating_sub(last));
            self.enemy_clock = Some(now);
            dt
        } else {
            self.enemy_clock = None;
            Duration::ZERO
        };
        out_events.push(Event::TimeAdvanced { now, enemy_dt });
    }

    fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let step = self.projectile_step;
        let lifetime = tuning::projectile_lifetime();
        let arena = self.level.arena;

        let mut spent = Vec::new();
        for projectile in self.projectiles.values_mut() {
            projectile.position += projectile.velocity * step.as_secs_f32();
            projectile.age = projectile.age.saturating_add(step);
            if !arena.contains(projectile.position) || projectile.age > lifetime {
                spent.push(projectile.id);
            }
        }
        for projectile in spent {
            let _ = self.projectiles.remove(&projectile);
            out_events.push(Event::ProjectileExpired { projectile });
        }
    }

    fn move_player(&mut self, id: PlayerId, position: Vec2, out_events: &mut Vec<Event>) {
        if !self.running || !self.player(id).is_some_and(|player| player.alive) {
            return;
        }
        if !position.is_finite() {
            out_events.push(Event::CommandRejected {
                player: id,
                error: RoomError::InvalidIntent(IntentFault::NonFiniteCoordinate),
            });
            return;
        }
        if let Some(player) = self.player_mut(id) {
            player.position = position;
            out_events.push(Event::PlayerMoved {
                player: id,
                position,
            });
        }
    }

    fn shoot(&mut self, id: PlayerId, direction: Vec2, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let Some(player) = self.player(id).filter(|player| player.alive) else {
            return;
        };
        let fault = if !direction.is_finite() {
            Some(IntentFault::NonFiniteCoordinate)
        } else if direction.length_squared() == 0.0 {
            Some(IntentFault::ZeroDirection)
        } else {
            None
        };
        if let Some(fault) = fault {
            out_events.push(Event::CommandRejected {
                player: id,
                error: RoomError::InvalidIntent(fault),
            });
            return;
        }

        let projectile = Projectile {
            id: ProjectileId::new(self.next_projectile),
            owner: id,
            position: player.position,
            velocity: direction.normalize() * PROJECTILE_SPEED,
            damage: tuning::projectile_damage(player.attack_level),
            age: Duration::ZERO,
        };
        self.next_projectile = self.next_projectile.wrapping_add(1);
        out_events.push(Event::ProjectileFired {
            projectile: projectile.id,
            owner: id,
        });
        let _ = self.projectiles.insert(projectile.id, projectile);
    }

    fn begin_wave(&mut self, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        if self.wave >= MAX_WAVE {
            self.end_run(GameOverReason::WavesCleared, out_events);
            return;
        }
        self.wave += 1;
        self.phase = Phase::Spawning;
        self.enemy_clock = None;
        out_events.push(Event::WaveStarted { wave: self.wave });
        out_events.push(Event::PhaseChanged {
            phase: Phase::Spawning,
        });
    }

    fn spawn_enemy(&mut self, lane: Lane, position: Vec2, out_events: &mut Vec<Event>) {
        if !self.running || !position.is_finite() {
            return;
        }
        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);
        let enemy = Enemy {
            id,
            position,
            hp: ENEMY_MAX_HP,
            wave: self.wave,
            lane,
            mode: EnemyMode::Path,
            waypoint: 0,
            spawned_at: self.clock,
        };
        let _ = self.enemies.insert(id, enemy);
        out_events.push(Event::EnemySpawned { enemy: id });
    }

    fn steer_enemy(&mut self, id: EnemyId, mode: EnemyMode, waypoint: usize, to: Vec2) {
        if !self.running || self.phase != Phase::Combat {
            return;
        }
        let level = Arc::clone(&self.level);
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return;
        };
        enemy.mode = mode;
        enemy.waypoint = waypoint.min(level.lane(enemy.lane).len());
        let destination = if to.is_finite() { to } else { enemy.position };
        enemy.position = geometry::constrain_enemy(&level, destination);
    }

    fn strike_base(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let contact = BASE_CONTACT_DISTANCE + DISTANCE_TOLERANCE;
        let in_contact = self.enemies.get(&id).is_some_and(|enemy| {
            enemy.position.distance_squared(self.level.base.position) <= contact * contact
        });
        if !in_contact {
            return;
        }
        let _ = self.enemies.remove(&id);
        self.base_hp = self.base_hp.saturating_sub(BASE_DAMAGE_PER_TICK);
        out_events.push(Event::EnemyReachedBase { enemy: id });
        out_events.push(Event::BaseDamaged {
            hp: self.base_hp,
            max_hp: self.level.base.max_hp,
        });
    }

    fn damage_player(&mut self, id: PlayerId, amount: u32, out_events: &mut Vec<Event>) {
        if !self.running || amount == 0 {
            return;
        }
        let Some(player) = self.player_mut(id).filter(|player| player.alive) else {
            return;
        };
        player.hp = player.hp.saturating_sub(amount);
        out_events.push(Event::PlayerHpChanged {
            player: id,
            hp: player.hp,
            max_hp: player.max_hp,
        });
        if player.hp == 0 {
            player.alive = false;
            out_events.push(Event::PlayerDied { player: id });
        }
    }

    fn hit_enemy(&mut self, projectile: ProjectileId, enemy: EnemyId, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let (Some(shot), Some(target)) = (
            self.projectiles.get(&projectile),
            self.enemies.get_mut(&enemy),
        ) else {
            return;
        };
        let reach = PROJECTILE_HIT_DISTANCE + DISTANCE_TOLERANCE;
        if shot.position.distance_squared(target.position) > reach * reach {
            return;
        }

        target.hp = target.hp.saturating_sub(shot.damage);
        let remaining = target.hp;
        let position = target.position;
        let _ = self.projectiles.remove(&projectile);
        out_events.push(Event::EnemyDamaged {
            enemy,
            hp: remaining,
        });

        if remaining == 0 {
            let _ = self.enemies.remove(&enemy);
            out_events.push(Event::EnemyKilled { enemy, position });

            let coin = CoinId::new(self.next_coin);
            self.next_coin = self.next_coin.wrapping_add(1);
            let _ = self.coins.insert(
                coin,
                Coin {
                    id: coin,
                    position,
                    value: COIN_VALUE,
                },
            );
            out_events.push(Event::CoinDropped {
                coin,
                position,
            });
        }
    }

    fn collect_coin(&mut self, coin: CoinId, id: PlayerId, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let Some(&Coin {
            position, value, ..
        }) = self.coins.get(&coin)
        else {
            return;
        };
        let reach = PICKUP_RADIUS + DISTANCE_TOLERANCE;
        let Some(player) = self.player_mut(id).filter(|player| {
            player.alive && player.position.distance_squared(position) <= reach * reach
        }) else {
            return;
        };

        player.coins = player.coins.saturating_add(value);
        let stats = player.stats_event();
        let _ = self.coins.remove(&coin);
        out_events.push(Event::CoinCollected { coin, player: id });
        out_events.push(stats);
    }

    fn purchase_upgrade(&mut self, id: PlayerId, stat: Stat, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        let pad = *self.level.pad(stat);
        let Some(player) = self
            .player_mut(id)
            .filter(|player| player.alive && pad.contains(player.position))
        else {
            return;
        };
        if player.coins < UPGRADE_COST || player.level(stat) >= MAX_STAT_LEVEL {
            return;
        }

        player.coins -= UPGRADE_COST;
        match stat {
            Stat::Armor => player.armor_level += 1,
            Stat::Attack => player.attack_level += 1,
        }
        out_events.push(player.stats_event());
    }

    fn open_shop(&mut self, out_events: &mut Vec<Event>) {
        if !self.running || self.phase != Phase::Combat || !self.enemies.is_empty() {
            return;
        }
        self.phase = Phase::Shop;
        out_events.push(Event::WaveCleared { wave: self.wave });
        out_events.push(Event::PhaseChanged { phase: Phase::Shop });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { now } => world.advance_clock(now, out_events),
        Command::AdvanceProjectiles => world.advance_projectiles(out_events),
        Command::AddPlayer { player, name } => world.add_player(player, name, out_events),
        Command::RemovePlayer { player } => world.remove_player(player, out_events),
        Command::SetReady { player, ready } => {
            if let Some(seat) = world.player_mut(player) {
                seat.ready = ready;
                out_events.push(Event::ReadyChanged { player, ready });
            }
        }
        Command::StartRun { requested_by } => world.request_run(requested_by, false, out_events),
        Command::RestartRun { requested_by } => world.request_run(requested_by, true, out_events),
        Command::MovePlayer { player, position } => world.move_player(player, position, out_events),
        Command::Shoot { player, direction } => world.shoot(player, direction, out_events),
        Command::BeginWave => world.begin_wave(out_events),
        Command::SpawnEnemy { lane, position } => world.spawn_enemy(lane, position, out_events),
        Command::ResumeCombat => {
            if world.running && world.phase == Phase::Spawning {
                world.phase = Phase::Combat;
                world.enemy_clock = None;
                out_events.push(Event::PhaseChanged {
                    phase: Phase::Combat,
                });
            }
        }
        Command::MoveEnemy {
            enemy,
            mode,
            waypoint,
            to,
        } => world.steer_enemy(enemy, mode, waypoint, to),
        Command::StrikeBase { enemy } => world.strike_base(enemy, out_events),
        Command::DamagePlayer { player, amount } => world.damage_player(player, amount, out_events),
        Command::HitEnemy { projectile, enemy } => world.hit_enemy(projectile, enemy, out_events),
        Command::CollectCoin { coin, player } => world.collect_coin(coin, player, out_events),
        Command::PurchaseUpgrade { player, stat } => {
            world.purchase_upgrade(player, stat, out_events)
        }
        Command::OpenShop => world.open_shop(out_events),
        Command::EndRun { reason } => {
            if world.running {
                world.end_run(reason, out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use rampart_core::{
        CoinSnapshot, CoinView, EnemySnapshot, EnemyView, LevelConfig, Phase, PlayerId,
        PlayerSnapshot, PlayerView, ProjectileSnapshot, ProjectileView, RoomStatus,
    };

    use super::World;

    /// Provides read-only access to the level geometry the room runs on.
    #[must_use]
    pub fn level(world: &World) -> &LevelConfig {
        &world.level
    }

    /// Active phase of the room.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Reports whether a run is in progress.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.running
    }

    /// Current host, if anyone is seated.
    #[must_use]
    pub fn host(world: &World) -> Option<PlayerId> {
        world.host
    }

    /// Aggregate counters used by phase checks.
    #[must_use]
    pub fn status(world: &World) -> RoomStatus {
        RoomStatus {
            phase: world.phase,
            running: world.running,
            wave: world.wave,
            base_hp: world.base_hp,
            base_max_hp: world.level.base.max_hp,
            players: world.players.len(),
            living_players: world.players.iter().filter(|player| player.alive).count(),
            enemies: world.enemies.len(),
        }
    }

    /// Captures a read-only view of the seated players in join order.
    #[must_use]
    pub fn player_view(world: &World) -> PlayerView {
        PlayerView::from_snapshots(
            world
                .players
                .iter()
                .map(|player| PlayerSnapshot {
                    id: player.id,
                    name: player.name.clone(),
                    slot: player.slot,
                    position: player.position,
                    hp: player.hp,
                    max_hp: player.max_hp,
                    alive: player.alive,
                    coins: player.coins,
                    armor_level: player.armor_level,
                    attack_level: player.attack_level,
                    ready: player.ready,
                    host: world.host == Some(player.id),
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the enemies in play.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .values()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    position: enemy.position,
                    hp: enemy.hp,
                    max_hp: super::ENEMY_MAX_HP,
                    wave: enemy.wave,
                    lane: enemy.lane,
                    mode: enemy.mode,
                    waypoint: enemy.waypoint,
                    spawned_at: enemy.spawned_at,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .values()
                .map(|projectile| ProjectileSnapshot {
                    id: projectile.id,
                    owner: projectile.owner,
                    position: projectile.position,
                    velocity: projectile.velocity,
                    damage: projectile.damage,
                    age: projectile.age,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the coins lying in the arena.
    #[must_use]
    pub fn coin_view(world: &World) -> CoinView {
        CoinView::from_snapshots(
            world
                .coins
                .values()
                .map(|coin| CoinSnapshot {
                    id: coin.id,
                    position: coin.position,
                    value: coin.value,
                })
                .collect(),
        )
    }
}

#[derive(Clone, Debug)]
struct Player {
    id: PlayerId,
    name: String,
    slot: usize,
    position: Vec2,
    hp: u32,
    max_hp: u32,
    alive: bool,
    coins: u32,
    armor_level: u32,
    attack_level: u32,
    ready: bool,
}

impl Player {
    fn new(id: PlayerId, name: String, slot: usize, position: Vec2) -> Self {
        Self {
            id,
            name,
            slot,
            position,
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            alive: true,
            coins: 0,
            armor_level: 1,
            attack_level: 1,
            ready: false,
        }
    }

    fn reset_for_run(&mut self) {
        self.hp = PLAYER_MAX_HP;
        self.max_hp = PLAYER_MAX_HP;
        self.alive = true;
        self.coins = 0;
        self.armor_level = 1;
        self.attack_level = 1;
    }

    fn level(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Armor => self.armor_level,
            Stat::Attack => self.attack_level,
        }
    }

    fn stats_event(&self) -> Event {
        Event::StatsChanged {
            player: self.id,
            coins: self.coins,
            armor_level: self.armor_level,
            attack_level: self.attack_level,
        }
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    position: Vec2,
    hp: u32,
    wave: u32,
    lane: Lane,
    mode: EnemyMode,
    waypoint: usize,
    spawned_at: Duration,
}

#[derive(Clone, Debug)]
struct Projectile {
    id: ProjectileId,
    owner: PlayerId,
    position: Vec2,
    velocity: Vec2,
    damage: u32,
    age: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Coin {
    id: CoinId,
    position: Vec2,
    value: u32,
}
