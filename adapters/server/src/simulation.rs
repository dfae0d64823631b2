//! One room's world together with the systems that drive it.

use std::{mem, sync::Arc, time::Duration};

use rampart_core::{Command, Event, LevelConfig, Phase, RoomCode};
use rampart_system_combat::Combat;
use rampart_system_enemy_ai::EnemyAi;
use rampart_system_progression::Progression;
use rampart_system_spawning::{Config as SpawningConfig, Spawning};
use rampart_world::{self as world, query, World};

/// Authoritative simulation of a single room.
///
/// Client commands go through [`RoomSimulation::dispatch`]; the periodic
/// driver calls [`RoomSimulation::tick`]. Both return every event the world
/// reported, in order.
#[derive(Debug)]
pub struct RoomSimulation {
    code: RoomCode,
    world: World,
    enemy_ai: EnemyAi,
    combat: Combat,
    spawning: Spawning,
    progression: Progression,
}

impl RoomSimulation {
    /// Creates an empty room in the lobby.
    ///
    /// `tick_interval` doubles as the fixed step projectiles advance by.
    #[must_use]
    pub fn new(
        code: RoomCode,
        level: Arc<LevelConfig>,
        tick_interval: Duration,
        global_seed: u64,
    ) -> Self {
        let spawning = Spawning::new(SpawningConfig::labeled(global_seed, code.as_str()));
        Self {
            code,
            world: World::new(level, tick_interval),
            enemy_ai: EnemyAi::new(),
            combat: Combat::new(),
            spawning,
            progression: Progression::new(),
        }
    }

    /// Code of the room.
    #[must_use]
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Read-only access to the room state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Applies a command and everything the reactive systems derive from it.
    pub fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        self.execute(vec![command], &mut log);
        log
    }

    /// Applies a client command issued at `now`, measured from the room's epoch.
    ///
    /// Outside a run nothing ticks, so the room clock is brought up to `now`
    /// first; a run started after a long lobby wait stamps its first wave with
    /// the current time.
    pub fn dispatch_at(&mut self, now: Duration, command: Command) -> Vec<Event> {
        if !query::is_running(&self.world) {
            let _ = self.dispatch(Command::Tick { now });
        }
        self.dispatch(command)
    }

    /// Runs one simulation step at `now`, measured from the room's epoch.
    ///
    /// Stages run in a fixed order; once a stage ends the run, the rest of the
    /// tick is skipped.
    pub fn tick(&mut self, now: Duration) -> Vec<Event> {
        let mut log = Vec::new();
        self.execute(vec![Command::Tick { now }], &mut log);
        if !query::is_running(&self.world) {
            return log;
        }

        let mut commands = Vec::new();
        if query::phase(&self.world) == Phase::Combat {
            self.enemy_ai.handle(
                &log,
                query::level(&self.world),
                &query::enemy_view(&self.world),
                &query::player_view(&self.world),
                &mut commands,
            );
            self.execute(mem::take(&mut commands), &mut log);
        }

        self.progression
            .check_base(&query::status(&self.world), &mut commands);
        if self.settle(&mut commands, &mut log) {
            return log;
        }

        if query::phase(&self.world) == Phase::Combat {
            self.combat.melee(
                &query::player_view(&self.world),
                &query::enemy_view(&self.world),
                &mut commands,
            );
        }
        commands.push(Command::AdvanceProjectiles);
        self.execute(mem::take(&mut commands), &mut log);

        self.combat.projectile_hits(
            &query::projectile_view(&self.world),
            &query::enemy_view(&self.world),
            &mut commands,
        );
        self.execute(mem::take(&mut commands), &mut log);

        self.combat.pickups(
            &query::coin_view(&self.world),
            &query::player_view(&self.world),
            &mut commands,
        );
        self.execute(mem::take(&mut commands), &mut log);

        self.combat.pads(
            query::level(&self.world),
            &query::player_view(&self.world),
            &mut commands,
        );
        self.execute(mem::take(&mut commands), &mut log);

        self.progression
            .check_tick(&query::status(&self.world), &mut commands);
        let _ = self.settle(&mut commands, &mut log);
        log
    }

    /// Executes pending commands and reports whether the run is over.
    fn settle(&mut self, commands: &mut Vec<Command>, log: &mut Vec<Event>) -> bool {
        self.execute(mem::take(commands), log);
        !query::is_running(&self.world)
    }

    /// Applies commands, feeding the resulting events back into the reactive
    /// systems until they stop producing work.
    fn execute(&mut self, mut pending: Vec<Command>, log: &mut Vec<Event>) {
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.spawning
                .handle(&events, query::level(&self.world), &mut pending);
            self.progression.handle(&events, &mut pending);
            log.append(&mut events);
        }
    }
}
