#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave composition system emitting enemy spawn commands.

use rampart_core::{tuning, Command, Event, Lane, LevelConfig, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

const FIRST_LANE: Lane = Lane::Left;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }

    /// Derives a configuration for a labelled stream, such as a room code.
    ///
    /// Distinct labels yield unrelated jitter sequences from the same global seed.
    #[must_use]
    pub fn labeled(global_seed: u64, label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(global_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0_u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self::new(u64::from_le_bytes(bytes))
    }
}

/// Pure system that places every enemy of a wave when the wave starts.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
    next_lane: Lane,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            next_lane: FIRST_LANE,
        }
    }

    /// Consumes events and emits one `SpawnEnemy` per enemy of each new wave.
    ///
    /// Lanes alternate across the whole run, so an odd-sized wave hands the
    /// first enemy of the next wave to the other lane.
    pub fn handle(&mut self, events: &[Event], level: &LevelConfig, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunStarted => self.next_lane = FIRST_LANE,
                Event::WaveStarted { wave } => self.spawn_wave(*wave, level, out),
                _ => {}
            }
        }
    }

    fn spawn_wave(&mut self, wave: u32, level: &LevelConfig, out: &mut Vec<Command>) {
        let count = tuning::wave_size(wave);
        out.reserve(count as usize);
        for _ in 0..count {
            let lane = self.next_lane;
            self.next_lane = lane.other();
            let position = self.entry_point(level, lane);
            out.push(Command::SpawnEnemy { lane, position });
        }
    }

    fn entry_point(&mut self, level: &LevelConfig, lane: Lane) -> Vec2 {
        if let Some(first) = level.lane(lane).first() {
            return *first;
        }
        let gate = level.gate;
        let half_spread = gate.spread.abs() / 2.0;
        if half_spread <= 0.0 {
            return gate.position;
        }
        let jitter = self.rng.gen_range(-half_spread..=half_spread);
        Vec2::new(gate.position.x + jitter, gate.position.y)
    }
}
