#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system deciding when a run advances to the next wave, the shop, or ends.

use rampart_core::{tuning::MAX_WAVE, Command, Event, GameOverReason, Phase, RoomStatus};

/// Progression system that watches room counters and lifecycle events.
#[derive(Debug, Default)]
pub struct Progression;

impl Progression {
    /// Creates a new progression system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reacts to lifecycle events; a freshly started run immediately begins wave one.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        if events.iter().any(|event| matches!(event, Event::RunStarted)) {
            out.push(Command::BeginWave);
        }
    }

    /// Ends the run once the base has no health left.
    pub fn check_base(&mut self, status: &RoomStatus, out: &mut Vec<Command>) {
        if status.running && status.base_hp == 0 {
            out.push(Command::EndRun {
                reason: GameOverReason::BaseDestroyed,
            });
        }
    }

    /// End-of-tick checks, in precedence order.
    ///
    /// A destroyed base or a room where every seated player is dead ends the
    /// run. Otherwise a combat phase with no enemies left either opens the
    /// shop or, after the last wave, ends the run as cleared.
    pub fn check_tick(&mut self, status: &RoomStatus, out: &mut Vec<Command>) {
        if !status.running {
            return;
        }

        let before = out.len();
        self.check_base(status, out);
        if out.len() > before {
            return;
        }

        if status.players > 0 && status.living_players == 0 {
            out.push(Command::EndRun {
                reason: GameOverReason::AllDead,
            });
            return;
        }

        if status.phase != Phase::Combat || status.enemies > 0 {
            return;
        }
        if status.wave >= MAX_WAVE {
            out.push(Command::EndRun {
                reason: GameOverReason::WavesCleared,
            });
        } else {
            out.push(Command::OpenShop);
        }
    }
}
