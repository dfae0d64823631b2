use std::{sync::Arc, time::Duration};

use rampart_core::{
    tuning::PLAYER_MAX_HP, Command, Event, GameOverReason, LevelConfig, Phase, PlayerId,
};
use rampart_system_progression::Progression;
use rampart_world::{self as world, query, World};

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn lobby_with(players: &[u64]) -> World {
    let mut world = World::new(
        Arc::new(LevelConfig::default()),
        Duration::from_millis(100),
    );
    let commands = players
        .iter()
        .flat_map(|id| {
            let player = PlayerId::new(*id);
            [
                Command::AddPlayer {
                    player,
                    name: format!("p{id}"),
                },
                Command::SetReady {
                    player,
                    ready: true,
                },
            ]
        })
        .collect();
    let _ = apply_all(&mut world, commands);
    world
}

#[test]
fn starting_a_run_begins_the_first_wave() {
    let mut world = lobby_with(&[1]);
    let mut progression = Progression::new();

    let events = apply_all(
        &mut world,
        vec![Command::StartRun {
            requested_by: PlayerId::new(1),
        }],
    );
    let mut commands = Vec::new();
    progression.handle(&events, &mut commands);
    assert_eq!(commands, vec![Command::BeginWave]);

    let events = apply_all(&mut world, commands);
    assert!(events.contains(&Event::WaveStarted { wave: 1 }));
    assert_eq!(query::phase(&world), Phase::Spawning);

    let mut commands = Vec::new();
    progression.handle(&events, &mut commands);
    assert!(commands.is_empty());
}

#[test]
fn simultaneous_deaths_end_the_run_and_reset_players() {
    let mut world = lobby_with(&[1, 2]);
    let mut progression = Progression::new();
    let _ = apply_all(
        &mut world,
        vec![
            Command::StartRun {
                requested_by: PlayerId::new(1),
            },
            Command::BeginWave,
            Command::DamagePlayer {
                player: PlayerId::new(1),
                amount: PLAYER_MAX_HP,
            },
            Command::DamagePlayer {
                player: PlayerId::new(2),
                amount: PLAYER_MAX_HP * 2,
            },
        ],
    );

    let mut commands = Vec::new();
    progression.check_tick(&query::status(&world), &mut commands);
    assert_eq!(
        commands,
        vec![Command::EndRun {
            reason: GameOverReason::AllDead
        }]
    );

    let events = apply_all(&mut world, commands);
    assert!(events.contains(&Event::RunEnded {
        reason: GameOverReason::AllDead,
        wave: 1,
    }));
    let status = query::status(&world);
    assert_eq!(status.phase, Phase::Lobby);
    assert_eq!(status.living_players, 2);
    for player in query::player_view(&world).iter() {
        assert_eq!(player.hp, PLAYER_MAX_HP);
        assert_eq!(player.coins, 0);
        assert_eq!((player.armor_level, player.attack_level), (1, 1));
    }
}

#[test]
fn one_survivor_keeps_the_run_alive() {
    let mut world = lobby_with(&[1, 2]);
    let _ = apply_all(
        &mut world,
        vec![
            Command::StartRun {
                requested_by: PlayerId::new(1),
            },
            Command::BeginWave,
            Command::DamagePlayer {
                player: PlayerId::new(2),
                amount: PLAYER_MAX_HP,
            },
        ],
    );
    let mut commands = Vec::new();
    Progression::new().check_tick(&query::status(&world), &mut commands);
    assert!(commands.is_empty());
}
