use std::{sync::Arc, time::Duration};

use rampart_core::{
    tuning::{ENEMY_MAX_HP, PLAYER_MAX_HP, UPGRADE_COST},
    CoinId, CoinSnapshot, CoinView, Command, EnemyId, EnemyMode, EnemySnapshot, EnemyView, Event,
    Lane, LevelConfig, PlayerId, PlayerSnapshot, PlayerView, ProjectileId, ProjectileSnapshot,
    ProjectileView, Stat, Vec2,
};
use rampart_system_combat::Combat;
use rampart_world::{self as world, query, World};

fn player(id: u64, x: f32, y: f32) -> PlayerSnapshot {
    PlayerSnapshot {
        id: PlayerId::new(id),
        name: format!("p{id}"),
        slot: id as usize,
        position: Vec2::new(x, y),
        hp: PLAYER_MAX_HP,
        max_hp: PLAYER_MAX_HP,
        alive: true,
        coins: 0,
        armor_level: 1,
        attack_level: 1,
        ready: true,
        host: id == 0,
    }
}

fn enemy(id: u32, x: f32, y: f32, hp: u32) -> EnemySnapshot {
    EnemySnapshot {
        id: EnemyId::new(id),
        position: Vec2::new(x, y),
        hp,
        max_hp: ENEMY_MAX_HP,
        wave: 1,
        lane: Lane::Left,
        mode: EnemyMode::Path,
        waypoint: 0,
        spawned_at: Duration::ZERO,
    }
}

fn projectile(id: u32, x: f32, y: f32, damage: u32) -> ProjectileSnapshot {
    ProjectileSnapshot {
        id: ProjectileId::new(id),
        owner: PlayerId::new(0),
        position: Vec2::new(x, y),
        velocity: Vec2::new(320.0, 0.0),
        damage,
        age: Duration::ZERO,
    }
}

#[test]
fn melee_contacts_stack_before_armor() {
    let mut armored = player(1, 500.0, 500.0);
    armored.armor_level = 2;
    let players = PlayerView::from_snapshots(vec![player(0, 100.0, 100.0), armored]);
    let enemies = EnemyView::from_snapshots(vec![
        enemy(0, 110.0, 100.0, ENEMY_MAX_HP),
        enemy(1, 520.0, 500.0, ENEMY_MAX_HP),
        enemy(2, 500.0, 470.0, ENEMY_MAX_HP),
        enemy(3, 480.0, 500.0, ENEMY_MAX_HP),
        enemy(4, 900.0, 900.0, ENEMY_MAX_HP),
    ]);

    let mut out = Vec::new();
    Combat::new().melee(&players, &enemies, &mut out);

    assert_eq!(
        out,
        vec![
            Command::DamagePlayer {
                player: PlayerId::new(0),
                amount: 5,
            },
            Command::DamagePlayer {
                player: PlayerId::new(1),
                amount: 8,
            },
        ]
    );
}

#[test]
fn dead_players_take_no_melee_damage() {
    let mut fallen = player(0, 100.0, 100.0);
    fallen.alive = false;
    fallen.hp = 0;
    let players = PlayerView::from_snapshots(vec![fallen]);
    let enemies = EnemyView::from_snapshots(vec![enemy(0, 100.0, 100.0, ENEMY_MAX_HP)]);

    let mut out = Vec::new();
    Combat::new().melee(&players, &enemies, &mut out);
    assert!(out.is_empty());
}

#[test]
fn projectile_hits_the_nearest_enemy_in_reach() {
    let projectiles = ProjectileView::from_snapshots(vec![projectile(0, 100.0, 100.0, 5)]);
    let enemies = EnemyView::from_snapshots(vec![
        enemy(0, 115.0, 100.0, ENEMY_MAX_HP),
        enemy(1, 104.0, 100.0, ENEMY_MAX_HP),
        enemy(2, 119.0, 100.0, ENEMY_MAX_HP),
    ]);

    let mut out = Vec::new();
    Combat::new().projectile_hits(&projectiles, &enemies, &mut out);
    assert_eq!(
        out,
        vec![Command::HitEnemy {
            projectile: ProjectileId::new(0),
            enemy: EnemyId::new(1),
        }]
    );
}

#[test]
fn projectiles_skip_enemies_already_finished_this_tick() {
    let projectiles = ProjectileView::from_snapshots(vec![
        projectile(0, 100.0, 100.0, 5),
        projectile(1, 100.0, 100.0, 5),
        projectile(2, 100.0, 100.0, 5),
    ]);
    let enemies = EnemyView::from_snapshots(vec![
        enemy(0, 100.0, 100.0, 5),
        enemy(1, 110.0, 100.0, ENEMY_MAX_HP),
    ]);

    let mut out = Vec::new();
    Combat::new().projectile_hits(&projectiles, &enemies, &mut out);
    assert_eq!(
        out,
        vec![
            Command::HitEnemy {
                projectile: ProjectileId::new(0),
                enemy: EnemyId::new(0),
            },
            Command::HitEnemy {
                projectile: ProjectileId::new(1),
                enemy: EnemyId::new(1),
            },
            Command::HitEnemy {
                projectile: ProjectileId::new(2),
                enemy: EnemyId::new(1),
            },
        ]
    );
}

#[test]
fn coin_goes_to_the_first_eligible_player_only() {
    let mut fallen = player(0, 300.0, 300.0);
    fallen.alive = false;
    fallen.hp = 0;
    let players = PlayerView::from_snapshots(vec![
        fallen,
        player(1, 310.0, 300.0),
        player(2, 300.0, 310.0),
    ]);
    let coins = CoinView::from_snapshots(vec![CoinSnapshot {
        id: CoinId::new(4),
        position: Vec2::new(300.0, 300.0),
        value: 1,
    }]);

    let mut out = Vec::new();
    Combat::new().pickups(&coins, &players, &mut out);
    assert_eq!(
        out,
        vec![Command::CollectCoin {
            coin: CoinId::new(4),
            player: PlayerId::new(1),
        }]
    );
}

#[test]
fn pads_require_coins_and_headroom() {
    let level = LevelConfig::default();
    let armor = level.pads.armor.position;
    let attack = level.pads.attack.position;

    let mut rich = player(0, armor.x, armor.y);
    rich.coins = UPGRADE_COST;
    let mut poor = player(1, armor.x + 10.0, armor.y);
    poor.coins = UPGRADE_COST - 1;
    let mut maxed = player(2, attack.x, attack.y);
    maxed.coins = 50;
    maxed.attack_level = 5;
    let mut outside = player(3, 800.0, 450.0);
    outside.coins = 50;

    let players = PlayerView::from_snapshots(vec![rich, poor, maxed, outside]);
    let mut out = Vec::new();
    Combat::new().pads(&level, &players, &mut out);
    assert_eq!(
        out,
        vec![Command::PurchaseUpgrade {
            player: PlayerId::new(0),
            stat: Stat::Armor,
        }]
    );
}

#[test]
fn collected_coins_buy_armor_on_the_next_pad_tick() {
    let mut world = World::new(
        Arc::new(LevelConfig::default()),
        Duration::from_millis(100),
    );
    let hero = PlayerId::new(0);
    let mut events = Vec::new();
    for command in [
        Command::AddPlayer {
            player: hero,
            name: "hero".into(),
        },
        Command::SetReady {
            player: hero,
            ready: true,
        },
        Command::StartRun { requested_by: hero },
    ] {
        world::apply(&mut world, command, &mut events);
    }

    let mut combat = Combat::new();
    let drop_zone = Vec2::new(500.0, 450.0);
    world::apply(
        &mut world,
        Command::MovePlayer {
            player: hero,
            position: drop_zone,
        },
        &mut events,
    );

    for _ in 0..UPGRADE_COST {
        let mut spawned = Vec::new();
        world::apply(
            &mut world,
            Command::SpawnEnemy {
                lane: Lane::Left,
                position: drop_zone,
            },
            &mut spawned,
        );
        for _ in 0..2 {
            world::apply(
                &mut world,
                Command::Shoot {
                    player: hero,
                    direction: Vec2::Y,
                },
                &mut events,
            );
            let mut commands = Vec::new();
            combat.projectile_hits(
                &query::projectile_view(&world),
                &query::enemy_view(&world),
                &mut commands,
            );
            assert_eq!(commands.len(), 1);
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
        }

        let mut commands = Vec::new();
        combat.pickups(
            &query::coin_view(&world),
            &query::player_view(&world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
    }

    let stats = query::player_view(&world).into_vec().remove(0);
    assert_eq!((stats.coins, stats.armor_level), (UPGRADE_COST, 1));

    let pad = query::level(&world).pads.armor.position;
    world::apply(
        &mut world,
        Command::MovePlayer {
            player: hero,
            position: pad,
        },
        &mut events,
    );
    let mut commands = Vec::new();
    combat.pads(query::level(&world), &query::player_view(&world), &mut commands);
    events.clear();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    assert_eq!(
        events,
        vec![Event::StatsChanged {
            player: hero,
            coins: 0,
            armor_level: 2,
            attack_level: 1,
        }]
    );
}
