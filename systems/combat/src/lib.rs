#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system resolving melee contact, projectile hits, coin pickups and pads.
//!
//! Each stage reads fresh views so that outcomes applied by an earlier stage
//! (a coin collected this tick, an enemy killed by a previous projectile) are
//! visible to the next one.

use rampart_core::{
    tuning::{
        self, MAX_STAT_LEVEL, MELEE_HIT_RADIUS, PICKUP_RADIUS, PROJECTILE_HIT_DISTANCE,
        UPGRADE_COST,
    },
    CoinView, Command, EnemyId, EnemyView, LevelConfig, PlayerView, ProjectileView, Stat,
};

const PAD_STATS: [Stat; 2] = [Stat::Armor, Stat::Attack];

/// Combat resolver that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct Combat {
    enemy_hp: Vec<(EnemyId, u32)>,
}

impl Combat {
    /// Creates a new combat resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one `DamagePlayer` per living player touched by enemies.
    ///
    /// Contacts from several enemies stack before armor is applied.
    pub fn melee(&mut self, players: &PlayerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        if enemies.is_empty() {
            return;
        }
        let reach = MELEE_HIT_RADIUS * MELEE_HIT_RADIUS;
        for player in players.alive() {
            let contacts = enemies
                .iter()
                .filter(|enemy| enemy.position.distance_squared(player.position) <= reach)
                .count();
            let amount = tuning::melee_damage(
                u32::try_from(contacts).unwrap_or(u32::MAX),
                player.armor_level,
            );
            if amount > 0 {
                out.push(Command::DamagePlayer {
                    player: player.id,
                    amount,
                });
            }
        }
    }

    /// Pairs every projectile with the nearest enemy inside its hit distance.
    ///
    /// Projectiles are resolved in firing order; an enemy already finished off
    /// by an earlier projectile this tick is no longer a candidate.
    pub fn projectile_hits(
        &mut self,
        projectiles: &ProjectileView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if enemies.is_empty() {
            return;
        }
        self.enemy_hp.clear();
        self.enemy_hp
            .extend(enemies.iter().map(|enemy| (enemy.id, enemy.hp)));

        let reach = PROJECTILE_HIT_DISTANCE * PROJECTILE_HIT_DISTANCE;
        for projectile in projectiles.iter() {
            let mut nearest: Option<(usize, f32)> = None;
            for (index, enemy) in enemies.iter().enumerate() {
                if self.enemy_hp[index].1 == 0 {
                    continue;
                }
                let distance = enemy.position.distance_squared(projectile.position);
                if distance > reach {
                    continue;
                }
                if nearest.map_or(true, |(_, closest)| distance < closest) {
                    nearest = Some((index, distance));
                }
            }

            let Some((index, _)) = nearest else {
                continue;
            };
            let (enemy, hp) = &mut self.enemy_hp[index];
            *hp = hp.saturating_sub(projectile.damage);
            out.push(Command::HitEnemy {
                projectile: projectile.id,
                enemy: *enemy,
            });
        }
    }

    /// Hands every coin to the first living player, in join order, within reach.
    pub fn pickups(&mut self, coins: &CoinView, players: &PlayerView, out: &mut Vec<Command>) {
        let reach = PICKUP_RADIUS * PICKUP_RADIUS;
        for coin in coins.iter() {
            let collector = players
                .alive()
                .find(|player| player.position.distance_squared(coin.position) <= reach);
            if let Some(player) = collector {
                out.push(Command::CollectCoin {
                    coin: coin.id,
                    player: player.id,
                });
            }
        }
    }

    /// Requests at most one upgrade per pad for every eligible player.
    pub fn pads(&mut self, level: &LevelConfig, players: &PlayerView, out: &mut Vec<Command>) {
        for player in players.alive() {
            let mut coins = player.coins;
            for stat in PAD_STATS {
                if coins < UPGRADE_COST || player.level(stat) >= MAX_STAT_LEVEL {
                    continue;
                }
                if !level.pad(stat).contains(player.position) {
                    continue;
                }
                coins -= UPGRADE_COST;
                out.push(Command::PurchaseUpgrade {
                    player: player.id,
                    stat,
                });
            }
        }
    }
}
