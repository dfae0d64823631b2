use rampart_core::{
    tuning::{ENEMY_BOUNDS_MARGIN, WALL_BUFFER},
    LevelConfig, Vec2,
};

/// Keeps an enemy inside the arena inset and outside every lane wall.
///
/// Walls are resolved in configuration order; each overlapping wall pushes the
/// point to its nearest edge plus [`WALL_BUFFER`].
pub(crate) fn constrain_enemy(level: &LevelConfig, point: Vec2) -> Vec2 {
    let arena = level.arena;
    let inset = arena.padding + ENEMY_BOUNDS_MARGIN;
    let mut x = point.x.min(arena.width - inset).max(inset);
    let mut y = point.y.min(arena.height - inset).max(inset);

    for wall in &level.walls {
        if !wall.overlaps(Vec2::new(x, y), WALL_BUFFER) {
            continue;
        }
        let right = wall.x + wall.width;
        let bottom = wall.y + wall.height;
        let to_right = (x - right).abs();
        let to_left = (x - wall.x).abs();
        let to_bottom = (y - bottom).abs();
        let to_top = (y - wall.y).abs();

        let nearest = to_right.min(to_left).min(to_bottom).min(to_top);
        if nearest == to_right {
            x = right + WALL_BUFFER;
        } else if nearest == to_left {
            x = wall.x - WALL_BUFFER;
        } else if nearest == to_bottom {
            y = bottom + WALL_BUFFER;
        } else {
            y = wall.y - WALL_BUFFER;
        }
    }

    Vec2::new(x, y)
}
