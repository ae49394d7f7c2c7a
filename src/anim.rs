//! Tile tweening: where each tile is drawn while it travels between cells, and the
//! fading ghosts of removed tiles. The app settles the engine's pending step once
//! [`Animator::is_settled`] reports nothing in flight.

use crate::board::{Icon, Pos, Spawned, TileId, TileMove};
use crate::engine::GameEvent;
use std::collections::HashMap;

pub const SWAP_SECS: f32 = 0.16;
pub const FALL_SECS: f32 = 0.16;
pub const DROP_SECS: f32 = 0.22;
const DROP_PER_ROW_SECS: f32 = 0.03;
/// Lower rows of a refill start falling first, one stagger step per row.
const DROP_STAGGER_SECS: f32 = 0.06;
pub const FADE_SECS: f32 = 0.18;

/// A position in tile units: `x` is the column, `y` the row. Fractional while moving;
/// negative `y` is above the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn of(pos: Pos) -> Self {
        Self {
            x: pos.col as f32,
            y: pos.row as f32,
        }
    }

    fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    from: Point,
    to: Point,
    delay: f32,
    duration: f32,
    elapsed: f32,
}

impl Motion {
    fn new(from: Point, to: Point, delay: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            delay,
            duration,
            elapsed: 0.0,
        }
    }

    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0)
    }

    fn done(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }

    fn point(&self) -> Point {
        self.from.lerp(self.to, ease_out_cubic(self.progress()))
    }
}

/// A removed tile still on screen while it fades out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub pos: Pos,
    pub icon: Icon,
    pub special: bool,
    age: f32,
}

impl Ghost {
    /// 0.0 when just removed, 1.0 when gone.
    pub fn fade(&self) -> f32 {
        (self.age / FADE_SECS).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct Animator {
    enabled: bool,
    motions: HashMap<TileId, Motion>,
    ghosts: Vec<Ghost>,
}

impl Animator {
    /// A disabled animator snaps every transition, so it is always settled.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            motions: HashMap::new(),
            ghosts: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.motions.clear();
        self.ghosts.clear();
    }

    pub fn is_settled(&self) -> bool {
        self.motions.is_empty() && self.ghosts.is_empty()
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    /// Where to draw tile `id`, which logically sits in `pos`.
    pub fn position(&self, id: TileId, pos: Pos) -> Point {
        self.motions
            .get(&id)
            .map_or_else(|| Point::of(pos), Motion::point)
    }

    pub fn apply(&mut self, event: &GameEvent) {
        if !self.enabled {
            return;
        }
        match event {
            GameEvent::Started | GameEvent::Quit => self.clear(),
            GameEvent::Swapped(a, b) | GameEvent::SwapReverted(a, b) => {
                self.slide(a, SWAP_SECS);
                self.slide(b, SWAP_SECS);
            }
            GameEvent::Removed {
                id,
                pos,
                icon,
                special,
            } => {
                self.motions.remove(id);
                self.ghosts.push(Ghost {
                    pos: *pos,
                    icon: *icon,
                    special: *special,
                    age: 0.0,
                });
            }
            GameEvent::Collapsed(collapse) => {
                for fall in &collapse.falls {
                    self.slide(fall, FALL_SECS);
                }
                for spawn in &collapse.spawns {
                    self.drop_in(spawn);
                }
            }
            GameEvent::BoardSpawned(spawns) | GameEvent::TilesRerolled(spawns) => {
                for spawn in spawns {
                    self.drop_in(spawn);
                }
            }
            _ => {}
        }
    }

    fn slide(&mut self, m: &TileMove, duration: f32) {
        // A tile already in flight continues from where it is drawn now.
        let from = self.position(m.id, m.from);
        self.motions
            .insert(m.id, Motion::new(from, Point::of(m.to), 0.0, duration));
    }

    fn drop_in(&mut self, s: &Spawned) {
        let to = Point::of(s.pos);
        let from = Point {
            x: to.x,
            y: to.y - s.above as f32,
        };
        let rows_below = s.above.saturating_sub(s.pos.row + 1) as f32;
        let duration = DROP_SECS + DROP_PER_ROW_SECS * s.above as f32;
        self.motions.insert(
            s.id,
            Motion::new(from, to, DROP_STAGGER_SECS * rows_below, duration),
        );
    }

    /// Advance every tween by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for motion in self.motions.values_mut() {
            motion.elapsed += dt;
        }
        self.motions.retain(|_, m| !m.done());
        for ghost in &mut self.ghosts {
            ghost.age += dt;
        }
        self.ghosts.retain(|g| g.age < FADE_SECS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Collapse, ROWS};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn swap_event(board: &mut Board) -> (GameEvent, TileId) {
        let (a, b) = board.swap(Pos::new(0, 0), Pos::new(0, 1)).unwrap();
        (GameEvent::Swapped(a, b), a.id)
    }

    fn sample_board() -> Board {
        let mut board = Board::new();
        board.fill(|p| (Icon::ALL[(p.row + p.col) % 3], false));
        board
    }

    #[test]
    fn test_ease_out_cubic_bounds() {
        assert!(approx(ease_out_cubic(0.0), 0.0));
        assert!(approx(ease_out_cubic(1.0), 1.0));
        assert!(ease_out_cubic(0.5) > 0.5);
        assert!(approx(ease_out_cubic(3.0), 1.0));
    }

    #[test]
    fn test_swap_moves_then_settles() {
        let mut board = sample_board();
        let (event, id) = swap_event(&mut board);
        let mut anim = Animator::new(true);
        anim.apply(&event);
        assert!(!anim.is_settled());
        assert!(approx(anim.position(id, Pos::new(0, 1)).x, 0.0));

        anim.update(SWAP_SECS / 2.0);
        let mid = anim.position(id, Pos::new(0, 1)).x;
        assert!(mid > 0.0 && mid < 1.0);

        anim.update(SWAP_SECS);
        assert!(anim.is_settled());
        assert_eq!(anim.position(id, Pos::new(0, 1)), Point::of(Pos::new(0, 1)));
    }

    #[test]
    fn test_disabled_animator_is_always_settled() {
        let mut board = sample_board();
        let (event, id) = swap_event(&mut board);
        let mut anim = Animator::new(false);
        anim.apply(&event);
        assert!(anim.is_settled());
        assert_eq!(anim.position(id, Pos::new(0, 1)), Point::of(Pos::new(0, 1)));
    }

    #[test]
    fn test_removed_tile_fades_out() {
        let mut board = sample_board();
        let pos = Pos::new(2, 2);
        let (id, tile) = board.remove(pos).unwrap();
        let mut anim = Animator::new(true);
        anim.apply(&GameEvent::Removed {
            id,
            pos,
            icon: tile.icon,
            special: tile.special,
        });
        assert_eq!(anim.ghosts().len(), 1);
        anim.update(FADE_SECS / 2.0);
        assert!(approx(anim.ghosts()[0].fade(), 0.5));
        anim.update(FADE_SECS);
        assert!(anim.ghosts().is_empty());
        assert!(anim.is_settled());
    }

    #[test]
    fn test_board_drop_starts_with_bottom_row() {
        let mut board = Board::new();
        let spawns = board.fill(|_| (Icon::Apple, false));
        let mut anim = Animator::new(true);
        anim.apply(&GameEvent::BoardSpawned(spawns.clone()));

        let bottom = spawns.iter().find(|s| s.pos.row == ROWS - 1).unwrap();
        let top = spawns.iter().find(|s| s.pos.row == 0).unwrap();
        assert!(approx(anim.position(top.id, top.pos).y, -(ROWS as f32)));

        anim.update(DROP_STAGGER_SECS);
        assert!(anim.position(bottom.id, bottom.pos).y > -1.0);
        // The top row waits (ROWS - 1) stagger steps before moving.
        assert!(approx(anim.position(top.id, top.pos).y, -(ROWS as f32)));

        anim.update(10.0);
        assert!(anim.is_settled());
    }

    #[test]
    fn test_collapse_falls_and_refills() {
        let mut board = sample_board();
        board.remove(Pos::new(5, 0));
        let collapse: Collapse = board.collapse(|_| (Icon::Grape, false));
        let fall = collapse.falls[0];
        let mut anim = Animator::new(true);
        anim.apply(&GameEvent::Collapsed(collapse));
        assert!(approx(anim.position(fall.id, fall.to).y, fall.from.row as f32));
        anim.update(FALL_SECS);
        assert_eq!(anim.position(fall.id, fall.to), Point::of(fall.to));
        assert!(!anim.is_settled());
        anim.update(DROP_SECS);
        assert!(anim.is_settled());
    }

    #[test]
    fn test_restart_drops_everything_in_flight() {
        let mut board = sample_board();
        let (event, _) = swap_event(&mut board);
        let mut anim = Animator::new(true);
        anim.apply(&event);
        anim.apply(&GameEvent::Started);
        assert!(anim.is_settled());
    }
}
