//! Particle sparks for removals and fireworks, in tile units like the animator.

use crate::anim::Point;
use crate::board::{COLS, ROWS};
use rand::Rng;
use ratatui::style::Color;

const BURST_SPARKS: usize = 18;
const BURST_LIFE: f32 = 0.5;
const BURST_SPEED: f32 = 2.5;
const FIREWORK_BURSTS: usize = 6;
const FIREWORK_SPARKS: usize = 28;
const FIREWORK_LIFE: f32 = 1.2;
const FIREWORK_SPEED: f32 = 4.0;
const GRAVITY: f32 = 3.0;

const FIREWORK_COLORS: [Color; 6] = [
    Color::Rgb(255, 209, 102),
    Color::Rgb(239, 71, 111),
    Color::Rgb(6, 214, 160),
    Color::Rgb(17, 138, 178),
    Color::Rgb(255, 255, 255),
    Color::Rgb(199, 125, 255),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    life: f32,
    max_life: f32,
    pub color: Color,
}

impl Spark {
    fn new(rng: &mut impl Rng, origin: Point, speed: f32, life: f32, color: Color) -> Self {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = rng.gen_range(0.3..1.0) * speed;
        Self {
            x: origin.x,
            y: origin.y,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            life: rng.gen_range(0.6..1.0) * life,
            max_life: life,
            color,
        }
    }

    fn update(&mut self, dt: f32) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.vy += GRAVITY * dt;
        self.life -= dt;
    }

    /// Remaining life as a fraction, for dimming.
    pub fn brightness(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct Sparks {
    sparks: Vec<Spark>,
}

impl Sparks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small burst where a tile was removed.
    pub fn burst(&mut self, rng: &mut impl Rng, at: Point, color: Color) {
        let origin = Point {
            x: at.x + 0.5,
            y: at.y + 0.5,
        };
        self.sparks.extend(
            (0..BURST_SPARKS).map(|_| Spark::new(rng, origin, BURST_SPEED, BURST_LIFE, color)),
        );
    }

    /// Bursts scattered over the whole board.
    pub fn fireworks(&mut self, rng: &mut impl Rng) {
        for _ in 0..FIREWORK_BURSTS {
            let origin = Point {
                x: rng.gen_range(0.0..COLS as f32),
                y: rng.gen_range(0.0..ROWS as f32 / 2.0),
            };
            let color = FIREWORK_COLORS[rng.gen_range(0..FIREWORK_COLORS.len())];
            self.sparks.extend((0..FIREWORK_SPARKS).map(|_| {
                Spark::new(rng, origin, FIREWORK_SPEED, FIREWORK_LIFE, color)
            }));
        }
    }

    pub fn update(&mut self, dt: f32) {
        for spark in &mut self.sparks {
            spark.update(dt);
        }
        self.sparks.retain(|s| s.life > 0.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spark> {
        self.sparks.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sparks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sparks.is_empty()
    }

    pub fn clear(&mut self) {
        self.sparks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_burst_dies_out() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sparks = Sparks::new();
        sparks.burst(&mut rng, Point { x: 2.0, y: 3.0 }, Color::Red);
        assert_eq!(sparks.len(), BURST_SPARKS);
        assert!(sparks.iter().all(|s| s.x == 2.5 && s.y == 3.5));
        sparks.update(0.1);
        assert!(sparks.iter().all(|s| s.brightness() < 1.0));
        sparks.update(BURST_LIFE);
        assert!(sparks.is_empty());
    }

    #[test]
    fn test_fireworks_cover_the_board() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut sparks = Sparks::new();
        sparks.fireworks(&mut rng);
        assert_eq!(sparks.len(), FIREWORK_BURSTS * FIREWORK_SPARKS);
        assert!(
            sparks
                .iter()
                .all(|s| (0.0..COLS as f32).contains(&s.x) && FIREWORK_COLORS.contains(&s.color))
        );
        sparks.update(BURST_LIFE);
        assert!(!sparks.is_empty());
        sparks.update(FIREWORK_LIFE);
        assert!(sparks.is_empty());
    }

    #[test]
    fn test_sparks_fall_under_gravity() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sparks = Sparks::new();
        sparks.burst(&mut rng, Point { x: 0.0, y: 0.0 }, Color::Blue);
        let before: Vec<f32> = sparks.iter().map(|s| s.vy).collect();
        sparks.update(0.05);
        for (s, vy) in sparks.iter().zip(before) {
            assert!(s.vy > vy);
        }
    }
}
