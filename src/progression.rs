//! Score, level, lives and timer, plus the difficulty curve derived from the level.

use crate::board::Icon;

/// Levels in a full run.
pub const TOTAL_LEVELS: u32 = 20;
pub const START_LIVES: u32 = 5;
pub const START_TIMER_SECS: f32 = 120.0;
/// Timer value after a timeout costs a life.
pub const PENALTY_TIMER_SECS: f32 = 30.0;

const POINTS_PER_TILE: u32 = 50;
const BIG_GROUP: usize = 5;
const BIG_GROUP_BONUS: u32 = 200;
const BASE_SPECIAL: f64 = 0.05;
const SPECIAL_STEP: f64 = 0.01;
const MAX_SPECIAL: f64 = 0.18;

/// Score needed to leave `level`.
pub fn level_target(level: u32) -> u32 {
    1000 + level.max(1).saturating_sub(1) * 600
}

/// Points for one matched group.
pub fn group_score(len: usize) -> u32 {
    let base = len as u32 * POINTS_PER_TILE;
    if len >= BIG_GROUP {
        base + BIG_GROUP_BONUS
    } else {
        base
    }
}

/// How many icons of the pool can be rolled at `level`.
pub fn unlocked_icon_count(level: u32) -> usize {
    (3 + level as usize / 3).min(Icon::ALL.len())
}

/// Base special-tile probability reached at `level` (+0.01 per level, capped).
pub fn special_probability(level: u32) -> f64 {
    (BASE_SPECIAL + SPECIAL_STEP * f64::from(level.saturating_sub(1))).min(MAX_SPECIAL)
}

/// Timer granted when `level` is reached.
pub fn level_timer(level: u32) -> f32 {
    (START_TIMER_SECS - 2.0 * level as f32).max(PENALTY_TIMER_SECS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Stay,
    LevelUp(u32),
    /// Final level target reached; the run is over.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Running,
    LifeLost { lives: u32 },
    GameOver,
}

/// Per-run progress. Reset wholesale on start/restart.
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    /// Seconds left; may briefly read <= 0 only inside a tick.
    pub timer: f32,
    pub unlocked_icons: usize,
    pub special_probability: f64,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(1, START_LIVES)
    }
}

impl Progression {
    pub fn new(start_level: u32, lives: u32) -> Self {
        let level = start_level.clamp(1, TOTAL_LEVELS);
        Self {
            score: 0,
            level,
            lives: lives.max(1),
            timer: START_TIMER_SECS,
            unlocked_icons: unlocked_icon_count(level),
            special_probability: special_probability(level),
        }
    }

    /// Chance that a newly spawned tile is special.
    pub fn spawn_special_chance(&self) -> f64 {
        (self.special_probability + 0.002 * f64::from(self.level)).clamp(0.0, 1.0)
    }

    /// Add the points for a group of `len` tiles and return them.
    pub fn award(&mut self, len: usize) -> u32 {
        let points = group_score(len);
        self.score = self.score.saturating_add(points);
        points
    }

    /// Advance at most one level per call.
    pub fn check_advance(&mut self) -> Advance {
        if self.score < level_target(self.level) {
            return Advance::Stay;
        }
        if self.level >= TOTAL_LEVELS {
            return Advance::Completed;
        }
        self.level += 1;
        self.timer = level_timer(self.level);
        self.unlocked_icons = unlocked_icon_count(self.level);
        self.special_probability = (self.special_probability + SPECIAL_STEP).min(MAX_SPECIAL);
        Advance::LevelUp(self.level)
    }

    /// One real-time second elapsed. The timer is reset to the penalty value
    /// on expiry even when that expiry ends the game.
    pub fn tick_second(&mut self) -> TimerTick {
        self.timer -= 1.0;
        if self.timer > 0.0 {
            return TimerTick::Running;
        }
        self.lives = self.lives.saturating_sub(1);
        self.timer = PENALTY_TIMER_SECS;
        if self.lives == 0 {
            TimerTick::GameOver
        } else {
            TimerTick::LifeLost { lives: self.lives }
        }
    }

    /// Whole seconds for display, never negative.
    pub fn timer_secs(&self) -> u32 {
        self.timer.max(0.0).floor() as u32
    }

    /// Fraction of the way from the previous level target to the current one.
    pub fn level_progress(&self) -> f64 {
        let floor = if self.level > 1 {
            level_target(self.level - 1)
        } else {
            0
        };
        let target = level_target(self.level);
        let span = f64::from(target.saturating_sub(floor).max(1));
        (f64::from(self.score.saturating_sub(floor)) / span).clamp(0.0, 1.0)
    }
}
