//! Match engine: tap selection, optimistic swap with revert, cascade resolution and board spawn.
//!
//! The engine never sleeps on fixed delays. Each step the player should see (a swap,
//! a removal, tiles falling) parks the engine in a transient [`Phase`] and exposes a
//! [`Ticket`]; whoever animates the step calls [`Game::settle`] with it once the
//! transition has really finished. Restarting or quitting starts a new session, so
//! tickets handed out earlier no longer match and are ignored.

use crate::GameConfig;
use crate::board::{Board, Collapse, Icon, Pos, Spawned, TileId, TileMove};
use crate::matcher::{MatchGroup, find_matches, matched_positions};
use crate::progression::{Advance, Progression, TimerTick};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

/// Chained resolutions allowed for one move before the cascade is cut short.
pub const MAX_CHAIN: u32 = 64;
/// Re-roll passes allowed when the starting board must be match-free.
const MAX_START_PASSES: u32 = 64;
const REROLL_SPECIAL_CHANCE: f64 = 0.03;
const FIREWORKS_GROUP: usize = 5;
const ONE_SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No run in progress (menu).
    Ready,
    Playing,
    Paused,
    GameOver,
    /// Every level cleared.
    Completed,
}

/// Where the move state machine is. Everything after `Selected` waits for a [`Ticket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected(Pos),
    /// Tiles exchanged; matches are checked once the swap has been shown.
    Swapping { a: Pos, b: Pos },
    /// Swap produced nothing and is being undone.
    Reverting,
    /// Matched tiles removed; gravity runs next.
    Removing,
    /// Tiles fell and refilled; chains are checked next.
    Collapsing,
    /// Fresh board dropping in.
    Spawning,
    /// Accidental starting matches replaced.
    Rerolling,
}

impl Phase {
    pub fn is_transient(self) -> bool {
        !matches!(self, Self::Idle | Self::Selected(_))
    }
}

/// Permission to run the continuation of one transient step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    session: u64,
    step: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Ignored,
    Selected,
    Deselected,
    /// A non-adjacent tile replaced the selection.
    Reselected,
    SwapStarted,
}

/// Things the front end should show or play. Drained with [`Game::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    BoardSpawned(Vec<Spawned>),
    TilesRerolled(Vec<Spawned>),
    Selected(Pos),
    Deselected,
    Swapped(TileMove, TileMove),
    SwapReverted(TileMove, TileMove),
    Removed {
        id: TileId,
        pos: Pos,
        icon: Icon,
        special: bool,
    },
    Scored {
        points: u32,
        group_len: usize,
    },
    Collapsed(Collapse),
    Chain(u32),
    Fireworks,
    LevelUp(u32),
    Completed,
    LifeLost {
        lives: u32,
    },
    GameOver,
    Paused(bool),
    Quit,
}

/// The whole game state: board, progression, move state machine and session clock.
#[derive(Debug)]
pub struct Game {
    board: Board,
    progression: Progression,
    status: Status,
    phase: Phase,
    chain: u32,
    start_passes: u32,
    session: u64,
    step: u64,
    /// Time accumulated towards the next one-second tick.
    clock: Duration,
    rng: StdRng,
    start_level: u32,
    start_lives: u32,
    strict_start: bool,
    events: VecDeque<GameEvent>,
}

fn roll(rng: &mut StdRng, icons: usize, special_chance: f64) -> (Icon, bool) {
    let icon = Icon::ALL[rng.gen_range(0..icons.clamp(1, Icon::ALL.len()))];
    (icon, rng.gen_bool(special_chance.clamp(0.0, 1.0)))
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            board: Board::new(),
            progression: Progression::new(config.start_level, config.lives),
            status: Status::Ready,
            phase: Phase::Idle,
            chain: 0,
            start_passes: 0,
            session: 0,
            step: 0,
            clock: Duration::ZERO,
            rng,
            start_level: config.start_level,
            start_lives: config.lives,
            strict_start: config.strict_start,
            events: VecDeque::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected(&self) -> Option<Pos> {
        match self.phase {
            Phase::Selected(pos) => Some(pos),
            _ => None,
        }
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Enter a transient phase; the previous ticket stops being valid.
    fn wait(&mut self, phase: Phase) {
        self.step += 1;
        self.phase = phase;
    }

    /// Reset progression and drop a fresh board in. Also used for restart.
    pub fn start(&mut self) {
        self.session += 1;
        self.step = 0;
        self.progression = Progression::new(self.start_level, self.start_lives);
        self.status = Status::Playing;
        self.phase = Phase::Idle;
        self.chain = 0;
        self.start_passes = 0;
        self.clock = Duration::ZERO;

        let spawns = {
            let Self {
                board,
                rng,
                progression,
                ..
            } = self;
            let icons = progression.unlocked_icons;
            let chance = progression.spawn_special_chance();
            board.fill(|_| roll(rng, icons, chance))
        };
        info!(
            "session {} started at level {} with {} lives",
            self.session, self.progression.level, self.progression.lives
        );
        self.emit(GameEvent::Started);
        self.emit(GameEvent::BoardSpawned(spawns));
        self.wait(Phase::Spawning);
    }

    /// Leave the run; pending transitions of this session are abandoned.
    pub fn quit(&mut self) {
        if self.status == Status::Ready {
            return;
        }
        self.session += 1;
        self.status = Status::Ready;
        self.phase = Phase::Idle;
        self.chain = 0;
        info!("quit to menu");
        self.emit(GameEvent::Quit);
    }

    /// Toggle between playing and paused. Returns false when there is nothing to pause.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = match self.status {
            Status::Playing => true,
            Status::Paused => false,
            _ => return false,
        };
        self.status = if paused {
            Status::Paused
        } else {
            Status::Playing
        };
        self.emit(GameEvent::Paused(paused));
        true
    }

    /// Player tapped the tile at `pos`.
    pub fn tap(&mut self, pos: Pos) -> TapOutcome {
        if self.status != Status::Playing || self.board.id_at(pos).is_none() {
            return TapOutcome::Ignored;
        }
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Selected(pos);
                self.emit(GameEvent::Selected(pos));
                TapOutcome::Selected
            }
            Phase::Selected(current) if current == pos => {
                self.phase = Phase::Idle;
                self.emit(GameEvent::Deselected);
                TapOutcome::Deselected
            }
            Phase::Selected(current) if current.is_adjacent(pos) => {
                let Some((first, second)) = self.board.swap(current, pos) else {
                    return TapOutcome::Ignored;
                };
                debug_assert!(self.board.is_consistent());
                self.emit(GameEvent::Swapped(first, second));
                self.wait(Phase::Swapping { a: current, b: pos });
                TapOutcome::SwapStarted
            }
            Phase::Selected(_) => {
                self.phase = Phase::Selected(pos);
                self.emit(GameEvent::Selected(pos));
                TapOutcome::Reselected
            }
            _ => TapOutcome::Ignored,
        }
    }

    /// Ticket for the transition currently on screen, if the engine is waiting on one.
    pub fn awaiting(&self) -> Option<Ticket> {
        (self.status == Status::Playing && self.phase.is_transient()).then_some(Ticket {
            session: self.session,
            step: self.step,
        })
    }

    /// The transition for `ticket` has finished; run the next step.
    /// Returns false for stale tickets, which change nothing.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        let current = Ticket {
            session: self.session,
            step: self.step,
        };
        if ticket != current || self.status != Status::Playing {
            debug!("ignoring stale ticket {:?} (current {:?})", ticket, current);
            return false;
        }
        match self.phase {
            Phase::Swapping { a, b } => {
                let groups = find_matches(&self.board);
                if groups.is_empty() {
                    debug!("swap {:?} <-> {:?} made no match, reverting", a, b);
                    if let Some((first, second)) = self.board.swap(a, b) {
                        self.emit(GameEvent::SwapReverted(first, second));
                    }
                    self.wait(Phase::Reverting);
                } else {
                    self.chain = 0;
                    self.resolve(&groups);
                }
            }
            Phase::Reverting => self.phase = Phase::Idle,
            Phase::Removing => self.collapse(),
            Phase::Collapsing => self.after_collapse(),
            Phase::Spawning | Phase::Rerolling => self.clean_start_board(),
            Phase::Idle | Phase::Selected(_) => return false,
        }
        true
    }

    /// Score every group, then remove each matched cell once.
    fn resolve(&mut self, groups: &[MatchGroup]) {
        let mut removed = BTreeSet::new();
        for group in groups {
            let points = self.progression.award(group.len());
            self.emit(GameEvent::Scored {
                points,
                group_len: group.len(),
            });
            if group.len() >= FIREWORKS_GROUP {
                self.emit(GameEvent::Fireworks);
            }
            for &pos in &group.tiles {
                if !removed.insert(pos) {
                    continue;
                }
                if let Some((id, tile)) = self.board.remove(pos) {
                    self.emit(GameEvent::Removed {
                        id,
                        pos,
                        icon: tile.icon,
                        special: tile.special,
                    });
                }
            }
        }
        debug!(
            "resolved {} groups ({} tiles), score {}",
            groups.len(),
            removed.len(),
            self.progression.score
        );
        self.wait(Phase::Removing);
    }

    fn collapse(&mut self) {
        self.refill();
        self.wait(Phase::Collapsing);
    }

    /// Gravity and refill after a removal batch.
    fn refill(&mut self) {
        let collapse = {
            let Self {
                board,
                rng,
                progression,
                ..
            } = self;
            let icons = progression.unlocked_icons;
            let chance = progression.spawn_special_chance();
            board.collapse(|_| roll(rng, icons, chance))
        };
        debug_assert!(self.board.is_full() && self.board.is_consistent());
        self.emit(GameEvent::Collapsed(collapse));
    }

    /// Run is over mid-move: leave a full board without scoring anything further.
    /// A pending swap is undone and a removal batch is refilled; chains are not resolved.
    fn abandon_move(&mut self) {
        match self.phase {
            Phase::Swapping { a, b } => {
                if let Some((first, second)) = self.board.swap(a, b) {
                    self.emit(GameEvent::SwapReverted(first, second));
                }
            }
            Phase::Removing => self.refill(),
            _ => {}
        }
        debug_assert!(self.board.is_full() && self.board.is_consistent());
        self.step += 1;
        self.phase = Phase::Idle;
        self.chain = 0;
    }

    fn after_collapse(&mut self) {
        let groups = find_matches(&self.board);
        if groups.is_empty() {
            self.finish_cascade();
            return;
        }
        if self.chain >= MAX_CHAIN {
            warn!("cascade cut short after {} chained resolutions", self.chain);
            self.finish_cascade();
            return;
        }
        self.chain += 1;
        self.emit(GameEvent::Chain(self.chain));
        self.resolve(&groups);
    }

    /// Board is stable: back to idle and let progression look at the score.
    fn finish_cascade(&mut self) {
        self.phase = Phase::Idle;
        self.chain = 0;
        match self.progression.check_advance() {
            Advance::Stay => {}
            Advance::LevelUp(level) => {
                info!("level {} reached at score {}", level, self.progression.score);
                self.emit(GameEvent::LevelUp(level));
                self.emit(GameEvent::Fireworks);
            }
            Advance::Completed => {
                info!("all levels cleared, score {}", self.progression.score);
                self.status = Status::Completed;
                self.emit(GameEvent::Completed);
                self.emit(GameEvent::Fireworks);
            }
        }
    }

    /// Replace tiles that formed accidental matches on a fresh board with re-rolled ones.
    /// One pass by default; with `strict_start` repeat until nothing matches.
    fn clean_start_board(&mut self) {
        let groups = find_matches(&self.board);
        let another_pass = self.phase == Phase::Spawning || self.strict_start;
        if groups.is_empty() || !another_pass || self.start_passes >= MAX_START_PASSES {
            if !groups.is_empty() && self.strict_start {
                warn!(
                    "starting board still matches after {} re-roll passes",
                    self.start_passes
                );
            }
            self.phase = Phase::Idle;
            return;
        }
        self.start_passes += 1;
        let positions = matched_positions(&groups);
        let spawns: Vec<Spawned> = {
            let Self {
                board,
                rng,
                progression,
                ..
            } = self;
            let icons = progression.unlocked_icons;
            positions
                .into_iter()
                .map(|pos| {
                    let (icon, special) = roll(rng, icons, REROLL_SPECIAL_CHANCE);
                    board.spawn(pos, icon, special, pos.row + 1)
                })
                .collect()
        };
        debug!(
            "re-rolled {} tiles on the starting board (pass {})",
            spawns.len(),
            self.start_passes
        );
        self.emit(GameEvent::TilesRerolled(spawns));
        self.wait(Phase::Rerolling);
    }

    /// Feed real elapsed time; the timer ticks once per whole second while playing.
    pub fn advance_clock(&mut self, elapsed: Duration) {
        if self.status != Status::Playing {
            return;
        }
        self.clock += elapsed;
        while self.clock >= ONE_SECOND && self.status == Status::Playing {
            self.clock -= ONE_SECOND;
            self.tick_second();
        }
    }

    fn tick_second(&mut self) {
        match self.progression.tick_second() {
            TimerTick::Running => {}
            TimerTick::LifeLost { lives } => {
                info!("timer ran out, {} lives left", lives);
                self.emit(GameEvent::LifeLost { lives });
            }
            TimerTick::GameOver => {
                info!("game over, score {}", self.progression.score);
                self.abandon_move();
                self.status = Status::GameOver;
                self.emit(GameEvent::LifeLost { lives: 0 });
                self.emit(GameEvent::GameOver);
                self.emit(GameEvent::Fireworks);
            }
        }
    }
}
