//! App: terminal init, main loop, event dispatch to the animator, sparks and audio,
//! key and mouse handling.

use crate::anim::{Animator, Point};
use crate::audio::Audio;
use crate::board::Pos;
use crate::effects::Sparks;
use crate::engine::{Game, GameEvent, Status};
use crate::highscores;
use crate::input::{Action, key_to_action, mouse_click};
use crate::theme::Theme;
use crate::ui::{self, RemovalFade, View};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// Upper bound on engine steps settled in one frame. Without animation a whole
/// cascade settles at once; the chain cap keeps it well below this.
const MAX_SETTLES_PER_FRAME: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
}

pub struct App {
    args: Args,
    game: Game,
    theme: Theme,
    screen: Screen,
    anim: Animator,
    sparks: Sparks,
    fade: RemovalFade,
    audio: Audio,
    /// Cosmetic randomness (sparks); the engine has its own seeded generator.
    rng: StdRng,
    banner: String,
    cursor: Pos,
    show_help: bool,
    high_score: u32,
    /// Terminal area of the last drawn frame, for mouse hit-testing.
    area: Rect,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let high_score = highscores::load_high_score();
        info!("high score on record: {}", high_score);
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, |seed| StdRng::seed_from_u64(seed ^ 0x5EED));
        Ok(Self {
            game: Game::new(&config),
            theme,
            screen: Screen::Menu,
            anim: Animator::new(!args.no_animation),
            sparks: Sparks::new(),
            fade: RemovalFade::default(),
            audio: Audio::new(args.mute),
            rng,
            banner: "Welcome to SkyMatch!".to_string(),
            cursor: Pos::new(0, 0),
            show_help: false,
            high_score,
            area: Rect::default(),
            args,
        })
    }

    fn start_game(&mut self) {
        self.anim.clear();
        self.sparks.clear();
        self.fade.clear();
        self.show_help = false;
        self.cursor = Pos::new(0, 0);
        self.screen = Screen::Playing;
        self.game.start();
        self.audio.set_music(true);
        self.pump();
    }

    fn quit_to_menu(&mut self) {
        self.game.quit();
        self.screen = Screen::Menu;
        self.audio.set_music(false);
        self.pump();
    }

    fn tap(&mut self, pos: Pos) {
        let outcome = self.game.tap(pos);
        debug!("tap {:?}: {:?}", pos, outcome);
        self.pump();
    }

    /// Forward queued engine events to the collaborators.
    fn dispatch_events(&mut self) {
        let events: Vec<GameEvent> = self.game.drain_events().collect();
        for event in events {
            self.on_game_event(&event);
            self.anim.apply(&event);
        }
    }

    fn on_game_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Started => self.banner = "Good luck!".to_string(),
            GameEvent::Selected(_) | GameEvent::Swapped(..) => self.audio.click(),
            GameEvent::Removed { pos, icon, .. } => {
                if !self.args.no_animation {
                    self.fade.push(*pos);
                }
                let color = self.theme.icon_color(*icon);
                self.sparks.burst(&mut self.rng, Point::of(*pos), color);
                self.audio.explosion();
            }
            GameEvent::Scored { points, group_len } => {
                debug!("+{} for a group of {}", points, group_len);
            }
            GameEvent::Fireworks => self.sparks.fireworks(&mut self.rng),
            GameEvent::LevelUp(level) => self.banner = format!("Level {} reached!", level),
            GameEvent::Completed => {
                self.banner = "You beat all levels! Congratulations!".to_string();
                self.audio.set_music(false);
            }
            GameEvent::LifeLost { lives } if *lives > 0 => {
                self.banner = "Time ran out! -1 life".to_string();
            }
            GameEvent::GameOver => {
                self.banner = "Game Over! Press R to play again.".to_string();
                self.audio.set_music(false);
            }
            GameEvent::Paused(paused) => {
                self.banner = if *paused { "Paused" } else { "Resumed" }.to_string();
                self.audio.set_music(!*paused);
            }
            GameEvent::Quit => self.banner = "Quit to menu".to_string(),
            _ => {}
        }
    }

    /// Dispatch events and settle every engine step whose transition has finished.
    fn pump(&mut self) {
        for _ in 0..MAX_SETTLES_PER_FRAME {
            self.dispatch_events();
            if !self.anim.is_settled() {
                break;
            }
            let Some(ticket) = self.game.awaiting() else {
                break;
            };
            self.game.settle(ticket);
        }
        self.dispatch_events();
        self.track_high_score();
    }

    fn track_high_score(&mut self) {
        let score = self.game.progression().score;
        if score <= self.high_score {
            return;
        }
        self.high_score = score;
        if let Err(e) = highscores::save_high_score(score) {
            warn!("could not save high score: {:#}", e);
        }
    }

    /// Advance clocks and animations by `dt`. Everything holds still while paused or
    /// while the help overlay is open.
    fn update(&mut self, dt: Duration) {
        if self.show_help || self.game.status() == Status::Paused {
            return;
        }
        let secs = dt.as_secs_f32();
        self.anim.update(secs);
        self.sparks.update(secs);
        self.game.advance_clock(dt);
        self.audio.tick(dt);
        self.pump();
    }

    fn move_cursor(&mut self, drow: isize, dcol: isize) {
        if let Some(pos) = self.cursor.step(drow, dcol) {
            self.cursor = pos;
        }
    }

    /// Returns true when the app should exit.
    fn on_key(&mut self, key: KeyEvent) -> bool {
        let action = key_to_action(key);
        if action == Action::Exit {
            return true;
        }
        if self.show_help {
            self.show_help = false;
            return false;
        }
        match (self.screen, action) {
            (Screen::Menu, Action::Quit) => return true,
            (Screen::Playing, Action::Quit) => self.quit_to_menu(),
            (_, Action::Help) => self.show_help = true,
            (_, Action::ToggleMode) => {
                let mode = self.theme.toggle_mode();
                debug!("switched to {:?} mode", mode);
            }
            (_, Action::ToggleSound) => {
                let muted = self.audio.toggle_mute();
                self.banner = if muted { "Sound off" } else { "Sound on" }.to_string();
            }
            (Screen::Menu, Action::Select) | (_, Action::Restart) => self.start_game(),
            (Screen::Playing, Action::Pause) => {
                self.game.toggle_pause();
                self.pump();
            }
            (Screen::Playing, Action::Up) => self.move_cursor(-1, 0),
            (Screen::Playing, Action::Down) => self.move_cursor(1, 0),
            (Screen::Playing, Action::Left) => self.move_cursor(0, -1),
            (Screen::Playing, Action::Right) => self.move_cursor(0, 1),
            (Screen::Playing, Action::Select) => self.tap(self.cursor),
            _ => {}
        }
        false
    }

    fn on_click(&mut self, column: u16, row: u16) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        if self.screen != Screen::Playing {
            return;
        }
        let hit = ui::areas(self.area).and_then(|a| ui::hit_test(a.board, column, row));
        if let Some(pos) = hit {
            self.cursor = pos;
            self.tap(pos);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        if self.args.no_menu {
            self.start_game();
        }
        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        info!("exiting with high score {}", self.high_score);

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        let mut last_frame = Instant::now();
        loop {
            let now = Instant::now();
            self.update(now.duration_since(last_frame));
            last_frame = now;

            terminal.draw(|f| {
                self.area = f.area();
                let view = View {
                    screen: self.screen,
                    game: &self.game,
                    anim: &self.anim,
                    sparks: &self.sparks,
                    theme: &self.theme,
                    banner: &self.banner,
                    high_score: self.high_score,
                    cursor: self.cursor,
                    show_help: self.show_help,
                    ascii: self.args.ascii,
                    sound_on: !self.audio.is_muted(),
                };
                ui::draw(f, &view, &mut self.fade, now);
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.on_key(key) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => {
                            if let Some((column, row)) = mouse_click(mouse) {
                                self.on_click(column, row);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{COLS, ROWS};
    use clap::Parser;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn app() -> App {
        let args = Args::parse_from(["skymatch", "--no-animation", "--mute", "--seed", "3"]);
        let config = GameConfig::from(&args);
        let mut app = App::new(args, config, Theme::default()).unwrap();
        // Keep tests away from the real high score file.
        app.high_score = u32::MAX;
        app
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_enter_starts_and_board_settles_at_once() {
        let mut app = app();
        assert_eq!(app.screen, Screen::Menu);
        assert!(!press(&mut app, KeyCode::Enter));
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.game.status(), Status::Playing);
        // No animation: the drop and the re-roll pass settle immediately.
        assert!(app.game.awaiting().is_none());
        assert!(app.game.board().is_full());
        assert_eq!(app.banner, "Good luck!");
    }

    #[test]
    fn test_quit_goes_to_menu_then_exits() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.screen, Screen::Menu);
        assert_eq!(app.banner, "Quit to menu");
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_pause_freezes_timer() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.banner, "Paused");
        app.update(Duration::from_secs(10));
        assert_eq!(app.game.progression().timer_secs(), 120);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.banner, "Resumed");
        app.update(Duration::from_secs(10));
        assert_eq!(app.game.progression().timer_secs(), 110);
    }

    #[test]
    fn test_ctrl_c_exits_from_play() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_help_overlay_swallows_next_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!app.show_help);
        assert_eq!(app.screen, Screen::Menu);
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor, Pos::new(0, 0));
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.cursor, Pos::new(ROWS - 1, COLS - 1));
    }

    #[test]
    fn test_cursor_select_taps_tile() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.game.selected(), Some(Pos::new(0, 0)));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.game.selected(), None);
    }

    #[test]
    fn test_click_selects_tile_under_pointer() {
        let mut app = app();
        app.area = Rect::new(0, 0, 100, 30);
        press(&mut app, KeyCode::Enter);
        let board = ui::areas(app.area).unwrap().board;
        let (x, y) = ui::tile_center(board, Pos::new(2, 3));
        app.on_click(x as u16, y as u16);
        assert_eq!(app.cursor, Pos::new(2, 3));
        assert_eq!(app.game.selected(), Some(Pos::new(2, 3)));
    }
}
