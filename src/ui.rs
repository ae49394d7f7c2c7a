//! Layout and drawing: board, tiles in flight, removal fades, sparks, HUD sidebar,
//! banner, and the menu / help / pause / game over overlays. Also mouse hit-testing.

use crate::anim::{Animator, Point};
use crate::app::Screen;
use crate::board::{COLS, Icon, Pos, ROWS};
use crate::effects::Sparks;
use crate::engine::{Game, Status};
use crate::progression::{TOTAL_LEVELS, level_target};
use crate::theme::{Surface, Theme};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// One tile is 7 columns by 3 rows; terminal cells are roughly twice as tall as wide.
pub const TILE_W: u16 = 7;
pub const TILE_H: u16 = 3;
const BOARD_W: u16 = COLS as u16 * TILE_W + 2;
const BOARD_H: u16 = ROWS as u16 * TILE_H + 2;
const SIDEBAR_WIDTH: u16 = 24;
const GAP: u16 = 1;
/// Smallest terminal that fits banner, board and sidebar.
pub const MIN_WIDTH: u16 = BOARD_W + GAP + SIDEBAR_WIDTH;
pub const MIN_HEIGHT: u16 = BOARD_H + 1;

/// Duration of the removal fade (TachyonFX), matching the animator's ghost lifetime.
const REMOVAL_FADE_MS: u32 = (crate::anim::FADE_SECS * 1000.0) as u32;

const HOW_TO_PLAY: &str = "Match 3 or more icons. Tap tiles to select and swap with adjacent \
    tiles. Clear tiles to score and fill the board. Reach targets to progress levels. Good luck!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub banner: Rect,
    /// Board including its border.
    pub board_outer: Rect,
    /// Tile grid only.
    pub board: Rect,
    pub sidebar: Rect,
}

/// Centre the banner, board and sidebar in `area`; None when the terminal is too small.
pub fn areas(area: Rect) -> Option<Areas> {
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        return None;
    }
    let x = area.x + (area.width - MIN_WIDTH) / 2;
    let y = area.y + (area.height - MIN_HEIGHT) / 2;
    Some(Areas {
        banner: Rect::new(x, y, MIN_WIDTH, 1),
        board_outer: Rect::new(x, y + 1, BOARD_W, BOARD_H),
        board: Rect::new(x + 1, y + 2, BOARD_W - 2, BOARD_H - 2),
        sidebar: Rect::new(x + BOARD_W + GAP, y + 1, SIDEBAR_WIDTH, BOARD_H),
    })
}

/// Tile whose centre is nearest to the clicked cell, if the click lies within half a
/// tile of it. Distances are scaled per axis so the reach is the same on screen
/// horizontally and vertically.
pub fn hit_test(board: Rect, column: u16, row: u16) -> Option<Pos> {
    let half_w = f32::from(TILE_W) / 2.0;
    let half_h = f32::from(TILE_H) / 2.0;
    let px = f32::from(column) + 0.5;
    let py = f32::from(row) + 0.5;
    Pos::all()
        .map(|pos| {
            let (cx, cy) = tile_center(board, pos);
            let dx = (px - cx) / half_w;
            let dy = (py - cy) / half_h;
            (pos, dx * dx + dy * dy)
        })
        .filter(|&(_, d)| d < 1.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(pos, _)| pos)
}

/// Centre of the tile at `pos` in terminal coordinates.
pub fn tile_center(board: Rect, pos: Pos) -> (f32, f32) {
    (
        f32::from(board.x) + (pos.col as f32 + 0.5) * f32::from(TILE_W),
        f32::from(board.y) + (pos.row as f32 + 0.5) * f32::from(TILE_H),
    )
}

/// Top-left terminal cell for a tile drawn at `p` (tile units, may be fractional).
fn tile_origin(board: Rect, p: Point) -> (i32, i32) {
    (
        i32::from(board.x) + (p.x * f32::from(TILE_W)).round() as i32,
        i32::from(board.y) + (p.y * f32::from(TILE_H)).round() as i32,
    )
}

/// Buffer cells covered by the tiles at `cells`.
fn cell_positions(board: Rect, cells: &[Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for pos in cells {
        let x0 = board.x + pos.col as u16 * TILE_W;
        let y0 = board.y + pos.row as u16 * TILE_H;
        for x in x0..x0 + TILE_W {
            for y in y0..y0 + TILE_H {
                set.insert((x, y));
            }
        }
    }
    set
}

/// TachyonFX fade over removed tiles. Restarted for every removal batch.
#[derive(Default)]
pub struct RemovalFade {
    cells: Vec<Pos>,
    effect: Option<Effect>,
    processed: Option<Instant>,
}

impl RemovalFade {
    pub fn start(&mut self, cells: Vec<Pos>) {
        self.cells = cells;
        self.effect = None;
        self.processed = None;
    }

    pub fn push(&mut self, pos: Pos) {
        if self.effect.is_some() {
            self.start(Vec::new());
        }
        self.cells.push(pos);
    }

    pub fn clear(&mut self) {
        self.start(Vec::new());
    }

    fn render(&mut self, frame: &mut Frame, board: Rect, bg: Color, now: Instant) {
        if self.cells.is_empty() {
            return;
        }
        let delta = self
            .processed
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        self.processed = Some(now);

        if self.effect.is_none() {
            let fading = cell_positions(board, &self.cells);
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                fading.contains(&(pos.x, pos.y))
            }));
            let effect = fx::fade_to(bg, bg, (REMOVAL_FADE_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board);
            self.effect = Some(effect);
        }
        if let Some(effect) = &mut self.effect {
            frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
            if effect.done() {
                self.cells.clear();
            }
        }
    }
}

/// Everything the renderer reads for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub game: &'a Game,
    pub anim: &'a Animator,
    pub sparks: &'a Sparks,
    pub theme: &'a Theme,
    pub banner: &'a str,
    pub high_score: u32,
    /// Keyboard cursor, shown while playing.
    pub cursor: Pos,
    pub show_help: bool,
    pub ascii: bool,
    pub sound_on: bool,
}

pub fn draw(frame: &mut Frame, view: &View, fade: &mut RemovalFade, now: Instant) {
    let area = frame.area();
    let surface = *view.theme.surface();
    frame
        .buffer_mut()
        .set_style(area, Style::default().bg(surface.bg).fg(surface.main_fg));

    let Some(areas) = areas(area) else {
        draw_too_small(frame, area, &surface);
        return;
    };

    draw_banner(frame, view, areas.banner, &surface);
    draw_board(frame, view, &areas, &surface);
    fade.render(frame, areas.board, surface.bg, now);
    draw_sparks(frame.buffer_mut(), view.sparks, areas.board);
    draw_sidebar(frame, view, areas.sidebar, &surface);

    if view.show_help {
        draw_help(frame, area, &surface);
        return;
    }
    match (view.screen, view.game.status()) {
        (Screen::Menu, _) => draw_menu(frame, view, area, &surface),
        (Screen::Playing, Status::Paused) => draw_pause_overlay(frame, area, &surface),
        (Screen::Playing, Status::GameOver) => draw_game_over(frame, view, area, &surface),
        (Screen::Playing, Status::Completed) => draw_completed(frame, view, area, &surface),
        _ => {}
    }
}

fn draw_too_small(frame: &mut Frame, area: Rect, surface: &Surface) {
    let msg = format!(
        "Terminal too small: need {}x{}, have {}x{}",
        MIN_WIDTH, MIN_HEIGHT, area.width, area.height
    );
    Paragraph::new(msg)
        .style(Style::default().fg(surface.title))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, frame.buffer_mut());
}

fn draw_banner(frame: &mut Frame, view: &View, area: Rect, surface: &Surface) {
    Paragraph::new(Line::from(Span::styled(
        view.banner,
        Style::default()
            .fg(surface.title)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .render(area, frame.buffer_mut());
}

fn put(buf: &mut Buffer, clip: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
        return;
    };
    if clip.contains(Position::new(x, y)) {
        buf[(x, y)].set_symbol(symbol).set_style(style);
    }
}

fn draw_board(frame: &mut Frame, view: &View, areas: &Areas, surface: &Surface) {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(surface.div_line).bg(surface.bg))
        .title(Span::styled(
            " SkyMatch ",
            Style::default().fg(surface.title),
        ))
        .render(areas.board_outer, frame.buffer_mut());

    let board = areas.board;
    let game = view.game;
    let buf = frame.buffer_mut();
    let playing = view.screen == Screen::Playing && game.status() == Status::Playing;

    for ghost in view.anim.ghosts() {
        let origin = tile_origin(board, Point::of(ghost.pos));
        let frame_style = Style::default().fg(surface.div_line).bg(surface.bg);
        draw_tile(buf, board, origin, ghost.icon, ghost.special, frame_style, view);
    }

    for (id, tile) in game.board().tiles() {
        let origin = tile_origin(board, view.anim.position(id, tile.pos));
        let mut frame_style = Style::default().fg(surface.div_line).bg(surface.bg);
        if game.selected() == Some(tile.pos) {
            frame_style = frame_style
                .fg(surface.highlight)
                .add_modifier(Modifier::BOLD);
        } else if playing && view.cursor == tile.pos {
            frame_style = frame_style.fg(surface.title);
        } else if tile.special {
            frame_style = frame_style.fg(view.theme.icon_color(tile.icon));
        }
        draw_tile(buf, board, origin, tile.icon, tile.special, frame_style, view);
    }
}

fn draw_tile(
    buf: &mut Buffer,
    clip: Rect,
    (x, y): (i32, i32),
    icon: Icon,
    special: bool,
    frame_style: Style,
    view: &View,
) {
    let surface = view.theme.surface();
    let face = Style::default().bg(surface.tile_bg);
    let right = x + i32::from(TILE_W) - 1;
    let bottom = y + i32::from(TILE_H) - 1;

    put(buf, clip, x, y, "┌", frame_style);
    put(buf, clip, right, y, "┐", frame_style);
    put(buf, clip, x, bottom, "└", frame_style);
    put(buf, clip, right, bottom, "┘", frame_style);
    for cx in x + 1..right {
        put(buf, clip, cx, y, "─", frame_style);
        put(buf, clip, cx, bottom, "─", frame_style);
    }
    for cy in y + 1..bottom {
        put(buf, clip, x, cy, "│", frame_style);
        put(buf, clip, right, cy, "│", frame_style);
        for cx in x + 1..right {
            put(buf, clip, cx, cy, " ", face);
        }
    }
    if special {
        let glow = Style::default()
            .fg(view.theme.icon_color(icon))
            .bg(surface.bg)
            .add_modifier(Modifier::BOLD);
        put(buf, clip, x + i32::from(TILE_W) / 2, y, "✦", glow);
    }

    let mid = y + i32::from(TILE_H) / 2;
    let color = view.theme.icon_color(icon);
    if view.ascii {
        let letter = icon.letter().to_string();
        let style = face.fg(color).add_modifier(Modifier::BOLD);
        put(buf, clip, x + i32::from(TILE_W) / 2, mid, &letter, style);
        return;
    }
    // Emoji are two cells wide; only draw when both cells are on the board.
    let gx = x + i32::from(TILE_W) / 2 - 1;
    let (Ok(ux), Ok(uy)) = (u16::try_from(gx), u16::try_from(mid)) else {
        return;
    };
    if clip.contains(Position::new(ux, uy)) && clip.contains(Position::new(ux + 1, uy)) {
        buf.set_string(ux, uy, icon.glyph(), face.fg(color));
    }
}

fn dim(color: Color, brightness: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let f = brightness.clamp(0.0, 1.0);
            Color::Rgb(
                (f32::from(r) * f) as u8,
                (f32::from(g) * f) as u8,
                (f32::from(b) * f) as u8,
            )
        }
        other => other,
    }
}

fn draw_sparks(buf: &mut Buffer, sparks: &Sparks, board: Rect) {
    for spark in sparks.iter() {
        let x = i32::from(board.x) + (spark.x * f32::from(TILE_W)) as i32;
        let y = i32::from(board.y) + (spark.y * f32::from(TILE_H)) as i32;
        let symbol = if spark.brightness() > 0.5 { "*" } else { "·" };
        let (Ok(ux), Ok(uy)) = (u16::try_from(x), u16::try_from(y)) else {
            continue;
        };
        if board.contains(Position::new(ux, uy)) {
            buf[(ux, uy)]
                .set_symbol(symbol)
                .set_fg(dim(spark.color, spark.brightness()));
        }
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect, surface: &Surface) {
    let title_style = Style::default().fg(surface.title);
    let fg_style = Style::default().fg(surface.main_fg);
    let border_style = Style::default().fg(surface.div_line).bg(surface.bg);
    let progress = view.game.progression();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats
            Constraint::Length(4), // Target gauge
            Constraint::Min(0),    // Controls
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let timer = progress.timer_secs();
    let timer_style = if timer <= 10 && view.game.status() == Status::Playing {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        fg_style
    };
    let heart = if view.ascii { "<3" } else { "♥" };
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(progress.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best:  ", title_style),
            Span::styled(view.high_score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(format!("{}/{}", progress.level, TOTAL_LEVELS), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lives: ", title_style),
            Span::styled(
                heart.repeat(progress.lives as usize),
                Style::default().fg(Color::Rgb(0xE0, 0x6C, 0x75)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Time:  ", title_style),
            Span::styled(format!("{:02}:{:02}", timer / 60, timer % 60), timer_style),
        ]),
        Line::from(vec![
            Span::styled("Sound: ", title_style),
            Span::styled(if view.sound_on { "on" } else { "off" }, fg_style),
        ]),
    ];
    Paragraph::new(Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    let target_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let target_inner = target_block.inner(chunks[1]);
    target_block.render(chunks[1], frame.buffer_mut());
    let target_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(target_inner);
    Paragraph::new(Line::from(Span::styled(
        format!("Target {}", level_target(progress.level)),
        title_style,
    )))
    .render(target_layout[0], frame.buffer_mut());
    Gauge::default()
        .ratio(progress.level_progress())
        .label(format!("{:.0}%", progress.level_progress() * 100.0))
        .gauge_style(Style::default().fg(surface.title).bg(surface.tile_bg))
        .render(target_layout[1], frame.buffer_mut());

    let keys = [
        ("Enter", "tap / start"),
        ("hjkl", "move cursor"),
        ("P", "pause"),
        ("R", "restart"),
        ("Q", "quit to menu"),
        ("M", "light / dark"),
        ("S", "sound"),
        ("?", "how to play"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!(" {:<6}", key), title_style),
                Span::styled(*what, Style::default().fg(surface.inactive_fg)),
            ])
        })
        .collect();
    Paragraph::new(Text::from(lines)).render(chunks[2], frame.buffer_mut());
}

/// Bordered box centred in `area`, sized to its content.
fn draw_popup(frame: &mut Frame, area: Rect, surface: &Surface, title: &str, lines: Vec<Line>) {
    let content_w = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let popup_w = (content_w + 6).min(area.width);
    let popup_h = (lines.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(surface.bg).fg(surface.main_fg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(surface.title).bg(surface.bg))
                .title(Span::styled(
                    format!(" {} ", title),
                    Style::default()
                        .fg(surface.title)
                        .add_modifier(Modifier::BOLD),
                )),
        )
        .render(popup, frame.buffer_mut());
}

fn key_line<'a>(key: &'a str, what: &'a str, surface: &Surface) -> Line<'a> {
    Line::from(vec![
        Span::styled(key, Style::default().fg(surface.title)),
        Span::styled(" — ", Style::default().fg(surface.inactive_fg)),
        Span::styled(what, Style::default().fg(surface.main_fg)),
    ])
}

fn draw_menu(frame: &mut Frame, view: &View, area: Rect, surface: &Surface) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Swap neighbours, line up three.",
            Style::default().fg(surface.main_fg),
        )),
        Line::from(""),
        key_line("Enter", "Start", surface),
        key_line("?", "How to play", surface),
        key_line("Q", "Quit", surface),
        Line::from(""),
        Line::from(Span::styled(
            format!("Best {}", view.high_score),
            Style::default().fg(surface.inactive_fg),
        )),
    ];
    draw_popup(frame, area, surface, "SkyMatch", lines);
}

fn draw_help(frame: &mut Frame, area: Rect, surface: &Surface) {
    let width = 44.min(area.width);
    let height = 12.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    Clear.render(popup, frame.buffer_mut());
    let text = Text::from(vec![
        Line::from(""),
        Line::from(HOW_TO_PLAY),
        Line::from(""),
        Line::from(Span::styled(
            "Click a tile or use the cursor keys and Enter.",
            Style::default().fg(surface.inactive_fg),
        )),
        Line::from(Span::styled(
            "Any key to close",
            Style::default().fg(surface.inactive_fg),
        )),
    ]);
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(surface.bg).fg(surface.main_fg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(surface.title).bg(surface.bg))
                .title(" How to play "),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, area: Rect, surface: &Surface) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        key_line("P", "Resume", surface),
        key_line("Q", "Quit to menu", surface),
    ];
    draw_popup(frame, area, surface, "Pause", lines);
}

fn score_lines<'a>(view: &View, surface: &Surface) -> Vec<Line<'a>> {
    let score = view.game.progression().score;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Score {}", score),
            Style::default()
                .fg(surface.main_fg)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if score > 0 && score >= view.high_score {
        lines.push(Line::from(Span::styled(
            "New high score!",
            Style::default().fg(surface.title),
        )));
    }
    lines.push(Line::from(""));
    lines
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect, surface: &Surface) {
    let mut lines = score_lines(view, surface);
    lines.push(key_line("R", "Play again", surface));
    lines.push(key_line("Q", "Menu", surface));
    draw_popup(frame, area, surface, "Game Over", lines);
}

fn draw_completed(frame: &mut Frame, view: &View, area: Rect, surface: &Surface) {
    let mut lines = score_lines(view, surface);
    lines.insert(
        1,
        Line::from(Span::styled(
            "You beat all levels!",
            Style::default().fg(surface.title),
        )),
    );
    lines.push(key_line("R", "Play again", surface));
    lines.push(key_line("Q", "Menu", surface));
    draw_popup(frame, area, surface, "Congratulations", lines);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn board_rect() -> Rect {
        areas(Rect::new(0, 0, MIN_WIDTH, MIN_HEIGHT)).unwrap().board
    }

    #[test]
    fn test_areas_need_minimum_size() {
        assert!(areas(Rect::new(0, 0, MIN_WIDTH - 1, MIN_HEIGHT)).is_none());
        assert!(areas(Rect::new(0, 0, MIN_WIDTH, MIN_HEIGHT - 1)).is_none());
        let a = areas(Rect::new(0, 0, 120, 40)).unwrap();
        assert_eq!(a.board.width, COLS as u16 * TILE_W);
        assert_eq!(a.board.height, ROWS as u16 * TILE_H);
        assert!(a.sidebar.x > a.board_outer.right() - 1);
    }

    #[test]
    fn test_click_on_tile_centre_hits_it() {
        let board = board_rect();
        for pos in Pos::all() {
            let (cx, cy) = tile_center(board, pos);
            assert_eq!(hit_test(board, cx as u16, cy as u16), Some(pos));
        }
    }

    #[test]
    fn test_click_in_tile_corner_misses() {
        let board = board_rect();
        let x = board.x + 2 * TILE_W;
        let y = board.y + TILE_H;
        assert_eq!(hit_test(board, x, y), None);
    }

    #[test]
    fn test_click_off_board_misses() {
        let board = board_rect();
        assert_eq!(hit_test(board, 0, 0), None);
        assert_eq!(hit_test(board, board.right() + 3, board.y + 1), None);
    }

    #[test]
    fn test_click_near_centre_is_forgiving() {
        let board = board_rect();
        let (cx, cy) = tile_center(board, Pos::new(3, 4));
        assert_eq!(hit_test(board, cx as u16 + 2, cy as u16), Some(Pos::new(3, 4)));
        assert_eq!(hit_test(board, cx as u16 - 2, cy as u16), Some(Pos::new(3, 4)));
    }

    fn render(screen: Screen, game: &Game, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let anim = Animator::new(false);
        let sparks = Sparks::new();
        let theme = Theme::default();
        let view = View {
            screen,
            game,
            anim: &anim,
            sparks: &sparks,
            theme: &theme,
            banner: "Good luck!",
            high_score: 1234,
            cursor: Pos::new(0, 0),
            show_help: false,
            ascii: true,
            sound_on: false,
        };
        let mut fade = RemovalFade::default();
        terminal
            .draw(|f| draw(f, &view, &mut fade, Instant::now()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_playing_screen_shows_hud() {
        let mut game = Game::new(&GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        });
        game.start();
        let screen = render(Screen::Playing, &game, 100, 30);
        assert!(screen.contains("Score"));
        assert!(screen.contains("Good luck!"));
        assert!(screen.contains("1/20"));
        assert!(screen.contains("02:00"));
    }

    #[test]
    fn test_menu_and_small_terminal() {
        let game = Game::new(&GameConfig::default());
        assert!(render(Screen::Menu, &game, 100, 30).contains("Start"));
        assert!(render(Screen::Menu, &game, 30, 10).contains("too small"));
    }
}
