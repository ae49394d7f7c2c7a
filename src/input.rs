//! Key bindings (normal and vim-style) and mouse clicks.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Tap the tile under the cursor; starts the game from the menu.
    Select,
    Pause,
    Restart,
    /// Back to the menu while playing; leaves the app from the menu.
    Quit,
    /// Leave the app from anywhere (Ctrl-C).
    Exit,
    ToggleMode,
    ToggleSound,
    Help,
    None,
}

/// Map key event to game action. Supports both normal (arrows, enter) and vim (hjkl, space).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Exit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('m' | 'M') => Action::ToggleMode,
        KeyCode::Char('s' | 'S') => Action::ToggleSound,
        KeyCode::Char('?') | KeyCode::F(1) => Action::Help,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        _ => Action::None,
    }
}

/// Terminal cell of a left click, if `mouse` is one.
pub fn mouse_click(mouse: MouseEvent) -> Option<(u16, u16)> {
    matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)).then_some((mouse.column, mouse.row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 12,
            row: 4,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_arrows_and_vim_agree() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Select);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Select);
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char('R'))), Action::Restart);
        assert_eq!(key_to_action(key(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(key(KeyCode::Char('m'))), Action::ToggleMode);
        assert_eq!(key_to_action(key(KeyCode::Char('?'))), Action::Help);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Exit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_only_left_press_is_a_click() {
        assert_eq!(
            mouse_click(mouse(MouseEventKind::Down(MouseButton::Left))),
            Some((12, 4))
        );
        assert_eq!(mouse_click(mouse(MouseEventKind::Up(MouseButton::Left))), None);
        assert_eq!(mouse_click(mouse(MouseEventKind::Down(MouseButton::Right))), None);
        assert_eq!(mouse_click(mouse(MouseEventKind::Moved)), None);
    }
}
