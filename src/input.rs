//! Key bindings: cursor movement, tile clicks, menu navigation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press. `Click` resolves the tile under the cursor;
/// mouse clicks are translated separately in the app from cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Click,
    Back,
    Quit,
    None,
}

/// Map key event to action. Supports arrows/enter/space and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') if no_mod => Action::Quit,
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Esc if no_mod => Action::Back,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::Up,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::Down,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::Left,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') if no_mod => Action::Click,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn arrows_and_vim_map_to_movement() {
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Right)), Action::Right);
    }

    #[test]
    fn enter_and_space_click() {
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Click);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Click);
    }

    #[test]
    fn modified_keys_are_ignored() {
        let mut ev = key(KeyCode::Char('k'));
        ev.modifiers = KeyModifiers::ALT;
        assert_eq!(key_to_action(ev), Action::None);
    }
}
