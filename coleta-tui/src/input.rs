use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Input text was edited; refresh suggestions
    InputChanged,
    /// Look up the typed coordinates or the highlighted suggestion
    Submit,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Up};

    // Global quit shortcut
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match key.code {
        Up => {
            app.select_previous();
            Action::None
        }
        Down => {
            app.select_next();
            Action::None
        }
        Char(character) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT) {
                return Action::None;
            }
            app.input.push(character);
            Action::InputChanged
        }
        Backspace => {
            if app.input.pop().is_some() {
                Action::InputChanged
            } else {
                Action::None
            }
        }
        Enter => Action::Submit,
        Esc => {
            if app.input.is_empty() {
                Action::Quit
            } else {
                app.input.clear();
                Action::InputChanged
            }
        }
        _ => Action::None,
    }
}
