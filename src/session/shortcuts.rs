use cosmic::iced::keyboard::{Key, Modifiers, key::Named};

use crate::domain::CalibrationAction;
use crate::session::messages::Msg;

/// Map a key press to a message
///
/// `editing` is true while the configuration editor has focus; plain digit
/// keys are left to the editor then.
pub fn handle_key_event(key: Key, modifiers: Modifiers, editing: bool) -> Option<Msg> {
    match key {
        // Ctrl+Enter: debug reading, Ctrl+Shift+Enter: value only
        Key::Named(Named::Enter) if modifiers.control() && modifiers.shift() => {
            Some(Msg::quick_reading())
        }
        Key::Named(Named::Enter) if modifiers.control() => Some(Msg::execute()),
        Key::Character(c) if c.as_str() == "o" && modifiers.control() => Some(Msg::open_dialog()),
        Key::Named(Named::Escape) => Some(Msg::disarm_all()),
        // 1-5 arm the actions in button order
        Key::Character(c) if !editing && !modifiers.control() => c
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| CalibrationAction::ALL.get(index).copied())
            .map(Msg::toggle),
        _ => None,
    }
}
