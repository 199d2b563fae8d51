//! Default key bindings.
//!
//! Keys are named the way most terminal toolkits print them: a bare
//! character (`"g"`, `"#"`), or modifiers joined with `+` (`"ctrl+n"`,
//! `"shift+r"`). Keys that open a text prompt (search, time entry) are left
//! to the front end, which builds the [`Action`] once the text is in.

use crate::app::Action;

/// Severity of warning events.
pub const SEVERITY_WARN: &str = "30";

/// Severity of error events.
pub const SEVERITY_ERROR: &str = "40";

/// Map a key to its navigation action.
pub fn action_for_key(key: &str) -> Option<Action> {
    let action = match key {
        // Single-event stepping
        "ctrl+n" | "down" => Action::NextEvent,
        "ctrl+p" | "up" => Action::PrevEvent,

        // Ends of the trace
        "g" | "home" => Action::First,
        "G" | "shift+g" | "end" => Action::Last,

        // Paging
        "ctrl+v" | "pgdown" => Action::PageForward,
        "alt+v" | "pgup" => Action::PageBackward,

        // Recovery starts
        "r" => Action::PrevRecoveryStart,
        "R" | "shift+r" => Action::NextRecoveryStart,

        // Any recovery transition
        "e" => Action::PrevRecovery,
        "E" | "shift+e" => Action::NextRecovery,

        // Severity jumps
        "3" => Action::NextSeverity(SEVERITY_WARN.to_string()),
        "#" | "shift+3" => Action::PrevSeverity(SEVERITY_WARN.to_string()),
        "4" => Action::NextSeverity(SEVERITY_ERROR.to_string()),
        "$" | "shift+4" => Action::PrevSeverity(SEVERITY_ERROR.to_string()),

        // Repeat search
        "n" => Action::SearchNext,
        "N" | "shift+n" => Action::SearchPrev,

        _ => return None,
    };
    Some(action)
}
