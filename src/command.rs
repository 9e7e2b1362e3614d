use crate::config::KeybindingConfig;
use crate::error::{Result, ScmTreeError};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents all possible user commands that can be executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Quit,

    // Tree commands
    NavigateUp,
    NavigateDown,
    NavigateLeft,
    NavigateRight,
    Enter,
    Home,
    End,

    // Change cursor
    NextChange,
    PreviousChange,

    ToggleView,
    Refresh,

    // Multi-step commands for testing
    Sequence(Vec<Command>),
}

impl Command {
    /// Parse a command from a string representation
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "quit" | "q" => Ok(Command::Quit),

            "navigate_up" | "up" => Ok(Command::NavigateUp),
            "navigate_down" | "down" => Ok(Command::NavigateDown),
            "navigate_left" | "left" => Ok(Command::NavigateLeft),
            "navigate_right" | "right" => Ok(Command::NavigateRight),
            "enter" | "open" => Ok(Command::Enter),
            "home" => Ok(Command::Home),
            "end" => Ok(Command::End),

            "next_change" | "n" => Ok(Command::NextChange),
            "previous_change" | "p" => Ok(Command::PreviousChange),

            "toggle_view" | "v" => Ok(Command::ToggleView),
            "refresh" | "r" => Ok(Command::Refresh),

            _ => {
                if let Some(inner) = s
                    .strip_prefix("sequence:[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    if inner.trim().is_empty() {
                        return Ok(Command::Sequence(vec![]));
                    }
                    let commands = inner
                        .split(',')
                        .map(|cmd_str| {
                            let cmd_str = cmd_str.trim();
                            Command::from_string(cmd_str).map_err(|e| {
                                ScmTreeError::Command(format!(
                                    "invalid command in sequence '{}': {}",
                                    cmd_str, e
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    return Ok(Command::Sequence(commands));
                }

                Err(ScmTreeError::Command(s.to_string()))
            }
        }
    }

    /// Map a key press to a command using the configured bindings
    pub fn from_key(key: KeyEvent, bindings: &KeybindingConfig) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Command::Quit),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Esc => Some(Command::Quit),
            KeyCode::Up => Some(Command::NavigateUp),
            KeyCode::Down => Some(Command::NavigateDown),
            KeyCode::Left => Some(Command::NavigateLeft),
            KeyCode::Right => Some(Command::NavigateRight),
            KeyCode::Enter => Some(Command::Enter),
            KeyCode::Home => Some(Command::Home),
            KeyCode::End => Some(Command::End),
            KeyCode::Char(c) if c == bindings.quit => Some(Command::Quit),
            KeyCode::Char(c) if c == bindings.toggle_view => Some(Command::ToggleView),
            KeyCode::Char(c) if c == bindings.refresh => Some(Command::Refresh),
            KeyCode::Char(c) if c == bindings.next_change => Some(Command::NextChange),
            KeyCode::Char(c) if c == bindings.previous_change => Some(Command::PreviousChange),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Quit => f.write_str("quit"),
            Command::NavigateUp => f.write_str("navigate_up"),
            Command::NavigateDown => f.write_str("navigate_down"),
            Command::NavigateLeft => f.write_str("navigate_left"),
            Command::NavigateRight => f.write_str("navigate_right"),
            Command::Enter => f.write_str("enter"),
            Command::Home => f.write_str("home"),
            Command::End => f.write_str("end"),
            Command::NextChange => f.write_str("next_change"),
            Command::PreviousChange => f.write_str("previous_change"),
            Command::ToggleView => f.write_str("toggle_view"),
            Command::Refresh => f.write_str("refresh"),
            Command::Sequence(commands) => {
                let inner: Vec<String> = commands.iter().map(ToString::to_string).collect();
                write!(f, "sequence:[{}]", inner.join(","))
            }
        }
    }
}
