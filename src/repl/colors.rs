//! ANSI color helpers for terminal output, with a light and a dark palette.

use crate::chat::{ChatMessage, Sender, Theme};

/// ANSI escape codes
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const BLACK: &str = "\x1b[30m";
    pub const WHITE: &str = "\x1b[37m";
    pub const GRAY: &str = "\x1b[90m";

    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
}

use ansi::*;

/// Colors used for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: &'static str,
    pub bot: &'static str,
    pub accent: &'static str,
    pub muted: &'static str,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                user: BLUE,
                bot: BLACK,
                accent: MAGENTA,
                muted: GRAY,
            },
            Theme::Dark => Palette {
                user: BRIGHT_CYAN,
                bot: WHITE,
                accent: BRIGHT_YELLOW,
                muted: DIM,
            },
        }
    }
}

/// Render a chat message: user lines right-aligned within `width`, bot left
pub fn message(msg: &ChatMessage, theme: Theme, width: usize) -> String {
    let palette = Palette::for_theme(theme);
    match msg.sender {
        Sender::User => {
            let label = format!("{} : you", msg.text);
            let pad = width.saturating_sub(label.chars().count());
            format!("{}{}{}{}", " ".repeat(pad), palette.user, label, RESET)
        }
        Sender::Bot => format!("{}{}bot{} {}{}{}", BOLD, palette.accent, RESET, palette.bot, msg.text, RESET),
    }
}

/// Format a success message (green)
pub fn success(msg: &str) -> String {
    format!("{}{}{}", GREEN, msg, RESET)
}

/// Format an error message (red)
pub fn error(msg: &str) -> String {
    format!("{}{}{}", RED, msg, RESET)
}

/// Format a warning message (yellow)
pub fn warning(msg: &str) -> String {
    format!("{}{}{}", YELLOW, msg, RESET)
}

/// Format a status/info message (gray/dim)
pub fn status(msg: &str) -> String {
    format!("{}{}{}", GRAY, msg, RESET)
}

/// Secondary text in the theme's muted color
pub fn muted(msg: &str, theme: Theme) -> String {
    format!("{}{}{}", Palette::for_theme(theme).muted, msg, RESET)
}

/// Format the prompt
pub fn prompt(theme: Theme) -> String {
    format!("{}{}>>> {}", BOLD, Palette::for_theme(theme).accent, RESET)
}

/// Format a horizontal separator
pub fn separator(width: usize) -> String {
    format!("{}{}{}", DIM, "─".repeat(width), RESET)
}

/// Format startup banner line
pub fn banner_line(label: &str, value: &str) -> String {
    format!("{}{:<12}{} {}", DIM, label, RESET, value)
}

/// Format startup banner with accent
pub fn banner_accent(text: &str) -> String {
    format!("{}{}{}{}", BOLD, MAGENTA, text, RESET)
}
