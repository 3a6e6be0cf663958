//! Slash commands: one table drives parsing, `/help` and tab completion.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

use super::colors::{ansi, Palette};
use crate::chat::Theme;

/// A recognised slash command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Theme,
    History,
    Clear,
    Status,
    Quit,
}

struct Entry {
    command: Command,
    name: &'static str,
    aliases: &'static [&'static str],
    summary: &'static str,
}

const TABLE: &[Entry] = &[
    Entry { command: Command::Help, name: "/help", aliases: &["/?"], summary: "Show this help" },
    Entry { command: Command::Theme, name: "/theme", aliases: &["/dark"], summary: "Toggle dark/light colors" },
    Entry { command: Command::History, name: "/history", aliases: &[], summary: "Reprint the conversation" },
    Entry { command: Command::Clear, name: "/clear", aliases: &[], summary: "Clear conversation history" },
    Entry {
        command: Command::Status,
        name: "/status",
        aliases: &[],
        summary: "Show model, knowledge base and web search settings",
    },
    Entry { command: Command::Quit, name: "/quit", aliases: &["/exit"], summary: "Exit" },
];

impl Command {
    /// Parse a line starting with `/`. Arguments after the command are ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.split_whitespace().next()?;
        TABLE
            .iter()
            .find(|e| e.name == word || e.aliases.contains(&word))
            .map(|e| e.command)
    }

    /// Command names (not aliases) beginning with `prefix`, in table order
    pub fn completions(prefix: &str) -> impl Iterator<Item = &'static str> + '_ {
        TABLE
            .iter()
            .map(|e| e.name)
            .filter(move |name| name.starts_with(prefix))
    }
}

pub fn help_text() -> String {
    let mut text = String::from("Commands:");
    for e in TABLE {
        text.push_str(&format!("\n  {:<9} - {}", e.name, e.summary));
    }
    text
}

/// Rustyline glue: completes and hints command names, otherwise hints
/// from history. Hints are drawn in the theme's muted color.
pub struct ChatHelper {
    history: HistoryHinter,
    muted: &'static str,
}

impl ChatHelper {
    pub fn new(theme: Theme) -> Self {
        Self {
            history: HistoryHinter::new(),
            muted: Palette::for_theme(theme).muted,
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.muted = Palette::for_theme(theme).muted;
    }
}

/// The command word being typed, if the cursor is still inside it
fn command_head(line: &str, pos: usize) -> Option<&str> {
    let head = line.get(..pos)?;
    (head.starts_with('/') && !head.contains(char::is_whitespace)).then_some(head)
}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Some(head) = command_head(line, pos) else {
            return Ok((pos, Vec::new()));
        };
        let candidates = Command::completions(head)
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        if !line.starts_with('/') {
            return self.history.hint(line, pos, ctx);
        }
        // only hint an unambiguous command
        let head = command_head(line, pos)?;
        let mut matches = Command::completions(head);
        let name = matches.next()?;
        if matches.next().is_some() || pos < line.len() {
            return None;
        }
        Some(name[head.len()..].to_string()).filter(|rest| !rest.is_empty())
    }
}

impl Highlighter for ChatHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("{}{}{}", self.muted, hint, ansi::RESET))
    }
}

impl Validator for ChatHelper {}

impl Helper for ChatHelper {}
