//! Interactive REPL
//!
//! Readline input with history and slash-command completion. Each question is
//! answered through the chat session; the prompt is not shown again until the
//! reply has been printed.

pub mod colors;
pub mod commands;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;

use crate::chat::ChatMessage;
use crate::session::{ChatSession, SendOutcome};
use commands::{help_text, ChatHelper, Command};

const WIDTH: usize = 72;

/// Lines shown by `/status`
#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    pub model: String,
    pub knowledge: String,
    pub web_search: String,
}

pub struct Repl {
    editor: Editor<ChatHelper, DefaultHistory>,
    session: ChatSession,
    status: StatusInfo,
    history_path: PathBuf,
}

impl Repl {
    pub fn new(session: ChatSession, status: StatusInfo) -> Result<Self> {
        let mut editor = Editor::<ChatHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(ChatHelper::new(session.theme())));

        Ok(Self {
            editor,
            session,
            status,
            history_path: crate::config::config_dir().join("chat_history"),
        })
    }

    fn load_history(&mut self) {
        if self.history_path.exists() {
            let _ = self.editor.load_history(&self.history_path);
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = self.editor.save_history(&self.history_path) {
            tracing::debug!("Could not save REPL history: {}", e);
        }
    }

    /// Run the REPL loop
    pub async fn run(&mut self) -> Result<()> {
        self.load_history();

        println!("Ask about music (Ctrl+D to exit, /help for commands)");
        println!();

        loop {
            let readline = self.editor.readline(&colors::prompt(self.session.theme()));

            match readline {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    self.editor.add_history_entry(trimmed)?;

                    if trimmed.starts_with('/') {
                        if !self.handle_command(trimmed) {
                            break;
                        }
                        continue;
                    }

                    self.ask(&line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("{}", colors::error(&format!("Error: {:?}", err)));
                    break;
                }
            }
        }

        self.save_history();
        Ok(())
    }

    /// Returns false when the REPL should exit
    fn handle_command(&mut self, line: &str) -> bool {
        match Command::parse(line) {
            Some(Command::Help) => println!("{}", help_text()),
            Some(Command::Theme) => {
                let theme = self.session.toggle_theme();
                if let Some(helper) = self.editor.helper_mut() {
                    helper.set_theme(theme);
                }
                println!("{}", colors::status(&format!("Switched to {} mode", theme)));
            }
            Some(Command::History) => {
                if self.session.history().is_empty() {
                    println!("{}", colors::status("No messages yet."));
                }
                for msg in self.session.history() {
                    self.print_message(msg);
                }
            }
            Some(Command::Clear) => {
                self.session.clear();
                println!("Conversation cleared.");
            }
            Some(Command::Status) => {
                println!("{}", colors::banner_line("Model", &self.status.model));
                println!("{}", colors::banner_line("Knowledge", &self.status.knowledge));
                println!("{}", colors::banner_line("Web search", &self.status.web_search));
                println!("{}", colors::banner_line("Theme", self.session.theme().as_str()));
                println!(
                    "{}",
                    colors::banner_line("Messages", &self.session.history().len().to_string())
                );
            }
            Some(Command::Quit) => return false,
            None => println!("{}", colors::warning(&format!("Unknown command: {}", line))),
        }
        true
    }

    async fn ask(&mut self, line: &str) {
        println!("{}", colors::muted("  thinking...", self.session.theme()));

        match self.session.send(line).await {
            SendOutcome::Replied(reply) => {
                self.print_message(&reply);
                println!();
            }
            SendOutcome::Busy => println!("{}", colors::warning("Still answering the last question.")),
            SendOutcome::Ignored => {}
        }
    }

    fn print_message(&self, msg: &ChatMessage) {
        println!("{}", colors::message(msg, self.session.theme(), WIDTH));
    }
}
