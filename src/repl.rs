//! Interactive REPL
//!
//! Conversational front end: one text input, and per turn the intent
//! label, the assistant's response, and the current trip context summary.
//! Slash commands: /context, /clear, /help, /quit.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::Color;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::errors::{Result, WayfarerError};
use crate::orchestrator::Orchestrator;

const BANNER: &str = "Wayfarer - conversational trip planner. Type /help for commands.";

/// Interactive chat session
pub struct Repl {
    orchestrator: Orchestrator,
    editor: Reedline,
    prompt: DefaultPrompt,
}

impl Repl {
    pub fn new(orchestrator: Orchestrator) -> Self {
        let editor = Reedline::create();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("wayfarer".to_string()),
            DefaultPromptSegment::Empty,
        );

        Self {
            orchestrator,
            editor,
            prompt,
        }
    }

    /// Run the read-eval-print loop until /quit or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        println!("{}", Color::Cyan.bold().paint(BANNER));

        loop {
            let signal = self
                .editor
                .read_line(&self.prompt)
                .map_err(|e| WayfarerError::Io(e.to_string()))?;

            match signal {
                Signal::Success(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if !self.handle_command(&line).await {
                            break;
                        }
                        continue;
                    }

                    self.handle_turn(&line).await;
                }
                Signal::CtrlC => continue,
                Signal::CtrlD => break,
            }
        }

        println!("{}", Color::DarkGray.paint("bye"));
        Ok(())
    }

    /// Returns false when the REPL should exit
    async fn handle_command(&mut self, command: &str) -> bool {
        match command {
            "/quit" | "/exit" => return false,
            "/clear" => {
                self.orchestrator.reset().await;
                println!("{}", Color::DarkGray.paint("session cleared"));
            }
            "/context" => {
                println!("{}", self.orchestrator.context_summary().await);
            }
            "/help" => {
                println!("/context  show the current trip context");
                println!("/clear    forget this session");
                println!("/quit     exit");
            }
            other => {
                println!("{}", Color::Red.paint(format!("unknown command: {other}")));
            }
        }
        true
    }

    async fn handle_turn(&mut self, line: &str) {
        let spinner = make_spinner();
        let result = self.orchestrator.process_user_input(line).await;
        spinner.finish_and_clear();

        println!(
            "{}",
            Color::DarkGray.paint(format!("[intent: {}]", result.intent))
        );
        println!("{}", result.response);

        if let Some(error) = result.error {
            println!("{}", Color::Red.paint(format!("error: {error}")));
        }

        println!(
            "{}",
            Color::DarkGray.paint(format!("context: {}", result.context.summary()))
        );
    }
}

fn make_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("planning...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
