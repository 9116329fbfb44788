//! Terminal implementation of the confirmation capability

use crate::dashboard;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use steward_common::{DashboardReport, MenuChoice, PromptOutcome, UserPrompt};

/// Map a typed answer to an outcome; `None` means ask again
pub fn parse_answer(input: &str, allowed: MenuChoice) -> Option<PromptOutcome<()>> {
    match input.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(PromptOutcome::Quit),
        "m" | "maintain" if allowed == MenuChoice::Maintain => {
            Some(PromptOutcome::Proceed(MenuChoice::Maintain))
        }
        "r" | "retry" if allowed == MenuChoice::Retry => {
            Some(PromptOutcome::Proceed(MenuChoice::Retry))
        }
        _ => None,
    }
}

pub struct TerminalPrompt {
    /// Confirm maintenance without asking (`--yes`)
    pub assume_yes: bool,
    pub color: bool,
    pub log_path: Option<PathBuf>,
}

impl TerminalPrompt {
    fn ask(&self, question: &str, allowed: MenuChoice) -> PromptOutcome<()> {
        let stdin = io::stdin();
        loop {
            if self.color {
                print!("{} ", question.bright_magenta());
            } else {
                print!("{} ", question);
            }
            let _ = io::stdout().flush();

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                // EOF or unreadable stdin: nobody to ask
                Ok(0) | Err(_) => return PromptOutcome::Quit,
                Ok(_) => {}
            }

            if let Some(outcome) = parse_answer(&input, allowed) {
                return outcome;
            }
        }
    }

    fn print_title(&self, title: &str) {
        println!();
        if self.color {
            println!("{}", title.bright_red().bold());
        } else {
            println!("{}", title);
        }
    }

    fn print_log_hint(&self) {
        if let Some(path) = &self.log_path {
            println!();
            println!("To examine the steward logs, inspect {}", path.display());
        }
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm_maintenance(&self, report: &DashboardReport) -> PromptOutcome<()> {
        println!();
        print!("{}", dashboard::render(report, self.color));

        if self.assume_yes {
            println!();
            println!("Performing maintenance (--yes)");
            return PromptOutcome::Proceed(MenuChoice::Maintain);
        }

        println!();
        self.ask("[m]aintain or [q]uit?", MenuChoice::Maintain)
    }

    fn show_dashboard(&self, report: &DashboardReport) {
        println!();
        print!("{}", dashboard::render(report, self.color));
    }

    fn offer_retry(&self, title: &str, details: &str) -> PromptOutcome<()> {
        self.print_title(title);
        println!();
        println!("{}", details);
        println!();
        self.ask("[r]etry or [q]uit?", MenuChoice::Retry)
    }

    fn report_failure(&self, title: &str, details: &str) {
        self.print_title(title);
        println!();
        println!("{}", details);
        self.print_log_hint();
    }
}
