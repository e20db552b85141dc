use colored::*;
use std::io::{self, BufRead, Write};

/// Confirmation surface: show `message`, return the option the user picked
pub trait Confirm: Send + Sync {
    fn ask(&self, message: &str, options: &[&str]) -> Option<String>;
}

/// Numbered prompt on stdin/stdout
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask(&self, message: &str, options: &[&str]) -> Option<String> {
        println!("\n{} {}", "!".yellow(), message.white());
        for (i, option) in options.iter().enumerate() {
            println!("  {} {}", format!("[{}]", i + 1).bright_black(), option.blue());
        }

        print!(
            "\n{} ",
            format!("Enter selection (1-{}):", options.len()).blue()
        );
        io::stdout().flush().ok()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input).ok()?;

        let selection: usize = input.trim().parse().ok()?;
        options
            .get(selection.checked_sub(1)?)
            .map(|s| s.to_string())
    }
}

/// Always answers with the same option, or declines when `None`
#[derive(Debug, Clone, Default)]
pub struct FixedAnswer(pub Option<String>);

impl FixedAnswer {
    pub fn selecting(option: impl Into<String>) -> Self {
        Self(Some(option.into()))
    }

    pub fn declining() -> Self {
        Self(None)
    }
}

impl Confirm for FixedAnswer {
    fn ask(&self, message: &str, _options: &[&str]) -> Option<String> {
        log::debug!("Auto-answering prompt '{message}' with {:?}", self.0);
        self.0.clone()
    }
}
