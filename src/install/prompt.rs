// src/install/prompt.rs

//! Interactive choices.
//!
//! Installer steps ask through a [`Prompter`] so tests can script the answers.

use std::io::{self, BufRead, Write};

use crate::errors::Result;

/// Something that can ask the user to pick from a numbered menu.
pub trait Prompter: Send {
    /// Show `question` and `options` (numbered from 1) and return the raw
    /// answer, trimmed. An empty answer means "take the default".
    fn choose(&mut self, question: &str, options: &[&str]) -> Result<String>;
}

/// Prompts on the terminal and reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn choose(&mut self, question: &str, options: &[&str]) -> Result<String> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(out, "{}", question)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, option)?;
        }
        write!(out, "Enter choice (1-{}): ", options.len())?;
        out.flush()?;
        drop(out);

        // EOF (closed stdin) reads as an empty answer, i.e. the default.
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}
