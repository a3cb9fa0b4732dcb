use std::{
    fmt,
    io::{BufRead, Write},
};

use color_eyre::{Result, eyre::ensure};

pub const PROMPT_QUESTION: &str = "Enter a description for the image: ";

/// Text description of the image to generate. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        ensure!(!text.is_empty(), "The prompt cannot be empty.");
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asks for a prompt on `output` and reads a single line from `input`.
pub fn read_prompt(mut input: impl BufRead, mut output: impl Write) -> Result<Prompt> {
    write!(output, "{PROMPT_QUESTION}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let text = match line.strip_suffix('\n') {
        Some(l) => l.strip_suffix('\r').unwrap_or(l),
        None => &line,
    };
    Prompt::new(text)
}
