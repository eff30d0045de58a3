//! Line-based terminal prompts.
//!
//! Questions go to stderr and answers are read one line at a time, so the
//! prompts work the same over a pipe as on a terminal and never mix with
//! `--json` output on stdout.

use shipwatch_core::{Error, Result};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Asks the user questions.
pub trait Prompter {
    /// Pick one of `choices`. Returns the index of the chosen entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends or cannot be read.
    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize>;

    /// Read a free-text answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends or cannot be read.
    fn input(&mut self, message: &str) -> Result<String>;
}

/// Prompts over any reader/writer pair.
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Read answers from `reader` and write questions to `writer`.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the writer, with everything that was asked.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_answer(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| Error::prompt(format!("could not read answer: {e}")))?;
        if read == 0 {
            return Err(Error::prompt("input closed before an answer was given"));
        }
        Ok(line.trim().to_string())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::prompt(format!("could not write prompt: {e}")))
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize> {
        if choices.is_empty() {
            return Err(Error::prompt(format!("nothing to choose from for: {message}")));
        }

        let mut menu = format!("? {message}\n");
        for (i, choice) in choices.iter().enumerate() {
            let _ = writeln!(menu, "  {}) {choice}", i + 1);
        }
        self.write(&menu)?;

        loop {
            self.write(&format!("  Answer [1-{}]: ", choices.len()))?;
            let answer = self.read_answer()?;
            if let Some(index) = parse_choice(&answer, choices) {
                return Ok(index);
            }
            self.write(&format!("  `{answer}` is not one of the choices\n"))?;
        }
    }

    fn input(&mut self, message: &str) -> Result<String> {
        self.write(&format!("? {message} "))?;
        self.read_answer()
    }
}

/// Accepts a 1-based number or a choice name (case-insensitive).
fn parse_choice(answer: &str, choices: &[&str]) -> Option<usize> {
    if let Ok(n) = answer.parse::<usize>() {
        return (1..=choices.len()).contains(&n).then(|| n - 1);
    }
    choices
        .iter()
        .position(|choice| choice.eq_ignore_ascii_case(answer))
}

/// Prompter on the process's stdin and stderr.
pub fn terminal() -> LinePrompter<io::StdinLock<'static>, io::Stderr> {
    LinePrompter::new(io::stdin().lock(), io::stderr())
}

/// Reads the MFA code from the terminal when the AWS session has expired.
#[derive(Debug, Default)]
pub struct TerminalMfaPrompt {
    // MfaPrompt is Sync; stdin is only ever read by one prompt at a time.
    lock: Mutex<()>,
}

impl shipwatch_aws::MfaPrompt for TerminalMfaPrompt {
    fn token_code(&self, mfa_serial: &str) -> Result<String> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::prompt("MFA prompt is unavailable"))?;
        tracing::debug!(mfa_serial, "Asking for MFA token code");
        terminal().input("Inform your MFA token code")
    }
}
