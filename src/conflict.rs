//! What to do when an output file already exists.
//!
//! The batch driver asks a [`ConflictResolver`] once per existing output and
//! acts on the [`ConflictDecision`]. The compositor and backend never see
//! this; by the time they run, the decision is made.
//!
//! Two resolvers ship:
//! - [`FixedResolver`]: the same answer every time (`--on-conflict overwrite`).
//! - [`PromptResolver`]: asks on the terminal. "All" answers stick for the
//!   rest of the batch.

use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    Overwrite,
    Skip,
    /// Stop processing; remaining jobs are not attempted.
    AbortBatch,
}

pub trait ConflictResolver {
    fn resolve(&mut self, output: &Path) -> io::Result<ConflictDecision>;
}

/// Always gives the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub ConflictDecision);

impl ConflictResolver for FixedResolver {
    fn resolve(&mut self, _output: &Path) -> io::Result<ConflictDecision> {
        Ok(self.0)
    }
}

/// Interactive resolver reading answers line by line.
///
/// ```text
/// IMG_0001_padded.jpg already exists. Overwrite? [y]es/[n]o/[a]ll/[s]kip all/[q]uit:
/// ```
///
/// Unrecognized answers repeat the question. End of input aborts the batch.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
    sticky: Option<ConflictDecision>,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            sticky: None,
        }
    }
}

impl PromptResolver<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read from stdin.
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

fn parse_answer(answer: &str) -> Option<(ConflictDecision, bool)> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some((ConflictDecision::Overwrite, false)),
        "n" | "no" => Some((ConflictDecision::Skip, false)),
        "a" | "all" => Some((ConflictDecision::Overwrite, true)),
        "s" | "skip all" => Some((ConflictDecision::Skip, true)),
        "q" | "quit" => Some((ConflictDecision::AbortBatch, false)),
        _ => None,
    }
}

impl<R: BufRead, W: Write> ConflictResolver for PromptResolver<R, W> {
    fn resolve(&mut self, output: &Path) -> io::Result<ConflictDecision> {
        if let Some(decision) = self.sticky {
            return Ok(decision);
        }
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| output.display().to_string());

        loop {
            write!(
                self.output,
                "{name} already exists. Overwrite? [y]es/[n]o/[a]ll/[s]kip all/[q]uit: "
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(ConflictDecision::AbortBatch);
            }
            match parse_answer(&line) {
                Some((decision, sticky)) => {
                    if sticky {
                        self.sticky = Some(decision);
                    }
                    return Ok(decision);
                }
                None => writeln!(self.output, "Please answer y, n, a, s or q.")?,
            }
        }
    }
}
