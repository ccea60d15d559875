//! Interactive case intake prompts

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use intake_core::{Case, CaseId};

/// Operator answers for one intake run
#[derive(Debug, Clone)]
pub struct IntakeAnswers {
    pub case: Case,
    pub evidence: PathBuf,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
    echo_prompts: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, echo_prompts: bool) -> Self {
        Self {
            input,
            output,
            echo_prompts,
        }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        if self.echo_prompts {
            write!(self.output, "{}: ", question)?;
            self.output.flush()?;
        }

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .with_context(|| format!("Failed to read answer to {:?}", question))?;
        if read == 0 {
            bail!("Input closed before {:?} was answered", question);
        }
        Ok(line.trim().to_string())
    }

    /// Ask for case metadata and the evidence path
    pub fn collect(&mut self) -> Result<IntakeAnswers> {
        if self.echo_prompts {
            writeln!(self.output, "🧪 Digital Forensics Case Intake")?;
            writeln!(self.output, "{}", "=".repeat(40))?;
        }

        let number = self.ask("Enter case number (e.g., 005)")?;
        let id = CaseId::parse(&number)?;
        let investigator = self.ask("Enter investigator name")?;
        let victim = self.ask("Enter victim name")?;
        let suspect = self.ask("Enter suspect name")?;
        let crime_type = self.ask("Enter crime type")?;
        let evidence = self.ask("Enter full path to evidence file")?;
        let evidence = strip_quotes(&evidence);
        if evidence.is_empty() {
            bail!(intake_core::IntakeError::InvalidCase(
                "evidence path is empty".to_string()
            ));
        }

        Ok(IntakeAnswers {
            case: Case {
                id,
                investigator,
                victim,
                suspect,
                crime_type,
            },
            evidence: PathBuf::from(evidence),
        })
    }
}

/// Remove quotes left over from pasting a path
fn strip_quotes(path: &str) -> &str {
    path.trim().trim_matches('"').trim_matches('\'')
}
