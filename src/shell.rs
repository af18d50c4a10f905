//! Line-oriented interactive session: enter customer fields, review the
//! prediction history and export results

use crate::export::{export_submission, format_history, ExportFormat};
use crate::model::Classifier;
use crate::session::{PredictionSession, Submission};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

const PROMPT: &str = "churn> ";

const HELP: &str = "\
Commands:
  predict [field=value; field=value ...]   classify a customer (unset fields use form defaults)
  history                                  show predictions made in this session
  clear                                    clear the prediction history
  export [csv|json] [dir]                  export the last prediction
  help                                     show this message
  quit | exit                              leave the session
Example:
  predict tenure=1; Contract=Month-to-month; PaymentMethod=Electronic check
";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Predict(Vec<(String, String)>),
    History,
    Clear,
    Export {
        format: ExportFormat,
        dir: Option<PathBuf>,
    },
    Help,
    Quit,
}

/// Parse `field=value` pairs separated by `;`
pub fn parse_pairs(text: &str) -> crate::Result<Vec<(String, String)>> {
    text.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Expected field=value, got '{}'", pair))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parse one input line; `None` for blank lines
pub fn parse_command(line: &str) -> crate::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    let command = match verb.to_ascii_lowercase().as_str() {
        "predict" => Command::Predict(parse_pairs(rest)?),
        "history" => Command::History,
        "clear" => Command::Clear,
        "export" => {
            let mut format = None;
            let mut dir = None;
            for token in rest.split_whitespace() {
                match token.parse::<ExportFormat>() {
                    Ok(parsed) if format.is_none() => format = Some(parsed),
                    _ if dir.is_none() => dir = Some(PathBuf::from(token)),
                    _ => anyhow::bail!("Usage: export [csv|json] [dir]"),
                }
            }
            Command::Export {
                format: format.unwrap_or_default(),
                dir,
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("Unknown command '{}'. Type 'help' for usage.", other),
    };
    Ok(Some(command))
}

/// Human-readable report of a prediction and its recommendation
pub fn format_submission(submission: &Submission) -> String {
    let result = &submission.result;
    let recommendation = submission.recommendation;

    let mut lines = vec![
        recommendation.headline().to_string(),
        format!("  Prediction:        {}", result.predicted_label),
        format!("  Churn risk:        {:.1}%", result.churn_probability * 100.0),
        format!(
            "  Retention chance:  {:.1}%",
            result.retention_probability() * 100.0
        ),
        "Recommendations:".to_string(),
    ];
    lines.extend(recommendation.guidance().iter().map(|line| format!("  - {}", line)));

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

/// Interactive front end over a prediction session
pub struct Shell<'a, C: Classifier + ?Sized> {
    session: PredictionSession<'a, C>,
    export_dir: PathBuf,
}

impl<'a, C: Classifier + ?Sized> Shell<'a, C> {
    pub fn new(classifier: &'a C, export_dir: PathBuf) -> Self {
        Self {
            session: PredictionSession::new(classifier),
            export_dir,
        }
    }

    pub fn session(&self) -> &PredictionSession<'a, C> {
        &self.session
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> crate::Result<()> {
        writeln!(output, "Customer churn prediction session. Type 'help' for commands.")?;
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    let reply = self.execute(command);
                    write!(output, "{}", reply)?;
                }
                Ok(None) => {}
                Err(err) => writeln!(output, "error: {}", err)?,
            }
            write!(output, "{}", PROMPT)?;
            output.flush()?;
        }

        writeln!(output)?;
        Ok(())
    }

    /// Execute one command and return the text to display
    pub fn execute(&mut self, command: Command) -> String {
        match command {
            Command::Predict(pairs) => match self.session.submit_form(pairs) {
                Ok(submission) => format_submission(&submission),
                Err(err) => {
                    warn!(error = %err, "Rejected customer record");
                    format!("error: {}\n", err)
                }
            },
            Command::History => {
                if self.session.history().is_empty() {
                    "No predictions in this session yet.\n".to_string()
                } else {
                    format_history(self.session.history())
                }
            }
            Command::Clear => {
                self.session.clear_history();
                "History cleared.\n".to_string()
            }
            Command::Export { format, dir } => {
                let Some(submission) = self.session.last() else {
                    return "Nothing to export: run a prediction first.\n".to_string();
                };
                let dir = dir.unwrap_or_else(|| self.export_dir.clone());
                match export_submission(submission, &dir, format) {
                    Ok(path) => format!("Saved {}\n", path.display()),
                    Err(err) => format!("error: {:#}\n", err),
                }
            }
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
        }
    }
}
