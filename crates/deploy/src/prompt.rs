//! Interactive decisions.

use std::io::{self, BufRead, Write};

use console::style;

/// Answers the pipeline's gates.
///
/// Each call blocks until an answer is available. An empty answer to a
/// prompt with a default selects the default.
pub trait Prompter {
    /// A yes/no gate.
    fn confirm(&mut self, message: &str, default: bool) -> io::Result<bool>;

    /// One of `choices`.
    fn select(&mut self, message: &str, choices: &[String], default: &str) -> io::Result<String>;

    /// Free text. Without a default an empty answer is returned as is.
    fn input(&mut self, message: &str, default: Option<&str>) -> io::Result<String>;
}

/// Line-based prompts on a terminal.
pub struct TerminalPrompter<R, W> {
    reader: R,
    writer: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr and read answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, message: &str, hint: &str) -> io::Result<String> {
        write!(
            self.writer,
            "{} {} {} ",
            style("?").green().bold(),
            style(message).bold(),
            style(hint).dim()
        )?;
        self.writer.flush()?;

        let mut answer = String::new();
        if self.reader.read_line(&mut answer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }
        Ok(answer.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&mut self, message: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(message, hint)?;
            match parse_confirm(&answer, default) {
                Some(value) => return Ok(value),
                None => writeln!(self.writer, "  {}", style("Please answer y or n").yellow())?,
            }
        }
    }

    fn select(&mut self, message: &str, choices: &[String], default: &str) -> io::Result<String> {
        for (index, choice) in choices.iter().enumerate() {
            writeln!(self.writer, "  {} {choice}", style(format!("{})", index + 1)).cyan())?;
        }
        let hint = format!("({default})");
        loop {
            let answer = self.ask(message, &hint)?;
            match parse_choice(&answer, choices, default) {
                Some(value) => return Ok(value),
                None => writeln!(
                    self.writer,
                    "  {}",
                    style("Pick a listed number or name").yellow()
                )?,
            }
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> io::Result<String> {
        let hint = default.map(|d| format!("({d})")).unwrap_or_default();
        let answer = self.ask(message, &hint)?;
        Ok(match default {
            Some(default) if answer.is_empty() => default.to_string(),
            _ => answer,
        })
    }
}

/// Answers every prompt with its default, for unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> io::Result<bool> {
        tracing::debug!(prompt = message, answer = default, "Using default answer");
        Ok(default)
    }

    fn select(&mut self, message: &str, _choices: &[String], default: &str) -> io::Result<String> {
        tracing::debug!(prompt = message, answer = default, "Using default answer");
        Ok(default.to_string())
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> io::Result<String> {
        tracing::debug!(prompt = message, answer = ?default, "Using default answer");
        Ok(default.unwrap_or_default().to_string())
    }
}

fn parse_confirm(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" | "true" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// A 1-based index or a choice name, case-insensitively.
fn parse_choice(answer: &str, choices: &[String], default: &str) -> Option<String> {
    if answer.is_empty() {
        return Some(default.to_string());
    }
    if let Ok(index) = answer.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| choices.get(i)).cloned();
    }
    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(answer))
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn prompter(input: &str) -> TerminalPrompter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_confirm_uses_default_and_retries() {
        let mut p = prompter("\nmaybe\nn\n");
        assert!(p.confirm("Continue?", true).unwrap());
        assert!(!p.confirm("Continue?", true).unwrap());

        let shown = String::from_utf8_lossy(&p.writer).into_owned();
        assert!(shown.contains("Please answer y or n"));
    }

    #[test]
    fn test_select_by_index_or_name() {
        let choices = vec!["All".to_string(), "None".to_string(), "optimism".to_string()];
        let mut p = prompter("3\nnone\n\n7\nall\n");

        assert_eq!(p.select("Network?", &choices, "All").unwrap(), "optimism");
        assert_eq!(p.select("Network?", &choices, "All").unwrap(), "None");
        assert_eq!(p.select("Network?", &choices, "All").unwrap(), "All");
        // Out of range, then a valid name.
        assert_eq!(p.select("Network?", &choices, "None").unwrap(), "All");
    }

    #[test]
    fn test_input_default() {
        let mut p = prompter("\nacme\n");
        assert_eq!(p.input("Team?", Some("kwenta")).unwrap(), "kwenta");
        assert_eq!(p.input("Team?", Some("kwenta")).unwrap(), "acme");
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut p = prompter("");
        let err = p.input("Access token?", None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
