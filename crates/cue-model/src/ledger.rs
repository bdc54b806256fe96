//! Loading, validating, and stamping cue ledgers.
//!
//! A ledger is written in two phases. During scene construction only cue
//! lines are appended. After the render finishes, the header naming the
//! video and voice is prepended ("stamped"). The voiceover pipeline then
//! requires the stamped form: header on line 1, cues after it.

use std::path::{Path, PathBuf};

use crate::cue::{is_header_line, Cue, LedgerHeader};

/// Errors raised while reading or writing a ledger file.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid ledger {path} at line {line}: {message}")]
    FormatError {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl LedgerError {
    /// 1-based line number of a format error, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::FormatError { line, .. } => Some(*line),
            Self::IoError { .. } => None,
        }
    }
}

/// A stamped ledger loaded into memory.
#[derive(Debug, Clone)]
pub struct LoadedLedger {
    /// Filesystem path the ledger was read from.
    pub path: PathBuf,

    /// Target video and voice.
    pub header: LedgerHeader,

    /// Cues in file order.
    pub cues: Vec<Cue>,

    /// 1-based source line of each cue, parallel to `cues`.
    lines: Vec<usize>,
}

/// Cue lines of a ledger that may or may not have been stamped yet.
#[derive(Debug, Clone)]
pub struct LedgerContents {
    pub header: Option<LedgerHeader>,
    pub cues: Vec<Cue>,
    lines: Vec<usize>,
}

impl LoadedLedger {
    /// Load a stamped ledger. The first non-blank line must be the header.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let content = read_ledger_file(&path)?;
        Self::parse(path, &content)
    }

    /// Parse stamped ledger content read from `path`.
    pub fn parse(path: PathBuf, content: &str) -> Result<Self, LedgerError> {
        let mut numbered = numbered_lines(content);

        let (header_line, header_raw) = numbered.next().ok_or_else(|| LedgerError::FormatError {
            path: path.clone(),
            line: 1,
            message: "ledger is empty; expected a header line".to_string(),
        })?;
        let header = parse_header(&path, header_line, header_raw)?;

        let (cues, lines) = parse_cue_lines(&path, numbered)?;
        Ok(Self {
            path,
            header,
            cues,
            lines,
        })
    }

    /// Check ledger invariants and return a description of every violation.
    pub fn validate(&self) -> Vec<String> {
        validate_cues(&self.cues, &self.lines)
    }

    /// Fail with the first invariant violation, if any.
    pub fn ensure_valid(&self) -> Result<(), LedgerError> {
        first_violation(&self.path, &self.cues, &self.lines)
    }

    /// Start time of the last cue, or zero for an empty ledger.
    pub fn last_start_secs(&self) -> f64 {
        self.cues.last().map(|c| c.start_time).unwrap_or(0.0)
    }
}

impl LedgerContents {
    /// Read a ledger whether or not it carries a header yet.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let content = read_ledger_file(&path)?;
        let mut numbered = numbered_lines(&content).peekable();

        let header = match numbered.peek() {
            Some((line, raw)) if is_header_line(raw) => {
                let header = parse_header(&path, *line, raw)?;
                numbered.next();
                Some(header)
            }
            _ => None,
        };

        let (cues, lines) = parse_cue_lines(&path, numbered)?;
        Ok(Self {
            header,
            cues,
            lines,
        })
    }

    /// Check ledger invariants and return a description of every violation.
    pub fn validate(&self) -> Vec<String> {
        validate_cues(&self.cues, &self.lines)
    }
}

/// Prepend `header` to the ledger at `path`, replacing an existing header.
///
/// The file is rewritten through a sibling temporary file and renamed into
/// place, so a crash never leaves a half-written ledger behind.
pub fn stamp_header(path: impl AsRef<Path>, header: &LedgerHeader) -> Result<(), LedgerError> {
    let path = path.as_ref();
    let content = read_ledger_file(path)?;

    let mut body = String::with_capacity(content.len());
    let mut seen_first = false;
    for raw in content.lines() {
        if raw.trim().is_empty() {
            continue;
        }
        if !seen_first {
            seen_first = true;
            if is_header_line(raw) {
                continue;
            }
        }
        body.push_str(raw.trim_end());
        body.push('\n');
    }

    let header_json = serde_json::to_string(header).map_err(|e| LedgerError::FormatError {
        path: path.to_path_buf(),
        line: 1,
        message: format!("failed to serialize header: {e}"),
    })?;

    let tmp_path = path.with_extension("jsonl.tmp");
    std::fs::write(&tmp_path, format!("{header_json}\n{body}")).map_err(|e| {
        LedgerError::IoError {
            path: tmp_path.clone(),
            source: e,
        }
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| LedgerError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

fn read_ledger_file(path: &Path) -> Result<String, LedgerError> {
    std::fs::read_to_string(path).map_err(|e| LedgerError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn numbered_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn parse_header(path: &Path, line: usize, raw: &str) -> Result<LedgerHeader, LedgerError> {
    let format_error = |message: String| LedgerError::FormatError {
        path: path.to_path_buf(),
        line,
        message,
    };

    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| format_error(format!("header is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(format_error("header must be a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| format_error(format!("invalid header: {e}")))
}

fn parse_cue_lines<'a>(
    path: &Path,
    numbered: impl Iterator<Item = (usize, &'a str)>,
) -> Result<(Vec<Cue>, Vec<usize>), LedgerError> {
    let mut cues = Vec::new();
    let mut lines = Vec::new();
    for (line, raw) in numbered {
        let cue: Cue = serde_json::from_str(raw).map_err(|e| LedgerError::FormatError {
            path: path.to_path_buf(),
            line,
            message: format!("invalid cue: {e}"),
        })?;
        cues.push(cue);
        lines.push(line);
    }
    Ok((cues, lines))
}

fn cue_violations(cues: &[Cue], lines: &[usize]) -> Vec<(usize, String)> {
    let mut violations = Vec::new();
    let mut previous_start: Option<f64> = None;

    for (index, (cue, &line)) in cues.iter().zip(lines).enumerate() {
        let expected_id = index as u32 + 1;
        if cue.id != expected_id {
            violations.push((
                line,
                format!("cue id {} out of sequence (expected {expected_id})", cue.id),
            ));
        }
        if cue.text.trim().is_empty() {
            violations.push((line, format!("cue {} has empty text", cue.id)));
        }
        if !cue.start_time.is_finite() || cue.start_time < 0.0 {
            violations.push((
                line,
                format!("cue {} has invalid start_time {}", cue.id, cue.start_time),
            ));
        }
        if let Some(prev) = previous_start {
            if cue.start_time < prev {
                violations.push((
                    line,
                    format!(
                        "cue {} starts at {:.3}s, before the previous cue at {:.3}s",
                        cue.id, cue.start_time, prev
                    ),
                ));
            }
        }
        previous_start = Some(cue.start_time);
    }

    violations
}

fn validate_cues(cues: &[Cue], lines: &[usize]) -> Vec<String> {
    cue_violations(cues, lines)
        .into_iter()
        .map(|(line, message)| format!("line {line}: {message}"))
        .collect()
}

fn first_violation(path: &Path, cues: &[Cue], lines: &[usize]) -> Result<(), LedgerError> {
    match cue_violations(cues, lines).into_iter().next() {
        Some((line, message)) => Err(LedgerError::FormatError {
            path: path.to_path_buf(),
            line,
            message,
        }),
        None => Ok(()),
    }
}
