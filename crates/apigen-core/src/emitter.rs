use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use similar::TextDiff;

use crate::error::EmitError;
use crate::ledger::{ChecksumLedger, digest};

/// What happened to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitDecision {
    Written,
    Overwritten,
    Skipped(SkipReason),
    PromptedAndDeclined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Protected,
    Unchanged,
}

impl fmt::Display for EmitDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitDecision::Written => write!(f, "written"),
            EmitDecision::Overwritten => write!(f, "overwritten"),
            EmitDecision::Skipped(SkipReason::Protected) => write!(f, "skipped (protected)"),
            EmitDecision::Skipped(SkipReason::Unchanged) => write!(f, "skipped (unchanged)"),
            EmitDecision::PromptedAndDeclined => write!(f, "kept (declined)"),
        }
    }
}

/// How to treat a file that exists on disk but has no ledger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntrackedPolicy {
    /// Adopt it when identical to the new output, otherwise ask.
    #[default]
    Prompt,
    /// Replace it without asking.
    Overwrite,
}

/// Asked before replacing a file whose contents were changed outside the
/// generator.
pub trait OverwritePrompt {
    /// `diff` is a unified diff from the file on disk to the new output.
    fn confirm(&mut self, path: &Path, diff: &str) -> Result<bool, EmitError>;
}

/// Never overwrites an edited file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecline;

impl OverwritePrompt for AlwaysDecline {
    fn confirm(&mut self, _path: &Path, _diff: &str) -> Result<bool, EmitError> {
        Ok(false)
    }
}

/// Overwrites every edited file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAccept;

impl OverwritePrompt for AlwaysAccept {
    fn confirm(&mut self, _path: &Path, _diff: &str) -> Result<bool, EmitError> {
        Ok(true)
    }
}

/// Paths that are never written. A pattern matches when it is a substring
/// of the path, or failing that, when it matches as a regex.
#[derive(Debug, Clone, Default)]
pub struct ProtectedPaths {
    patterns: Vec<(String, Option<Regex>)>,
}

impl ProtectedPaths {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                let regex = match Regex::new(p) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        log::warn!("protected pattern `{p}` is not a valid regex, matching literally: {err}");
                        None
                    }
                };
                (p.to_string(), regex)
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|(literal, regex)| {
            path.contains(literal.as_str()) || regex.as_ref().is_some_and(|r| r.is_match(path))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmitterOptions {
    pub force: bool,
    pub protected: ProtectedPaths,
    pub untracked: UntrackedPolicy,
}

/// Counts of [`EmitDecision`]s over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub overwritten: usize,
    pub unchanged: usize,
    pub protected: usize,
    pub declined: usize,
}

impl RunSummary {
    /// Files whose bytes changed on disk.
    pub fn changed(&self) -> usize {
        self.written + self.overwritten
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} overwritten, {} unchanged, {} protected, {} declined",
            self.written, self.overwritten, self.unchanged, self.protected, self.declined
        )
    }
}

/// Writes rendered files, consulting the checksum ledger so that files a
/// user edited are not replaced without consent.
pub struct Emitter {
    ledger: ChecksumLedger,
    options: EmitterOptions,
    prompt: Box<dyn OverwritePrompt>,
    decisions: Vec<(PathBuf, EmitDecision)>,
    /// Ledger keys of every path emitted so far in this run.
    emitted: HashSet<String>,
}

impl Emitter {
    pub fn new(
        ledger: ChecksumLedger,
        options: EmitterOptions,
        prompt: Box<dyn OverwritePrompt>,
    ) -> Self {
        Self {
            ledger,
            options,
            prompt,
            decisions: Vec::new(),
            emitted: HashSet::new(),
        }
    }

    pub fn ledger(&self) -> &ChecksumLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> ChecksumLedger {
        self.ledger
    }

    /// Drop ledger entries for paths this run did not emit. Returns how
    /// many were removed.
    pub fn prune_ledger(&mut self) -> usize {
        let emitted = &self.emitted;
        self.ledger.retain(|key| emitted.contains(key))
    }

    pub fn decisions(&self) -> &[(PathBuf, EmitDecision)] {
        &self.decisions
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for (_, decision) in &self.decisions {
            match decision {
                EmitDecision::Written => summary.written += 1,
                EmitDecision::Overwritten => summary.overwritten += 1,
                EmitDecision::Skipped(SkipReason::Unchanged) => summary.unchanged += 1,
                EmitDecision::Skipped(SkipReason::Protected) => summary.protected += 1,
                EmitDecision::PromptedAndDeclined => summary.declined += 1,
            }
        }
        summary
    }

    /// Write `rendered` to `path` unless that would destroy user edits.
    ///
    /// Emitting the same path twice in one run is an error: the second
    /// write would silently replace the first.
    pub fn emit(&mut self, rendered: &str, path: &Path) -> Result<EmitDecision, EmitError> {
        if !self.emitted.insert(ledger_key(path)) {
            return Err(EmitError::DuplicateOutput {
                path: path.to_path_buf(),
            });
        }
        let decision = self.decide_and_write(rendered, path)?;
        log::debug!("{}: {decision}", path.display());
        self.decisions.push((path.to_path_buf(), decision));
        Ok(decision)
    }

    fn decide_and_write(&mut self, rendered: &str, path: &Path) -> Result<EmitDecision, EmitError> {
        let key = ledger_key(path);

        if self.options.protected.matches(&key) {
            return Ok(EmitDecision::Skipped(SkipReason::Protected));
        }

        let exists = path.exists();
        if self.options.force || !exists {
            self.write(rendered, path, &key)?;
            return Ok(if exists {
                EmitDecision::Overwritten
            } else {
                EmitDecision::Written
            });
        }

        let new = digest(rendered.as_bytes());
        let current = read_existing(path)?;

        let Some(old) = self.ledger.get(&key) else {
            return match self.options.untracked {
                UntrackedPolicy::Overwrite => {
                    self.write(rendered, path, &key)?;
                    Ok(EmitDecision::Overwritten)
                }
                UntrackedPolicy::Prompt if current == rendered.as_bytes() => {
                    self.ledger.insert(key, new);
                    Ok(EmitDecision::Skipped(SkipReason::Unchanged))
                }
                UntrackedPolicy::Prompt => self.ask(rendered, path, &key, &current),
            };
        };

        if new == old {
            return Ok(EmitDecision::Skipped(SkipReason::Unchanged));
        }
        if digest(&current) == old {
            self.write(rendered, path, &key)?;
            return Ok(EmitDecision::Overwritten);
        }
        self.ask(rendered, path, &key, &current)
    }

    fn ask(
        &mut self,
        rendered: &str,
        path: &Path,
        key: &str,
        current: &[u8],
    ) -> Result<EmitDecision, EmitError> {
        let current = String::from_utf8_lossy(current);
        let diff = TextDiff::from_lines(&*current, rendered)
            .unified_diff()
            .context_radius(3)
            .header(&format!("{key} (current)"), &format!("{key} (generated)"))
            .to_string();
        if self.prompt.confirm(path, &diff)? {
            self.write(rendered, path, key)?;
            Ok(EmitDecision::Overwritten)
        } else {
            Ok(EmitDecision::PromptedAndDeclined)
        }
    }

    fn write(&mut self, rendered: &str, path: &Path, key: &str) -> Result<(), EmitError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EmitError::io(parent, e))?;
        }
        fs::write(path, rendered).map_err(|e| EmitError::io(path, e))?;
        self.ledger.insert(key, digest(rendered.as_bytes()));
        Ok(())
    }
}

/// Ledger key for an output path, with `/` separators on every platform.
pub fn ledger_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn read_existing(path: &Path) -> Result<Vec<u8>, EmitError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(EmitError::io(path, err)),
    }
}
