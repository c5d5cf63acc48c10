//! Per-line heuristics that turn raw installer output into progress.
//!
//! Installer output is unstructured, so each command family gets its own
//! small set of rules:
//!
//! - **Package installs** (pip, npm, winget, brew): an explicit percentage
//!   if the line has one, otherwise a fixed value for the phase keyword.
//! - **Container pulls**: distinct 12-hex layer ids are counted and the
//!   share of finished layers is reported.
//! - **Model pulls**: explicit percentages, plus fixed values for the
//!   manifest, verify and write phases.
//! - **Downloads** (curl, wget, install scripts): explicit percentages only.
//!
//! Independently of family, a line can signal that the command is done.
//! Error keywords win over success keywords, and per-layer lines never
//! count as overall success.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::event::ProgressEvent;

static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid percent regex"));

static LAYER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{12}):").expect("valid layer regex"));

const ERROR_KEYWORDS: &[&str] = &["error", "failed", "not found"];
const SUCCESS_KEYWORDS: &[&str] = &["success", "complete", "finished"];
const LAYER_DONE_MARKERS: &[&str] = &["pull complete", "already exists"];

/// Package-manager phases, most specific first. First match wins.
const PACKAGE_PHASES: &[(&str, f64)] = &[
    ("successfully installed", 100.0),
    ("installing collected", 60.0),
    ("installing", 70.0),
    ("downloading", 25.0),
    ("collecting", 10.0),
];

const MODEL_PHASES: &[(&str, f64)] = &[
    ("writing manifest", 95.0),
    ("verifying", 90.0),
    ("pulling manifest", 5.0),
];

/// Which set of heuristics applies to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFamily {
    /// Native or language package manager install.
    PackageInstall,
    /// `docker run` / `docker pull` / `docker start`.
    ContainerPull,
    /// `ollama pull`.
    ModelPull,
    /// Raw downloads and install scripts.
    Download,
}

impl ProgressFamily {
    /// Pick a family from the command line itself.
    pub fn for_command(command: &str) -> Self {
        let lower = command.to_lowercase();
        if lower.contains("ollama pull") {
            ProgressFamily::ModelPull
        } else if lower.contains("docker run")
            || lower.contains("docker pull")
            || lower.contains("docker start")
        {
            ProgressFamily::ContainerPull
        } else if lower.starts_with("curl ") || lower.starts_with("wget ") {
            ProgressFamily::Download
        } else {
            ProgressFamily::PackageInstall
        }
    }
}

/// Early verdict from a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The command reported overall success.
    Success,
    /// The command reported a failure.
    Failure,
}

/// What one line means.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineOutcome {
    /// Progress to render, if any.
    pub event: Option<ProgressEvent>,
    /// Whether monitoring should stop here.
    pub termination: Option<Termination>,
}

/// Distinct container layers seen and finished.
#[derive(Debug, Default)]
pub struct LayerCounter {
    seen: HashSet<String>,
    done: HashSet<String>,
}

impl LayerCounter {
    /// Record a layer line. Returns `false` if the line isn't one.
    pub fn observe(&mut self, line: &str) -> bool {
        let Some(id) = layer_id(line) else {
            return false;
        };
        let lower = line.to_lowercase();
        self.seen.insert(id.to_string());
        if LAYER_DONE_MARKERS.iter().any(|m| lower.contains(m)) {
            self.done.insert(id.to_string());
        }
        true
    }

    /// Distinct layers seen.
    pub fn total(&self) -> usize {
        self.seen.len()
    }

    /// Distinct layers finished.
    pub fn completed(&self) -> usize {
        self.done.len()
    }

    /// Finished share in percent (0 before any layer is seen).
    pub fn percent(&self) -> f64 {
        if self.seen.is_empty() {
            0.0
        } else {
            self.done.len() as f64 * 100.0 / self.seen.len() as f64
        }
    }
}

/// Stateful classifier for one command's output.
#[derive(Debug)]
pub struct LineClassifier {
    family: ProgressFamily,
    layers: LayerCounter,
}

impl LineClassifier {
    pub fn new(family: ProgressFamily) -> Self {
        Self {
            family,
            layers: LayerCounter::default(),
        }
    }

    pub fn family(&self) -> ProgressFamily {
        self.family
    }

    /// Classify one line of output.
    pub fn classify(&mut self, line: &str) -> LineOutcome {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineOutcome::default();
        }
        let lower = trimmed.to_lowercase();
        let is_layer = layer_id(trimmed).is_some();

        let event = match self.family {
            ProgressFamily::PackageInstall => {
                explicit_percent(trimmed).or_else(|| phase_event(&lower, trimmed, PACKAGE_PHASES))
            }
            ProgressFamily::ContainerPull => {
                if self.layers.observe(trimmed) {
                    Some(ProgressEvent::at(
                        self.layers.percent(),
                        format!(
                            "layers {}/{}",
                            self.layers.completed(),
                            self.layers.total()
                        ),
                    ))
                } else {
                    None
                }
            }
            ProgressFamily::ModelPull => {
                explicit_percent(trimmed).or_else(|| phase_event(&lower, trimmed, MODEL_PHASES))
            }
            ProgressFamily::Download => explicit_percent(trimmed),
        };

        let termination = if ERROR_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Some(Termination::Failure)
        } else if !is_layer && SUCCESS_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Some(Termination::Success)
        } else {
            None
        };

        LineOutcome { event, termination }
    }
}

fn layer_id(line: &str) -> Option<&str> {
    LAYER_REGEX
        .captures(line.trim_start())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn explicit_percent(line: &str) -> Option<ProgressEvent> {
    let caps = PERCENT_REGEX.captures(line)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(ProgressEvent::at(value, shorten(line)))
}

fn phase_event(lower: &str, line: &str, phases: &[(&str, f64)]) -> Option<ProgressEvent> {
    phases
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, percent)| ProgressEvent::at(*percent, shorten(line)))
}

/// Keep spinner messages on one terminal line.
fn shorten(line: &str) -> String {
    const MAX: usize = 60;
    if line.chars().count() <= MAX {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX - 3).collect();
        format!("{}...", cut)
    }
}
