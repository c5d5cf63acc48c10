//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses. Spinners it hands out share their
//! recording with the UI, so a test can look at what a spinner saw after
//! the code under test has dropped it.
//!
//! # Example
//!
//! ```
//! use stackup::ui::{MockUI, Prompt, PromptType, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("install_ollama", "yes");
//!
//! ui.message("Checking ollama");
//! let mut spinner = ui.start_spinner("Installing ollama");
//! spinner.set_progress(50.0);
//! spinner.finish_success("ollama installed");
//!
//! assert!(ui.has_message("Checking"));
//! assert_eq!(ui.spinner_records()[0].progress, vec![50.0]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
///
/// Supports both single responses (via `set_prompt_response`) and queued
/// responses (via `queue_prompt_responses`) for keys asked more than once.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    skips: Vec<String>,
    headers: Vec<String>,
    progress: Vec<(usize, usize)>,
    spinners: Vec<Arc<Mutex<SpinnerRecord>>>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
    default_prompt_response: Option<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Queue responses for the same prompt key, returned in order.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Response for any prompt key not explicitly configured.
    pub fn set_default_prompt_response(&mut self, response: &str) {
        self.default_prompt_response = Some(response.to_string());
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn skips(&self) -> &[String] {
        &self.skips
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn progress(&self) -> &[(usize, usize)] {
        &self.progress
    }

    /// Get all prompts that were shown (by key).
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    /// Labels of every spinner started, in order.
    pub fn spinners(&self) -> Vec<String> {
        self.spinners.iter().map(|s| lock(s).label.clone()).collect()
    }

    /// Snapshot of everything each spinner recorded.
    pub fn spinner_records(&self) -> Vec<SpinnerRecord> {
        self.spinners.iter().map(|s| lock(s).clone()).collect()
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_skip(&self, msg: &str) -> bool {
        self.skips.iter().any(|m| m.contains(msg))
    }

    fn response_for(&mut self, key: &str) -> Option<String> {
        if let Some(response) = self.prompt_queues.get_mut(key).and_then(|q| q.pop_front()) {
            return Some(response);
        }
        self.prompt_responses
            .get(key)
            .or(self.default_prompt_response.as_ref())
            .cloned()
    }
}

fn to_result(prompt: &Prompt, response: String) -> PromptResult {
    match prompt.prompt_type {
        PromptType::Select { .. } => PromptResult::String(response),
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn skipped(&mut self, msg: &str) {
        self.skips.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        if let Some(response) = self.response_for(&prompt.key) {
            return Ok(to_result(prompt, response));
        }
        if let Some(default) = &prompt.default {
            return Ok(to_result(prompt, default.clone()));
        }
        Ok(to_result(prompt, String::new()))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let spinner = MockSpinner::labeled(message);
        self.spinners.push(Arc::clone(&spinner.record));
        Box::new(spinner)
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        self.progress.push((current, total));
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    Success,
    Error,
    Skipped,
}

/// Everything a [`MockSpinner`] was told.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpinnerRecord {
    pub label: String,
    pub messages: Vec<String>,
    pub progress: Vec<f64>,
    pub finish_message: Option<String>,
    pub status: Option<SpinnerStatus>,
}

/// Mock spinner that records messages, percentages and the finish.
#[derive(Debug, Default, Clone)]
pub struct MockSpinner {
    record: Arc<Mutex<SpinnerRecord>>,
}

fn lock(record: &Mutex<SpinnerRecord>) -> MutexGuard<'_, SpinnerRecord> {
    record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSpinner {
    pub fn new() -> Self {
        Self::default()
    }

    fn labeled(label: &str) -> Self {
        let spinner = Self::default();
        lock(&spinner.record).label = label.to_string();
        spinner
    }

    /// All messages set during spinning.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.record).messages.clone()
    }

    /// All percentages set during spinning.
    pub fn progress_values(&self) -> Vec<f64> {
        lock(&self.record).progress.clone()
    }

    pub fn finish_message(&self) -> Option<String> {
        lock(&self.record).finish_message.clone()
    }

    pub fn status(&self) -> Option<SpinnerStatus> {
        lock(&self.record).status
    }

    fn finish(&mut self, msg: &str, status: SpinnerStatus) {
        let mut record = lock(&self.record);
        record.finish_message = Some(msg.to_string());
        record.status = Some(status);
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        lock(&self.record).messages.push(msg.to_string());
    }

    fn set_progress(&mut self, percent: f64) {
        lock(&self.record).progress.push(percent);
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Success);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Error);
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Skipped);
    }
}
