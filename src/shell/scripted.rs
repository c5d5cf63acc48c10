//! Scripted command runner for testing.
//!
//! `ScriptedRunner` implements [`CommandRunner`] without spawning anything.
//! Responses are matched by exact command first, then by the longest
//! registered prefix; unmatched commands fail as if the binary were missing.
//! Every issued command is recorded for later assertion.
//!
//! # Example
//!
//! ```
//! use stackup::shell::{CommandRunner, ScriptedRunner};
//!
//! let runner = ScriptedRunner::new();
//! runner.respond("ollama --version", true, "ollama version 0.5.7");
//!
//! assert!(runner.run("ollama --version").success);
//! assert!(!runner.run("docker --version").success);
//! assert_eq!(runner.issued().len(), 2);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use super::command::{CommandResult, CommandRunner, OutputStream, StreamEvent};

/// One item of scripted streaming output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedLine {
    /// A line of output.
    Line(String),
    /// A poll that times out with nothing to read.
    Idle,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    success: bool,
    spawn_error: bool,
    output: Vec<ScriptedLine>,
}

/// Command runner that replays configured responses.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    issued: RefCell<Vec<String>>,
    terminated: Rc<RefCell<Vec<String>>>,
}

impl ScriptedRunner {
    /// Create a runner with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response: the exit status and newline-separated output.
    pub fn respond(&self, pattern: &str, success: bool, output: &str) {
        let lines = output
            .lines()
            .map(|l| ScriptedLine::Line(l.to_string()))
            .collect();
        self.respond_stream(pattern, success, lines);
    }

    /// Script a streaming response with explicit idle polls.
    pub fn respond_stream(&self, pattern: &str, success: bool, output: Vec<ScriptedLine>) {
        let mut rules = self.rules.borrow_mut();
        rules.retain(|r| r.pattern != pattern);
        rules.push(Rule {
            pattern: pattern.to_string(),
            success,
            spawn_error: false,
            output,
        });
    }

    /// Script a command that cannot be started at all.
    pub fn fail_to_spawn(&self, pattern: &str) {
        let mut rules = self.rules.borrow_mut();
        rules.retain(|r| r.pattern != pattern);
        rules.push(Rule {
            pattern: pattern.to_string(),
            success: false,
            spawn_error: true,
            output: Vec::new(),
        });
    }

    /// All commands issued so far, in order.
    pub fn issued(&self) -> Vec<String> {
        self.issued.borrow().clone()
    }

    /// Number of issued commands starting with `prefix`.
    pub fn count_issued(&self, prefix: &str) -> usize {
        self.issued
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether any issued command starts with `prefix`.
    pub fn was_issued(&self, prefix: &str) -> bool {
        self.count_issued(prefix) > 0
    }

    /// Commands whose streams were terminated before finishing.
    pub fn terminated(&self) -> Vec<String> {
        self.terminated.borrow().clone()
    }

    fn lookup(&self, command: &str) -> Option<Rule> {
        let rules = self.rules.borrow();
        if let Some(rule) = rules.iter().find(|r| r.pattern == command) {
            return Some(rule.clone());
        }
        rules
            .iter()
            .filter(|r| command.starts_with(&r.pattern))
            .max_by_key(|r| r.pattern.len())
            .cloned()
    }

    fn record(&self, command: &str) -> Option<Rule> {
        self.issued.borrow_mut().push(command.to_string());
        self.lookup(command)
    }
}

fn result_for(command: &str, rule: &Rule) -> CommandResult {
    if rule.spawn_error {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure");
        return CommandResult::spawn_failure(command, &err);
    }

    let stdout: String = rule
        .output
        .iter()
        .filter_map(|l| match l {
            ScriptedLine::Line(s) => Some(format!("{}\n", s)),
            ScriptedLine::Idle => None,
        })
        .collect();

    if rule.success {
        CommandResult::success(stdout, String::new(), Duration::ZERO)
    } else {
        CommandResult::failure(Some(1), stdout, String::new(), Duration::ZERO)
    }
}

fn not_scripted(command: &str) -> CommandResult {
    CommandResult::failure(
        Some(127),
        String::new(),
        format!("{}: command not found", command),
        Duration::ZERO,
    )
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> CommandResult {
        match self.record(command) {
            Some(rule) => result_for(command, &rule),
            None => not_scripted(command),
        }
    }

    fn run_streaming(&self, command: &str) -> Box<dyn OutputStream> {
        let (pending, result) = match self.record(command) {
            Some(rule) => (rule.output.iter().cloned().collect(), result_for(command, &rule)),
            None => (VecDeque::new(), not_scripted(command)),
        };
        Box::new(ScriptedStream {
            command: command.to_string(),
            pending,
            result,
            terminated: false,
            log: Rc::clone(&self.terminated),
        })
    }
}

/// Stream replaying scripted lines.
struct ScriptedStream {
    command: String,
    pending: VecDeque<ScriptedLine>,
    result: CommandResult,
    terminated: bool,
    log: Rc<RefCell<Vec<String>>>,
}

impl OutputStream for ScriptedStream {
    fn next_event(&mut self, _timeout: Duration) -> StreamEvent {
        if self.terminated {
            return StreamEvent::Closed;
        }
        match self.pending.pop_front() {
            Some(ScriptedLine::Line(line)) => StreamEvent::Line(line),
            Some(ScriptedLine::Idle) => StreamEvent::Idle,
            None => StreamEvent::Closed,
        }
    }

    fn terminate(&mut self) {
        if !self.terminated {
            self.terminated = true;
            self.log.borrow_mut().push(self.command.clone());
        }
    }

    fn finish(self: Box<Self>) -> CommandResult {
        if self.terminated {
            let mut result = self.result;
            result.success = false;
            result.exit_code = None;
            return result;
        }
        self.result
    }
}
