//! Per-tool states, prompt answers and the run summary.

use std::fmt;

/// Where a tool is in its provisioning workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolState {
    /// Not looked at yet.
    Pending,
    /// Detection is running.
    Checking,
    /// Detection found it; nothing to do.
    AlreadyPresent,
    /// The user declined.
    Skipped,
    /// The adapter reported success.
    Installed,
    /// The adapter reported failure.
    Failed,
}

impl ToolState {
    /// Whether no further action happens for the tool this run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ToolState::AlreadyPresent | ToolState::Skipped | ToolState::Installed | ToolState::Failed
        )
    }

    /// Status text shown after the tool name.
    pub fn status_text(self) -> &'static str {
        match self {
            ToolState::Pending => "pending",
            ToolState::Checking => "checking",
            ToolState::AlreadyPresent => "already installed",
            ToolState::Skipped => "skipped",
            ToolState::Installed => "installed",
            ToolState::Failed => "failed",
        }
    }

    /// Terminal states in summary order.
    pub const TERMINAL: [ToolState; 4] = [
        ToolState::Installed,
        ToolState::AlreadyPresent,
        ToolState::Skipped,
        ToolState::Failed,
    ];
}

impl fmt::Display for ToolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Answer to "install this tool?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallChoice {
    Yes,
    No,
    /// Install this one and every later missing tool without asking.
    All,
}

impl InstallChoice {
    /// Parse a prompt answer. Anything unrecognised is `No`.
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => InstallChoice::Yes,
            "a" | "all" => InstallChoice::All,
            _ => InstallChoice::No,
        }
    }

    /// Value carried by the matching prompt option.
    pub fn value(self) -> &'static str {
        match self {
            InstallChoice::Yes => "yes",
            InstallChoice::No => "no",
            InstallChoice::All => "all",
        }
    }
}

/// Final record for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Name as written in the manifest.
    pub tool_name: String,
    /// Terminal state reached.
    pub state: ToolState,
    /// Failure diagnostic or manual-install guidance.
    pub detail: Option<String>,
}

impl InstallOutcome {
    pub fn new(tool_name: impl Into<String>, state: ToolState) -> Self {
        Self {
            tool_name: tool_name.into(),
            state,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    /// Whether the tool is usable after the run.
    pub fn succeeded(&self) -> bool {
        matches!(self.state, ToolState::AlreadyPresent | ToolState::Installed)
    }
}

/// Advisory printed after every run that got as far as a summary.
pub const RESTART_ADVISORY: &str = "Some tools may require a system restart to work properly.";

/// Outcomes of a whole run, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<InstallOutcome>,
    /// Whether the run ended through the "all" batch.
    pub bulk: bool,
    /// Whether the run was cut short by an interrupt between tools.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn push(&mut self, outcome: InstallOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of tools that ended in `state`.
    pub fn count(&self, state: ToolState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Outcome for a tool, by manifest name.
    pub fn outcome(&self, tool_name: &str) -> Option<&InstallOutcome> {
        self.outcomes.iter().find(|o| o.tool_name == tool_name)
    }

    /// Manifest names of the tools that failed.
    pub fn failed_tools(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.state == ToolState::Failed)
            .map(|o| o.tool_name.as_str())
            .collect()
    }

    /// One line with the count per terminal state.
    pub fn counts_line(&self) -> String {
        ToolState::TERMINAL
            .iter()
            .map(|s| format!("{} {}", self.count(*s), s.status_text()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!ToolState::Pending.is_terminal());
        assert!(!ToolState::Checking.is_terminal());
        for state in ToolState::TERMINAL {
            assert!(state.is_terminal(), "{state}");
        }
    }

    #[test]
    fn choice_parsing_defaults_to_no() {
        assert_eq!(InstallChoice::parse("y"), InstallChoice::Yes);
        assert_eq!(InstallChoice::parse(" YES "), InstallChoice::Yes);
        assert_eq!(InstallChoice::parse("a"), InstallChoice::All);
        assert_eq!(InstallChoice::parse("All"), InstallChoice::All);
        assert_eq!(InstallChoice::parse("n"), InstallChoice::No);
        assert_eq!(InstallChoice::parse("sure"), InstallChoice::No);
        assert_eq!(InstallChoice::parse(""), InstallChoice::No);
    }

    #[test]
    fn choice_value_parses_back() {
        for choice in [InstallChoice::Yes, InstallChoice::No, InstallChoice::All] {
            assert_eq!(InstallChoice::parse(choice.value()), choice);
        }
    }

    #[test]
    fn outcome_success_is_derived() {
        assert!(InstallOutcome::new("ollama", ToolState::Installed).succeeded());
        assert!(InstallOutcome::new("ollama", ToolState::AlreadyPresent).succeeded());
        assert!(!InstallOutcome::new("ollama", ToolState::Skipped).succeeded());
        assert!(!InstallOutcome::new("ollama", ToolState::Failed).succeeded());
    }

    #[test]
    fn summary_counts() {
        let mut summary = RunSummary::default();
        summary.push(InstallOutcome::new("Ollama", ToolState::Installed));
        summary.push(InstallOutcome::new("Docker", ToolState::Failed));
        summary.push(InstallOutcome::new("n8n", ToolState::Failed));
        summary.push(InstallOutcome::new("llama3.2", ToolState::AlreadyPresent));

        assert_eq!(summary.count(ToolState::Failed), 2);
        assert_eq!(summary.failed_tools(), vec!["Docker", "n8n"]);
        assert_eq!(
            summary.counts_line(),
            "1 installed, 1 already installed, 0 skipped, 2 failed"
        );
        assert_eq!(
            summary.outcome("llama3.2").map(|o| o.state),
            Some(ToolState::AlreadyPresent)
        );
    }
}
