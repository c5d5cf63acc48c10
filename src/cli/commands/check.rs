//! Check command implementation.
//!
//! The `stackup check` command runs detection for every tool and prints
//! what is present and what is missing. It never prompts or installs.

use crate::error::Result;
use crate::provision::Provisioner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, Workspace};

/// The check command implementation.
pub struct CheckCommand<'a> {
    workspace: Workspace<'a>,
}

impl<'a> CheckCommand<'a> {
    pub fn new(workspace: Workspace<'a>) -> Self {
        Self { workspace }
    }
}

impl Command for CheckCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let tools = self.workspace.requirements()?;
        let provisioner = Provisioner::from_config(
            self.workspace.config,
            self.workspace.runner,
            self.workspace.interrupt,
        )?;

        ui.show_header("AI Development Environment Check");
        if tools.is_empty() {
            ui.warning("No tools found to check!");
            return Ok(CommandResult::success());
        }

        provisioner.check(&tools, ui);
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::AtomicBool;

    use crate::config::{StackupConfig, ToolEntry};
    use crate::shell::{Platform, ScriptedRunner};
    use crate::ui::MockUI;
    use tempfile::TempDir;

    #[test]
    fn reports_each_tool_without_installing() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Installation_Checklist_Prompt.md"),
            "- **Ollama** (Framework)\n- **llama3.2** (LLM)\n",
        )
        .unwrap();
        let mut config = StackupConfig::default();
        config.settings.platform = Some(Platform::Linux);
        let runner = ScriptedRunner::new();
        runner.respond("ollama --version", true, "ollama version 0.5.7");
        runner.respond("ollama list", true, "NAME\nphi3:latest  1  2 GB");
        let flag = AtomicBool::new(false);
        let mut ui = MockUI::new();

        let cmd = CheckCommand::new(Workspace {
            project_root: temp.path(),
            manifest: None,
            config: &config,
            runner: &runner,
            interrupt: &flag,
        });
        assert!(cmd.execute(&mut ui).unwrap().success);

        assert!(ui.has_success("Ollama installed"));
        assert!(ui.has_skip("llama3.2 missing"));
        assert!(ui.prompts_shown().is_empty());
        assert!(!runner.was_issued("ollama pull"));
    }

    #[test]
    fn config_tools_checked_without_manifest() {
        let temp = TempDir::new().unwrap();
        let mut config = StackupConfig::default();
        config.settings.platform = Some(Platform::Linux);
        config.tools = vec![ToolEntry {
            name: "Docker".into(),
            tool_type: "Framework".into(),
        }];
        let runner = ScriptedRunner::new();
        runner.respond("docker --version", true, "Docker version 27.0.3");
        let flag = AtomicBool::new(false);
        let mut ui = MockUI::new();

        let cmd = CheckCommand::new(Workspace {
            project_root: temp.path(),
            manifest: None,
            config: &config,
            runner: &runner,
            interrupt: &flag,
        });
        cmd.execute(&mut ui).unwrap();
        assert!(ui.has_success("Docker installed"));
    }
}
