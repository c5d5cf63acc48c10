//! End-to-end provisioning runs through the public API.
//!
//! A checklist is parsed, every command is answered by a `ScriptedRunner`
//! and every prompt by a `MockUI`.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use stackup::manifest::parse_manifest;
use stackup::progress::MonitorSettings;
use stackup::provision::{ProvisionOptions, Provisioner, ToolState};
use stackup::shell::{Platform, ScriptedLine, ScriptedRunner};
use stackup::tools::{CommandTable, WarningTable};
use stackup::ui::{MockUI, SpinnerStatus};

const CHECKLIST: &str = "\
# AI workstation

## Runtimes
- **Ollama** (Framework) - local model server
- **Docker** (Framework)

## Models
- **gemma3** (LLM)

## Libraries
- **python-dotenv** (Python Library)
";

fn provisioner<'a>(runner: &'a ScriptedRunner, flag: &'a AtomicBool) -> Provisioner<'a> {
    Provisioner::new(runner, flag)
        .with_commands(CommandTable::for_platform(Platform::Linux))
        .with_warnings(WarningTable::none())
        .with_monitor(MonitorSettings {
            heartbeat: Duration::from_secs(3600),
            poll: Duration::ZERO,
            grace: Duration::ZERO,
        })
}

fn line(text: &str) -> ScriptedLine {
    ScriptedLine::Line(text.to_string())
}

#[test]
fn mixed_checklist_reaches_a_terminal_state_for_every_tool() {
    let tools = parse_manifest(CHECKLIST);
    assert_eq!(tools.len(), 4);

    let runner = ScriptedRunner::new();
    runner.respond("ollama --version", true, "ollama version 0.5.7");
    runner.respond("docker --version", false, "");
    runner.respond("ollama list", true, "NAME  ID  SIZE  MODIFIED");
    runner.respond_stream(
        "ollama pull gemma2",
        true,
        vec![
            line("pulling manifest"),
            line("pulling ff1d1fc78170...  42% 2.3 GB/5.4 GB"),
            line("verifying sha256 digest"),
            line("writing manifest"),
            line("success"),
        ],
    );
    runner.respond("python3 -c", false, "ModuleNotFoundError");
    runner.respond("python3 -m pip install python-dotenv", true, "Successfully installed python-dotenv-1.0.1");

    let flag = AtomicBool::new(false);
    let mut ui = MockUI::new();
    ui.set_prompt_response("install_docker", "n");
    ui.set_prompt_response("install_gemma2", "y");
    ui.set_prompt_response("install_python-dotenv", "yes");

    let summary = provisioner(&runner, &flag)
        .run(&tools, ProvisionOptions::default(), &mut ui)
        .unwrap();

    let states: Vec<ToolState> = summary.outcomes.iter().map(|o| o.state).collect();
    assert_eq!(
        states,
        vec![
            ToolState::AlreadyPresent,
            ToolState::Skipped,
            ToolState::Installed,
            ToolState::Installed,
        ]
    );
    assert!(states.iter().all(|s| s.is_terminal()));
    assert!(!runner.was_issued("curl -fsSL https://get.docker.com"));
    assert!(ui.has_message("Summary: 2 installed, 1 already installed, 1 skipped, 0 failed"));

    let model = ui
        .spinner_records()
        .into_iter()
        .find(|s| s.label.contains("gemma3"))
        .unwrap();
    assert_eq!(model.status, Some(SpinnerStatus::Success));
    assert!(model.progress.contains(&42.0));
    assert_eq!(model.progress.last().copied(), Some(100.0));
}

#[test]
fn all_answer_installs_the_rest_without_prompting() {
    let tools = parse_manifest("- **Docker** (Framework)\n- **llama3.2** (LLM)\n- **phi3** (LLM)\n");

    let runner = ScriptedRunner::new();
    runner.respond("docker --version", false, "");
    runner.respond("curl -fsSL https://get.docker.com", true, "");
    runner.respond("ollama list", true, "NAME\nphi3:latest  4f2222927938  2.2 GB  now");
    runner.respond("ollama pull llama3.2", true, "success");

    let flag = AtomicBool::new(false);
    let mut ui = MockUI::new();
    ui.set_prompt_response("install_docker", "a");

    let summary = provisioner(&runner, &flag)
        .run(&tools, ProvisionOptions::default(), &mut ui)
        .unwrap();

    assert_eq!(ui.prompts_shown(), &["install_docker"]);
    assert_eq!(summary.count(ToolState::Installed), 2);
    assert_eq!(summary.count(ToolState::AlreadyPresent), 1);
    assert_eq!(runner.count_issued("ollama pull"), 1);
    assert!(!runner.was_issued("ollama pull phi3"));
}

#[test]
fn container_pull_reports_layer_progress() {
    let tools = parse_manifest("- **Open WebUI** (Interface)\n");

    let runner = ScriptedRunner::new();
    runner.respond("docker ps --filter name=open-webui", true, "CONTAINER ID   IMAGE");
    runner.respond_stream(
        "docker run -d -p 3000:8080",
        true,
        vec![
            line("Unable to find image 'ghcr.io/open-webui/open-webui:main' locally"),
            line("a1b2c3d4e5f6: Pulling fs layer"),
            line("b2c3d4e5f6a7: Pulling fs layer"),
            line("a1b2c3d4e5f6: Pull complete"),
            line("b2c3d4e5f6a7: Pull complete"),
            line("4f1c2d3e4b5a6978"),
        ],
    );

    let flag = AtomicBool::new(false);
    let mut ui = MockUI::new();

    let summary = provisioner(&runner, &flag)
        .run(&tools, ProvisionOptions { assume_all: true }, &mut ui)
        .unwrap();

    assert_eq!(summary.outcomes[0].state, ToolState::Installed);
    let spinner = &ui.spinner_records()[0];
    assert!(spinner.progress.contains(&50.0));
    assert!(spinner.progress.contains(&100.0));
}

#[test]
fn failed_model_pull_is_reported_in_summary() {
    let tools = parse_manifest("- **mistral** (LLM)\n");

    let runner = ScriptedRunner::new();
    runner.respond("ollama list", true, "NAME");
    runner.respond_stream(
        "ollama pull mistral",
        false,
        vec![
            line("pulling manifest"),
            line("Error: pull model manifest: file does not exist"),
        ],
    );

    let flag = AtomicBool::new(false);
    let mut ui = MockUI::new();

    let summary = provisioner(&runner, &flag)
        .run(&tools, ProvisionOptions { assume_all: true }, &mut ui)
        .unwrap();

    assert_eq!(summary.failed_tools(), vec!["mistral"]);
    assert!(ui.has_error("Failed: mistral"));
    assert!(runner.terminated().iter().any(|c| c.starts_with("ollama pull")));
    assert_eq!(
        ui.spinner_records()[0].status,
        Some(SpinnerStatus::Error)
    );
}
