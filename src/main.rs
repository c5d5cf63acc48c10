//! Stackup CLI entry point.

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use signal_hook::consts::SIGINT;
use stackup::cli::{Cli, CommandDispatcher};
use stackup::config::load_config;
use stackup::shell::{is_ci, ShellRunner};
use stackup::ui::{create_ui, NonInteractiveUI, OutputMode, UserInterface};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("stackup=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stackup=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Route Ctrl-C into `flag` so a running install can be stopped without
/// killing stackup. A second Ctrl-C before the first is handled exits.
fn install_interrupt_handler(flag: &Arc<AtomicBool>) {
    let conditional = signal_hook::flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(flag));
    let set = signal_hook::flag::register(SIGINT, Arc::clone(flag));
    if let Err(e) = conditional.and(set) {
        tracing::warn!("Could not install interrupt handler: {}", e);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Stackup starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let project_root = cli
        .project
        .as_ref()
        .cloned()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let config = match load_config(&project_root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            NonInteractiveUI::new(output_mode).error(&format!("Error: {}", e));
            return ExitCode::from(1);
        }
    };

    let is_interactive = !cli.non_interactive && !is_ci();
    let mut ui = create_ui(is_interactive, output_mode, config.settings.tick_interval());

    let interrupt = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(&interrupt);

    let runner = ShellRunner::new();
    let dispatcher = CommandDispatcher::new(project_root, config, &runner, &interrupt);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
