use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

mod cli;

use cli::{ask_on_terminal, help_text, Command, CommandArgs};
use rscontrol::services::{HardwareReporter, ProcessLauncher, Reported, Supervisor, SysinfoProcessTable};
use rscontrol::ComponentRegistry;

const ALL: &str = "all";
const HARDWARE: &str = "hardware";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();

    let registry = match load_registry(&args) {
        Ok(registry) => registry,
        Err(e) => {
            println!("❌ {:#}", e);
            return Ok(());
        }
    };

    let target = match &args.command {
        Command::Help { topic } => {
            print!("{}", help_text(topic.as_deref(), &registry.names()));
            return Ok(());
        }
        Command::Status { target } if target == HARDWARE => {
            let reporter = HardwareReporter::new(&args.thermal_dir, &args.snapshot);
            println!("{}", reporter.report());
            return Ok(());
        }
        Command::Start { target } | Command::Stop { target } | Command::Status { target } => target.clone(),
    };

    let yes = args.yes;
    let mut supervisor = Supervisor::new(
        registry,
        SysinfoProcessTable::new(),
        ProcessLauncher,
        move |dependent: &str, requires: &str| yes || ask_on_terminal(dependent, requires),
    )
    .with_timeouts(args.timeouts());

    match (&args.command, target.as_str()) {
        (Command::Start { .. }, ALL) => {
            for (name, report) in supervisor.start_all().await {
                for line in report.lines(&name) {
                    println!("{}", line);
                }
            }
        }
        (Command::Start { .. }, name) => {
            for line in supervisor.start(name).await.lines(name) {
                println!("{}", line);
            }
        }
        (Command::Stop { .. }, ALL) => {
            for (name, result) in supervisor.stop_all().await {
                println!("{}", Reported::new(&name, &result));
            }
        }
        (Command::Stop { .. }, name) => {
            let result = supervisor.stop(name).await;
            println!("{}", Reported::new(name, &result));
        }
        (_, ALL) => {
            for (name, result) in supervisor.status_all() {
                println!("{}", Reported::new(&name, &result));
            }
        }
        (_, name) => {
            let result = supervisor.status(name);
            println!("{}", Reported::new(name, &result));
        }
    }

    Ok(())
}

fn load_registry(args: &CommandArgs) -> anyhow::Result<ComponentRegistry> {
    if let Some(path) = &args.registry {
        log::debug!("Loading component registry from {}", path.display());
        return ComponentRegistry::from_file(path)
            .with_context(|| format!("Failed to load registry {}", path.display()));
    }

    let workdir = match &args.workdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    Ok(ComponentRegistry::ravenspeak(&workdir))
}
