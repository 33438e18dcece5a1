use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use rscontrol::models::DEFAULT_SNAPSHOT_PATH;
use rscontrol::services::{Timeouts, DEFAULT_THERMAL_DIR};

/// RSControl - RavenSpeak Supervisor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, disable_help_subcommand = true)]
pub struct CommandArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Working directory of the built-in components (defaults to the current directory)
    #[arg(short = 'w', long, env = "RSCONTROL_WORKDIR", global = true)]
    pub workdir: Option<PathBuf>,

    /// JSON file replacing the built-in component table
    #[arg(long, env = "RSCONTROL_REGISTRY", global = true)]
    pub registry: Option<PathBuf>,

    /// Network snapshot written by rscontrol-net-snapshot
    #[arg(long, env = "RSCONTROL_NET_SNAPSHOT", default_value = DEFAULT_SNAPSHOT_PATH, global = true)]
    pub snapshot: PathBuf,

    /// Directory holding thermal_zone*/temp sensors
    #[arg(long, env = "RSCONTROL_THERMAL_DIR", default_value = DEFAULT_THERMAL_DIR, global = true)]
    pub thermal_dir: PathBuf,

    /// Seconds to wait for a component's readiness signal
    #[arg(long, default_value_t = 60, global = true)]
    pub ready_timeout: u64,

    /// Seconds to wait for a component to exit after SIGTERM
    #[arg(long, default_value_t = 10, global = true)]
    pub stop_timeout: u64,

    /// Start missing dependencies without asking
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the specified RavenSpeak component (or "all")
    Start { target: String },
    /// Stop the specified component (or "all")
    Stop { target: String },
    /// Show running status (use 'hardware' to show system load)
    Status {
        #[arg(default_value = "all")]
        target: String,
    },
    /// Show this help message or help for a command
    Help { topic: Option<String> },
}

impl CommandArgs {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            ready: Duration::from_secs(self.ready_timeout),
            stop: Duration::from_secs(self.stop_timeout),
            ..Timeouts::default()
        }
    }
}

/// 交互式确认是否先启动依赖
pub fn ask_on_terminal(_dependent: &str, requires: &str) -> bool {
    print!("⚠️ '{}' is not running. Start it now? (y/n): ", requires);
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match std::io::stdin().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

pub fn help_text(topic: Option<&str>, components: &[String]) -> String {
    let names = components.join(", ");
    match topic {
        Some("status") => format!(
            "
status [component] - Show status of a specific component
    Valid components: {}, hardware, all
",
            names
        ),
        Some(cmd @ ("start" | "stop")) => format!(
            "
{} [component] - {} a specific component
    Valid components: {}, all
",
            cmd,
            if cmd == "start" { "Start" } else { "Stop" },
            names
        ),
        _ => "
Available commands:
    start [component]    - Start the specified RavenSpeak component
    stop [component]     - Stop the specified component
    status [component]   - Show running status (use 'hardware' to show system load)
    help [command]       - Show this help message or help for a command
"
        .to_string(),
    }
}
