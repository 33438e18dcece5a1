pub mod hardware;
pub mod launcher;
pub mod process_checker;
pub mod readiness;
pub mod supervisor;

pub use hardware::{current_network_counters, read_cpu_temperature, HardwareReporter, DEFAULT_THERMAL_DIR};
pub use launcher::{Launcher, ProcessLauncher, SpawnedComponent};
pub use process_checker::{invoking_chain, locate, matches_signature, ProcessTable, SysinfoProcessTable};
pub use readiness::{OutputSource, ReadinessMonitor};
pub use supervisor::{ComponentStatus, Reported, StartOutcome, StartReport, StopOutcome, Supervisor, Timeouts};
