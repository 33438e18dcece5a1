pub mod component;
pub mod hardware;
pub mod snapshot;

pub use component::{ComponentDescriptor, DependencyEdge, LocatedProcess};
pub use hardware::{CpuTemperature, DiskUsage, HardwareReport, InterfaceTraffic, LoadAverage, MemoryUsage};
pub use snapshot::{InterfaceCounters, NetworkSnapshot, DEFAULT_SNAPSHOT_PATH};
