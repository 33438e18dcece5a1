use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use nix::sys::statvfs::statvfs;
use sysinfo::{Networks, System};

use crate::models::{
    CpuTemperature, DiskUsage, HardwareReport, InterfaceCounters, InterfaceTraffic, LoadAverage,
    MemoryUsage, NetworkSnapshot,
};

pub const DEFAULT_THERMAL_DIR: &str = "/sys/class/thermal";

/// 主机状态采集（只读，不写快照文件）
pub struct HardwareReporter {
    thermal_dir: PathBuf,
    snapshot_path: PathBuf,
}

impl HardwareReporter {
    pub fn new(thermal_dir: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            thermal_dir: thermal_dir.into(),
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn report(&self) -> HardwareReport {
        let mut sys = System::new();
        sys.refresh_memory();

        let load = System::load_average();
        let current = current_network_counters();
        let delta = NetworkSnapshot::load(&self.snapshot_path).map(|previous| previous.delta_to(&current));

        HardwareReport {
            load: LoadAverage {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            },
            memory: MemoryUsage::from_bytes(sys.used_memory(), sys.total_memory()),
            disk: root_disk_usage(),
            cpu_temperature: read_cpu_temperature(&self.thermal_dir),
            interfaces: current
                .interfaces
                .into_iter()
                .map(|(iface, counters)| (iface, InterfaceTraffic::from(counters)))
                .collect(),
            delta,
        }
    }
}

/// 当前各网卡累计收发字节数
pub fn current_network_counters() -> NetworkSnapshot {
    let networks = Networks::new_with_refreshed_list();
    let interfaces: BTreeMap<String, InterfaceCounters> = networks
        .iter()
        .map(|(iface, data)| {
            (
                iface.clone(),
                InterfaceCounters {
                    sent: data.total_transmitted(),
                    recv: data.total_received(),
                },
            )
        })
        .collect();

    NetworkSnapshot::new(interfaces)
}

/// 根分区用量，与 `df /` 的 Used 一致（保留块计入已用）
fn root_disk_usage() -> Option<DiskUsage> {
    match statvfs(Path::new("/")) {
        Ok(stat) => Some(DiskUsage::from_blocks(
            stat.blocks() as u64,
            stat.blocks_free() as u64,
            stat.fragment_size() as u64,
        )),
        Err(e) => {
            log::debug!("statvfs(/) failed: {}", e);
            None
        }
    }
}

/// 读取第一个可用的 thermal_zone*/temp（按名称排序）
///
/// 没有可读传感器时返回 Unavailable，不会报错
pub fn read_cpu_temperature(thermal_dir: &Path) -> CpuTemperature {
    let entries = match std::fs::read_dir(thermal_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot list {}: {}", thermal_dir.display(), e);
            return CpuTemperature::Unavailable;
        }
    };

    let mut zones: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("thermal_zone"))
        .map(|entry| entry.path().join("temp"))
        .collect();
    zones.sort();

    for zone in zones {
        let reading = std::fs::read_to_string(&zone)
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        match reading {
            Some(milli) => return CpuTemperature::from_millidegrees(milli),
            None => log::debug!("Skipping unreadable sensor {}", zone.display()),
        }
    }

    CpuTemperature::Unavailable
}
