use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::snapshot::InterfaceCounters;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 字节 -> MB（整除）
pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / BYTES_PER_MB
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct MemoryUsage {
    /// 已用内存 (MB)
    pub used_mb: u64,
    /// 总内存 (MB)
    pub total_mb: u64,
    /// 使用率 (百分比，0-100，一位小数)
    pub percent: f64,
}

impl MemoryUsage {
    pub fn from_bytes(used: u64, total: u64) -> Self {
        let percent = if total > 0 {
            (used as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            used_mb: bytes_to_mb(used),
            total_mb: bytes_to_mb(total),
            percent,
        }
    }
}

/// 根分区使用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct DiskUsage {
    pub used_mb: u64,
    pub total_mb: u64,
}

impl DiskUsage {
    /// statvfs 块计数换算：已用 = 总块数 - 空闲块数（含 root 保留块）
    pub fn from_blocks(blocks: u64, blocks_free: u64, fragment_size: u64) -> Self {
        let total = blocks.saturating_mul(fragment_size);
        let used = blocks.saturating_sub(blocks_free).saturating_mul(fragment_size);
        Self {
            used_mb: bytes_to_mb(used),
            total_mb: bytes_to_mb(total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CpuTemperature {
    Celsius(f64),
    Unavailable,
}

impl CpuTemperature {
    /// thermal_zone 的 temp 文件单位是毫摄氏度
    pub fn from_millidegrees(milli: i64) -> Self {
        CpuTemperature::Celsius((milli as f64 / 100.0).round() / 10.0)
    }
}

impl fmt::Display for CpuTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuTemperature::Celsius(c) => write!(f, "{:.1}°C", c),
            CpuTemperature::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// 网卡累计流量 (MB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct InterfaceTraffic {
    pub sent_mb: u64,
    pub recv_mb: u64,
}

impl From<InterfaceCounters> for InterfaceTraffic {
    fn from(counters: InterfaceCounters) -> Self {
        Self {
            sent_mb: bytes_to_mb(counters.sent),
            recv_mb: bytes_to_mb(counters.recv),
        }
    }
}

/// 主机状态报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HardwareReport {
    pub load: LoadAverage,
    pub memory: MemoryUsage,
    /// 找不到根分区时为 None
    pub disk: Option<DiskUsage>,
    pub cpu_temperature: CpuTemperature,
    /// 当前累计流量
    pub interfaces: BTreeMap<String, InterfaceTraffic>,
    /// 相对上次快照的增量（字节）；没有有效快照时为 None
    pub delta: Option<BTreeMap<String, InterfaceCounters>>,
}

impl fmt::Display for HardwareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "📊 Hardware Status:")?;
        writeln!(
            f,
            "CPU Load (1/5/15 min): {:.2}, {:.2}, {:.2}",
            self.load.one, self.load.five, self.load.fifteen
        )?;
        writeln!(
            f,
            "Memory: {:.1}% used ({} MB / {} MB)",
            self.memory.percent, self.memory.used_mb, self.memory.total_mb
        )?;
        match &self.disk {
            Some(disk) => writeln!(
                f,
                "Disk: {} GB used of {} GB",
                disk.used_mb / 1024,
                disk.total_mb / 1024
            )?,
            None => writeln!(f, "Disk: Unavailable")?,
        }
        writeln!(f, "CPU Temp: {}", self.cpu_temperature)?;

        writeln!(f)?;
        writeln!(f, "📶 Network Interfaces:")?;
        for (iface, traffic) in &self.interfaces {
            match self.delta.as_ref().and_then(|d| d.get(iface)) {
                Some(delta) => writeln!(
                    f,
                    "  {}: ↑ {} MB (last hour), ↓ {} MB (last hour)",
                    iface,
                    bytes_to_mb(delta.sent),
                    bytes_to_mb(delta.recv)
                )?,
                None => writeln!(
                    f,
                    "  {}: sent {} MB, received {} MB",
                    iface, traffic.sent_mb, traffic.recv_mb
                )?,
            }
        }
        Ok(())
    }
}
