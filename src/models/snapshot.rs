use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 默认快照路径（由独立的采样任务写入）
pub const DEFAULT_SNAPSHOT_PATH: &str = "/tmp/rscontrol_net_stats.json";

/// 单个网卡的累计字节计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub sent: u64,
    pub recv: u64,
}

/// 网卡名 -> 累计计数
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkSnapshot {
    pub interfaces: BTreeMap<String, InterfaceCounters>,
}

impl NetworkSnapshot {
    pub fn new(interfaces: BTreeMap<String, InterfaceCounters>) -> Self {
        Self { interfaces }
    }

    /// 读取快照。文件不存在或内容损坏时返回 None
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("No network snapshot at {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!("Ignoring malformed network snapshot {}: {}", path.display(), e);
                None
            }
        }
    }

    /// 整体覆盖写入：先写临时文件再 rename，读者不会看到写了一半的文件
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)
    }

    /// 计算 current - self，只包含两边都有的网卡
    ///
    /// 计数器被重置（重启、溢出）时差值按 0 处理
    pub fn delta_to(&self, current: &NetworkSnapshot) -> BTreeMap<String, InterfaceCounters> {
        current
            .interfaces
            .iter()
            .filter_map(|(iface, now)| {
                let before = self.interfaces.get(iface)?;
                Some((
                    iface.clone(),
                    InterfaceCounters {
                        sent: now.sent.saturating_sub(before.sent),
                        recv: now.recv.saturating_sub(before.recv),
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn snapshot(entries: &[(&str, u64, u64)]) -> NetworkSnapshot {
        NetworkSnapshot::new(
            entries
                .iter()
                .map(|(name, sent, recv)| (name.to_string(), InterfaceCounters { sent: *sent, recv: *recv }))
                .collect(),
        )
    }

    #[test]
    fn test_delta_against_previous() {
        let previous = snapshot(&[("eth0", 100, 200)]);
        let current = snapshot(&[("eth0", 150, 205)]);

        let delta = previous.delta_to(&current);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["eth0"], InterfaceCounters { sent: 50, recv: 5 });
    }

    #[test]
    fn test_delta_skips_new_interfaces_and_clamps_resets() {
        let previous = snapshot(&[("eth0", 500, 500), ("lo", 10, 10)]);
        let current = snapshot(&[("eth0", 100, 700), ("wlan0", 1, 1)]);

        let delta = previous.delta_to(&current);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["eth0"], InterfaceCounters { sent: 0, recv: 200 });
    }

    #[test]
    fn test_load_reads_snapshot_file_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"eth0": {{"sent": 100, "recv": 200}}, "lo": {{"sent": 1, "recv": 2}}}}"#).unwrap();

        let loaded = NetworkSnapshot::load(file.path()).unwrap();
        assert_eq!(loaded, snapshot(&[("eth0", 100, 200), ("lo", 1, 2)]));
    }

    #[test]
    fn test_save_overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");

        snapshot(&[("eth0", 1, 2), ("wlan0", 3, 4)]).save(&path).unwrap();
        let latest = snapshot(&[("eth0", 10, 20)]);
        latest.save(&path).unwrap();

        assert_eq!(NetworkSnapshot::load(&path), Some(latest));
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["eth0"]["sent"], 10);
        assert_eq!(raw["eth0"]["recv"], 20);
    }

    #[test]
    fn test_load_missing_or_corrupt_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(NetworkSnapshot::load(&dir.path().join("absent.json")).is_none());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, r#"{"eth0": {"sent": 10"#).unwrap();
        assert!(NetworkSnapshot::load(&corrupt).is_none());

        let negative = dir.path().join("negative.json");
        std::fs::write(&negative, r#"{"eth0": {"sent": -1, "recv": 0}}"#).unwrap();
        assert!(NetworkSnapshot::load(&negative).is_none());
    }
}
