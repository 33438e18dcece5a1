use std::collections::{HashMap, HashSet};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System, UpdateKind};

use crate::error::{Result, SupervisorError};
use crate::models::LocatedProcess;

/// 进程表抽象，供生命周期控制器查询和发信号
pub trait ProcessTable {
    /// 按命令签名查找进程
    fn find(&self, signature: &[String]) -> Option<LocatedProcess>;

    /// 发送终止信号 (SIGTERM)
    fn terminate(&self, pid: u32) -> Result<()>;

    /// 进程是否仍存活（僵尸进程视为已退出）
    fn is_alive(&self, pid: u32) -> bool;
}

/// 判断命令行是否包含签名的所有片段
///
/// 每个片段只需是任意一个参数的子串，片段之间没有顺序要求
pub fn matches_signature(cmdline: &[String], signature: &[String]) -> bool {
    !signature.is_empty()
        && signature
            .iter()
            .all(|fragment| cmdline.iter().any(|arg| arg.contains(fragment.as_str())))
}

/// 在进程列表中查找第一个匹配项（调用方负责保证遍历顺序确定）
pub fn locate<I>(processes: I, signature: &[String]) -> Option<LocatedProcess>
where
    I: IntoIterator<Item = LocatedProcess>,
{
    processes
        .into_iter()
        .find(|process| matches_signature(&process.cmdline, signature))
}

/// 当前进程及其所有祖先（sh -c、sudo、cron 等调用者）
///
/// `parents` 为 PID -> 父 PID；遇到环或缺失的父进程即停止
pub fn invoking_chain(parents: &HashMap<u32, Option<u32>>, self_pid: u32) -> HashSet<u32> {
    let mut chain = HashSet::new();
    let mut current = Some(self_pid);
    while let Some(pid) = current {
        if !chain.insert(pid) {
            break;
        }
        current = parents.get(&pid).copied().flatten();
    }
    chain
}

/// 基于 sysinfo 的真实进程表
pub struct SysinfoProcessTable {
    self_pid: u32,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self {
            self_pid: std::process::id(),
        }
    }

    /// 列出可读取命令行的进程，按 PID 升序
    ///
    /// 读不到命令行的进程（已退出、无权限）被跳过；
    /// 线程以及当前进程和它的祖先不参与匹配
    fn snapshot(&self) -> Vec<LocatedProcess> {
        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
        );

        let parents: HashMap<u32, Option<u32>> = sys
            .processes()
            .iter()
            .map(|(pid, process)| (pid.as_u32(), process.parent().map(|p| p.as_u32())))
            .collect();
        let excluded = invoking_chain(&parents, self.self_pid);

        let mut processes: Vec<LocatedProcess> = sys
            .processes()
            .iter()
            .filter(|(pid, process)| {
                !excluded.contains(&pid.as_u32()) && process.thread_kind().is_none()
            })
            .filter_map(|(pid, process)| {
                let cmdline: Vec<String> = process
                    .cmd()
                    .iter()
                    .map(|s| s.to_string_lossy().into_owned())
                    .collect();

                if cmdline.is_empty() {
                    log::debug!("Skipping PID {}: command line unavailable", pid);
                    return None;
                }

                Some(LocatedProcess {
                    pid: pid.as_u32(),
                    cmdline,
                })
            })
            .collect();

        processes.sort_by_key(|p| p.pid);
        processes
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn find(&self, signature: &[String]) -> Option<LocatedProcess> {
        let found = locate(self.snapshot(), signature);
        if let Some(process) = &found {
            log::debug!("Found PID {} for {:?}: {}", process.pid, signature, process.cmdline.join(" "));
        }
        found
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        let sysinfo_pid = Pid::from_u32(pid);
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[sysinfo_pid]), true);

        let process = sys.process(sysinfo_pid).ok_or_else(|| SupervisorError::Signal {
            pid,
            reason: "process no longer exists".to_string(),
        })?;

        match process.kill_with(Signal::Term) {
            Some(true) => Ok(()),
            Some(false) => Err(SupervisorError::Signal {
                pid,
                reason: "termination request was refused".to_string(),
            }),
            None => Err(SupervisorError::Signal {
                pid,
                reason: "SIGTERM is not supported on this platform".to_string(),
            }),
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        let sysinfo_pid = Pid::from_u32(pid);
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[sysinfo_pid]), true);

        sys.process(sysinfo_pid)
            .map(|p| p.status() != ProcessStatus::Zombie)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pid: u32, cmdline: &[&str]) -> LocatedProcess {
        LocatedProcess {
            pid,
            cmdline: cmdline.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sig(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn synthetic_table() -> Vec<LocatedProcess> {
        vec![
            entry(10, &["/usr/lib/systemd/systemd", "--user"]),
            entry(42, &["/home/pi/venv/bin/python3", "/home/pi/venv/bin/rasa", "run", "actions"]),
            entry(77, &["python3", "main.py"]),
        ]
    }

    #[test]
    fn test_no_match_returns_none() {
        assert_eq!(locate(synthetic_table(), &sig(&["rasa", "shell"])), None);
        assert_eq!(locate(Vec::new(), &sig(&["python3", "main.py"])), None);
    }

    #[test]
    fn test_single_match_returned() {
        let found = locate(synthetic_table(), &sig(&["rasa", "run", "actions"])).unwrap();
        assert_eq!(found.pid, 42);

        let found = locate(synthetic_table(), &sig(&["python3", "main.py"])).unwrap();
        assert_eq!(found.pid, 77);
    }

    #[test]
    fn test_fragments_match_any_argument_in_any_order() {
        let cmdline = sig(&["/opt/bin/rasa", "run", "actions", "--port", "5055"]);
        assert!(matches_signature(&cmdline, &sig(&["actions", "rasa", "run"])));
        assert!(matches_signature(&cmdline, &sig(&["505"])));
        assert!(!matches_signature(&cmdline, &sig(&["rasa", "shell"])));
    }

    #[test]
    fn test_empty_signature_never_matches() {
        assert!(!matches_signature(&sig(&["anything"]), &[]));
        assert_eq!(locate(synthetic_table(), &[]), None);
    }

    #[test]
    fn test_first_match_wins() {
        let table = vec![entry(5, &["rasa", "shell"]), entry(9, &["rasa", "shell", "--debug"])];
        assert_eq!(locate(table, &sig(&["rasa", "shell"])).unwrap().pid, 5);
    }

    #[test]
    fn test_invoking_chain_walks_to_root() {
        let parents: HashMap<u32, Option<u32>> = [
            (1, None),
            (100, Some(1)),
            (200, Some(100)),
            (300, Some(200)),
            (400, Some(100)),
        ]
        .into_iter()
        .collect();

        let chain = invoking_chain(&parents, 300);
        assert_eq!(chain, HashSet::from([300, 200, 100, 1]));
        assert!(!chain.contains(&400));

        let cyclic: HashMap<u32, Option<u32>> = [(5, Some(6)), (6, Some(5))].into_iter().collect();
        assert_eq!(invoking_chain(&cyclic, 5), HashSet::from([5, 6]));

        assert_eq!(invoking_chain(&HashMap::new(), 9), HashSet::from([9]));
    }

    #[test]
    fn test_live_table_finds_spawned_process() {
        let marker = format!("{}", 900_000 + std::process::id() % 90_000);
        let mut child = std::process::Command::new("sleep").arg(&marker).spawn().unwrap();

        let table = SysinfoProcessTable::new();
        let signature = sig(&["sleep", &marker]);
        let mut found = None;
        for _ in 0..50 {
            found = table.find(&signature);
            if found.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        child.kill().unwrap();
        child.wait().unwrap();

        let found = found.expect("spawned sleep should be visible");
        assert_eq!(found.pid, child.id());
        assert_eq!(found.cmdline, signature);
    }

    #[test]
    fn test_live_table_skips_invoking_processes() {
        let table = SysinfoProcessTable::new();
        let own_cmdline: Vec<String> = std::env::args().collect();
        assert!(!own_cmdline.is_empty());

        let found = table.find(&own_cmdline);
        assert!(found.map(|p| p.pid != std::process::id()).unwrap_or(true));

        let snapshot = table.snapshot();
        assert!(!snapshot.is_empty());
        assert!(snapshot.iter().all(|p| p.pid != std::process::id()));
        let parent = std::os::unix::process::parent_id();
        assert!(snapshot.iter().all(|p| p.pid != parent));
    }
}
