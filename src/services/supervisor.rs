use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{self, Instant};

use crate::error::{Result, SupervisorError};
use crate::models::ComponentDescriptor;
use crate::registry::ComponentRegistry;
use crate::services::launcher::Launcher;
use crate::services::process_checker::ProcessTable;
use crate::services::readiness::{OutputSource, ReadinessMonitor, DEFAULT_IDLE_BACKOFF, DEFAULT_READY_TIMEOUT};

/// 各阶段的等待时间
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// 等待就绪信号
    pub ready: Duration,
    /// 读输出的单次等待
    pub idle_backoff: Duration,
    /// 就绪后在进程表中确认 PID
    pub verify: Duration,
    /// 发送 SIGTERM 后等待退出
    pub stop: Duration,
    /// 依赖启动后再检查前的等待
    pub settle: Duration,
    /// verify/stop 的轮询间隔
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ready: DEFAULT_READY_TIMEOUT,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            verify: Duration::from_secs(60),
            stop: Duration::from_secs(10),
            settle: Duration::from_secs(2),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Running { pid: u32 },
    AlreadyRunning { pid: u32 },
    /// 已就绪但进程表中找不到
    Unverified,
    /// 超时或进程提前退出；子进程保持运行
    NotReady,
    DependencyDeclined { requires: String },
    DependencyFailed { requires: String, reason: String },
}

/// 一次 start 的完整结果：自动启动的依赖（如有）和目标组件本身
#[derive(Debug)]
pub struct StartReport {
    pub dependency: Option<(String, Result<StartOutcome>)>,
    pub outcome: Result<StartOutcome>,
}

impl StartReport {
    fn only(outcome: Result<StartOutcome>) -> Self {
        Self {
            dependency: None,
            outcome,
        }
    }

    /// 按发生顺序输出状态行，依赖在前
    pub fn lines(&self, name: &str) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some((requires, result)) = &self.dependency {
            lines.push(Reported::new(requires, result).to_string());
        }
        lines.push(Reported::new(name, &self.outcome).to_string());
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { pid: u32 },
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentStatus {
    Running { pid: u32 },
    NotRunning,
}

/// 单个组件的操作结果，Display 输出给操作员看的状态行
pub struct Reported<'a, T> {
    pub name: &'a str,
    pub result: &'a Result<T>,
}

impl<'a, T> Reported<'a, T> {
    pub fn new(name: &'a str, result: &'a Result<T>) -> Self {
        Self { name, result }
    }
}

impl fmt::Display for Reported<'_, StartOutcome> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name;
        match self.result {
            Ok(StartOutcome::Running { pid }) => write!(f, "✅ {} is now running (PID {})", name, pid),
            Ok(StartOutcome::AlreadyRunning { pid }) => {
                write!(f, "✅ {} is already running (PID {})", name, pid)
            }
            Ok(StartOutcome::Unverified) => {
                write!(f, "⚠️ {} may have started, but could not verify PID.", name)
            }
            Ok(StartOutcome::NotReady) => write!(
                f,
                "❌ {} failed to signal ready state within timeout; {} failed to start correctly.",
                name, name
            ),
            Ok(StartOutcome::DependencyDeclined { requires }) => write!(
                f,
                "❌ Cannot start '{}' without '{}' running.",
                name, requires
            ),
            Ok(StartOutcome::DependencyFailed { requires, reason }) => write!(
                f,
                "❌ {} failed to start ({}). Aborting {} startup.",
                requires, reason, name
            ),
            Err(e) => write!(f, "❌ Failed to start {}: {}", name, e),
        }
    }
}

impl fmt::Display for Reported<'_, StopOutcome> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Ok(StopOutcome::Stopped { pid }) => write!(f, "🛑 Stopped {} (PID {})", self.name, pid),
            Ok(StopOutcome::NotRunning) => write!(f, "⚠️ {} is not running", self.name),
            Err(e) => write!(f, "❌ Error stopping {}: {}", self.name, e),
        }
    }
}

impl fmt::Display for Reported<'_, ComponentStatus> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Ok(ComponentStatus::Running { pid }) => {
                write!(f, "✅ {} is running (PID {})", self.name, pid)
            }
            Ok(ComponentStatus::NotRunning) => write!(f, "❌ {} is not running", self.name),
            Err(e) => write!(f, "❌ {}", e),
        }
    }
}

/// 生命周期控制器
///
/// 不保存任何跨调用的进程句柄，"是否在运行" 每次都从进程表重新判断。
/// `confirm(dependent, requires)` 决定是否自动启动缺失的依赖
pub struct Supervisor<T, L, P> {
    registry: ComponentRegistry,
    table: T,
    launcher: L,
    confirm: P,
    timeouts: Timeouts,
}

impl<T, L, P> Supervisor<T, L, P>
where
    T: ProcessTable,
    L: Launcher,
    P: FnMut(&str, &str) -> bool,
{
    pub fn new(registry: ComponentRegistry, table: T, launcher: L, confirm: P) -> Self {
        Self {
            registry,
            table,
            launcher,
            confirm,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    fn component(&self, name: &str) -> Result<&ComponentDescriptor> {
        self.registry
            .get(name)
            .ok_or_else(|| SupervisorError::UnknownComponent(name.to_string()))
    }

    pub async fn start(&mut self, name: &str) -> StartReport {
        let component = match self.component(name) {
            Ok(component) => component.clone(),
            Err(e) => return StartReport::only(Err(e)),
        };

        if let Some(process) = self.table.find(component.signature()) {
            return StartReport::only(Ok(StartOutcome::AlreadyRunning { pid: process.pid }));
        }

        // 依赖的子进程句柄保留到本次 start 结束，输出管道在目标启动期间保持打开
        let mut dependency_child: Option<L::Child> = None;
        let mut dependency = None;

        if let Some(requires) = self.registry.requirement_of(name).cloned() {
            if self.table.find(requires.signature()).is_none() {
                log::warn!("⚠️ '{}' is not running", requires.name);
                if !(self.confirm)(name, &requires.name) {
                    return StartReport::only(Ok(StartOutcome::DependencyDeclined {
                        requires: requires.name,
                    }));
                }

                let result = match self.launch(&requires).await {
                    Ok((outcome, child)) => {
                        dependency_child = Some(child);
                        Ok(outcome)
                    }
                    Err(e) => Err(e),
                };

                time::sleep(self.timeouts.settle).await;
                if self.table.find(requires.signature()).is_none() {
                    let reason = match &result {
                        Err(e) => e.to_string(),
                        Ok(StartOutcome::NotReady) => "no readiness signal within timeout".to_string(),
                        Ok(_) => "not visible in the process table".to_string(),
                    };
                    return StartReport {
                        dependency: Some((requires.name.clone(), result)),
                        outcome: Ok(StartOutcome::DependencyFailed {
                            requires: requires.name,
                            reason,
                        }),
                    };
                }
                dependency = Some((requires.name, result));
            }
        }

        let outcome = self.launch(&component).await.map(|(outcome, _child)| outcome);
        drop(dependency_child);
        StartReport { dependency, outcome }
    }

    /// 启动单个组件，不检查依赖；子进程句柄交还给调用方
    async fn launch(&self, component: &ComponentDescriptor) -> Result<(StartOutcome, L::Child)> {
        let cwd = resolve_working_directory(&component.working_directory)?;

        log::info!("⏳ Starting {}...", component.name);
        let mut child = self.launcher.launch(component, &cwd)?;

        if let Some(signal) = &component.readiness_signal {
            let monitor = ReadinessMonitor {
                timeout: self.timeouts.ready,
                idle_backoff: self.timeouts.idle_backoff,
            };
            if !monitor.await_ready(&mut child, signal).await {
                return Ok((StartOutcome::NotReady, child));
            }
        }

        let outcome = match self.verify(component, &mut child).await {
            Some(pid) => StartOutcome::Running { pid },
            None => StartOutcome::Unverified,
        };
        Ok((outcome, child))
    }

    /// 在进程表中确认进程可见，子进程退出后不再等待
    async fn verify<C: OutputSource>(&self, component: &ComponentDescriptor, child: &mut C) -> Option<u32> {
        let deadline = Instant::now() + self.timeouts.verify;
        loop {
            if let Some(process) = self.table.find(component.signature()) {
                return Some(process.pid);
            }
            if child.has_exited() || Instant::now() >= deadline {
                return None;
            }
            time::sleep(self.timeouts.poll_interval).await;
        }
    }

    pub async fn stop(&self, name: &str) -> Result<StopOutcome> {
        let component = self.component(name)?;
        let Some(process) = self.table.find(component.signature()) else {
            return Ok(StopOutcome::NotRunning);
        };

        log::info!("Sending SIGTERM to {} (PID {})", name, process.pid);
        self.table.terminate(process.pid)?;

        let deadline = Instant::now() + self.timeouts.stop;
        while self.table.is_alive(process.pid) {
            if Instant::now() >= deadline {
                return Err(SupervisorError::StopTimeout {
                    pid: process.pid,
                    timeout_secs: self.timeouts.stop.as_secs(),
                });
            }
            time::sleep(self.timeouts.poll_interval).await;
        }

        Ok(StopOutcome::Stopped { pid: process.pid })
    }

    pub fn status(&self, name: &str) -> Result<ComponentStatus> {
        let component = self.component(name)?;
        Ok(match self.table.find(component.signature()) {
            Some(process) => ComponentStatus::Running { pid: process.pid },
            None => ComponentStatus::NotRunning,
        })
    }

    /// 按注册顺序逐个启动，单个失败不影响其余组件
    pub async fn start_all(&mut self) -> Vec<(String, StartReport)> {
        let mut results = Vec::new();
        for name in self.registry.names() {
            let report = self.start(&name).await;
            results.push((name, report));
        }
        results
    }

    pub async fn stop_all(&self) -> Vec<(String, Result<StopOutcome>)> {
        let mut results = Vec::new();
        for name in self.registry.names() {
            let result = self.stop(&name).await;
            results.push((name, result));
        }
        results
    }

    pub fn status_all(&self) -> Vec<(String, Result<ComponentStatus>)> {
        self.registry
            .names()
            .into_iter()
            .map(|name| {
                let result = self.status(&name);
                (name, result)
            })
            .collect()
    }
}

fn resolve_working_directory(dir: &Path) -> Result<PathBuf> {
    let full = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    if !full.is_dir() {
        return Err(SupervisorError::MissingWorkingDirectory(full));
    }
    Ok(full)
}
