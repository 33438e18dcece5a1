use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 组件描述（启动命令同时作为进程匹配签名）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// 组件名称（唯一标识符）
    pub name: String,
    /// 可执行文件 + 参数
    pub command: Vec<String>,
    /// 工作目录
    pub working_directory: PathBuf,
    /// 就绪信号：输出中出现该子串即认为就绪
    #[serde(default)]
    pub readiness_signal: Option<String>,
}

impl ComponentDescriptor {
    pub fn new(name: &str, command: &[&str], working_directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            working_directory: working_directory.into(),
            readiness_signal: None,
        }
    }

    pub fn with_readiness_signal(mut self, signal: &str) -> Self {
        self.readiness_signal = Some(signal.to_string());
        self
    }

    /// 匹配签名
    pub fn signature(&self) -> &[String] {
        &self.command
    }
}

/// 启动依赖：`dependent` 启动前 `requires` 必须已在运行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub dependent: String,
    pub requires: String,
}

/// 进程表中找到的进程
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedProcess {
    pub pid: u32,
    pub cmdline: Vec<String>,
}
