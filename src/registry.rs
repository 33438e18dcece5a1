use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, SupervisorError};
use crate::models::{ComponentDescriptor, DependencyEdge};

pub const RASA_SHELL: &str = "rasa_shell";
pub const RASA_ACTIONS: &str = "rasa_actions";
pub const MAIN: &str = "main";

/// 组件表：启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    components: Vec<ComponentDescriptor>,
    dependency: Option<DependencyEdge>,
}

/// 注册表文件格式
#[derive(Debug, Deserialize)]
struct RegistryFile {
    components: Vec<ComponentDescriptor>,
    #[serde(default)]
    dependency: Option<DependencyEdge>,
}

impl ComponentRegistry {
    pub fn new(
        components: Vec<ComponentDescriptor>,
        dependency: Option<DependencyEdge>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for component in &components {
            if !seen.insert(component.name.as_str()) {
                return Err(SupervisorError::InvalidRegistry(format!(
                    "duplicate component '{}'",
                    component.name
                )));
            }
            if component.command.is_empty() {
                return Err(SupervisorError::EmptyCommand(component.name.clone()));
            }
        }

        if let Some(edge) = &dependency {
            for name in [&edge.dependent, &edge.requires] {
                if !seen.contains(name.as_str()) {
                    return Err(SupervisorError::InvalidRegistry(format!(
                        "dependency refers to unknown component '{}'",
                        name
                    )));
                }
            }
            if edge.dependent == edge.requires {
                return Err(SupervisorError::InvalidRegistry(format!(
                    "'{}' cannot depend on itself",
                    edge.dependent
                )));
            }
        }

        Ok(Self {
            components,
            dependency,
        })
    }

    /// RavenSpeak 的三个组件，rasa_shell 依赖 rasa_actions
    pub fn ravenspeak(workdir: &Path) -> Self {
        Self {
            components: vec![
                ComponentDescriptor::new(RASA_SHELL, &["rasa", "shell"], workdir)
                    .with_readiness_signal("Starting Rasa server on"),
                ComponentDescriptor::new(RASA_ACTIONS, &["rasa", "run", "actions"], workdir)
                    .with_readiness_signal("Action endpoint is up and running"),
                ComponentDescriptor::new(MAIN, &["python3", "main.py"], workdir),
            ],
            dependency: Some(DependencyEdge {
                dependent: RASA_SHELL.to_string(),
                requires: RASA_ACTIONS.to_string(),
            }),
        }
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SupervisorError::InvalidRegistry(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file: RegistryFile = serde_json::from_str(&raw).map_err(|e| {
            SupervisorError::InvalidRegistry(format!("cannot parse {}: {}", path.display(), e))
        })?;

        Self::new(file.components, file.dependency)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    pub fn names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    /// `name` 启动前必须在运行的组件
    pub fn requirement_of(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.dependency
            .as_ref()
            .filter(|edge| edge.dependent == name)
            .and_then(|edge| self.get(&edge.requires))
    }
}
