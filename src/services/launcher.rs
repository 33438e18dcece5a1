use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::error::{Result, SupervisorError};
use crate::models::ComponentDescriptor;
use crate::services::readiness::{MergedOutput, OutputSource};

/// 启动组件进程
pub trait Launcher {
    type Child: OutputSource;

    fn launch(&self, component: &ComponentDescriptor, cwd: &Path) -> Result<Self::Child>;
}

/// 真实子进程启动器：stdout/stderr 通过管道捕获
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

/// 本次调用启动的子进程；drop 时不会杀掉子进程
pub struct SpawnedComponent {
    child: Child,
    output: MergedOutput<ChildStdout, ChildStderr>,
}

impl SpawnedComponent {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

impl Launcher for ProcessLauncher {
    type Child = SpawnedComponent;

    fn launch(&self, component: &ComponentDescriptor, cwd: &Path) -> Result<SpawnedComponent> {
        let (program, args) = component
            .command
            .split_first()
            .ok_or_else(|| SupervisorError::EmptyCommand(component.name.clone()))?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                name: component.name.clone(),
                source,
            })?;

        log::debug!("Spawned {} as PID {:?}", component.name, child.id());

        let output = MergedOutput::new(child.stdout.take(), child.stderr.take());
        Ok(SpawnedComponent { child, output })
    }
}

impl OutputSource for SpawnedComponent {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.output.next_line().await
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}
