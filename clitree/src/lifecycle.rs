//! PreRun → Run → PostRun executor.

use std::fmt;

use crate::command::{Command, CommandContext, Hook};
use crate::{CliResult, Error};

/// A hook slot in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreRun,
    Run,
    PostRun,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::PreRun, Phase::Run, Phase::PostRun];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PreRun => "preRun",
            Phase::Run => "run",
            Phase::PostRun => "postRun",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running(Phase),
    Done,
    Failed(Phase),
}

/// Runs the hooks of one command, at most once each.
///
/// Absent hooks are skipped. The first failing hook moves the executor to
/// [`LifecycleState::Failed`] and no later hook runs.
pub struct Lifecycle<'c> {
    hooks: [Option<&'c dyn Hook>; 3],
    state: LifecycleState,
}

impl<'c> Lifecycle<'c> {
    pub fn new(
        pre_run: Option<&'c dyn Hook>,
        run: Option<&'c dyn Hook>,
        post_run: Option<&'c dyn Hook>,
    ) -> Self {
        Self {
            hooks: [pre_run, run, post_run],
            state: LifecycleState::Idle,
        }
    }

    pub fn for_command(command: &'c Command) -> Self {
        Self {
            hooks: command.hooks(),
            state: LifecycleState::Idle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run from `Idle` to `Done`, or stop at the first failure.
    ///
    /// A second call on a finished executor runs nothing and returns `Ok`.
    pub fn run(&mut self, cmd: &CommandContext<'_>, args: &[String]) -> CliResult<()> {
        if self.state != LifecycleState::Idle {
            return Ok(());
        }
        for (phase, hook) in Phase::ALL.into_iter().zip(self.hooks) {
            let Some(hook) = hook else {
                continue;
            };
            self.state = LifecycleState::Running(phase);
            tracing::debug!(command = cmd.name(), %phase, "running hook");
            if let Err(source) = hook.invoke(cmd, args) {
                tracing::debug!(command = cmd.name(), %phase, "hook failed");
                self.state = LifecycleState::Failed(phase);
                return Err(Error::Lifecycle { phase, source });
            }
        }
        self.state = LifecycleState::Done;
        Ok(())
    }
}

impl fmt::Debug for Lifecycle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("pre_run", &self.hooks[0].is_some())
            .field("run", &self.hooks[1].is_some())
            .field("post_run", &self.hooks[2].is_some())
            .field("state", &self.state)
            .finish()
    }
}
