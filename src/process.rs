//! External process execution.
//!
//! Every tool the pipeline drives (cmake, cpack, windeployqt, flatpak-builder)
//! is described as a [`Cmd`] and executed through a [`CommandRunner`]. A
//! non-zero exit is always an error; there is no retry and no partial success.

use anyhow::{bail, Context, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Description of a single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Program name followed by arguments, lossily converted for display.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy().into_owned())
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// Executes commands. Implementations must treat non-zero exit as an error.
pub trait CommandRunner {
    fn run(&self, cmd: &Cmd) -> Result<()>;
}

/// Runs commands on the host, inheriting stdio so tool output streams live.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> Result<()> {
        match cmd.cwd() {
            Some(cwd) => tracing::info!("Running: {cmd} (in {})", cwd.display()),
            None => tracing::info!("Running: {cmd}"),
        }

        let status = cmd
            .to_command()
            .status()
            .with_context(|| format!("starting '{cmd}'"))?;

        if !status.success() {
            tracing::error!("'{cmd}' failed with {status}");
            bail!("command '{cmd}' failed with {status}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_includes_program_and_args() {
        let cmd = Cmd::new("cmake")
            .args(["--build", "build"])
            .arg("--config")
            .arg("Release");

        assert_eq!(cmd.argv(), ["cmake", "--build", "build", "--config", "Release"]);
        assert_eq!(cmd.to_string(), "cmake --build build --config Release");
        assert!(cmd.cwd().is_none());
    }

    #[test]
    fn current_dir_is_recorded() {
        let cmd = Cmd::new("cpack").current_dir(Path::new("build"));
        assert_eq!(cmd.cwd(), Some(Path::new("build")));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_success() {
        assert!(SystemRunner.run(&Cmd::new("true")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_non_zero_exit() {
        let err = SystemRunner
            .run(&Cmd::new("sh").args(["-c", "exit 1"]))
            .unwrap_err();
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let err = SystemRunner
            .run(&Cmd::new("definitely_not_a_real_command_12345"))
            .unwrap_err();
        assert!(err.to_string().contains("starting"));
    }
}
