use std::io;
use std::process::{Command, Stdio};

use crate::batch::command::BatchCommand;
use crate::error::{PathOpsError, Result};

/// Executes batch commands against the host application.
pub trait HostRunner {
    /// Run `command` to completion. A non-zero exit is a [`PathOpsError::Process`]
    /// carrying the captured error stream.
    fn run(&mut self, command: &BatchCommand) -> Result<()>;
}

/// Runs the host binary as a blocking foreground subprocess.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl HostRunner for ProcessRunner {
    fn run(&mut self, command: &BatchCommand) -> Result<()> {
        tracing::debug!(program = %command.program.display(), args = command.args.len(), "spawning host");

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => PathOpsError::Process(format!(
                    "{}: not found, check [host] binary in config",
                    command.program.display()
                )),
                _ => PathOpsError::Process(format!("{}: {e}", command.program.display())),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(status = %output.status, "host process failed");
        Err(PathOpsError::Process(if stderr.is_empty() {
            format!("{} exited with {}", command.program.display(), output.status)
        } else {
            stderr
        }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn sh(script: &str) -> BatchCommand {
        BatchCommand {
            program: PathBuf::from("sh"),
            args: vec![OsString::from("-c"), OsString::from(script)],
        }
    }

    #[test]
    fn success_is_ok() {
        assert!(ProcessRunner.run(&sh("exit 0")).is_ok());
    }

    #[test]
    fn failure_surfaces_stderr() {
        let err = ProcessRunner.run(&sh("echo 'verb not found' >&2; exit 3")).unwrap_err();
        match err {
            PathOpsError::Process(msg) => assert_eq!(msg, "verb not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn silent_failure_reports_status() {
        let err = ProcessRunner.run(&sh("exit 1")).unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn missing_binary_is_a_process_error() {
        let cmd = BatchCommand {
            program: PathBuf::from("/nonexistent/inkscape"),
            args: Vec::new(),
        };
        let err = ProcessRunner.run(&cmd).unwrap_err();
        assert!(matches!(err, PathOpsError::Process(_)));
    }
}
