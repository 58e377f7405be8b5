//! Backend abstraction for image builds and cloud provisioning.
//!
//! Each resource kind talks to its own trait so real CLIs and the
//! in-process [`simulated::Simulated`] backend can be mixed freely.

pub mod aws;
pub mod docker;
pub mod simulated;

use crate::error::{Error, Result};
use crate::types::{BuildRequest, ImageRef, RoleHandle, RoleRequest, RuntimeHandle, RuntimeRequest};
use std::io::Write;
use std::process::{Command, Stdio};

/// Builds container images from a local context.
pub trait ImageBuilder: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Build the image described by `request`.
    fn build(&self, request: &BuildRequest) -> Result<ImageRef>;
}

/// Creates execution roles.
pub trait IdentityBackend: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Create a role and attach its inline policy.
    fn create_role(&self, request: &RoleRequest) -> Result<RoleHandle>;
}

/// Creates agent runtimes.
pub trait RuntimeBackend: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Create a runtime.
    fn create_runtime(&self, request: &RuntimeRequest) -> Result<RuntimeHandle>;
}

/// Run `program` with `args`, returning stdout on success.
pub(crate) fn run_checked(program: &str, args: &[String], action: &str) -> Result<String> {
    log::debug!("running {program} {}", args.join(" "));

    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::CommandNotFound(program.to_string())
        } else {
            Error::CommandFailed {
                message: format!("failed to execute {program}: {e}"),
                stderr: String::new(),
            }
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::from_command_output(program, action, &stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run `program` with `input` written to its stdin.
///
/// Used for secrets that must not appear in the argument list.
pub(crate) fn run_with_stdin(
    program: &str,
    args: &[String],
    input: &str,
    action: &str,
) -> Result<String> {
    log::debug!("running {program} {} (stdin)", args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::CommandNotFound(program.to_string())
            } else {
                Error::CommandFailed {
                    message: format!("failed to execute {program}: {e}"),
                    stderr: String::new(),
                }
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }
    let output = child.wait_with_output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::from_command_output(program, action, &stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Whether `program --version` runs.
pub(crate) fn is_installed(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_checked_missing_program() {
        let err = run_checked("voicestack-definitely-not-installed", &[], "probe").unwrap_err();
        assert!(matches!(err, Error::CommandNotFound(p) if p == "voicestack-definitely-not-installed"));
    }

    #[test]
    fn test_run_with_stdin_missing_program() {
        let err = run_with_stdin("voicestack-definitely-not-installed", &[], "secret", "login")
            .unwrap_err();
        assert!(matches!(err, Error::CommandNotFound(_)));
    }

    #[test]
    fn test_is_installed_missing_program() {
        assert!(!is_installed("voicestack-definitely-not-installed"));
    }
}
