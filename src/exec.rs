use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured, whitespace-trimmed output of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
	pub stdout: String,
	pub stderr: String,
}

#[derive(Debug, Error)]
pub enum CommandError {
	#[error("failed to start {program}: {source}")]
	Spawn {
		program: String,
		source: std::io::Error,
	},

	#[error("{program} did not finish within {} ms", .timeout.as_millis())]
	Timeout { program: String, timeout: Duration },

	#[error("{program} exited with {status}: {stderr}")]
	Failed {
		program: String,
		status: std::process::ExitStatus,
		stderr: String,
	},
}

/// Run an external program and wait at most `timeout` for it to exit.
///
/// A zero timeout means the 10 second default. The child is killed when the
/// deadline passes.
pub async fn run(timeout: Duration, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
	let timeout = if timeout.is_zero() { DEFAULT_TIMEOUT } else { timeout };
	debug!(program, ?args, timeout_ms = timeout.as_millis() as u64, "running command");

	let child = Command::new(program)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn()
		.map_err(|source| CommandError::Spawn {
			program: program.to_string(),
			source,
		})?;

	// Dropping the wait future on timeout drops the child, which kills it
	let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
		Ok(Ok(output)) => output,
		Ok(Err(source)) => {
			return Err(CommandError::Spawn { program: program.to_string(), source });
		}
		Err(_) => {
			return Err(CommandError::Timeout { program: program.to_string(), timeout });
		}
	};

	let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
	if !output.status.success() {
		return Err(CommandError::Failed {
			program: program.to_string(),
			status: output.status,
			stderr,
		});
	}
	Ok(CommandOutput { stdout, stderr })
}

/// Whether `program` can be found on PATH or at one of the usual system
/// locations.
pub fn has_program(program: &str) -> bool {
	let in_path = std::env::var_os("PATH")
		.map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
		.unwrap_or(false);
	in_path || ["/usr/bin", "/bin", "/usr/sbin", "/sbin"]
		.iter()
		.any(|dir| std::path::Path::new(dir).join(program).is_file())
}
