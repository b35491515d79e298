mod linux;
mod macos;
mod windows;

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::exec::{self, CommandError, CommandOutput};
use crate::transport::{Endpoint, DEFAULT_DNS_PORT};

pub use linux::Linux;
pub use macos::MacOs;
pub use windows::Windows;

/// Active resolvers keyed by interface, network service, or config source
pub type DnsStatus = BTreeMap<String, Vec<String>>;

/// Reads and changes the resolvers the operating system uses.
#[async_trait]
pub trait DnsControl: Send + Sync {
	fn name(&self) -> &'static str;

	/// Point the active interfaces at `servers`, in order.
	async fn apply(&self, servers: &[Endpoint], dry_run: bool) -> Result<()>;

	/// Report the resolvers currently configured.
	async fn status(&self) -> Result<DnsStatus>;

	/// Return the active interfaces to DHCP-provided resolvers.
	async fn reset(&self, dry_run: bool) -> Result<()>;
}

/// Pick the implementation for the host operating system.
pub fn host_control() -> Result<Box<dyn DnsControl>> {
	match std::env::consts::OS {
		"linux" => Ok(Box::new(Linux::default())),
		"macos" => Ok(Box::new(MacOs)),
		"windows" => Ok(Box::new(Windows)),
		other => bail!("unsupported platform: {}", other),
	}
}

/// Host part of each endpoint; OS settings have no notion of a port.
fn server_hosts(servers: &[Endpoint]) -> Vec<String> {
	for s in servers.iter().filter(|s| s.port != DEFAULT_DNS_PORT) {
		warn!(endpoint = %s, "port is ignored when configuring system DNS");
	}
	servers.iter().map(|s| s.host.to_string()).collect()
}

/// Run a command, logging any stderr chatter from a successful run.
async fn run_logged(timeout: Duration, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
	let out = exec::run(timeout, program, args).await?;
	if !out.stderr.is_empty() {
		debug!(program, stderr = %out.stderr, "command wrote to stderr");
	}
	Ok(out)
}
