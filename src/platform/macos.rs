use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{run_logged, server_hosts, DnsControl, DnsStatus};
use crate::transport::Endpoint;

const NO_SERVERS: &str = "There aren't any DNS Servers set";

/// networksetup across every enabled network service
#[derive(Debug, Default, Clone, Copy)]
pub struct MacOs;

/// Service names from `networksetup -listallnetworkservices`.
///
/// Skips the explanatory first line and disabled services, which are
/// prefixed with an asterisk.
pub(super) fn parse_network_services(output: &str) -> Vec<String> {
	output.lines()
		.map(str::trim)
		.filter(|l| !l.is_empty() && !l.starts_with("An asterisk") && !l.starts_with('*'))
		.map(String::from)
		.collect()
}

/// Servers from `networksetup -getdnsservers <service>`.
pub(super) fn parse_dns_servers(output: &str) -> Vec<String> {
	if output.contains(NO_SERVERS) {
		return Vec::new();
	}
	output.lines()
		.map(str::trim)
		.filter(|l| !l.is_empty())
		.map(String::from)
		.collect()
}

async fn list_services() -> Result<Vec<String>> {
	let out = run_logged(Duration::from_secs(5), "networksetup", &["-listallnetworkservices"])
		.await
		.context("failed to list network services")?;
	let services = parse_network_services(&out.stdout);
	if services.is_empty() {
		bail!("no network services found");
	}
	Ok(services)
}

async fn set_servers(service: &str, values: &[&str]) -> bool {
	let mut args = vec!["-setdnsservers", service];
	args.extend_from_slice(values);
	match run_logged(Duration::from_secs(8), "networksetup", &args).await {
		Ok(_) => true,
		Err(e) => {
			warn!(service, error = %e, "networksetup failed");
			false
		}
	}
}

async fn flush_cache() {
	info!("flushing DNS cache");
	if let Err(e) = run_logged(Duration::from_secs(5), "dscacheutil", &["-flushcache"]).await {
		warn!(error = %e, "dscacheutil failed");
	}
	if let Err(e) = run_logged(Duration::from_secs(5), "killall", &["-HUP", "mDNSResponder"]).await {
		warn!(error = %e, "could not signal mDNSResponder");
	}
}

#[async_trait]
impl DnsControl for MacOs {
	fn name(&self) -> &'static str {
		"macos"
	}

	async fn apply(&self, servers: &[Endpoint], dry_run: bool) -> Result<()> {
		let hosts = server_hosts(servers);
		let hosts: Vec<&str> = hosts.iter().map(String::as_str).collect();
		let services = list_services().await?;
		println!("Found {} network services: {}", services.len(), services.join(", "));
		println!("Setting DNS servers: {}", hosts.join(" "));

		for service in &services {
			if dry_run {
				println!("[DRY-RUN] Would set DNS for: {}", service);
			} else if set_servers(service, &hosts).await {
				println!("Set DNS for: {}", service);
			} else {
				println!("Failed to set DNS for: {}", service);
			}
		}
		if !dry_run {
			flush_cache().await;
		}
		Ok(())
	}

	async fn status(&self) -> Result<DnsStatus> {
		let mut status = DnsStatus::new();
		for service in list_services().await? {
			let servers = match run_logged(Duration::from_secs(5), "networksetup", &["-getdnsservers", service.as_str()]).await {
				Ok(out) => parse_dns_servers(&out.stdout),
				Err(e) => {
					warn!(service = %service, error = %e, "could not read DNS servers");
					Vec::new()
				}
			};
			status.insert(service, servers);
		}
		Ok(status)
	}

	async fn reset(&self, dry_run: bool) -> Result<()> {
		let services = list_services().await?;
		println!("Found {} network services to reset", services.len());

		for service in &services {
			if dry_run {
				println!("[DRY-RUN] Would reset DNS for: {}", service);
			} else if set_servers(service, &["empty"]).await {
				println!("Reset DNS for: {}", service);
			} else {
				println!("Failed to reset DNS for: {}", service);
			}
		}
		if !dry_run {
			flush_cache().await;
		}
		Ok(())
	}
}
