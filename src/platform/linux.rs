use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{run_logged, server_hosts, DnsControl, DnsStatus};
use crate::exec::has_program;
use crate::resolver::parse_resolv_conf;
use crate::transport::Endpoint;

const RESOLV_CONF: &str = "/etc/resolv.conf";
const RESOLVED_STUB: &str = "/run/systemd/resolve/stub-resolv.conf";

/// systemd-resolved, then NetworkManager, then /etc/resolv.conf
#[derive(Debug, Clone)]
pub struct Linux {
	resolv_conf: PathBuf,
}

impl Default for Linux {
	fn default() -> Self {
		Self { resolv_conf: PathBuf::from(RESOLV_CONF) }
	}
}

fn has_resolved() -> bool {
	Path::new(RESOLVED_STUB).exists() || has_program("resolvectl")
}

/// Interface name from `ip route show default` output (the fifth field).
pub(super) fn parse_default_iface(output: &str) -> Option<String> {
	output.lines()
		.next()?
		.split_whitespace()
		.nth(4)
		.map(String::from)
}

async fn default_iface() -> Option<String> {
	let out = run_logged(Duration::from_secs(3), "ip", &["route", "show", "default"]).await.ok()?;
	parse_default_iface(&out.stdout)
}

/// Servers listed by `resolvectl status`, in order and without duplicates.
pub(super) fn parse_resolvectl_status(output: &str) -> Vec<String> {
	let mut servers: Vec<String> = Vec::new();
	for line in output.lines() {
		let Some((key, value)) = line.split_once(':') else {
			continue;
		};
		let key = key.trim();
		if key != "Current DNS Server" && key != "DNS Servers" {
			continue;
		}
		for server in value.split_whitespace() {
			if !servers.iter().any(|s| s == server) {
				servers.push(server.to_string());
			}
		}
	}
	servers
}

pub(super) fn render_resolv_conf(hosts: &[String]) -> String {
	let mut content = String::from("# Generated by dns-switch\n");
	for host in hosts {
		content.push_str(&format!("nameserver {}\n", host));
	}
	content
}

#[async_trait]
impl DnsControl for Linux {
	fn name(&self) -> &'static str {
		"linux"
	}

	async fn apply(&self, servers: &[Endpoint], dry_run: bool) -> Result<()> {
		let hosts = server_hosts(servers);
		let iface = default_iface().await;
		println!("Default interface: {}", iface.as_deref().unwrap_or("(none)"));
		println!("Setting DNS servers: {}", hosts.join(" "));

		if let Some(iface) = &iface {
			if has_resolved() {
				let mut args = vec!["dns", iface.as_str()];
				args.extend(hosts.iter().map(String::as_str));
				if dry_run {
					println!("[DRY-RUN] Would run: resolvectl {}", args.join(" "));
				} else {
					match run_logged(Duration::from_secs(5), "resolvectl", &args).await {
						Ok(_) => {
							println!("DNS set via systemd-resolved on {}", iface);
							return Ok(());
						}
						Err(e) => warn!(error = %e, "systemd-resolved rejected the change"),
					}
				}
			}

			if has_program("nmcli") {
				let joined = hosts.join(",");
				let args = ["con", "mod", iface.as_str(), "ipv4.method", "manual", "ipv4.dns", joined.as_str()];
				if dry_run {
					println!("[DRY-RUN] Would run: nmcli {}", args.join(" "));
				} else {
					info!(iface = %iface, "using NetworkManager");
					if let Err(e) = run_logged(Duration::from_secs(8), "nmcli", &args).await {
						warn!(error = %e, "nmcli con mod failed");
					}
					if let Err(e) = run_logged(Duration::from_secs(5), "nmcli", &["con", "up", iface.as_str()]).await {
						warn!(error = %e, "nmcli con up failed");
					}
					println!("DNS set via NetworkManager on {}", iface);
					return Ok(());
				}
			}
		}

		let path = self.resolv_conf.display();
		if dry_run {
			println!("[DRY-RUN] Would write {}:\n{}", path, render_resolv_conf(&hosts));
			return Ok(());
		}
		info!("falling back to writing {}", path);
		std::fs::write(&self.resolv_conf, render_resolv_conf(&hosts))
			.with_context(|| format!("failed to write {}", path))?;
		println!("DNS written to {}", path);
		Ok(())
	}

	async fn status(&self) -> Result<DnsStatus> {
		let mut status = DnsStatus::new();
		if has_program("resolvectl") {
			match run_logged(Duration::from_secs(5), "resolvectl", &["status"]).await {
				Ok(out) => {
					let servers = parse_resolvectl_status(&out.stdout);
					if !servers.is_empty() {
						status.insert("systemd-resolved".to_string(), servers);
					}
				}
				Err(e) => warn!(error = %e, "resolvectl status failed"),
			}
		}
		match std::fs::read_to_string(&self.resolv_conf) {
			Ok(content) => {
				status.insert("resolv.conf".to_string(), parse_resolv_conf(&content));
			}
			Err(e) => warn!(error = %e, "could not read {}", self.resolv_conf.display()),
		}
		if status.is_empty() {
			bail!("could not read DNS status");
		}
		Ok(status)
	}

	async fn reset(&self, dry_run: bool) -> Result<()> {
		let iface = default_iface().await;
		println!("Default interface: {}", iface.as_deref().unwrap_or("(none)"));

		if let Some(iface) = &iface {
			if has_resolved() {
				if dry_run {
					println!("[DRY-RUN] Would run: resolvectl revert {}", iface);
				} else {
					match run_logged(Duration::from_secs(5), "resolvectl", &["revert", iface.as_str()]).await {
						Ok(_) => {
							println!("DNS reset via systemd-resolved on {}", iface);
							return Ok(());
						}
						Err(e) => warn!(error = %e, "systemd-resolved reset failed"),
					}
				}
			}

			if has_program("nmcli") {
				let args = ["con", "mod", iface.as_str(), "ipv4.method", "auto", "ipv4.dns", ""];
				if dry_run {
					println!("[DRY-RUN] Would run: nmcli {}", args.join(" "));
				} else {
					if let Err(e) = run_logged(Duration::from_secs(8), "nmcli", &args).await {
						warn!(error = %e, "nmcli con mod failed");
					}
					if let Err(e) = run_logged(Duration::from_secs(5), "nmcli", &["con", "up", iface.as_str()]).await {
						warn!(error = %e, "nmcli con up failed");
					}
					println!("DNS reset via NetworkManager on {}", iface);
					return Ok(());
				}
			}
		}

		let content = "# DNS settings reset to DHCP defaults\n# Generated by dns-switch\n";
		let path = self.resolv_conf.display();
		if dry_run {
			println!("[DRY-RUN] Would reset {}", path);
			return Ok(());
		}
		std::fs::write(&self.resolv_conf, content)
			.with_context(|| format!("failed to reset {}", path))?;
		println!("Reset {}", path);
		Ok(())
	}
}
