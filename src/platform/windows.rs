use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{run_logged, server_hosts, DnsControl, DnsStatus};
use crate::transport::Endpoint;

const UP_ADAPTERS: &str = "Get-NetAdapter | Where-Object {$_.Status -eq 'Up'}";

/// PowerShell DnsClient cmdlets across every adapter that is up
#[derive(Debug, Default, Clone, Copy)]
pub struct Windows;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AdapterDns {
	interface_alias: String,
	#[serde(default)]
	server_addresses: Vec<String>,
}

/// ConvertTo-Json emits a bare object when there is only one item.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
	One(T),
	Many(Vec<T>),
}

pub(super) fn set_servers_script(hosts: &[String]) -> String {
	let list = hosts.iter()
		.map(|h| format!("'{}'", h))
		.collect::<Vec<_>>()
		.join(",");
	format!(
		"{} | ForEach-Object {{ Set-DnsClientServerAddress -InterfaceIndex $_.ifIndex -ServerAddresses @({}) }}",
		UP_ADAPTERS, list,
	)
}

pub(super) fn reset_script() -> String {
	format!(
		"{} | ForEach-Object {{ Set-DnsClientServerAddress -InterfaceIndex $_.ifIndex -ResetServerAddresses }}",
		UP_ADAPTERS,
	)
}

/// Parse `Get-DnsClientServerAddress | ConvertTo-Json` output, merging the
/// IPv4 and IPv6 entries of each interface.
pub(super) fn parse_dns_client_json(output: &str) -> Result<DnsStatus> {
	let mut status = DnsStatus::new();
	if output.trim().is_empty() {
		return Ok(status);
	}
	let items = match serde_json::from_str::<OneOrMany<AdapterDns>>(output).context("unexpected PowerShell output")? {
		OneOrMany::One(item) => vec![item],
		OneOrMany::Many(items) => items,
	};
	for AdapterDns { interface_alias, server_addresses } in items {
		status.entry(interface_alias).or_default().extend(server_addresses);
	}
	Ok(status)
}

async fn powershell(timeout: Duration, script: &str) -> Result<String> {
	let out = run_logged(
		timeout,
		"powershell",
		&["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", script],
	).await?;
	Ok(out.stdout)
}

#[async_trait]
impl DnsControl for Windows {
	fn name(&self) -> &'static str {
		"windows"
	}

	async fn apply(&self, servers: &[Endpoint], dry_run: bool) -> Result<()> {
		let hosts = server_hosts(servers);
		println!("Setting DNS servers: {}", hosts.join(" "));
		if dry_run {
			println!("[DRY-RUN] Would use PowerShell to set DNS for all active adapters");
			return Ok(());
		}
		powershell(Duration::from_secs(15), &set_servers_script(&hosts))
			.await
			.context("PowerShell command failed")?;
		println!("DNS set via PowerShell");
		Ok(())
	}

	async fn status(&self) -> Result<DnsStatus> {
		let script = "Get-DnsClientServerAddress | Where-Object {$_.ServerAddresses} | \
			Select-Object InterfaceAlias,ServerAddresses | ConvertTo-Json";
		let stdout = powershell(Duration::from_secs(10), script).await?;
		parse_dns_client_json(&stdout)
	}

	async fn reset(&self, dry_run: bool) -> Result<()> {
		if dry_run {
			println!("[DRY-RUN] Would use PowerShell to reset DNS for all active adapters");
			return Ok(());
		}
		powershell(Duration::from_secs(15), &reset_script())
			.await
			.context("PowerShell reset command failed")?;
		println!("DNS reset via PowerShell");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_set_servers_script() {
		let script = set_servers_script(&["1.1.1.1".to_string(), "1.0.0.1".to_string()]);
		assert!(script.starts_with(UP_ADAPTERS));
		assert!(script.contains("-ServerAddresses @('1.1.1.1','1.0.0.1')"));
		assert!(reset_script().contains("-ResetServerAddresses"));
	}

	#[test]
	fn test_parse_json_array() {
		let out = r#"[
			{"InterfaceAlias": "Ethernet", "ServerAddresses": ["1.1.1.1", "1.0.0.1"]},
			{"InterfaceAlias": "Ethernet", "ServerAddresses": ["2606:4700:4700::1111"]},
			{"InterfaceAlias": "Wi-Fi", "ServerAddresses": ["192.168.1.1"]}
		]"#;
		let status = parse_dns_client_json(out).unwrap();
		assert_eq!(status.len(), 2);
		assert_eq!(status["Ethernet"], vec!["1.1.1.1", "1.0.0.1", "2606:4700:4700::1111"]);
		assert_eq!(status["Wi-Fi"], vec!["192.168.1.1"]);
	}

	#[test]
	fn test_parse_json_single_object() {
		let out = r#"{"InterfaceAlias": "Ethernet", "ServerAddresses": ["8.8.8.8"]}"#;
		let status = parse_dns_client_json(out).unwrap();
		assert_eq!(status["Ethernet"], vec!["8.8.8.8"]);
	}

	#[test]
	fn test_parse_json_empty_and_garbage() {
		assert!(parse_dns_client_json("  ").unwrap().is_empty());
		assert!(parse_dns_client_json("not json").is_err());
	}

	#[tokio::test]
	async fn test_dry_run_touches_nothing() {
		let servers: Vec<Endpoint> = vec!["9.9.9.9".parse().unwrap()];
		assert!(Windows.apply(&servers, true).await.is_ok());
		assert!(Windows.reset(true).await.is_ok());
	}
}
