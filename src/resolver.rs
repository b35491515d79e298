use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use crate::error::ConfigError;
use crate::transport::{Endpoint, Host, Profile, DEFAULT_DNS_PORT};

/// Name of the pseudo-profile built from addresses given on the command line.
pub const CUSTOM_PROFILE: &str = "custom";

/// Name that selects every built-in profile for a benchmark.
pub const ALL_PROFILES: &str = "all";

fn invalid(input: &str, reason: impl ToString) -> ConfigError {
	ConfigError::InvalidEndpoint {
		input: input.to_string(),
		reason: reason.to_string(),
	}
}

/// Parse a resolver address string into an Endpoint.
///
/// Supports formats:
///   "1.1.1.1"              -- IPv4, default port 53
///   "1.1.1.1:53"           -- IPv4 with explicit port
///   "2606:4700::1111"      -- bare IPv6, default port 53
///   "[2606:4700::1111]:53" -- bracketed IPv6 with port
///   "dns.example"          -- hostname, default port 53
///   "dns.example:5353"     -- hostname with explicit port
pub fn parse_endpoint(input: &str) -> Result<Endpoint, ConfigError> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(invalid(input, "empty resolver address"));
	}

	let endpoint = if trimmed.starts_with('[') {
		// Bracketed IPv6, with or without a port
		match trimmed.parse::<SocketAddr>() {
			Ok(addr) => Endpoint::from(addr),
			Err(_) => {
				let inner = trimmed.trim_start_matches('[').trim_end_matches(']');
				let ip: IpAddr = inner.parse().map_err(|e| invalid(input, e))?;
				Endpoint::new(ip, DEFAULT_DNS_PORT)
			}
		}
	} else if trimmed.matches(':').count() > 1 {
		// Bare IPv6 address without port
		let ip: IpAddr = trimmed.parse().map_err(|e| invalid(input, e))?;
		Endpoint::new(ip, DEFAULT_DNS_PORT)
	} else if let Ok(addr) = trimmed.parse::<SocketAddr>() {
		addr.into()
	} else if let Ok(ip) = trimmed.parse::<IpAddr>() {
		Endpoint::new(ip, DEFAULT_DNS_PORT)
	} else {
		let (host, port) = match trimmed.rsplit_once(':') {
			Some((host, port)) => {
				let port = port.parse::<u16>()
					.map_err(|e| invalid(input, format!("invalid port '{}': {}", port, e)))?;
				(host, port)
			}
			None => (trimmed, DEFAULT_DNS_PORT),
		};
		validate_hostname(host).map_err(|reason| invalid(input, reason))?;
		Endpoint {
			host: Host::Name(host.trim_end_matches('.').to_ascii_lowercase()),
			port,
		}
	};

	if endpoint.port == 0 {
		return Err(invalid(input, "port must be non-zero"));
	}
	Ok(endpoint)
}

fn validate_hostname(host: &str) -> Result<(), &'static str> {
	let host = host.trim_end_matches('.');
	if host.is_empty() || host.len() > 253 {
		return Err("invalid hostname length");
	}
	// Something like "1.2.3.999" is a mistyped address, not a name
	if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
		return Err("invalid IP address");
	}
	for label in host.split('.') {
		if label.is_empty() || label.len() > 63 {
			return Err("invalid hostname label");
		}
		if label.starts_with('-') || label.ends_with('-') {
			return Err("hostname label starts or ends with '-'");
		}
		if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
			return Err("hostname contains invalid characters");
		}
	}
	Ok(())
}

/// Parse a list of resolver addresses, preserving order.
pub fn parse_endpoints<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Endpoint>, ConfigError> {
	inputs.iter().map(|s| parse_endpoint(s.as_ref())).collect()
}

/// Extract nameserver addresses from resolv.conf content.
pub fn parse_resolv_conf(content: &str) -> Vec<String> {
	content.lines()
		.map(str::trim)
		.filter(|l| l.starts_with("nameserver"))
		.filter_map(|l| l.split_whitespace().nth(1))
		.map(String::from)
		.collect()
}

/// Immutable set of named resolver profiles
#[derive(Debug, Clone)]
pub struct ProfileTable {
	profiles: BTreeMap<String, Profile>,
}

impl ProfileTable {
	/// Well-known public resolvers; within a profile, order is fallback priority.
	pub fn builtin() -> Self {
		let presets: [(&str, [[u8; 4]; 2]); 4] = [
			("cloudflare", [[1, 1, 1, 1], [1, 0, 0, 1]]),
			("google", [[8, 8, 8, 8], [8, 8, 4, 4]]),
			("quad9", [[9, 9, 9, 9], [149, 112, 112, 112]]),
			("opendns", [[208, 67, 222, 222], [208, 67, 220, 220]]),
		];
		let profiles = presets.into_iter()
			.filter_map(|(name, ips)| {
				let endpoints = ips.into_iter()
					.map(|ip| Endpoint::new(IpAddr::from(ip), DEFAULT_DNS_PORT))
					.collect();
				let profile = Profile::new(name, endpoints).ok()?;
				Some((name.to_string(), profile))
			})
			.collect();
		Self { profiles }
	}

	pub fn get(&self, name: &str) -> Result<&Profile, ConfigError> {
		self.profiles.get(name)
			.ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
	}

	/// Profiles in name order.
	pub fn iter(&self) -> impl Iterator<Item = &Profile> {
		self.profiles.values()
	}

	/// A single profile by name, or one built from `extra` when the name is
	/// `custom`.
	pub fn profile_for(&self, name: &str, extra: &[String]) -> Result<Profile, ConfigError> {
		if name == CUSTOM_PROFILE {
			if extra.is_empty() {
				return Err(ConfigError::MissingCustomEndpoints);
			}
			return Profile::new(CUSTOM_PROFILE, parse_endpoints(extra)?);
		}
		self.get(name).cloned()
	}

	/// Whether addresses given after `name` would be thrown away, which is the
	/// case for every name except `custom`.
	pub fn ignores_extra(name: &str, extra: &[String]) -> bool {
		name != CUSTOM_PROFILE && !extra.is_empty()
	}

	/// Resolve a benchmark selection into concrete profiles; `all` picks
	/// every profile in the table.
	pub fn select(&self, name: &str, extra: &[String]) -> Result<Vec<Profile>, ConfigError> {
		if name == ALL_PROFILES {
			return Ok(self.iter().cloned().collect());
		}
		Ok(vec![self.profile_for(name, extra)?])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ipv4_no_port() {
		let r = parse_endpoint("1.1.1.1").unwrap();
		assert_eq!(r.port, 53);
		assert_eq!(r.host.to_string(), "1.1.1.1");
	}

	#[test]
	fn test_ipv4_with_port() {
		let r = parse_endpoint("8.8.8.8:5353").unwrap();
		assert_eq!(r.port, 5353);
		assert_eq!(r.host.to_string(), "8.8.8.8");
	}

	#[test]
	fn test_ipv6_bare() {
		let r = parse_endpoint("2606:4700::1111").unwrap();
		assert_eq!(r.port, 53);
	}

	#[test]
	fn test_ipv6_bracketed() {
		let r = parse_endpoint("[2606:4700::1111]:5353").unwrap();
		assert_eq!(r.port, 5353);
		let r = parse_endpoint("[::1]").unwrap();
		assert_eq!(r.port, 53);
		assert_eq!(r.host.to_string(), "::1");
	}

	#[test]
	fn test_hostname() {
		let r = parse_endpoint("DNS.Example.").unwrap();
		assert_eq!(r.host, Host::Name("dns.example".to_string()));
		assert_eq!(r.port, 53);
		let r = parse_endpoint("resolver-1.example:8053").unwrap();
		assert_eq!(r.port, 8053);
	}

	#[test]
	fn test_invalid_input() {
		assert!(parse_endpoint("").is_err());
		assert!(parse_endpoint("not an ip").is_err());
		assert!(parse_endpoint("1.2.3.999").is_err());
		assert!(parse_endpoint("1.1.1.1:99999").is_err());
		assert!(parse_endpoint("1.1.1.1:0").is_err());
		assert!(parse_endpoint("-bad.example").is_err());
		assert!(parse_endpoint("dns.example:port").is_err());
	}

	#[test]
	fn test_builtin_profiles() {
		let table = ProfileTable::builtin();
		assert_eq!(table.iter().count(), 4);
		let names: Vec<&str> = table.iter().map(|p| p.name()).collect();
		assert_eq!(names, vec!["cloudflare", "google", "opendns", "quad9"]);

		let expected = [
			("cloudflare", ["1.1.1.1:53", "1.0.0.1:53"]),
			("google", ["8.8.8.8:53", "8.8.4.4:53"]),
			("quad9", ["9.9.9.9:53", "149.112.112.112:53"]),
			("opendns", ["208.67.222.222:53", "208.67.220.220:53"]),
		];
		for (name, servers) in expected {
			let rendered: Vec<String> = table.get(name).unwrap()
				.endpoints().iter().map(|e| e.to_string()).collect();
			assert_eq!(rendered, servers, "profile {}", name);
		}
	}

	#[test]
	fn test_select() {
		let table = ProfileTable::builtin();
		assert_eq!(table.select("all", &[]).unwrap().len(), 4);
		assert_eq!(table.select("google", &[]).unwrap()[0].name(), "google");
		assert_eq!(
			table.select("nope", &[]).unwrap_err(),
			ConfigError::UnknownProfile("nope".to_string()),
		);
		assert_eq!(
			table.select("custom", &[]).unwrap_err(),
			ConfigError::MissingCustomEndpoints,
		);
		let custom = table.select("custom", &["9.9.9.9".to_string(), "1.1.1.1:5353".to_string()])
			.unwrap();
		assert_eq!(custom[0].endpoints().len(), 2);
		assert_eq!(custom[0].endpoints()[1].port, 5353);
	}

	#[test]
	fn test_profile_for_rejects_all() {
		let table = ProfileTable::builtin();
		assert_eq!(
			table.profile_for("all", &[]).unwrap_err(),
			ConfigError::UnknownProfile("all".to_string()),
		);
		assert_eq!(table.profile_for("quad9", &[]).unwrap().endpoints().len(), 2);
		assert!(matches!(
			table.profile_for("custom", &["bad address!".to_string()]),
			Err(ConfigError::InvalidEndpoint { .. }),
		));
	}

	#[test]
	fn test_ignores_extra() {
		let extra = vec!["1.1.1.1".to_string()];
		assert!(ProfileTable::ignores_extra("google", &extra));
		assert!(ProfileTable::ignores_extra("all", &extra));
		assert!(!ProfileTable::ignores_extra("custom", &extra));
		assert!(!ProfileTable::ignores_extra("google", &[]));
	}

	#[test]
	fn test_parse_resolv_conf() {
		let content = "# generated\nsearch lan\nnameserver 127.0.0.53\n  nameserver 1.1.1.1 \noptions edns0\n";
		assert_eq!(parse_resolv_conf(content), vec!["127.0.0.53", "1.1.1.1"]);
	}
}
