use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_DNS_PORT: u16 = 53;

/// Resolver host, either a literal address or a name to be looked up
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
	Ip(IpAddr),
	Name(String),
}

impl fmt::Display for Host {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Host::Ip(ip) => write!(f, "{}", ip),
			Host::Name(name) => f.write_str(name),
		}
	}
}

/// A single DNS resolver address: host plus UDP port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
	pub host: Host,
	pub port: u16,
}

impl Endpoint {
	pub fn new(ip: IpAddr, port: u16) -> Self {
		Self { host: Host::Ip(ip), port }
	}
}

impl From<SocketAddr> for Endpoint {
	fn from(addr: SocketAddr) -> Self {
		Self::new(addr.ip(), addr.port())
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.host {
			Host::Ip(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
			_ => write!(f, "{}:{}", self.host, self.port),
		}
	}
}

impl FromStr for Endpoint {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		crate::resolver::parse_endpoint(s)
	}
}

/// A named, ordered list of resolver endpoints tried in fallback order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
	name: String,
	endpoints: Vec<Endpoint>,
}

impl Profile {
	pub fn new(name: impl Into<String>, endpoints: Vec<Endpoint>) -> Result<Self, ConfigError> {
		let name = name.into();
		if endpoints.is_empty() {
			return Err(ConfigError::EmptyProfile(name));
		}
		Ok(Self { name, endpoints })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn endpoints(&self) -> &[Endpoint] {
		&self.endpoints
	}
}

/// Validated input to a benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkRequest {
	pub profiles: Vec<Profile>,
	pub domains: Vec<String>,
	pub runs: u32,
	pub timeout: Duration,
	/// Number of profiles benchmarked at once; 1 runs them one after another
	pub concurrency: usize,
}

impl BenchmarkRequest {
	pub fn new(
		profiles: Vec<Profile>,
		domains: Vec<String>,
		runs: u32,
		timeout: Duration,
	) -> Result<Self, ConfigError> {
		if profiles.is_empty() {
			return Err(ConfigError::NoProfiles);
		}
		for (i, p) in profiles.iter().enumerate() {
			if profiles[..i].iter().any(|q| q.name == p.name) {
				return Err(ConfigError::DuplicateProfile(p.name.clone()));
			}
		}
		if domains.is_empty() {
			return Err(ConfigError::NoDomains);
		}
		if runs == 0 {
			return Err(ConfigError::ZeroRuns);
		}
		if timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		Ok(Self { profiles, domains, runs, timeout, concurrency: 1 })
	}

	pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
		if concurrency == 0 {
			return Err(ConfigError::ZeroConcurrency);
		}
		self.concurrency = concurrency;
		Ok(self)
	}

	/// Attempts made for each profile.
	pub fn attempts_per_profile(&self) -> usize {
		self.domains.len() * self.runs as usize
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn local_profile(name: &str) -> Profile {
		Profile::new(name, vec!["127.0.0.1:53".parse().unwrap()]).unwrap()
	}

	#[test]
	fn test_endpoint_display() {
		let v4: Endpoint = "1.1.1.1".parse().unwrap();
		assert_eq!(v4.to_string(), "1.1.1.1:53");
		let v6: Endpoint = "2606:4700::1111".parse().unwrap();
		assert_eq!(v6.to_string(), "[2606:4700::1111]:53");
		let named: Endpoint = "dns.example:5353".parse().unwrap();
		assert_eq!(named.to_string(), "dns.example:5353");
	}

	#[test]
	fn test_empty_profile_rejected() {
		let err = Profile::new("custom", vec![]).unwrap_err();
		assert_eq!(err, ConfigError::EmptyProfile("custom".to_string()));
	}

	#[test]
	fn test_request_validation() {
		let timeout = Duration::from_millis(100);
		let domains = vec!["localhost".to_string()];

		let err = BenchmarkRequest::new(vec![], domains.clone(), 1, timeout).unwrap_err();
		assert_eq!(err, ConfigError::NoProfiles);

		let err = BenchmarkRequest::new(vec![local_profile("a")], vec![], 1, timeout).unwrap_err();
		assert_eq!(err, ConfigError::NoDomains);

		let err = BenchmarkRequest::new(vec![local_profile("a")], domains.clone(), 0, timeout)
			.unwrap_err();
		assert_eq!(err, ConfigError::ZeroRuns);

		let err = BenchmarkRequest::new(vec![local_profile("a")], domains.clone(), 1, Duration::ZERO)
			.unwrap_err();
		assert_eq!(err, ConfigError::ZeroTimeout);

		let err = BenchmarkRequest::new(
			vec![local_profile("a"), local_profile("a")], domains.clone(), 1, timeout,
		).unwrap_err();
		assert_eq!(err, ConfigError::DuplicateProfile("a".to_string()));
	}

	#[test]
	fn test_request_concurrency() {
		let req = BenchmarkRequest::new(
			vec![local_profile("a")], vec!["localhost".to_string()], 3, Duration::from_millis(50),
		).unwrap();
		assert_eq!(req.concurrency, 1);
		assert_eq!(req.attempts_per_profile(), 3);
		assert!(req.clone().with_concurrency(0).is_err());
		assert_eq!(req.with_concurrency(4).unwrap().concurrency, 4);
	}
}
