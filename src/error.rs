use thiserror::Error;

/// Rejected input, reported before any lookup is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("profile not found: {0} (use 'dns-switch list' to see available profiles)")]
	UnknownProfile(String),

	#[error("profile '{0}' has no resolver endpoints")]
	EmptyProfile(String),

	#[error("duplicate profile name: {0}")]
	DuplicateProfile(String),

	#[error("custom requires at least one resolver address")]
	MissingCustomEndpoints,

	#[error("invalid resolver address '{input}': {reason}")]
	InvalidEndpoint { input: String, reason: String },

	#[error("no profiles selected for benchmark")]
	NoProfiles,

	#[error("no domains to query")]
	NoDomains,

	#[error("runs per domain must be at least 1")]
	ZeroRuns,

	#[error("timeout must be greater than zero")]
	ZeroTimeout,

	#[error("concurrency must be at least 1")]
	ZeroConcurrency,
}
