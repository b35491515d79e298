use clap::{Args, Parser, Subcommand};

/// Switch and benchmark DNS resolvers locally
#[derive(Parser, Debug)]
#[command(name = "dns-switch", version)]
#[command(about = "Switch and benchmark DNS resolvers locally")]
#[command(long_about = "Switch DNS servers with a single command, show the active \
	DNS settings, and compare resolver latency.")]
pub struct Cli {
	/// Log debug details to stderr (RUST_LOG overrides)
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Apply a DNS profile, or 'custom' followed by resolver addresses
	Switch {
		/// Profile name or 'custom'
		profile: String,

		/// Resolver addresses for 'custom' (e.g. 1.1.1.1 or 9.9.9.9:53)
		servers: Vec<String>,

		/// Show what would happen without making changes
		#[arg(long = "dry-run")]
		dry_run: bool,
	},

	/// Reset DNS settings to DHCP defaults
	Reset {
		/// Show what would happen without making changes
		#[arg(long = "dry-run")]
		dry_run: bool,
	},

	/// Show active DNS settings
	Status,

	/// List available DNS profiles
	List,

	/// Compare resolver latency
	Benchmark(BenchmarkArgs),

	/// Show version information
	Version,
}

#[derive(Args, Debug)]
pub struct BenchmarkArgs {
	/// Profile name, 'all', or 'custom'
	pub profile: String,

	/// Resolver addresses for 'custom', tried in order
	pub servers: Vec<String>,

	/// Domains to query (comma separated, repeatable)
	#[arg(short = 'd', long = "domains")]
	pub domains: Vec<String>,

	/// File containing domains to query (one per line)
	#[arg(long = "domain-file")]
	pub domain_file: Option<String>,

	/// Number of queries per domain
	#[arg(short = 'n', long = "runs", default_value = "5")]
	pub runs: u32,

	/// Single query timeout in milliseconds
	#[arg(short = 't', long = "timeout", default_value = "1200")]
	pub timeout: u64,

	/// Number of profiles benchmarked at the same time
	#[arg(short = 'c', long = "concurrency", default_value = "1")]
	pub concurrency: usize,

	/// Output CSV file path
	#[arg(short = 'o', long = "output")]
	pub output: Option<String>,
}
