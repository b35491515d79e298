mod bench;
mod cli;
mod dns;
mod domains;
mod error;
mod exec;
mod output;
mod platform;
mod resolver;
mod stats;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{BenchmarkArgs, Cli, Command};
use crate::dns::HickoryLookup;
use crate::resolver::ProfileTable;
use crate::transport::BenchmarkRequest;

fn init_logging(verbose: bool) {
	let default_filter = if verbose { "warn,dns_switch=debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_filter));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn warn_ignored_servers(profile: &str, servers: &[String]) {
	if ProfileTable::ignores_extra(profile, servers) {
		warn!(profile, ?servers, "extra addresses are only used with 'custom' and are ignored");
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	let profiles = ProfileTable::builtin();

	match cli.command {
		Command::List => output::print_profiles(&profiles),
		Command::Status => {
			let control = platform::host_control()?;
			let status = control.status().await?;
			output::print_status(&status);
		}
		Command::Switch { profile, servers, dry_run } => {
			warn_ignored_servers(&profile, &servers);
			let selected = profiles.profile_for(&profile, &servers)?;
			let control = platform::host_control()?;
			info!(platform = control.name(), profile = selected.name(), dry_run, "switching resolvers");
			control.apply(selected.endpoints(), dry_run).await?;
		}
		Command::Reset { dry_run } => {
			let control = platform::host_control()?;
			info!(platform = control.name(), dry_run, "resetting resolvers");
			control.reset(dry_run).await?;
		}
		Command::Benchmark(args) => run_benchmark_command(args, &profiles).await?,
		Command::Version => println!("dns-switch {}", env!("CARGO_PKG_VERSION")),
	}

	Ok(())
}

async fn run_benchmark_command(args: BenchmarkArgs, profiles: &ProfileTable) -> anyhow::Result<()> {
	warn_ignored_servers(&args.profile, &args.servers);
	let selected = profiles.select(&args.profile, &args.servers)?;

	// Collect domains from flags and file, falling back to defaults
	let mut domain_list = domains::split_domain_args(&args.domains);
	if let Some(path) = &args.domain_file {
		domain_list.extend(domains::read_domain_file(path)?);
	}
	if args.domains.is_empty() && args.domain_file.is_none() {
		domain_list = domains::default_domains();
	}

	let request = BenchmarkRequest::new(
		selected,
		domain_list,
		args.runs,
		Duration::from_millis(args.timeout),
	)?.with_concurrency(args.concurrency)?;

	output::print_config_summary(&request);

	println!("Running benchmark...");
	let results = bench::run_benchmark(&request, Arc::new(HickoryLookup)).await;

	output::print_results_table(&results);

	if let Some(path) = &args.output {
		output::write_csv(path, &request, &results)?;
	}

	Ok(())
}
