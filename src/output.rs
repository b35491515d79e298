use std::collections::BTreeMap;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::platform::DnsStatus;
use crate::resolver::ProfileTable;
use crate::stats::BenchmarkResult;
use crate::transport::{BenchmarkRequest, Endpoint};

fn join_endpoints(endpoints: &[Endpoint]) -> String {
	endpoints.iter()
		.map(|e| e.to_string())
		.collect::<Vec<_>>()
		.join(" ")
}

fn new_table(header: Vec<&str>) -> Table {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(header);
	table
}

/// Print every profile with its servers in fallback order.
pub fn print_profiles(profiles: &ProfileTable) {
	let mut table = new_table(vec!["Profile", "Servers"]);
	for p in profiles.iter() {
		table.add_row(vec![p.name().to_string(), join_endpoints(p.endpoints())]);
	}
	println!("{table}");
}

/// Print the active resolvers per interface or source.
pub fn print_status(status: &DnsStatus) {
	let mut table = new_table(vec!["Interface", "DNS Servers"]);
	for (iface, servers) in status {
		let servers = if servers.is_empty() {
			"(default)".to_string()
		} else {
			servers.join(" ")
		};
		table.add_row(vec![iface.clone(), servers]);
	}
	println!("{table}");
}

/// Print a summary of the benchmark configuration before running.
pub fn print_config_summary(request: &BenchmarkRequest) {
	println!("DNS Benchmark Configuration");
	println!("===========================");
	println!("Profiles:       {}", request.profiles.len());
	for p in &request.profiles {
		println!("  - {} ({})", p.name(), join_endpoints(p.endpoints()));
	}
	println!("Domains:        {}", request.domains.join(", "));
	println!("Runs:           {}", request.runs);
	println!("Timeout:        {} ms", request.timeout.as_millis());
	println!("Concurrency:    {}", request.concurrency);
	println!();
}

/// Print the benchmark results as a formatted table.
pub fn print_results_table(results: &BTreeMap<String, BenchmarkResult>) {
	let mut table = new_table(vec!["Profile", "Avg", "P50", "P90", "Success"]);
	for (name, r) in results {
		table.add_row(vec![
			name.clone(),
			format!("{:.1} ms", r.avg_ms()),
			format!("{:.1} ms", r.p50_ms()),
			format!("{:.1} ms", r.p90_ms()),
			format!("{}/{} ({:.0}%)", r.successes, r.total, r.success_rate()),
		]);
	}

	println!("\nBenchmark Results");
	println!("=================\n");
	println!("{table}");
}

/// Write benchmark results to a CSV file.
pub fn write_csv(
	path: &str,
	request: &BenchmarkRequest,
	results: &BTreeMap<String, BenchmarkResult>,
) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record([
		"profile", "servers",
		"avg_ms", "p50_ms", "p90_ms",
		"successes", "total", "success_rate",
	])?;

	for (name, r) in results {
		let servers = request.profiles.iter()
			.find(|p| p.name() == name)
			.map(|p| join_endpoints(p.endpoints()))
			.unwrap_or_default();
		writer.write_record([
			name.clone(),
			servers,
			format!("{:.2}", r.avg_ms()),
			format!("{:.2}", r.p50_ms()),
			format!("{:.2}", r.p90_ms()),
			r.successes.to_string(),
			r.total.to_string(),
			format!("{:.1}", r.success_rate()),
		])?;
	}

	writer.flush()?;
	println!("\nResults written to: {}", path);
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::transport::Profile;

	#[test]
	fn test_write_csv() {
		let profile = Profile::new(
			"cloudflare",
			vec!["1.1.1.1".parse().unwrap(), "1.0.0.1".parse().unwrap()],
		).unwrap();
		let request = BenchmarkRequest::new(
			vec![profile], vec!["example.com".to_string()], 2, Duration::from_millis(500),
		).unwrap();
		let mut results = BTreeMap::new();
		results.insert("cloudflare".to_string(), BenchmarkResult {
			latencies: vec![Duration::from_millis(10)],
			successes: 1,
			total: 2,
		});

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("results.csv");
		let path = path.to_str().unwrap();
		write_csv(path, &request, &results).unwrap();

		let content = std::fs::read_to_string(path).unwrap();
		let mut lines = content.lines();
		assert_eq!(
			lines.next(),
			Some("profile,servers,avg_ms,p50_ms,p90_ms,successes,total,success_rate"),
		);
		assert_eq!(
			lines.next(),
			Some("cloudflare,1.1.1.1:53 1.0.0.1:53,10.00,10.00,10.00,1,2,50.0"),
		);
		assert_eq!(lines.next(), None);
	}
}
