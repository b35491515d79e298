use anyhow::{anyhow, Result};

/// Domains queried when none are given on the command line.
pub fn default_domains() -> Vec<String> {
	vec![
		"turk.net",
		"google.com",
		"cloudflare.com",
	].into_iter().map(String::from).collect()
}

/// Flatten `--domains` values, each of which may hold a comma-separated list.
pub fn split_domain_args(values: &[String]) -> Vec<String> {
	values.iter()
		.flat_map(|v| v.split(','))
		.map(str::trim)
		.filter(|d| !d.is_empty())
		.map(String::from)
		.collect()
}

/// Parse domain file content: one domain per line.
///
/// Blank lines and lines starting with '#' are skipped.
pub fn parse_domain_list(content: &str) -> Vec<String> {
	content.lines()
		.map(|line| line.trim().to_string())
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.collect()
}

/// Read domains from a file, one per line.
pub fn read_domain_file(path: &str) -> Result<Vec<String>> {
	let content = std::fs::read_to_string(path)
		.map_err(|e| anyhow!("failed to read domain file '{}': {}", path, e))?;
	Ok(parse_domain_list(&content))
}
