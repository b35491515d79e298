use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::dns::{AttemptError, Lookup};
use crate::stats::BenchmarkResult;
use crate::transport::{BenchmarkRequest, Profile};

/// Run the benchmark for every profile in the request.
///
/// Each profile gets `domains × runs` attempts, made one after another in
/// domain order. Profiles are run as separate tasks, at most
/// `request.concurrency` at a time. Failed attempts only count toward the
/// total; the returned map always has one entry per requested profile.
pub async fn run_benchmark(
	request: &BenchmarkRequest,
	lookup: Arc<dyn Lookup>,
) -> BTreeMap<String, BenchmarkResult> {
	info!(
		profiles = request.profiles.len(),
		domains = request.domains.len(),
		runs = request.runs,
		timeout_ms = request.timeout.as_millis() as u64,
		"starting benchmark"
	);

	let semaphore = Arc::new(Semaphore::new(request.concurrency));
	let domains: Arc<[String]> = request.domains.clone().into();

	let mut handles = Vec::new();
	for profile in &request.profiles {
		let sem = semaphore.clone();
		let lookup = lookup.clone();
		let domains = domains.clone();
		let profile = profile.clone();
		let runs = request.runs;
		let timeout = request.timeout;

		let name = profile.name().to_string();
		handles.push((name, tokio::spawn(async move {
			// A closed semaphore only means nothing else is gating us
			let _permit = sem.acquire().await.ok();
			bench_profile(lookup.as_ref(), &profile, &domains, runs, timeout).await
		})));
	}

	let mut results = BTreeMap::new();
	for (name, handle) in handles {
		let result = match handle.await {
			Ok(result) => result,
			Err(e) => {
				warn!(profile = %name, "benchmark task failed: {}", e);
				BenchmarkResult {
					total: request.attempts_per_profile(),
					..BenchmarkResult::default()
				}
			}
		};
		results.insert(name, result);
	}
	results
}

/// Make every attempt for one profile, strictly in sequence.
async fn bench_profile(
	lookup: &dyn Lookup,
	profile: &Profile,
	domains: &[String],
	runs: u32,
	timeout: Duration,
) -> BenchmarkResult {
	let mut result = BenchmarkResult::default();
	for domain in domains {
		for run in 0..runs {
			let start = Instant::now();
			let attempt = lookup.lookup(profile.endpoints(), domain, timeout);
			let outcome = match tokio::time::timeout(timeout, attempt).await {
				Ok(outcome) => outcome,
				Err(_) => Err(AttemptError::Timeout(timeout)),
			};
			match outcome {
				Ok(()) => result.record(Some(start.elapsed())),
				Err(e) => {
					debug!(profile = profile.name(), domain = %domain, run, error = %e, "attempt failed");
					result.record(None);
				}
			}
		}
	}
	debug!(
		profile = profile.name(),
		successes = result.successes,
		total = result.total,
		"profile finished"
	);
	result
}
