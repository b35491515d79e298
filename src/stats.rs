use std::time::Duration;

/// Accumulated outcome of every attempt made against one profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkResult {
	/// Latency of each successful attempt, in completion order
	pub latencies: Vec<Duration>,
	pub successes: usize,
	pub total: usize,
}

impl BenchmarkResult {
	/// Record one attempt; `latency` is `Some` only when it succeeded.
	pub fn record(&mut self, latency: Option<Duration>) {
		self.total += 1;
		if let Some(latency) = latency {
			self.successes += 1;
			self.latencies.push(latency);
		}
	}

	/// Arithmetic mean latency in milliseconds, 0 with no samples.
	pub fn avg_ms(&self) -> f64 {
		mean_ms(&self.latencies).unwrap_or(0.0)
	}

	pub fn p50_ms(&self) -> f64 {
		self.percentile_ms(0.50)
	}

	pub fn p90_ms(&self) -> f64 {
		self.percentile_ms(0.90)
	}

	/// Latency at fraction `p` (0.0..=1.0) in milliseconds, 0 with no samples.
	pub fn percentile_ms(&self, p: f64) -> f64 {
		let mut sorted = self.latencies.clone();
		sorted.sort_unstable();
		percentile(&sorted, p).map(as_ms).unwrap_or(0.0)
	}

	/// Share of successful attempts as a percentage.
	pub fn success_rate(&self) -> f64 {
		if self.total == 0 {
			return 0.0;
		}
		(self.successes as f64 / self.total as f64) * 100.0
	}
}

/// Whole milliseconds; the sub-millisecond remainder is dropped.
fn as_ms(d: Duration) -> f64 {
	d.as_millis() as f64
}

/// Pick the value at index floor((n - 1) * p) from a sorted slice.
///
/// This rounds down between ranks instead of interpolating, so for five
/// samples p = 0.9 selects the fourth smallest value, not the largest.
/// Returns None if the slice is empty.
pub fn percentile<T: Copy>(sorted_values: &[T], p: f64) -> Option<T> {
	if sorted_values.is_empty() {
		return None;
	}
	let last = sorted_values.len() - 1;
	let idx = ((last as f64) * p.clamp(0.0, 1.0)).floor() as usize;
	Some(sorted_values[idx.min(last)])
}

/// Calculate the arithmetic mean of a slice of latencies, in milliseconds.
///
/// The sum is truncated to whole milliseconds before dividing.
pub fn mean_ms(values: &[Duration]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}
	let sum: Duration = values.iter().sum();
	Some(as_ms(sum) / values.len() as f64)
}
