use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{
	NameServerConfig, ResolverConfig, ResolverOpts, ServerOrderingStrategy,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{ResolveError, TokioResolver};
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::transport::{Endpoint, Host};

/// Why a single resolution attempt did not produce an answer
#[derive(Debug, Error)]
pub enum AttemptError {
	#[error("none of the {0} resolver endpoints accepted a UDP connection")]
	Unreachable(usize),

	#[error("lookup failed: {0}")]
	Resolve(#[from] ResolveError),

	#[error("timed out after {} ms", .0.as_millis())]
	Timeout(Duration),
}

/// Resolve a name using only the given resolvers, in fallback order.
#[async_trait]
pub trait Lookup: Send + Sync {
	async fn lookup(
		&self,
		endpoints: &[Endpoint],
		domain: &str,
		timeout: Duration,
	) -> Result<(), AttemptError>;
}

/// Lookup backed by hickory-resolver over plain UDP.
///
/// A fresh resolver with caching disabled is built for every attempt so
/// that no answer is served from a previous run.
#[derive(Debug, Default, Clone, Copy)]
pub struct HickoryLookup;

#[async_trait]
impl Lookup for HickoryLookup {
	async fn lookup(
		&self,
		endpoints: &[Endpoint],
		domain: &str,
		timeout: Duration,
	) -> Result<(), AttemptError> {
		let addr = first_usable(endpoints).await
			.ok_or(AttemptError::Unreachable(endpoints.len()))?;

		let config = ResolverConfig::from_parts(
			None,
			vec![],
			vec![NameServerConfig::new(addr, Protocol::Udp)],
		);
		let mut opts = ResolverOpts::default();
		opts.timeout = timeout;
		opts.attempts = 1;
		opts.cache_size = 0;
		opts.num_concurrent_reqs = 1;
		opts.server_ordering_strategy = ServerOrderingStrategy::UserProvidedOrder;

		let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
			.with_options(opts)
			.build();
		let answer = resolver.lookup_ip(domain).await?;
		debug!(%addr, domain, answers = answer.iter().count(), "lookup succeeded");
		Ok(())
	}
}

/// Walk the endpoints in order and return the first one a UDP socket can
/// connect to.
///
/// Hostname endpoints are expanded through the system resolver first; a
/// name that does not resolve is skipped like any other unusable endpoint.
pub async fn first_usable(endpoints: &[Endpoint]) -> Option<SocketAddr> {
	for endpoint in endpoints {
		let candidates: Vec<SocketAddr> = match &endpoint.host {
			Host::Ip(ip) => vec![SocketAddr::new(*ip, endpoint.port)],
			Host::Name(name) => match tokio::net::lookup_host((name.as_str(), endpoint.port)).await {
				Ok(addrs) => addrs.collect(),
				Err(e) => {
					debug!(%endpoint, error = %e, "could not resolve resolver hostname");
					continue;
				}
			},
		};
		for addr in candidates {
			match udp_connect(addr).await {
				Ok(()) => return Some(addr),
				Err(e) => debug!(%endpoint, %addr, error = %e, "resolver endpoint unusable"),
			}
		}
	}
	None
}

async fn udp_connect(addr: SocketAddr) -> io::Result<()> {
	let bind_addr = if addr.is_ipv4() {
		"0.0.0.0:0"
	} else {
		"[::]:0"
	};
	let socket = UdpSocket::bind(bind_addr).await?;
	socket.connect(addr).await
}

#[cfg(test)]
pub(crate) mod testing {
	use std::net::SocketAddr;

	use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
	use hickory_proto::rr::rdata::A;
	use hickory_proto::rr::{RData, Record, RecordType};
	use tokio::net::UdpSocket;

	/// Start a UDP DNS server on loopback that answers every A query with
	/// 127.0.0.1 and every other query with an empty NOERROR.
	pub async fn spawn_answering_server() -> SocketAddr {
		let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let addr = socket.local_addr().unwrap();
		tokio::spawn(async move {
			let mut buf = vec![0u8; 4096];
			loop {
				let Ok((len, src)) = socket.recv_from(&mut buf).await else {
					break;
				};
				let Ok(query) = Message::from_vec(&buf[..len]) else {
					continue;
				};
				let mut response = Message::new();
				response.set_id(query.id());
				response.set_message_type(MessageType::Response);
				response.set_op_code(OpCode::Query);
				response.set_recursion_desired(query.recursion_desired());
				response.set_recursion_available(true);
				response.set_response_code(ResponseCode::NoError);
				for q in query.queries() {
					response.add_query(q.clone());
					if q.query_type() == RecordType::A {
						response.add_answer(Record::from_rdata(
							q.name().clone(), 60, RData::A(A::new(127, 0, 0, 1)),
						));
					}
				}
				let bytes = response.to_vec().unwrap();
				let _ = socket.send_to(&bytes, src).await;
			}
		});
		addr
	}

	/// An address a UDP socket refuses to connect to without SO_BROADCAST.
	pub fn unusable_endpoint() -> crate::transport::Endpoint {
		"255.255.255.255:53".parse().unwrap()
	}
}

#[cfg(test)]
mod tests {
	use super::testing::{spawn_answering_server, unusable_endpoint};
	use super::*;

	#[tokio::test]
	async fn test_first_usable_skips_broken_endpoint() {
		let server = spawn_answering_server().await;
		let endpoints = vec![unusable_endpoint(), Endpoint::from(server)];
		assert_eq!(first_usable(&endpoints).await, Some(server));
	}

	#[tokio::test]
	async fn test_first_usable_keeps_order() {
		let a = spawn_answering_server().await;
		let b = spawn_answering_server().await;
		let endpoints = vec![Endpoint::from(a), Endpoint::from(b)];
		assert_eq!(first_usable(&endpoints).await, Some(a));
	}

	#[tokio::test]
	async fn test_lookup_succeeds_against_local_server() {
		let server = spawn_answering_server().await;
		let result = HickoryLookup
			.lookup(&[Endpoint::from(server)], "www.example.com.", Duration::from_secs(2))
			.await;
		assert!(result.is_ok(), "lookup failed: {:?}", result);
	}

	#[tokio::test]
	async fn test_lookup_falls_back_to_second_endpoint() {
		let server = spawn_answering_server().await;
		let endpoints = vec![unusable_endpoint(), Endpoint::from(server)];
		let result = HickoryLookup
			.lookup(&endpoints, "www.example.com.", Duration::from_secs(2))
			.await;
		assert!(result.is_ok(), "lookup failed: {:?}", result);
	}

	#[tokio::test]
	async fn test_lookup_all_endpoints_unusable() {
		let result = HickoryLookup
			.lookup(&[unusable_endpoint()], "www.example.com.", Duration::from_millis(200))
			.await;
		assert!(matches!(result, Err(AttemptError::Unreachable(1))));
	}

	#[test]
	fn test_timeout_message() {
		let e = AttemptError::Timeout(Duration::from_millis(1200));
		assert_eq!(e.to_string(), "timed out after 1200 ms");
	}
}
