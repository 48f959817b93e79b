//! Grove Testkit - Deterministic Architect for Tests
//!
//! An in-memory stand-in for the server-side tree builder ("architect"):
//! it keeps team chains, builds real Merkle trees over their leaves,
//! signs main and hidden roots, and serves lookups through the same
//! [`grove_client::MerkleTransport`] trait production code talks to.
//! Publication is explicit (`publish_main`, `rebuild_hidden`) so tests
//! can drive the committed/uncommitted lifecycle step by step, and fault
//! injection flags let tests exercise every adversarial path without a
//! bespoke mock per test.
//!
//! Consumed as a dev-dependency; nothing here is production code.

#![forbid(unsafe_code)]

/// In-memory tree builder and transport
pub mod architect;

/// Test key generation
pub mod keys;

pub use architect::{FaultPlan, InMemoryArchitect};
pub use keys::generate_signing_key;

/// Initialize tracing output for a test process
///
/// Subscribes a fmt layer honoring `RUST_LOG` so failing scenario runs
/// can be replayed with client and architect logs visible. Safe to call
/// from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
