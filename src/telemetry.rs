// src/telemetry.rs
//! Tracing setup and log-safe text identifiers.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "sentiment_form=info,warn";

/// Install a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Uses `try_init`, so a subscriber already installed by the hosting runtime
/// stays in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Short SHA-256 prefix used in logs instead of raw user text.
pub fn text_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
