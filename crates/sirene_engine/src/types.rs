use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use sirene_core::{Etablissement, ResultRow, SirenParseError};

/// Cooperative stop signal shared between the driving side (a Ctrl-C
/// handler, a UI button) and the fetch loops, which poll it between
/// network calls. Cloning hands out another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask running fetches to stop at their next checkpoint.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous stop request so the flag can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notifications emitted while resolving identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The batch moved on to the identifier at `index` (zero-based).
    SirenStarted {
        index: usize,
        total: usize,
        siren: String,
    },
    /// One page was fetched and normalized. `page` counts successful
    /// pages; `rows` is the running row count for this identifier.
    PageFetched { siren: String, page: u32, rows: usize },
    /// One identifier finished with `rows` rows after dedup.
    SirenCompleted {
        index: usize,
        total: usize,
        siren: String,
        rows: usize,
    },
}

/// Everything one identifier's fetch produced: normalized rows (filtered,
/// deduplicated, ordered by SIRET) plus the raw records exactly as the
/// registry returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SirenFetch {
    pub rows: Vec<ResultRow>,
    pub raw: Vec<Etablissement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidSiren(#[from] SirenParseError),
    #[error(
        "401 Unauthorized: the registry rejected the API key; check the Sirene \
         subscription and the X-INSEE-Api-Key-Integration header"
    )]
    Unauthorized,
    #[error("400 Bad Request for {url}: {body}")]
    BadRequest { url: String, body: String },
    #[error("rate limited: gave up after {retries} consecutive 429 responses")]
    RateLimitExceeded { retries: u32 },
    #[error("unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unreadable response payload: {0}")]
    Decode(String),
    #[error("safety stop: page limit of {pages} reached before the result set was exhausted")]
    PageLimitReached { pages: u32 },
    #[error("stop requested")]
    Cancelled,
}
