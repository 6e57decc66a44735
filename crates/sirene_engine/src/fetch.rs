use std::time::Duration;

use chrono::{Local, NaiveDate};
use log::{debug, warn};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;

use sirene_core::{field_selection, finalize_fetch_rows, siret_query, Siren, SiretResponse};

use crate::{CancelFlag, FetchError, ProgressEvent, SirenFetch};

/// Cursor value requesting the first page of a search.
pub const FIRST_PAGE_CURSOR: &str = "*";

/// Credential header understood by the registry.
const API_KEY_HEADER: &str = "X-INSEE-Api-Key-Integration";

const AGENT: &str = "sirene-batch/0.1";

/// How many bytes of a 400 response body are kept in the error.
const BODY_SNIPPET_BYTES: usize = 400;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Registry root, without the trailing `/siret`.
    pub base_url: String,
    /// Restrict the search to currently active establishments.
    pub only_active: bool,
    /// Registry snapshot date; today when unset.
    pub as_of_date: Option<NaiveDate>,
    /// Establishments per page (`nombre` request parameter).
    pub page_size: u32,
    /// Request budget per identifier, throttle retries included.
    pub max_pages: u32,
    /// Consecutive 429 responses tolerated before giving up.
    pub max_retries: u32,
    /// Politeness pause before every request.
    pub base_delay: Duration,
    /// The wait after the n-th consecutive 429 is `n` times this unit.
    pub backoff_unit: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.insee.fr/api-sirene/3.11".to_string(),
            only_active: true,
            as_of_date: None,
            page_size: 500,
            max_pages: 500,
            max_retries: 15,
            base_delay: Duration::from_millis(200),
            backoff_unit: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Resolves one parent identifier into its establishment rows.
#[async_trait::async_trait]
pub trait SiretSource: Send + Sync {
    async fn fetch_establishments(
        &self,
        siren: &str,
        cancel: &CancelFlag,
        sink: &dyn ProgressSink,
    ) -> Result<SirenFetch, FetchError>;
}

/// Client for the registry's `/siret` search endpoint. One instance holds
/// one connection pool and can be shared across an entire batch.
#[derive(Debug, Clone)]
pub struct SireneClient {
    client: reqwest::Client,
    api_key: String,
    settings: FetchSettings,
}

impl SireneClient {
    pub fn new(api_key: impl Into<String>, settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/siret", self.settings.base_url.trim_end_matches('/'))
    }

    fn as_of_date(&self) -> String {
        self.settings
            .as_of_date
            .unwrap_or_else(|| Local::now().date_naive())
            .to_string()
    }
}

#[async_trait::async_trait]
impl SiretSource for SireneClient {
    /// Walk the cursor pagination until the registry reports no further
    /// page. Progress is emitted per successful page; the stop flag is
    /// checked before every request.
    async fn fetch_establishments(
        &self,
        siren: &str,
        cancel: &CancelFlag,
        sink: &dyn ProgressSink,
    ) -> Result<SirenFetch, FetchError> {
        let siren = Siren::parse(siren)?;
        let url = self.endpoint();
        let query = siret_query(&siren, self.settings.only_active);
        let champs = field_selection();
        let date = self.as_of_date();
        let nombre = self.settings.page_size.to_string();

        let mut cursor = FIRST_PAGE_CURSOR.to_string();
        let mut raw = Vec::new();
        let mut rows = Vec::new();
        let mut throttled: u32 = 0;
        let mut pages: u32 = 0;
        let mut exhausted = false;

        // Bounds total requests, throttle retries included, so a cursor
        // that never terminates cannot loop forever.
        for _attempt in 0..self.settings.max_pages {
            if cancel.is_stopped() {
                return Err(FetchError::Cancelled);
            }

            tokio::time::sleep(self.settings.base_delay).await;

            let response = self
                .client
                .get(&url)
                .header(ACCEPT, "application/json")
                .header(API_KEY_HEADER, &self.api_key)
                .header(USER_AGENT, AGENT)
                .query(&[
                    ("q", query.as_str()),
                    ("date", date.as_str()),
                    ("nombre", nombre.as_str()),
                    ("curseur", cursor.as_str()),
                    ("champs", champs.as_str()),
                ])
                .send()
                .await
                .map_err(map_reqwest_error)?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                throttled += 1;
                if throttled > self.settings.max_retries {
                    return Err(FetchError::RateLimitExceeded {
                        retries: self.settings.max_retries,
                    });
                }
                let pause = self.settings.backoff_unit * throttled;
                warn!(
                    "registry throttled {siren}; waiting {}ms (retry {throttled}/{})",
                    pause.as_millis(),
                    self.settings.max_retries
                );
                tokio::time::sleep(pause).await;
                continue;
            }
            throttled = 0;

            let status = response.status();
            let final_url = response.url().to_string();
            if status == StatusCode::UNAUTHORIZED {
                return Err(FetchError::Unauthorized);
            }
            if status == StatusCode::BAD_REQUEST {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::BadRequest {
                    url: final_url,
                    body: body_snippet(&body),
                });
            }
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                    url: final_url,
                });
            }

            let page: SiretResponse = response.json().await.map_err(map_reqwest_error)?;
            pages += 1;

            // The query already narrows to active periods, but the filter
            // is re-applied per record: a period match does not guarantee
            // the current state is active.
            for etab in &page.etablissements {
                if self.settings.only_active && !etab.passes_active_filter() {
                    continue;
                }
                if let Some(row) = etab.to_row() {
                    rows.push(row);
                }
            }
            let next = page.header.curseur_suivant;
            raw.extend(page.etablissements);

            debug!("{siren}: page {pages}, {} rows so far", rows.len());
            sink.emit(ProgressEvent::PageFetched {
                siren: siren.to_string(),
                page: pages,
                rows: rows.len(),
            });

            match next.as_deref() {
                // A missing, empty or unchanged cursor means the result
                // set is exhausted.
                None | Some("") => {
                    exhausted = true;
                    break;
                }
                Some(next) if next == cursor.as_str() => {
                    exhausted = true;
                    break;
                }
                Some(next) => cursor = next.to_string(),
            }
        }

        if !exhausted {
            return Err(FetchError::PageLimitReached {
                pages: self.settings.max_pages,
            });
        }

        Ok(SirenFetch {
            rows: finalize_fetch_rows(rows),
            raw,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout(err.to_string());
    }
    if err.is_decode() {
        return FetchError::Decode(err.to_string());
    }
    FetchError::Network(err.to_string())
}

/// First `BODY_SNIPPET_BYTES` of an error body, cut on a char boundary.
fn body_snippet(body: &str) -> String {
    let mut end = BODY_SNIPPET_BYTES.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
