use std::time::{Duration, Instant};

use bytes::Bytes;
use form_urlencoded::Serializer;
use hyper::{
    Request, StatusCode,
    http::{self, request, uri::Uri},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tap::TapFallible;

use crate::{
    model::LectureRecord,
    prelude::*,
    util::{http_client, send_request, HttpClient, HttpHost, RequestBody},
};
use super::{
    err::{conflict, invalid_input, not_authorized, unavailable},
    LectureSource, NewLecture, SourceConfig, SourceResult,
};


/// Postgres error code for unique constraint violations. The only unique
/// column we can violate by inserting is the video URL.
const UNIQUE_VIOLATION: &str = "23505";

/// Talks to a PostgREST-style REST interface of the lecture service.
pub(crate) struct RestSource {
    http_client: HttpClient,
    host: HttpHost,
    api_key: SecretString,
    access_token: Option<SecretString>,
    table: String,
    rank_column: String,
    timeout: Duration,
}

/// Error body returned by the REST interface.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl RestSource {
    pub(crate) fn new(config: &SourceConfig, access_token: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            http_client: http_client()?,
            host: config.host.clone(),
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
            access_token,
            table: config.table.clone(),
            rank_column: config.rank_column.clone(),
            timeout: config.request_timeout,
        })
    }

    fn authed_req_builder(&self, pq: &str) -> (Uri, request::Builder) {
        let uri = self.host.with_path_and_query(pq);
        let bearer = self.access_token.as_ref().unwrap_or(&self.api_key);
        let builder = Request::builder()
            .uri(&uri)
            .header("apikey", self.api_key.expose_secret())
            .header(http::header::AUTHORIZATION, format!("Bearer {}", bearer.expose_secret()));

        (uri, builder)
    }

    /// Sends the request with our timeout. Every failure to get a response
    /// counts as the source being unavailable.
    async fn send(&self, req: Request<RequestBody>) -> SourceResult<(StatusCode, Bytes)> {
        send_request(&self.http_client, req, self.timeout).await
            .map(|(parts, body)| (parts.status, body))
            .map_err(|e| unavailable!("{e:#}"))
    }
}

impl LectureSource for RestSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> SourceResult<Vec<LectureRecord>> {
        let before = Instant::now();
        let pq = page_path_and_query(&self.table, &self.rank_column, page, page_size);
        let (uri, builder) = self.authed_req_builder(&pq);
        let req = builder
            .body(RequestBody::new(Bytes::new()))
            .expect("bug: failed to build request");

        trace!("Fetching lecture page {page} (size {page_size}): GET {uri}");
        let (status, body) = self.send(req).await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&body).ok()
                .and_then(|e| e.message)
                .unwrap_or_default();
            return Err(unavailable!("lecture service returned unexpected HTTP code {status} {detail}"));
        }

        let records = serde_json::from_slice::<Vec<LectureRecord>>(&body)
            .tap_err(|_| trace!("Unparsable body: {}", String::from_utf8_lossy(&body)))
            .map_err(|e| unavailable!("failed to deserialize lecture page: {e}"))?;

        debug!(
            "Received {} KiB ({} lectures) for page {page} (in {:.2?})",
            body.len() / 1024,
            records.len(),
            before.elapsed(),
        );

        Ok(records)
    }

    async fn create_record(&self, record: &NewLecture) -> SourceResult<()> {
        if self.access_token.is_none() {
            return Err(not_authorized!("creating lectures requires being signed in"));
        }

        let body = serde_json::to_vec(record).expect("failed to serialize new lecture");
        let (uri, builder) = self.authed_req_builder(&format!("/rest/v1/{}", self.table));
        let req = builder
            .method(http::Method::POST)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header("Prefer", "return=minimal")
            .body(RequestBody::from(body))
            .expect("bug: failed to build request");

        debug!("Creating lecture '{}' ({}): POST {uri}", record.title, record.video_url);
        let (status, body) = self.send(req).await?;
        if status.is_success() {
            info!("Created lecture '{}'", record.title);
            return Ok(());
        }

        let error = serde_json::from_slice::<ErrorBody>(&body).ok();
        let message = error.as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| format!("HTTP {status}"));
        let is_unique_violation = error.as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == UNIQUE_VIOLATION);

        Err(match status {
            _ if is_unique_violation || status == StatusCode::CONFLICT => {
                conflict!("This video URL is already in use.")
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                not_authorized!("{message}")
            }
            s if s.is_client_error() => invalid_input!("{message}"),
            _ => unavailable!("creating lecture failed: {message}"),
        })
    }
}


/// Builds path and query of the request for one page. Pages are 1-based.
fn page_path_and_query(table: &str, rank_column: &str, page: u32, page_size: u32) -> String {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);

    // The ID as secondary key makes the order total, so that pages do not
    // overlap or skip records with equal rank.
    let query = Serializer::new(String::new())
        .append_pair("select", "*")
        .append_pair("order", &format!("{rank_column}.desc,id.asc"))
        .append_pair("offset", &offset.to_string())
        .append_pair("limit", &page_size.to_string())
        .finish();

    format!("/rest/v1/{table}?{query}")
}
