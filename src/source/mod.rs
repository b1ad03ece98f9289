//! The remote lecture source: an ordered, paginated collection of lecture
//! records that we only ever read page by page and append to.

use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;

use crate::{model::{LectureRecord, Week}, util::HttpHost};

mod client;
pub(crate) mod err;

pub(crate) use self::{
    client::RestSource,
    err::{SourceError, SourceErrorKind, SourceResult},
};


/// Query surface over the remote lecture collection.
///
/// Implementations must return pages sorted by rank (descending) with a
/// stable tie-breaker, so that consecutive pages line up.
pub(crate) trait LectureSource {
    /// Fetches page `page` (1-based) with `page_size` records. A page with
    /// fewer records than `page_size` means the collection is exhausted.
    async fn fetch_page(&self, page: u32, page_size: u32) -> SourceResult<Vec<LectureRecord>>;

    /// Appends a new record to the remote collection. Fails with `Conflict`
    /// if the video URL is already used.
    async fn create_record(&self, record: &NewLecture) -> SourceResult<()>;
}

/// A record that is about to be created. The remote source assigns ID and
/// rank.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewLecture {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) video_url: String,
    pub(crate) thumbnail_url: String,
    pub(crate) instructor: String,
    pub(crate) week_number: Week,
    pub(crate) course_id: String,
}


#[derive(Debug, confique::Config)]
pub(crate) struct SourceConfig {
    /// Base URL of the lecture service (without path), e.g.
    /// "https://abcdefgh.supabase.co". Plain HTTP is only allowed for local
    /// hosts, unless the URL ends in "#allow-insecure".
    pub(crate) host: HttpHost,

    /// Public (anonymous) API key of the lecture service. Sent with every
    /// request.
    pub(crate) api_key: SecretString,

    /// Name of the table holding the lecture records.
    #[config(default = "lectures")]
    pub(crate) table: String,

    /// Column the collection is ranked by. Records are requested in
    /// descending order of this column.
    #[config(default = "rating")]
    pub(crate) rank_column: String,

    /// Maximum time a single request to the lecture service may take.
    #[config(default = "30s", deserialize_with = crate::config::deserialize_duration)]
    pub(crate) request_timeout: Duration,
}
