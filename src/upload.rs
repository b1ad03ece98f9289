//! Turning user input into a new lecture record.

use hyper::Uri;

use crate::{
    auth::{IdentityProvider, User},
    catalog::{Catalog, FetchOutcome},
    model::{Course, Week},
    prelude::*,
    source::{
        err::{invalid_input, not_authorized},
        LectureSource, NewLecture, SourceResult,
    },
};


/// Raw input of the upload form. Nothing is validated yet.
#[derive(Debug, Clone, Default)]
pub(crate) struct LectureDraft {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) video_url: String,
    pub(crate) thumbnail_url: String,
    pub(crate) week_number: u32,
    pub(crate) course_id: String,
}

impl LectureDraft {
    /// Checks the draft and fills in the instructor from the signed-in user.
    pub(crate) fn validate(self, user: Option<&User>) -> SourceResult<NewLecture> {
        let user = user.ok_or_else(|| not_authorized!("Please log in to upload a lecture."))?;

        let title = self.title.trim();
        let video_url = self.video_url.trim();
        let thumbnail_url = self.thumbnail_url.trim();
        let course_id = self.course_id.trim();
        if [title, video_url, thumbnail_url, course_id].iter().any(|s| s.is_empty()) {
            return Err(invalid_input!("Please fill in all required fields."));
        }

        for (label, url) in [("video URL", video_url), ("thumbnail URL", thumbnail_url)] {
            if !is_web_url(url) {
                return Err(invalid_input!("{label} '{url}' is not a valid http(s) URL"));
            }
        }

        let week_number = Week::new(self.week_number)
            .filter(|w| w.get() <= Week::MAX_UPLOAD)
            .ok_or_else(|| invalid_input!(
                "week number has to be between 1 and {}, but is {}",
                Week::MAX_UPLOAD,
                self.week_number,
            ))?;

        if Course::find(course_id).is_none() {
            return Err(invalid_input!("unknown course '{course_id}' (see `lectern courses`)"));
        }

        Ok(NewLecture {
            title: title.to_owned(),
            description: self.description.trim().to_owned(),
            video_url: video_url.to_owned(),
            thumbnail_url: thumbnail_url.to_owned(),
            instructor: user.display_name().to_owned(),
            week_number,
            course_id: course_id.to_owned(),
        })
    }
}

fn is_web_url(s: &str) -> bool {
    s.parse::<Uri>().is_ok_and(|uri| {
        matches!(uri.scheme_str(), Some("http" | "https")) && uri.authority().is_some()
    })
}

/// Validates the draft for the currently signed-in user, creates the record
/// and refreshes the catalog. Errors of the identity provider are returned as
/// outer error, everything concerning the record itself as inner one.
pub(crate) async fn submit<S: LectureSource>(
    catalog: &Catalog<S>,
    identity: &impl IdentityProvider,
    draft: LectureDraft,
) -> Result<SourceResult<FetchOutcome>> {
    let user = identity.current_user().await
        .context("failed to determine signed-in user")?;
    let record = match draft.validate(user.as_ref()) {
        Ok(record) => record,
        Err(e) => return Ok(Err(e)),
    };

    debug!("Uploading lecture '{}' to week {} of {}", record.title, record.week_number, record.course_id);
    Ok(catalog.create_record(&record).await)
}
