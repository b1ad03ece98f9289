//! Types describing lecture records as they come from the remote source.

use std::{fmt, num::NonZeroU32};

use serde::{Deserialize, Serialize};

mod course;

pub(crate) use self::course::{Course, LEVELS};


/// Opaque identity of a lecture record. The remote source usually uses UUIDs,
/// but we never look inside.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct LectureId(pub(crate) String);

impl fmt::Display for LectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for LectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LectureId({})", self.0)
    }
}

/// Week of the course term a lecture belongs to. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub(crate) struct Week(NonZeroU32);

impl Week {
    /// The highest week number the upload form accepts.
    pub(crate) const MAX_UPLOAD: u32 = 52;

    pub(crate) fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    pub(crate) fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for Week {
    type Error = &'static str;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or("week number must be positive")
    }
}

impl From<Week> for u32 {
    fn from(value: Week) -> Self {
        value.get()
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for Week {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s.parse::<u32>().map_err(|e| format!("invalid week number: {e}"))?;
        Self::new(n).ok_or_else(|| "week number must be positive".into())
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LectureRecord {
    pub(crate) id: LectureId,
    pub(crate) title: String,
    pub(crate) instructor: String,
    #[serde(default)]
    pub(crate) description: Option<String>,

    /// Link to the video itself. Unique across the whole remote collection.
    pub(crate) video_url: String,
    pub(crate) thumbnail_url: String,
    pub(crate) week_number: Week,

    /// Key into the course taxonomy, see [`Course`].
    pub(crate) course_id: String,

    /// Popularity rank. The remote source sorts by this, descending.
    #[serde(default)]
    pub(crate) rating: f64,

    #[serde(default)]
    pub(crate) views: u64,
}

impl LectureRecord {
    /// Returns the course this lecture belongs to, if the ID is part of our
    /// taxonomy.
    pub(crate) fn course(&self) -> Option<&'static Course> {
        Course::find(&self.course_id)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_record() {
        let json = r#"{
            "id": "0b1c",
            "title": "Joins and normal forms",
            "description": null,
            "video_url": "https://videos.example.com/watch?v=42",
            "thumbnail_url": "https://videos.example.com/42.jpg",
            "instructor": "Ada",
            "week_number": 4,
            "course_id": "DBMS",
            "rating": 4.5,
            "views": 1200
        }"#;

        let record: LectureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, LectureId("0b1c".into()));
        assert_eq!(record.week_number.get(), 4);
        assert_eq!(record.description, None);
        assert_eq!(record.course().map(|c| c.code), Some("D203"));
    }

    #[test]
    fn missing_views_default_to_zero() {
        let json = r#"{
            "id": "a", "title": "t", "video_url": "v", "thumbnail_url": "th",
            "instructor": "i", "week_number": 1, "course_id": "CT", "rating": 1
        }"#;
        let record: LectureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.views, 0);
    }

    #[test]
    fn week_zero_is_rejected() {
        assert!(serde_json::from_str::<Week>("0").is_err());
        assert!("0".parse::<Week>().is_err());
        assert_eq!("7".parse::<Week>().unwrap().get(), 7);
    }
}
