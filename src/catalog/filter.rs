use std::fmt;

use crate::model::{Course, LectureRecord, Week};


/// What the user chose to narrow the catalog down to. Every field that is
/// `None` does not constrain the result at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterCriteria {
    pub(crate) week: Option<Week>,
    pub(crate) course: Option<String>,

    /// Free text matched case-insensitively against title and instructor.
    /// Empty or whitespace-only queries count as unset.
    pub(crate) query: Option<String>,
}

impl FilterCriteria {
    /// Returns the lower-cased text query, or `None` if there is no effective
    /// one.
    fn needle(&self) -> Option<String> {
        self.query.as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(str::to_lowercase)
    }

    /// Returns `true` if no field constrains the result.
    pub(crate) fn is_unconstrained(&self) -> bool {
        self.week.is_none() && self.course.is_none() && self.needle().is_none()
    }

    /// Builds a predicate with the query already lower-cased, so that it can
    /// be used on many records.
    fn matcher(&self) -> impl Fn(&LectureRecord) -> bool + '_ {
        let needle = self.needle();
        move |record: &LectureRecord| {
            self.week.map_or(true, |week| record.week_number == week)
                && self.course.as_ref().map_or(true, |course| &record.course_id == course)
                && needle.as_ref().map_or(true, |needle| {
                    record.title.to_lowercase().contains(needle)
                        || record.instructor.to_lowercase().contains(needle)
                })
        }
    }
}

/// Heading describing the active week and course filters, e.g.
/// "Week 3 - DBMS Lectures".
impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let course = self.course.as_deref()
            .map(|id| Course::find(id).map_or(id, |c| c.name));

        match (self.week, course) {
            (Some(week), Some(course)) => write!(f, "Week {week} - {course} Lectures"),
            (Some(week), None) => write!(f, "Week {week} Lectures"),
            (None, Some(course)) => write!(f, "{course} Lectures"),
            (None, None) => write!(f, "All Lectures"),
        }
    }
}

/// Returns all records matching `criteria`, in their original order.
pub(crate) fn apply<'a>(
    records: &'a [LectureRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a LectureRecord> {
    let matches = criteria.matcher();
    records.iter().filter(|r| matches(*r)).collect()
}


#[cfg(test)]
mod tests {
    use crate::{
        catalog::tests::{lectures, fourteen_lectures},
        model::{LectureRecord, Week},
    };
    use super::{apply, FilterCriteria};

    fn ids(records: &[&LectureRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.0.clone()).collect()
    }

    fn week(n: u32) -> Option<Week> {
        Week::new(n)
    }

    #[test]
    fn unconstrained_returns_input() {
        let records = lectures(0..9);
        let out = apply(&records, &FilterCriteria::default());
        assert_eq!(out.len(), records.len());
        assert!(out.iter().zip(&records).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn week_filter_keeps_relative_order() {
        let records = fourteen_lectures();
        let criteria = FilterCriteria { week: week(3), ..Default::default() };
        let out = apply(&records, &criteria);
        assert_eq!(ids(&out), ["l4", "l11"]);
    }

    #[test]
    fn fields_are_combined_with_and() {
        let mut records = lectures(0..4);
        records[0].course_id = "DBMS".into();
        records[0].week_number = Week::new(2).unwrap();
        records[1].course_id = "DBMS".into();
        records[1].week_number = Week::new(5).unwrap();
        records[2].course_id = "JAVA".into();
        records[2].week_number = Week::new(2).unwrap();

        let criteria = FilterCriteria {
            week: week(2),
            course: Some("DBMS".into()),
            query: None,
        };
        assert_eq!(ids(&apply(&records, &criteria)), ["l0"]);

        let criteria = FilterCriteria { course: Some("DBMS".into()), ..Default::default() };
        assert_eq!(ids(&apply(&records, &criteria)), ["l0", "l1"]);
    }

    #[test]
    fn text_query_is_case_insensitive_substring() {
        let mut records = lectures(0..3);
        records[0].title = "Intro to Relational Algebra".into();
        records[1].instructor = "Prof. ALGEBRAIC".into();

        let criteria = FilterCriteria { query: Some("aLgEbRa".into()), ..Default::default() };
        assert_eq!(ids(&apply(&records, &criteria)), ["l0", "l1"]);

        let criteria = FilterCriteria { query: Some("no such lecture".into()), ..Default::default() };
        assert!(apply(&records, &criteria).is_empty());
    }

    #[test]
    fn blank_query_is_unset() {
        let records = lectures(0..5);
        for query in ["", "   ", "\t\n"] {
            let criteria = FilterCriteria { query: Some(query.into()), ..Default::default() };
            assert!(criteria.is_unconstrained());
            assert_eq!(apply(&records, &criteria).len(), 5);
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let records = fourteen_lectures();
        let criteria = FilterCriteria {
            week: week(3),
            query: Some("lecture".into()),
            ..Default::default()
        };

        let once = apply(&records, &criteria);
        let owned = once.iter().map(|r| (*r).clone()).collect::<Vec<_>>();
        let twice = apply(&owned, &criteria);
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(ids(&once), ids(&apply(&records, &criteria)));
    }

    #[test]
    fn unknown_course_matches_nothing() {
        let records = lectures(0..5);
        let criteria = FilterCriteria { course: Some("CS9000".into()), ..Default::default() };
        assert!(apply(&records, &criteria).is_empty());
        assert!(!criteria.is_unconstrained());
    }

    #[test]
    fn heading() {
        let mut criteria = FilterCriteria::default();
        assert_eq!(criteria.to_string(), "All Lectures");

        criteria.week = week(3);
        assert_eq!(criteria.to_string(), "Week 3 Lectures");

        criteria.course = Some("bsc-2".into());
        assert_eq!(criteria.to_string(), "Week 3 - Machine Learning Lectures");

        criteria.week = None;
        criteria.course = Some("CS9000".into());
        assert_eq!(criteria.to_string(), "CS9000 Lectures");
    }
}
