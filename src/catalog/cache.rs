use std::collections::HashSet;

use crate::model::{LectureId, LectureRecord};


/// All records fetched in the current cache generation, in arrival order.
///
/// As pages arrive in rank order, arrival order is also rank order. The cache
/// only ever grows until it is reset completely; entries are never reordered
/// or replaced.
#[derive(Debug, Default)]
pub(crate) struct CatalogCache {
    records: Vec<LectureRecord>,
    ids: HashSet<LectureId>,
}

impl CatalogCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends all records of `page` whose ID is not yet known and returns how
    /// many were added. If a record shows up twice, the first-seen copy stays.
    pub(crate) fn ingest(&mut self, page: impl IntoIterator<Item = LectureRecord>) -> usize {
        let before = self.records.len();
        for record in page {
            if self.ids.insert(record.id.clone()) {
                self.records.push(record);
            }
        }

        self.records.len() - before
    }

    /// Removes all entries, starting a new cache generation.
    pub(crate) fn reset(&mut self) {
        self.records.clear();
        self.ids.clear();
    }

    pub(crate) fn all(&self) -> &[LectureRecord] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}


#[cfg(test)]
mod tests {
    use super::CatalogCache;
    use crate::catalog::tests::{lecture, lectures};

    fn ids(cache: &CatalogCache) -> Vec<&str> {
        cache.all().iter().map(|r| r.id.0.as_str()).collect()
    }

    #[test]
    fn ingest_appends_in_order() {
        let mut cache = CatalogCache::new();
        assert_eq!(cache.ingest(lectures(0..3)), 3);
        assert_eq!(cache.ingest(lectures(3..5)), 2);
        assert_eq!(ids(&cache), ["l0", "l1", "l2", "l3", "l4"]);
    }

    #[test]
    fn overlapping_pages_keep_first_seen_copy() {
        let mut cache = CatalogCache::new();
        cache.ingest(lectures(0..4));

        // The remote order shifted a bit, so the next page repeats two records,
        // this time with changed data.
        let mut shifted = lecture(2);
        shifted.title = "changed".into();
        let added = cache.ingest([shifted, lecture(3), lecture(4), lecture(5)]);

        assert_eq!(added, 2);
        assert_eq!(ids(&cache), ["l0", "l1", "l2", "l3", "l4", "l5"]);
        assert_eq!(cache.all()[2].title, lecture(2).title);
    }

    #[test]
    fn duplicates_within_one_page() {
        let mut cache = CatalogCache::new();
        assert_eq!(cache.ingest([lecture(1), lecture(1), lecture(0), lecture(1)]), 2);
        assert_eq!(ids(&cache), ["l1", "l0"]);
    }

    #[test]
    fn no_duplicates_for_arbitrary_ingest_sequences() {
        let mut cache = CatalogCache::new();
        for (start, end) in [(0, 5), (3, 8), (0, 2), (7, 12), (11, 12), (20, 20)] {
            cache.ingest(lectures(start..end));
        }

        let mut seen = std::collections::HashSet::new();
        assert!(cache.all().iter().all(|r| seen.insert(r.id.clone())));
        assert_eq!(cache.len(), 12);
        let expected = (0..12).map(|i| format!("l{i}")).collect::<Vec<_>>();
        assert_eq!(ids(&cache), expected);
    }

    #[test]
    fn reset_starts_over() {
        let mut cache = CatalogCache::new();
        cache.ingest(lectures(0..3));
        cache.reset();
        assert!(cache.all().is_empty());
        assert_eq!(cache.len(), 0);

        // Previously seen IDs are accepted again after a reset.
        assert_eq!(cache.ingest(lectures(1..2)), 1);
        assert_eq!(cache.all(), [lecture(1)]);
    }
}
