use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::data::{MediaRecord, Orientation, Quality, RecordId};
use crate::error::{GalleryError, Result};

/// Field used as the single active primary sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Size,
    Duration,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Date, SortKey::Size, SortKey::Duration];

    /// Comparable numeric projection of a record for this key
    fn project(self, record: &MediaRecord) -> i128 {
        match self {
            SortKey::Date => i128::from(record.modified_at),
            SortKey::Size => i128::from(record.size_bytes),
            SortKey::Duration => i128::from(record.duration.total_seconds()),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SortKey::Date => "Date",
            SortKey::Size => "Size",
            SortKey::Duration => "Duration",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Ordering of the view: favorites tiebreak ahead of one primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    /// `None` keeps the input order
    pub key: Option<SortKey>,
    pub direction: SortDirection,
    pub favorites_first: bool,
}

impl Default for SortConfig {
    /// Newest first, no favorites tiebreak
    fn default() -> Self {
        Self {
            key: Some(SortKey::Date),
            direction: SortDirection::Descending,
            favorites_first: false,
        }
    }
}

impl SortConfig {
    fn compare(&self, a: &MediaRecord, b: &MediaRecord) -> Ordering {
        if self.favorites_first && a.favorite != b.favorite {
            return if a.favorite {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        let Some(key) = self.key else {
            return Ordering::Equal;
        };

        let difference = key.project(a) - key.project(b);
        let ordering = difference.cmp(&0);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Independent predicates; `None` means "all"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub orientation: Option<Orientation>,
    pub quality: Option<Quality>,
}

impl FilterConfig {
    pub fn accepts(&self, record: &MediaRecord) -> bool {
        self.orientation.map_or(true, |o| record.orientation == o)
            && self.quality.map_or(true, |q| record.quality == q)
    }
}

/// Sorted, filter-annotated projection of the collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub records: Vec<MediaRecord>,
}

impl View {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of an id, looked up fresh on every call
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| &r.id == id)
    }

    pub fn get(&self, id: &RecordId) -> Option<&MediaRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn visible(&self) -> impl Iterator<Item = &MediaRecord> {
        self.records.iter().filter(|r| !r.skip)
    }

    pub(crate) fn get_mut(&mut self, id: &RecordId) -> Option<&mut MediaRecord> {
        self.records.iter_mut().find(|r| &r.id == id)
    }
}

/// Holds the record set of one fetch cycle and the active configuration
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    records: Vec<MediaRecord>,
    sort: SortConfig,
    filter: FilterConfig,
    query: String,
}

impl CollectionState {
    pub fn new(sort: SortConfig, filter: FilterConfig) -> Self {
        Self {
            records: Vec::new(),
            sort,
            filter,
            query: String::new(),
        }
    }

    /// Record the active configuration; the backing collection is untouched
    pub fn configure(&mut self, sort: SortConfig, filter: FilterConfig) {
        self.sort = sort;
        self.filter = filter;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn filter(&self) -> FilterConfig {
        self.filter
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the backing collection with a freshly fetched one
    pub fn replace(&mut self, records: Vec<MediaRecord>) {
        self.records = records;
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&MediaRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Remove a record after the server confirmed its deletion
    pub fn remove(&mut self, id: &RecordId) -> Result<MediaRecord> {
        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| GalleryError::NotFound(id.clone()))?;
        Ok(self.records.remove(index))
    }

    pub fn set_favorite(&mut self, id: &RecordId, favorite: bool) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| GalleryError::NotFound(id.clone()))?;
        record.favorite = favorite;
        Ok(())
    }

    /// View over the backing collection under the current configuration
    pub fn current_view(&self) -> View {
        self.view(&self.records)
    }

    /// Order and annotate `records` under the current configuration.
    ///
    /// The input is never mutated: the result holds fresh copies whose `skip`
    /// flags are recomputed in full. Sorting is stable, so records tied on the
    /// active key keep their input order.
    pub fn view(&self, records: &[MediaRecord]) -> View {
        let mut records: Vec<MediaRecord> = records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.skip = !self.accepts(&record);
                record
            })
            .collect();

        records.sort_by(|a, b| self.sort.compare(a, b));

        View { records }
    }

    fn accepts(&self, record: &MediaRecord) -> bool {
        self.filter.accepts(record)
            && (self.query.is_empty() || record.title.to_lowercase().contains(&self.query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::RecordDuration;

    fn record(id: &str, modified_at: i64, favorite: bool) -> MediaRecord {
        MediaRecord {
            id: RecordId::from(id),
            title: format!("clip {}", id),
            size_bytes: 0,
            modified_at,
            duration: RecordDuration::Seconds(0),
            quality: Quality::HD,
            orientation: Orientation::Landscape,
            favorite,
            skip: false,
        }
    }

    fn ids(view: &View) -> Vec<&str> {
        view.records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_favorites_first_then_date_desc() {
        let records = vec![
            record("1", 100, false),
            record("2", 200, true),
            record("3", 150, false),
        ];
        let state = CollectionState::new(
            SortConfig {
                key: Some(SortKey::Date),
                direction: SortDirection::Descending,
                favorites_first: true,
            },
            FilterConfig::default(),
        );

        assert_eq!(ids(&state.view(&records)), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let records = vec![
            record("a", 100, false),
            record("b", 50, false),
            record("c", 100, false),
            record("d", 100, false),
        ];
        let mut state = CollectionState::default();
        state.configure(
            SortConfig {
                key: Some(SortKey::Date),
                direction: SortDirection::Descending,
                favorites_first: false,
            },
            FilterConfig::default(),
        );
        assert_eq!(ids(&state.view(&records)), vec!["a", "c", "d", "b"]);

        state.configure(
            SortConfig {
                key: Some(SortKey::Date),
                direction: SortDirection::Ascending,
                favorites_first: false,
            },
            FilterConfig::default(),
        );
        assert_eq!(ids(&state.view(&records)), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_no_key_keeps_input_order() {
        let records = vec![record("x", 3, false), record("y", 1, true), record("z", 2, false)];
        let state = CollectionState::new(
            SortConfig {
                key: None,
                direction: SortDirection::Ascending,
                favorites_first: false,
            },
            FilterConfig::default(),
        );
        assert_eq!(ids(&state.view(&records)), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_duration_strings_sort_numerically() {
        let mut long = record("long", 0, false);
        long.duration = RecordDuration::Formatted("10:00".into());
        let mut short = record("short", 0, false);
        short.duration = RecordDuration::Formatted("9:59".into());
        let mut mid = record("mid", 0, false);
        mid.duration = RecordDuration::Seconds(599);

        let state = CollectionState::new(
            SortConfig {
                key: Some(SortKey::Duration),
                direction: SortDirection::Descending,
                favorites_first: false,
            },
            FilterConfig::default(),
        );
        // 9:59 and 599 seconds tie and keep input order
        assert_eq!(
            ids(&state.view(&[short, long, mid])),
            vec!["long", "short", "mid"]
        );
    }

    #[test]
    fn test_filter_flags_instead_of_removing() {
        let mut portrait = record("p", 1, false);
        portrait.orientation = Orientation::Portrait;
        let mut uhd = record("u", 2, false);
        uhd.quality = Quality::FourK;
        let plain = record("l", 3, false);

        let state = CollectionState::new(
            SortConfig::default(),
            FilterConfig {
                orientation: Some(Orientation::Landscape),
                quality: Some(Quality::HD),
            },
        );
        let view = state.view(&[portrait, uhd, plain]);

        assert_eq!(view.len(), 3);
        let skipped: Vec<&str> = view
            .records
            .iter()
            .filter(|r| r.skip)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(skipped, vec!["u", "p"]);
        assert_eq!(view.visible().count(), 1);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut records = vec![record("a", 1, false), record("b", 2, false), record("c", 3, true)];
        records[1].quality = Quality::SD;
        let state = CollectionState::new(
            SortConfig::default(),
            FilterConfig {
                orientation: None,
                quality: Some(Quality::HD),
            },
        );

        let once = state.view(&records);
        let twice = state.view(&once.records);
        let skipped = |v: &View| {
            let mut ids: Vec<String> = v
                .records
                .iter()
                .filter(|r| r.skip)
                .map(|r| r.id.to_string())
                .collect();
            ids.sort();
            ids
        };
        assert_eq!(skipped(&once), skipped(&twice));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_skip_recomputed_on_reconfigure() {
        let mut sd = record("sd", 1, false);
        sd.quality = Quality::SD;
        let mut state = CollectionState::new(
            SortConfig::default(),
            FilterConfig {
                orientation: None,
                quality: Some(Quality::HD),
            },
        );
        state.replace(vec![sd]);
        assert!(state.current_view().records[0].skip);

        state.configure(SortConfig::default(), FilterConfig::default());
        assert!(!state.current_view().records[0].skip);
        // the backing collection never carries view flags
        assert!(!state.records()[0].skip);
    }

    #[test]
    fn test_view_does_not_mutate_input() {
        let records = vec![record("a", 1, false), record("b", 2, false)];
        let state = CollectionState::new(
            SortConfig::default(),
            FilterConfig {
                orientation: Some(Orientation::Portrait),
                quality: None,
            },
        );
        let view = state.view(&records);
        assert!(view.records.iter().all(|r| r.skip));
        assert!(records.iter().all(|r| !r.skip));
        assert_eq!(records[0].id.as_str(), "a");
    }

    #[test]
    fn test_query_composes_with_filter() {
        let mut cat = record("cat", 1, false);
        cat.title = "Cat Video".into();
        let mut dog = record("dog", 2, false);
        dog.title = "dog video".into();
        let mut state = CollectionState::default();
        state.set_query("  CAT ");
        state.replace(vec![cat, dog]);

        let view = state.current_view();
        let visible: Vec<&str> = view.visible().map(|r| r.id.as_str()).collect();
        assert_eq!(visible, vec!["cat"]);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut state = CollectionState::default();
        state.replace(vec![record("a", 1, false)]);

        assert!(matches!(
            state.remove(&RecordId::from("zzz")),
            Err(GalleryError::NotFound(_))
        ));
        assert_eq!(state.records().len(), 1);

        let removed = state.remove(&RecordId::from("a")).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert!(state.records().is_empty());
    }
}
