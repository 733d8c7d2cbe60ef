//! Gallery controller
//!
//! Wires user actions (sort and filter changes, search, favorites, deletion)
//! to the collection state, the batch renderer and the preference store. The
//! controller owns the current [`View`]; every change that alters ordering or
//! membership recomputes it and resets the renderer.

use std::num::NonZeroUsize;

use crate::error::{GalleryError, Result};
use crate::render::{Advance, Batch, BatchRenderer, VisibilityWatcher};
use crate::state::collection::{CollectionState, FilterConfig, SortConfig, View};
use crate::state::data::{MediaRecord, RecordId};
use crate::state::format;
use crate::state::preferences::{PreferenceStore, Preferences};

/// Totals shown in the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub records: usize,
    pub total_bytes: u64,
    pub favorites: usize,
}

impl Stats {
    pub fn megabytes(&self) -> String {
        format::megabytes(self.total_bytes)
    }

    pub fn gigabytes(&self) -> String {
        format::gigabytes(self.total_bytes)
    }
}

pub struct GalleryController<W, S> {
    collection: CollectionState,
    renderer: BatchRenderer<W>,
    preferences: Preferences<S>,
    view: View,
}

impl<W: VisibilityWatcher, S: PreferenceStore> GalleryController<W, S> {
    /// Restore sort and filter from the preference store
    pub fn new(preferences: Preferences<S>, batch_size: NonZeroUsize, watcher: W) -> Self {
        let collection = CollectionState::new(preferences.sort_config(), preferences.filter_config());
        Self {
            collection,
            renderer: BatchRenderer::new(batch_size, watcher),
            preferences,
            view: View::default(),
        }
    }

    pub fn sort(&self) -> SortConfig {
        self.collection.sort()
    }

    pub fn filter(&self) -> FilterConfig {
        self.collection.filter()
    }

    pub fn query(&self) -> &str {
        self.collection.query()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn record(&self, id: &RecordId) -> Option<&MediaRecord> {
        self.view.get(id)
    }

    /// Records revealed so far, in display order
    pub fn rendered_records(&self) -> Vec<&MediaRecord> {
        self.renderer
            .rendered_ids()
            .iter()
            .filter_map(|id| self.view.get(id))
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.renderer.subscription().is_some()
    }

    pub fn watcher_mut(&mut self) -> &mut W {
        self.renderer.watcher_mut()
    }

    pub fn preferences(&self) -> &Preferences<S> {
        &self.preferences
    }

    /// Install a freshly fetched record set and render its first batch
    pub fn load(&mut self, mut records: Vec<MediaRecord>) -> Batch {
        let favorites = self.preferences.favorites();
        for record in &mut records {
            record.favorite = favorites.contains(&record.id);
        }
        tracing::info!("Loaded {} records ({} favorites)", records.len(), favorites.len());
        self.collection.replace(records);
        self.refresh()
    }

    /// Persist and apply a new sort configuration
    pub fn set_sort(&mut self, sort: SortConfig) -> Result<Batch> {
        self.preferences.save_sort_config(&sort)?;
        self.collection.configure(sort, self.collection.filter());
        Ok(self.refresh())
    }

    /// Persist and apply a new filter configuration
    pub fn set_filter(&mut self, filter: FilterConfig) -> Result<Batch> {
        self.preferences.save_filter_config(&filter)?;
        self.collection.configure(self.collection.sort(), filter);
        Ok(self.refresh())
    }

    pub fn set_query(&mut self, query: &str) -> Batch {
        self.collection.set_query(query);
        self.refresh()
    }

    /// Visibility signal for a rendered element
    pub fn on_visible(&mut self, element: &RecordId) -> Advance {
        self.renderer.on_visible(element, &self.view)
    }

    /// Flip a favorite in place without resetting the grid. With favorites
    /// first active, the new order applies from the next reset.
    pub fn toggle_favorite(&mut self, id: &RecordId) -> Result<bool> {
        if self.collection.get(id).is_none() {
            return Err(GalleryError::NotFound(id.clone()));
        }

        let favorite = self.preferences.toggle_favorite(id)?;
        self.collection.set_favorite(id, favorite)?;
        if let Some(record) = self.view.get_mut(id) {
            record.favorite = favorite;
        }
        Ok(favorite)
    }

    /// Identity to send with a delete request
    pub fn acting_user(&self) -> Result<String> {
        self.preferences.identity().ok_or(GalleryError::Unauthorized)
    }

    pub fn identity(&self) -> Option<String> {
        self.preferences.identity()
    }

    pub fn set_identity(&mut self, name: &str) -> Result<()> {
        self.preferences.set_identity(name)?;
        tracing::info!("Identity set to {}", name.trim());
        Ok(())
    }

    /// Drop a record the server has deleted and re-render from the top
    pub fn confirm_deleted(&mut self, id: &RecordId) -> Result<Batch> {
        let removed = self.collection.remove(id)?;
        tracing::info!("Removed {} ({})", removed.title, removed.id);
        Ok(self.refresh())
    }

    pub fn stats(&self) -> Stats {
        let records = self.collection.records();
        Stats {
            records: records.len(),
            total_bytes: records.iter().map(|r| r.size_bytes).sum(),
            favorites: self.preferences.favorites().len(),
        }
    }

    fn refresh(&mut self) -> Batch {
        self.view = self.collection.current_view();
        self.renderer.reset(&self.view)
    }
}

impl<W, S> std::fmt::Debug for GalleryController<W, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryController")
            .field("records", &self.collection.records().len())
            .field("view", &self.view.len())
            .field("sort", &self.collection.sort())
            .field("filter", &self.collection.filter())
            .finish()
    }
}
