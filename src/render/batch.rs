use std::num::NonZeroUsize;

use super::watcher::VisibilityWatcher;
use crate::state::collection::View;
use crate::state::data::RecordId;

/// Ids revealed in one rendering step, in display order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    pub ids: Vec<RecordId>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Outcome of a continuation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Another batch was revealed
    Emitted(Batch),
    /// Nothing left to reveal for this view
    Exhausted,
    /// The last rendered id is gone from the view; pagination stops
    Stale(RecordId),
    /// Signal for an element that is not the current subscription
    Ignored,
}

/// Reveals a bounded number of visible records at a time.
///
/// The resume cursor is the last rendered *id*, located in the current view
/// on every advance, so deletions between batches never shift it.
#[derive(Debug)]
pub struct BatchRenderer<W> {
    batch_size: NonZeroUsize,
    rendered: Vec<RecordId>,
    subscribed: Option<RecordId>,
    watcher: W,
}

impl<W: VisibilityWatcher> BatchRenderer<W> {
    pub fn new(batch_size: NonZeroUsize, watcher: W) -> Self {
        Self {
            batch_size,
            rendered: Vec::new(),
            subscribed: None,
            watcher,
        }
    }

    /// Ids emitted since the last reset, in emission order
    pub fn rendered_ids(&self) -> &[RecordId] {
        &self.rendered
    }

    pub fn subscription(&self) -> Option<&RecordId> {
        self.subscribed.as_ref()
    }

    pub fn watcher_mut(&mut self) -> &mut W {
        &mut self.watcher
    }

    /// Replace the whole rendered list with the first batch of `view`
    pub fn reset(&mut self, view: &View) -> Batch {
        self.detach();
        self.rendered.clear();

        let batch = self.emit_from(view, 0);
        tracing::debug!(
            "Render reset: {} of {} records shown",
            batch.len(),
            view.visible().count()
        );
        batch
    }

    /// Reveal the next batch after the last rendered id
    pub fn advance(&mut self, view: &View) -> Advance {
        self.detach();

        let Some(last) = self.rendered.last().cloned() else {
            return Advance::Exhausted;
        };

        let Some(position) = view.position(&last) else {
            tracing::warn!("Last rendered record {} left the view; pagination stopped", last);
            return Advance::Stale(last);
        };

        let batch = self.emit_from(view, position + 1);
        if batch.is_empty() {
            Advance::Exhausted
        } else {
            Advance::Emitted(batch)
        }
    }

    /// Visibility callback: only the current subscription may advance
    pub fn on_visible(&mut self, element: &RecordId, view: &View) -> Advance {
        if self.subscribed.as_ref() != Some(element) {
            tracing::debug!("Ignoring visibility of {} (not subscribed)", element);
            return Advance::Ignored;
        }
        self.advance(view)
    }

    fn emit_from(&mut self, view: &View, start: usize) -> Batch {
        let remaining = view.records.get(start..).unwrap_or_default();
        let mut candidates = remaining.iter().filter(|r| !r.skip);

        let ids: Vec<RecordId> = candidates
            .by_ref()
            .take(self.batch_size.get())
            .map(|r| r.id.clone())
            .collect();
        let has_more = candidates.next().is_some();

        self.rendered.extend(ids.iter().cloned());

        if has_more {
            if let Some(last) = ids.last() {
                self.watcher.subscribe(last);
                self.subscribed = Some(last.clone());
            }
        }

        Batch { ids }
    }

    /// Drop the current subscription before any new one is made
    fn detach(&mut self) {
        if let Some(element) = self.subscribed.take() {
            self.watcher.unsubscribe(&element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{MediaRecord, Orientation, Quality, RecordDuration};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Subscribe(String),
        Unsubscribe(String),
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingWatcher {
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl VisibilityWatcher for RecordingWatcher {
        fn subscribe(&mut self, element: &RecordId) {
            self.calls.borrow_mut().push(Call::Subscribe(element.to_string()));
        }

        fn unsubscribe(&mut self, element: &RecordId) {
            self.calls.borrow_mut().push(Call::Unsubscribe(element.to_string()));
        }
    }

    fn record(id: &str, skip: bool) -> MediaRecord {
        MediaRecord {
            id: RecordId::from(id),
            title: id.to_string(),
            size_bytes: 0,
            modified_at: 0,
            duration: RecordDuration::Seconds(0),
            quality: Quality::SD,
            orientation: Orientation::Unknown,
            favorite: false,
            skip,
        }
    }

    fn view_of(ids: &[&str]) -> View {
        View {
            records: ids.iter().map(|id| record(id, false)).collect(),
        }
    }

    fn without(view: &View, id: &str) -> View {
        View {
            records: view
                .records
                .iter()
                .filter(|r| r.id.as_str() != id)
                .cloned()
                .collect(),
        }
    }

    fn renderer(size: usize) -> (BatchRenderer<RecordingWatcher>, Rc<RefCell<Vec<Call>>>) {
        let watcher = RecordingWatcher::default();
        let calls = watcher.calls.clone();
        (
            BatchRenderer::new(NonZeroUsize::new(size).unwrap(), watcher),
            calls,
        )
    }

    fn ids(batch: &Batch) -> Vec<&str> {
        batch.ids.iter().map(RecordId::as_str).collect()
    }

    #[test]
    fn test_resume_by_id_after_delete() {
        let (mut renderer, _) = renderer(2);
        let view = view_of(&["a", "b", "c", "d", "e"]);

        assert_eq!(ids(&renderer.reset(&view)), vec!["a", "b"]);

        match renderer.advance(&view) {
            Advance::Emitted(batch) => assert_eq!(ids(&batch), vec!["c", "d"]),
            other => panic!("unexpected {:?}", other),
        }

        let view = without(&view, "c");
        match renderer.advance(&view) {
            Advance::Emitted(batch) => assert_eq!(ids(&batch), vec!["e"]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(renderer.subscription(), None);
        assert_eq!(renderer.advance(&view), Advance::Exhausted);
    }

    #[test]
    fn test_skipped_records_are_not_emitted() {
        let (mut renderer, _) = renderer(2);
        let view = View {
            records: vec![
                record("a", true),
                record("b", false),
                record("c", true),
                record("d", false),
                record("e", false),
            ],
        };

        assert_eq!(ids(&renderer.reset(&view)), vec!["b", "d"]);
        assert_eq!(renderer.subscription(), Some(&RecordId::from("d")));
        assert_eq!(renderer.advance(&view), Advance::Emitted(Batch { ids: vec![RecordId::from("e")] }));
    }

    #[test]
    fn test_empty_view_renders_nothing() {
        let (mut renderer, calls) = renderer(3);
        let view = View {
            records: vec![record("a", true), record("b", true)],
        };

        assert!(renderer.reset(&view).is_empty());
        assert!(calls.borrow().is_empty());
        assert_eq!(renderer.advance(&view), Advance::Exhausted);
        assert!(renderer.reset(&View::default()).is_empty());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_single_batch_view_does_not_subscribe() {
        let (mut renderer, calls) = renderer(5);
        let view = view_of(&["a", "b", "c"]);

        assert_eq!(renderer.reset(&view).len(), 3);
        assert_eq!(renderer.subscription(), None);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_reset_unsubscribes_before_subscribing() {
        let (mut renderer, calls) = renderer(1);
        let view = view_of(&["a", "b", "c"]);

        renderer.reset(&view);
        renderer.reset(&view_of(&["x", "y"]));

        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Subscribe("a".into()),
                Call::Unsubscribe("a".into()),
                Call::Subscribe("x".into()),
            ]
        );
        assert_eq!(renderer.rendered_ids(), &[RecordId::from("x")]);
    }

    #[test]
    fn test_no_render_after_exhaustion() {
        let (mut renderer, _) = renderer(2);
        let view = view_of(&["a", "b", "c"]);

        renderer.reset(&view);
        assert!(matches!(
            renderer.on_visible(&RecordId::from("b"), &view),
            Advance::Emitted(_)
        ));
        // exhausted: stray signals for any element do nothing
        assert_eq!(renderer.on_visible(&RecordId::from("c"), &view), Advance::Ignored);
        assert_eq!(renderer.on_visible(&RecordId::from("b"), &view), Advance::Ignored);
        assert_eq!(renderer.rendered_ids().len(), 3);
    }

    #[test]
    fn test_stale_cursor_fails_soft() {
        let (mut renderer, _) = renderer(2);
        let view = view_of(&["a", "b", "c", "d"]);

        renderer.reset(&view);
        let view = without(&view, "b");

        assert_eq!(renderer.advance(&view), Advance::Stale(RecordId::from("b")));
        assert_eq!(renderer.subscription(), None);
    }

    #[test]
    fn test_batch_resumption_with_deletes() {
        let all: Vec<String> = (0..25).map(|i| format!("r{:02}", i)).collect();
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let mut view = view_of(&refs);
        let (mut renderer, _) = renderer(10);

        let mut shown = ids(&renderer.reset(&view))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        // two already rendered, non-final records are deleted mid-scroll
        view = without(&without(&view, "r03"), "r07");

        let advances = (all.len() + 9) / 10 - 1;
        for _ in 0..advances {
            match renderer.advance(&view) {
                Advance::Emitted(batch) => {
                    shown.extend(batch.ids.iter().map(|id| id.to_string()))
                }
                other => panic!("unexpected {:?}", other),
            }
        }

        let unique: HashSet<&String> = shown.iter().collect();
        assert_eq!(shown.len(), 25);
        assert_eq!(unique.len(), 25);
        assert_eq!(renderer.advance(&view), Advance::Exhausted);
    }
}
