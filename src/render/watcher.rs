use crate::state::data::RecordId;

/// Edge-triggered notification source for "element entered viewing proximity".
///
/// A subscription fires at most once. The owner of the watcher reports the
/// fired element back to the renderer.
pub trait VisibilityWatcher {
    fn subscribe(&mut self, element: &RecordId);
    fn unsubscribe(&mut self, element: &RecordId);
}

/// Scroll state of the grid container, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    pub offset_y: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ScrollPosition {
    fn distance_to_end(&self) -> f32 {
        self.content_height - (self.offset_y + self.viewport_height)
    }
}

/// Watches the last rendered card of a vertically scrolling grid.
///
/// The subscribed element is always the last one rendered, so it counts as
/// visible once the viewport is within `margin` pixels of the content end.
#[derive(Debug, Clone)]
pub struct ScrollWatcher {
    target: Option<RecordId>,
    margin: f32,
}

impl ScrollWatcher {
    pub fn new(margin: f32) -> Self {
        Self {
            target: None,
            margin: margin.max(0.0),
        }
    }

    pub fn target(&self) -> Option<&RecordId> {
        self.target.as_ref()
    }

    /// Feed a scroll update. Returns the element whose subscription fired.
    pub fn observe(&mut self, position: ScrollPosition) -> Option<RecordId> {
        if self.target.is_some() && position.distance_to_end() <= self.margin {
            return self.target.take();
        }
        None
    }

    /// Fire the pending subscription without a scroll, e.g. from a
    /// "show more" action when the content does not fill the viewport.
    pub fn fire(&mut self) -> Option<RecordId> {
        self.target.take()
    }
}

impl VisibilityWatcher for ScrollWatcher {
    fn subscribe(&mut self, element: &RecordId) {
        self.target = Some(element.clone());
    }

    fn unsubscribe(&mut self, element: &RecordId) {
        if self.target.as_ref() == Some(element) {
            self.target = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset_y: f32) -> ScrollPosition {
        ScrollPosition {
            offset_y,
            viewport_height: 600.0,
            content_height: 2_000.0,
        }
    }

    #[test]
    fn test_fires_once_near_end() {
        let mut watcher = ScrollWatcher::new(100.0);
        watcher.subscribe(&RecordId::from("last"));

        assert_eq!(watcher.observe(at(0.0)), None);
        assert_eq!(watcher.observe(at(1_350.0)), Some(RecordId::from("last")));
        // edge-triggered: no second fire without a new subscription
        assert_eq!(watcher.observe(at(1_400.0)), None);
    }

    #[test]
    fn test_unsubscribe_only_matching() {
        let mut watcher = ScrollWatcher::new(0.0);
        watcher.subscribe(&RecordId::from("a"));
        watcher.unsubscribe(&RecordId::from("b"));
        assert_eq!(watcher.target(), Some(&RecordId::from("a")));

        watcher.unsubscribe(&RecordId::from("a"));
        assert_eq!(watcher.observe(at(1_400.0)), None);
    }

    #[test]
    fn test_fire_without_scroll() {
        let mut watcher = ScrollWatcher::new(100.0);
        assert_eq!(watcher.fire(), None);

        watcher.subscribe(&RecordId::from("last"));
        assert_eq!(watcher.fire(), Some(RecordId::from("last")));
        assert_eq!(watcher.observe(at(1_400.0)), None);
    }
}
