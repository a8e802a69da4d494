//! Scroll affordances: the scroll-to-top button and anchor offsets

/// A floating button that appears once the reader has scrolled down
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollToTop {
    show_after: f32,
    visible: bool,
}

impl ScrollToTop {
    pub fn new(show_after: f32) -> Self {
        Self {
            show_after,
            visible: false,
        }
    }

    /// Track a new scroll offset. Returns `true` if visibility changed.
    pub fn update(&mut self, scroll_y: f32) -> bool {
        let visible = scroll_y > self.show_after;
        let changed = visible != self.visible;
        if changed {
            tracing::trace!(scroll_y, visible, "scroll-to-top visibility changed");
        }
        self.visible = visible;
        changed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Where activating the button scrolls to
    pub fn target(&self) -> f32 {
        0.0
    }
}

impl Default for ScrollToTop {
    fn default() -> Self {
        Self::new(300.0)
    }
}

/// Scroll offset that puts `section_top` just below a fixed nav bar
pub fn anchor_offset(section_top: f32, nav_height: f32) -> f32 {
    (section_top - nav_height).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_threshold_is_exclusive() {
        let mut button = ScrollToTop::default();
        assert!(!button.is_visible());

        assert!(!button.update(300.0));
        assert!(!button.is_visible());

        assert!(button.update(301.0));
        assert!(button.is_visible());
        assert!(!button.update(2000.0));

        assert!(button.update(0.0));
        assert!(!button.is_visible());
    }

    #[test]
    fn test_anchor_offset() {
        assert_eq!(anchor_offset(1000.0, 64.0), 936.0);
        assert_eq!(anchor_offset(0.0, 64.0), 0.0);
    }
}
