//! Sticky auto-scroll for the message view.
//!
//! Auto-scroll engages on new content only while the viewport is already
//! near the bottom, so a user who scrolled up to read history is not yanked
//! back down by an arriving token.

/// Lines-from-bottom within which the view counts as "at the bottom".
const STICK_THRESHOLD_LINES: usize = 3;

/// Scroll position over the rendered message lines.
///
/// `offset` counts lines from the bottom; 0 means pinned to the newest
/// content.
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Lines scrolled up from the bottom.
    pub offset: usize,
    /// Total rendered content lines from the last layout pass.
    pub content_lines: usize,
    /// Viewport height in lines.
    pub viewport_lines: usize,
    /// True once the user manually scrolled away from the bottom.
    pub user_has_scrolled: bool,
    stick_threshold: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            content_lines: 0,
            viewport_lines: 0,
            user_has_scrolled: false,
            stick_threshold: STICK_THRESHOLD_LINES,
        }
    }

    pub fn with_stick_threshold(mut self, lines: usize) -> Self {
        self.stick_threshold = lines;
        self
    }

    fn max_offset(&self) -> usize {
        self.content_lines.saturating_sub(self.viewport_lines)
    }

    /// True while the viewport sits within the stickiness threshold of the
    /// newest content.
    pub fn is_near_bottom(&self) -> bool {
        self.offset <= self.stick_threshold
    }

    /// Record the dimensions from the last layout pass.
    pub fn set_dimensions(&mut self, content_lines: usize, viewport_lines: usize) {
        self.content_lines = content_lines;
        self.viewport_lines = viewport_lines;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Scroll up (toward older content). Returns true if the position moved.
    pub fn scroll_up(&mut self, lines: usize) -> bool {
        let old = self.offset;
        self.offset = (self.offset + lines).min(self.max_offset());
        self.user_has_scrolled = true;
        old != self.offset
    }

    /// Scroll down (toward newer content). Reaching the bottom re-enables
    /// auto-scroll. Returns true if the position moved.
    pub fn scroll_down(&mut self, lines: usize) -> bool {
        let old = self.offset;
        self.offset = self.offset.saturating_sub(lines);
        if self.offset == 0 {
            self.user_has_scrolled = false;
        }
        old != self.offset
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = 0;
        self.user_has_scrolled = false;
    }

    /// React to content growth (a new persisted message or partial-message
    /// growth of `grown_lines`).
    ///
    /// Near the bottom the view snaps down to follow the stream; further up
    /// the absolute position is held so the visible lines do not shift.
    pub fn on_content_grown(&mut self, grown_lines: usize) {
        self.content_lines += grown_lines;
        if self.is_near_bottom() {
            self.scroll_to_bottom();
        } else {
            self.offset = (self.offset + grown_lines).min(self.max_offset());
        }
    }
}
