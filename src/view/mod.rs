//! Render glue: the merged message timeline and scroll stickiness.

mod scroll;
mod timeline;

pub use scroll::ScrollState;
pub use timeline::TimelineEntry;
