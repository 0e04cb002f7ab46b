//! Preview and control presentation

pub mod view;

pub use view::{Control, ControlAction, Emphasis, PlaybackPreview, PreviewPresenter, View};
