// Export modules for use in tests
pub mod app;
pub mod document;
pub mod event_source;
pub mod notification;
pub mod pagination;
pub mod panic_handler;
pub mod qa;
pub mod render;
pub mod settings;
pub mod theme;
pub mod view_state;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use app::{App, AppAction, Focus, run_app_with_event_source};
