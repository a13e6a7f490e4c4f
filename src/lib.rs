// Core functionality
pub mod core {
    pub mod config;
    pub mod error;
    pub mod logging;
}

// Client API access
pub mod api {
    pub mod client;
    pub mod types;
}

// Result paging & hydration
pub mod browse {
    pub mod hydrate;
    pub mod pagination;
    pub mod search;
    pub mod store;
    pub mod tags;
    pub mod tasks;
}

// Top-level state
pub mod app {
    pub mod shell;
}

// User interfaces
pub mod ui {
    pub mod cli;
    pub mod tui;
}

// Re-export commonly used types
pub use crate::core::error::{Error, Result};
pub use crate::core::config::{Config, Settings};
pub use crate::api::client::{HydrusClient, MediaApi};
pub use crate::api::types::{ApiVersion, ByteRange, FileRef, Metadata, MetadataQuery};
pub use crate::browse::pagination::{PagerButton, Paginator};
pub use crate::browse::search::{fetch_results, SearchResult};
pub use crate::browse::store::ResultStore;
pub use crate::app::shell::{AppEvent, AppShell};
pub use crate::ui::cli::Cli;
pub use crate::ui::tui::BrowserTui;
