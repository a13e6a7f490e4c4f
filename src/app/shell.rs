use crate::api::client::MediaApi;
use crate::api::types::{ApiVersion, FileRef, Metadata};
use crate::browse::hydrate::fetch_thumbnails;
use crate::browse::search::{fetch_results, parse_tags, LastSubmit, SearchResult};
use crate::browse::store::{HydrationTicket, ResultStore};
use crate::browse::tasks::{Sequencer, TaskSlot};
use crate::core::error::Result;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Completions reported by background tasks to the shell
#[derive(Debug)]
pub enum AppEvent {
    ApiVersion(Result<ApiVersion>),
    SearchCompleted {
        seq: u64,
        tags: Vec<String>,
        result: Result<Vec<SearchResult>>,
    },
    ThumbnailsLoaded {
        ticket: HydrationTicket,
        thumbnails: Vec<Option<Bytes>>,
    },
    FileSaved {
        file_id: u64,
        result: Result<PathBuf>,
    },
}

/// Top-level browser state.
///
/// The shell is the only writer of its state. Network work runs in spawned
/// tasks that report back as `AppEvent`s; the owner of the receiver feeds
/// them to `handle_event`. Each kind of work keeps at most one task alive and
/// completions from superseded searches are discarded by sequence number.
pub struct AppShell {
    api: Arc<dyn MediaApi>,
    events: mpsc::UnboundedSender<AppEvent>,
    download_dir: PathBuf,

    search_value: String,
    last_submit: LastSubmit,
    store: ResultStore,
    api_version: Option<ApiVersion>,
    status: Option<String>,

    search_seq: Sequencer,
    search_task: TaskSlot,
    thumbnail_task: TaskSlot,
    download_task: TaskSlot,
}

impl AppShell {
    pub fn new(
        api: Arc<dyn MediaApi>,
        page_size: usize,
        download_dir: PathBuf,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let shell = Self {
            api,
            events,
            download_dir,
            search_value: String::new(),
            last_submit: LastSubmit::default(),
            store: ResultStore::new(page_size),
            api_version: None,
            status: None,
            search_seq: Sequencer::default(),
            search_task: TaskSlot::default(),
            thumbnail_task: TaskSlot::default(),
            download_task: TaskSlot::default(),
        };
        (shell, rx)
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn search_value(&self) -> &str {
        &self.search_value
    }

    pub fn set_search_value(&mut self, value: impl Into<String>) {
        self.search_value = value.into();
    }

    pub fn search_value_mut(&mut self) -> &mut String {
        &mut self.search_value
    }

    pub fn last_submitted(&self) -> &[String] {
        self.last_submit.tags()
    }

    pub fn api_version(&self) -> Option<ApiVersion> {
        self.api_version
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        self.search_task.is_running()
    }

    /// Direct streaming URL for a file, when the client can produce one
    pub fn stream_url(&self, file_id: u64) -> Option<String> {
        self.api.stream_url(file_id)
    }

    /// Look up the server's API version in the background
    pub fn request_api_version(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.api_version().await;
            let _ = tx.send(AppEvent::ApiVersion(result));
        });
    }

    /// Submit the current search text
    pub fn submit_search(&mut self) -> Option<u64> {
        let tags = parse_tags(&self.search_value);
        self.search_tags(tags)
    }

    /// Search for `tags` unless they equal the last submission as a set.
    /// Returns the sequence number of the issued search, or `None` when the
    /// resubmission was a no-op.
    pub fn search_tags(&mut self, tags: Vec<String>) -> Option<u64> {
        if !self.last_submit.submit(tags) {
            tracing::debug!(tags = ?self.last_submit.tags(), "same search resubmitted, skipping");
            return None;
        }

        let tags = self.last_submit.tags().to_vec();
        let seq = self.search_seq.issue();
        tracing::info!(seq, ?tags, "searching");
        self.status = Some(format!("Searching {}...", tags.join(" ")));

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        self.search_task.spawn(async move {
            let result = fetch_results(api.as_ref(), &tags).await;
            let _ = tx.send(AppEvent::SearchCompleted { seq, tags, result });
        });
        Some(seq)
    }

    /// Tag picked in the viewer: close the viewer and search for exactly
    /// that tag, spaces included.
    pub fn search_from_tag(&mut self, tag: &str) -> Option<u64> {
        self.store.close();
        self.search_value = tag.to_string();
        self.search_tags(vec![tag.to_string()])
    }

    /// Apply one background completion
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ApiVersion(Ok(version)) => {
                tracing::info!(
                    api = version.version,
                    hydrus = version.hydrus_version,
                    "connected"
                );
                self.api_version = Some(version);
            }
            AppEvent::ApiVersion(Err(e)) => {
                tracing::error!(error = %e, "api version lookup failed");
                self.status = Some(format!("Could not reach the client API: {}", e));
            }
            AppEvent::SearchCompleted { seq, tags, result } => {
                if !self.search_seq.is_latest(seq) {
                    tracing::debug!(seq, latest = self.search_seq.latest(), "stale search dropped");
                    return;
                }
                match result {
                    Ok(results) => {
                        tracing::info!(seq, count = results.len(), "search completed");
                        self.status = Some(format!(
                            "{} results for {}",
                            results.len(),
                            tags.join(" ")
                        ));
                        self.thumbnail_task.cancel();
                        self.store.reset(results);
                        self.hydrate_visible_page();
                    }
                    Err(e) => {
                        tracing::error!(seq, error = %e, "search failed");
                        self.status = Some(match e.status() {
                            Some(401) | Some(403) => {
                                format!("Search failed: check the access key ({})", e)
                            }
                            _ => format!("Search failed: {}", e),
                        });
                        // Resubmitting the same query retries.
                        self.last_submit.clear();
                    }
                }
            }
            AppEvent::ThumbnailsLoaded { ticket, thumbnails } => {
                self.store.complete_hydration(&ticket, thumbnails);
            }
            AppEvent::FileSaved { file_id, result } => match result {
                Ok(path) => {
                    tracing::info!(file_id, path = %path.display(), "file saved");
                    self.status = Some(format!("Saved {}", path.display()));
                }
                Err(e) => {
                    tracing::error!(file_id, error = %e, "file download failed");
                    self.status = Some(format!("Download failed: {}", e));
                }
            },
        }
    }

    /// Start fetching thumbnails for the visible page if it has none yet
    pub fn hydrate_visible_page(&mut self) -> bool {
        let Some(ticket) = self.store.begin_hydration() else {
            return false;
        };
        tracing::debug!(page = ticket.page, seq = ticket.seq, "hydrating page");

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        self.thumbnail_task.spawn(async move {
            let thumbnails = fetch_thumbnails(api.as_ref(), &ticket.ids).await;
            let _ = tx.send(AppEvent::ThumbnailsLoaded { ticket, thumbnails });
        });
        true
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        let shown = self.store.set_page(page);
        self.hydrate_visible_page();
        shown
    }

    pub fn next_page(&mut self) -> bool {
        let moved = self.store.next_page();
        if moved {
            self.hydrate_visible_page();
        }
        moved
    }

    pub fn prev_page(&mut self) -> bool {
        let moved = self.store.prev_page();
        if moved {
            self.hydrate_visible_page();
        }
        moved
    }

    pub fn open(&mut self, index_in_page: usize) -> bool {
        self.store.open(index_in_page).is_some()
    }

    pub fn close(&mut self) {
        self.store.close();
    }

    pub fn open_item(&self) -> Option<&SearchResult> {
        self.store.open_item()
    }

    /// Download the open file into the download directory
    pub fn save_open_item(&mut self) -> bool {
        let Some(metadata) = self.store.open_item().and_then(|r| r.metadata.clone()) else {
            return false;
        };
        let file_id = metadata.file_id;
        let path = self.download_dir.join(file_name(&metadata));
        self.status = Some(format!("Downloading {}...", file_id));

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        self.download_task.spawn(async move {
            let result = download(api.as_ref(), &FileRef::Id(file_id), &path).await;
            let _ = tx.send(AppEvent::FileSaved { file_id, result });
        });
        true
    }
}

/// `<hash><ext>`, falling back to the id when the hash is unknown
pub fn file_name(metadata: &Metadata) -> String {
    let stem = if metadata.hash.is_empty() {
        metadata.file_id.to_string()
    } else {
        metadata.hash.clone()
    };
    if metadata.ext.is_empty() {
        stem
    } else if metadata.ext.starts_with('.') {
        format!("{}{}", stem, metadata.ext)
    } else {
        format!("{}.{}", stem, metadata.ext)
    }
}

async fn download(api: &dyn MediaApi, file: &FileRef, path: &Path) -> Result<PathBuf> {
    let bytes = api.get_file(file, None).await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let mut metadata = Metadata {
            file_id: 4,
            ext: ".png".to_string(),
            ..Default::default()
        };
        assert_eq!(file_name(&metadata), "4.png");

        metadata.hash = "beef".to_string();
        metadata.ext = "webm".to_string();
        assert_eq!(file_name(&metadata), "beef.webm");

        metadata.ext.clear();
        assert_eq!(file_name(&metadata), "beef");
    }
}
