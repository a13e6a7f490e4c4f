#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use hydrus_browser::api::types::{
    ApiVersion, ByteRange, FileRef, Metadata, MetadataQuery, DEFAULT_TAG_SERVICE, STATUS_CURRENT,
};
use hydrus_browser::{Error, MediaApi, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory client API with call counters and scripted failures
#[derive(Default)]
pub struct MockApi {
    /// Search results keyed by the space-joined tag list
    searches: Mutex<HashMap<String, Vec<u64>>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    failing_searches: Mutex<HashSet<String>>,
    failing_thumbnails: Mutex<HashSet<u64>>,
    missing_metadata: Mutex<HashSet<u64>>,
    reverse_metadata: Mutex<bool>,

    pub search_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub thumbnail_calls: AtomicUsize,
    pub file_calls: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(self, tags: &str, ids: impl IntoIterator<Item = u64>) -> Self {
        self.searches
            .lock()
            .unwrap()
            .insert(tags.to_string(), ids.into_iter().collect());
        self
    }

    pub fn with_search_delay(self, tags: &str, delay: Duration) -> Self {
        self.search_delays
            .lock()
            .unwrap()
            .insert(tags.to_string(), delay);
        self
    }

    pub fn failing_search(self, tags: &str) -> Self {
        self.failing_searches.lock().unwrap().insert(tags.to_string());
        self
    }

    /// Let a search that used to fail succeed
    pub fn recover_search(&self, tags: &str) {
        self.failing_searches.lock().unwrap().remove(tags);
    }

    pub fn failing_thumbnail(self, id: u64) -> Self {
        self.failing_thumbnails.lock().unwrap().insert(id);
        self
    }

    pub fn without_metadata(self, id: u64) -> Self {
        self.missing_metadata.lock().unwrap().insert(id);
        self
    }

    /// Return metadata in the opposite order to the request
    pub fn reversed_metadata(self) -> Self {
        *self.reverse_metadata.lock().unwrap() = true;
        self
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_requests(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn thumbnails(&self) -> usize {
        self.thumbnail_calls.load(Ordering::SeqCst)
    }

    pub fn files(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }
}

pub fn metadata(file_id: u64) -> Metadata {
    let mut statuses = BTreeMap::new();
    statuses.insert(
        STATUS_CURRENT.to_string(),
        vec![
            "creator:someone".to_string(),
            "series:a show".to_string(),
            "character:the lead".to_string(),
            "blue sky".to_string(),
        ],
    );
    let mut display_tags = BTreeMap::new();
    display_tags.insert(DEFAULT_TAG_SERVICE.to_string(), statuses);

    Metadata {
        file_id,
        hash: format!("{:064x}", file_id),
        mime: "image/png".to_string(),
        ext: ".png".to_string(),
        size: Some(1024 * file_id),
        width: Some(640),
        height: Some(480),
        service_names_to_statuses_to_display_tags: display_tags,
        ..Default::default()
    }
}

pub fn file_bytes(file_id: u64) -> Bytes {
    Bytes::from(format!("file-{}", file_id))
}

pub fn thumbnail_bytes(file_id: u64) -> Bytes {
    Bytes::from(format!("thumb-{}", file_id))
}

fn file_id(file: &FileRef) -> Result<u64> {
    match file {
        FileRef::Id(id) => Ok(*id),
        FileRef::Hash(hash) => u64::from_str_radix(hash, 16)
            .map_err(|e| Error::Parsing(e.to_string())),
    }
}

#[async_trait]
impl MediaApi for MockApi {
    async fn api_version(&self) -> Result<ApiVersion> {
        Ok(ApiVersion {
            version: 17,
            hydrus_version: 441,
        })
    }

    async fn search_files(&self, tags: &[String]) -> Result<Vec<u64>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let key = tags.join(" ");
        let delay = self.search_delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_searches.lock().unwrap().contains(&key) {
            return Err(Error::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                message: "search failed".to_string(),
            });
        }
        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn file_metadata(&self, query: &MetadataQuery) -> Result<Vec<Metadata>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let MetadataQuery::FileIds(ids) = query else {
            return Err(Error::Unknown("mock only answers id queries".to_string()));
        };
        let missing = self.missing_metadata.lock().unwrap().clone();
        let mut entries: Vec<Metadata> = ids
            .iter()
            .filter(|id| !missing.contains(id))
            .map(|id| metadata(*id))
            .collect();
        if *self.reverse_metadata.lock().unwrap() {
            entries.reverse();
        }
        Ok(entries)
    }

    async fn get_thumbnail(&self, file: &FileRef) -> Result<Bytes> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        let id = file_id(file)?;
        if self.failing_thumbnails.lock().unwrap().contains(&id) {
            return Err(Error::Http {
                status: 404,
                status_text: "Not Found".to_string(),
                message: format!("no thumbnail for {}", id),
            });
        }
        Ok(thumbnail_bytes(id))
    }

    async fn get_file(&self, file: &FileRef, range: Option<ByteRange>) -> Result<Bytes> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = file_bytes(file_id(file)?);
        match range {
            None => Ok(bytes),
            Some(range) => {
                let start = range.start as usize;
                let end = range
                    .end
                    .map(|end| end as usize + 1)
                    .unwrap_or(bytes.len())
                    .min(bytes.len());
                Ok(bytes.slice(start.min(end)..end))
            }
        }
    }

    fn stream_url(&self, file_id: u64) -> Option<String> {
        Some(format!("http://mock/get_files/file?file_id={}", file_id))
    }
}
