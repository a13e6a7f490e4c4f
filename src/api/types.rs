use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag service shown in the viewer
pub const DEFAULT_TAG_SERVICE: &str = "my tags";

/// Tag status key for current tags
pub const STATUS_CURRENT: &str = "0";

/// `service name -> status -> tags`
pub type TagsByService = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersion {
    pub version: u32,
    pub hydrus_version: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilesResponse {
    #[serde(default)]
    pub file_ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMetadataResponse {
    #[serde(default)]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestNewPermissionsResponse {
    pub access_key: String,
}

/// File metadata as returned by `get_files/file_metadata`.
///
/// `service_names_to_statuses_to_display_tags` holds sibling-merged tags and is
/// what should be shown to users; `service_names_to_statuses_to_tags` holds the
/// raw storage tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub file_id: u64,
    pub hash: String,
    pub size: Option<u64>,
    pub mime: String,
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<u64>,
    pub num_frames: Option<u64>,
    pub num_words: Option<u64>,
    #[serde(alias = "hasAudio")]
    pub has_audio: bool,
    pub is_inbox: bool,
    pub is_local: bool,
    pub is_trashed: bool,
    pub known_urls: Vec<String>,
    pub service_names_to_statuses_to_tags: TagsByService,
    pub service_names_to_statuses_to_display_tags: TagsByService,
}

impl Metadata {
    /// Current display tags for one tag service; empty when the service is absent
    pub fn display_tags(&self, service: &str) -> &[String] {
        self.service_names_to_statuses_to_display_tags
            .get(service)
            .and_then(|statuses| statuses.get(STATUS_CURRENT))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

/// Identifies a single file. When both an id and a hash are known the id wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRef {
    Id(u64),
    Hash(String),
}

impl FileRef {
    pub fn from_parts(
        file_id: Option<u64>,
        hash: Option<String>,
        endpoint: &'static str,
    ) -> Result<Self> {
        match (file_id, hash) {
            (Some(id), _) => Ok(FileRef::Id(id)),
            (None, Some(hash)) if !hash.is_empty() => Ok(FileRef::Hash(hash)),
            _ => Err(Error::MissingIdentifier(endpoint)),
        }
    }

    /// Query parameter as `(name, value)`
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            FileRef::Id(id) => ("file_id", id.to_string()),
            FileRef::Hash(hash) => ("hash", hash.clone()),
        }
    }
}

/// Selects files for a bulk metadata request. Ids win over hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataQuery {
    FileIds(Vec<u64>),
    Hashes(Vec<String>),
}

impl MetadataQuery {
    pub fn from_parts(file_ids: Option<Vec<u64>>, hashes: Option<Vec<String>>) -> Result<Self> {
        match (file_ids, hashes) {
            (Some(ids), _) => Ok(MetadataQuery::FileIds(ids)),
            (None, Some(hashes)) => Ok(MetadataQuery::Hashes(hashes)),
            (None, None) => Err(Error::MissingIdentifier("file_metadata")),
        }
    }

    /// Query parameter as `(name, json-encoded list)`
    pub fn query_pair(&self) -> Result<(&'static str, String)> {
        Ok(match self {
            MetadataQuery::FileIds(ids) => ("file_ids", serde_json::to_string(ids)?),
            MetadataQuery::Hashes(hashes) => ("hashes", serde_json::to_string(hashes)?),
        })
    }
}

/// Inclusive byte range for partial file requests (HTTP 206)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Value for the `Range` header, e.g. `bytes=0-1023` or `bytes=4096-`
    pub fn header_value(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end),
            None => format!("bytes={}-", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_deserializes_partial_payload() {
        let json = r#"{
            "file_id": 7,
            "hash": "abcd",
            "mime": "video/webm",
            "width": null,
            "hasAudio": true,
            "service_names_to_statuses_to_display_tags": {
                "my tags": { "0": ["creator:someone", "blue sky"], "2": ["old"] }
            }
        }"#;
        let metadata: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.file_id, 7);
        assert!(metadata.has_audio);
        assert!(metadata.is_video());
        assert_eq!(metadata.width, None);
        assert_eq!(metadata.display_tags(DEFAULT_TAG_SERVICE), ["creator:someone", "blue sky"]);
        assert!(metadata.display_tags("missing service").is_empty());
    }

    #[test]
    fn test_file_ref_prefers_id() {
        let r = FileRef::from_parts(Some(3), Some("ff".to_string()), "get_file").unwrap();
        assert_eq!(r, FileRef::Id(3));
        assert_eq!(r.query_pair(), ("file_id", "3".to_string()));

        let r = FileRef::from_parts(None, Some("ff".to_string()), "get_file").unwrap();
        assert_eq!(r.query_pair(), ("hash", "ff".to_string()));
    }

    #[test]
    fn test_missing_identifier() {
        let err = FileRef::from_parts(None, None, "get_thumbnail").unwrap_err();
        assert!(matches!(err, Error::MissingIdentifier("get_thumbnail")));

        let err = MetadataQuery::from_parts(None, None).unwrap_err();
        assert!(matches!(err, Error::MissingIdentifier("file_metadata")));
    }

    #[test]
    fn test_metadata_query_json_encoding() {
        let q = MetadataQuery::from_parts(Some(vec![5, 7, 9]), Some(vec!["x".to_string()])).unwrap();
        assert_eq!(q.query_pair().unwrap(), ("file_ids", "[5,7,9]".to_string()));
    }

    #[test]
    fn test_byte_range_header() {
        assert_eq!(ByteRange::new(0, Some(1023)).header_value(), "bytes=0-1023");
        assert_eq!(ByteRange::new(4096, None).header_value(), "bytes=4096-");
    }
}
