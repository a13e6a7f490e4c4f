use crate::api::client::MediaApi;
use crate::api::types::{Metadata, MetadataQuery};
use crate::core::error::Result;
use bytes::Bytes;

/// One entry of a result set, filled in as responses arrive.
///
/// Starts with only `file_id`; once metadata is attached the transient id is
/// cleared and `metadata.file_id` becomes the identity. `thumbnail` is set
/// only while the entry's page is (or was) visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub file_id: Option<u64>,
    pub metadata: Option<Metadata>,
    pub thumbnail: Option<Bytes>,
    /// A thumbnail fetch has completed for this entry, successfully or not
    pub thumbnail_attempted: bool,
}

impl SearchResult {
    pub fn placeholder(file_id: u64) -> Self {
        Self {
            file_id: Some(file_id),
            ..Default::default()
        }
    }

    pub fn hydrated(metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Default::default()
        }
    }

    /// Authoritative id: the metadata's once hydrated, the placeholder's before
    pub fn id(&self) -> Option<u64> {
        self.metadata
            .as_ref()
            .map(|m| m.file_id)
            .or(self.file_id)
    }

    /// Thumbnail still unset and no fetch has finished for it yet
    pub fn needs_thumbnail(&self) -> bool {
        self.thumbnail.is_none() && !self.thumbnail_attempted
    }
}

/// Split a query on whitespace into tags
pub fn parse_tags(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

/// Remembers the last submitted tag list and decides whether a new submission
/// needs a round trip.
#[derive(Debug, Clone, Default)]
pub struct LastSubmit {
    tags: Vec<String>,
}

impl LastSubmit {
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Same tags regardless of order. Sorts both lists.
    pub fn is_same_search(&mut self, tags: &mut [String]) -> bool {
        if self.tags.len() != tags.len() {
            return false;
        }
        self.tags.sort();
        tags.sort();
        self.tags.as_slice() == &*tags
    }

    /// Record `tags`, sorted, as the latest submission. Returns `true` when
    /// they differ from the previous one as a set, i.e. a search must be issued.
    pub fn submit(&mut self, mut tags: Vec<String>) -> bool {
        let same = self.is_same_search(&mut tags);
        tags.sort();
        self.tags = tags;
        !same
    }

    /// Forget the last submission so the next one always searches
    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

/// Attach bulk metadata to placeholders.
///
/// Each metadata entry is matched to the placeholder at the same index when
/// the ids agree, otherwise by scanning for the placeholder with that id.
/// Matched placeholders drop their transient `file_id`. Returns the number of
/// entries matched.
pub fn attach_metadata(results: &mut [SearchResult], metadata: Vec<Metadata>) -> usize {
    let mut matched = 0;

    for (i, entry) in metadata.into_iter().enumerate() {
        let target = match results.get(i) {
            Some(r) if r.file_id == Some(entry.file_id) => Some(i),
            _ => results
                .iter()
                .position(|r| r.file_id == Some(entry.file_id)),
        };

        match target {
            Some(idx) => {
                let result = &mut results[idx];
                result.metadata = Some(entry);
                result.file_id = None;
                matched += 1;
            }
            None => {
                tracing::debug!(file_id = entry.file_id, "metadata for unknown file ignored");
            }
        }
    }

    matched
}

/// Run a tag search and hydrate the result ids with metadata.
///
/// Ids the server returned no metadata for are dropped so that every entry of
/// the returned set has `metadata`.
pub async fn fetch_results(api: &dyn MediaApi, tags: &[String]) -> Result<Vec<SearchResult>> {
    let file_ids = api.search_files(tags).await?;
    tracing::debug!(count = file_ids.len(), ?tags, "search returned");

    if file_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut results: Vec<SearchResult> = file_ids
        .iter()
        .copied()
        .map(SearchResult::placeholder)
        .collect();

    let metadata = api
        .file_metadata(&MetadataQuery::FileIds(file_ids))
        .await?;
    let matched = attach_metadata(&mut results, metadata);

    if matched < results.len() {
        tracing::warn!(
            missing = results.len() - matched,
            "some search results came back without metadata"
        );
        results.retain(|r| r.metadata.is_some());
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(file_id: u64) -> Metadata {
        Metadata {
            file_id,
            ..Default::default()
        }
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_tags_drops_empty_tokens() {
        assert_eq!(parse_tags("  blue_sky   cat "), tags(&["blue_sky", "cat"]));
        assert!(parse_tags("   ").is_empty());
    }

    #[test]
    fn test_attach_metadata_in_order() {
        let mut results: Vec<_> = [5, 7, 9].into_iter().map(SearchResult::placeholder).collect();
        let matched = attach_metadata(&mut results, vec![meta(5), meta(7), meta(9)]);

        assert_eq!(matched, 3);
        let ids: Vec<_> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![Some(5), Some(7), Some(9)]);
        assert!(results.iter().all(|r| r.file_id.is_none() && r.metadata.is_some()));
    }

    #[test]
    fn test_attach_metadata_out_of_order_falls_back_to_id() {
        let mut results: Vec<_> = [5, 7, 9].into_iter().map(SearchResult::placeholder).collect();
        attach_metadata(&mut results, vec![meta(9), meta(5), meta(7)]);

        let ids: Vec<_> = results
            .iter()
            .map(|r| r.metadata.as_ref().unwrap().file_id)
            .collect();
        assert_eq!(ids, vec![5, 7, 9]);
    }

    #[test]
    fn test_attach_metadata_ignores_unknown_and_duplicates() {
        let mut results: Vec<_> = [1, 2].into_iter().map(SearchResult::placeholder).collect();
        let matched = attach_metadata(&mut results, vec![meta(1), meta(1), meta(3)]);

        assert_eq!(matched, 1);
        assert!(results[0].metadata.is_some());
        assert_eq!(results[1].file_id, Some(2));
        assert!(results[1].metadata.is_none());
    }

    #[test]
    fn test_last_submit_same_set_different_order() {
        let mut last = LastSubmit::default();
        assert!(last.submit(tags(&["b", "a"])));
        assert_eq!(last.tags(), tags(&["a", "b"]).as_slice());

        assert!(!last.submit(tags(&["a", "b"])));
        assert!(last.submit(tags(&["a", "c"])));
        assert!(last.submit(tags(&["a"])));
    }

    #[test]
    fn test_submit_of_new_length_is_stored_sorted() {
        let mut last = LastSubmit::default();
        assert!(last.submit(tags(&["cat", "blue_sky", "red"])));
        assert_eq!(last.tags(), tags(&["blue_sky", "cat", "red"]).as_slice());

        assert!(last.submit(tags(&["z", "y"])));
        assert_eq!(last.tags(), tags(&["y", "z"]).as_slice());
    }

    #[test]
    fn test_clear_forces_next_search() {
        let mut last = LastSubmit::default();
        assert!(last.submit(tags(&["a"])));
        last.clear();
        assert!(last.tags().is_empty());
        assert!(last.submit(tags(&["a"])));
    }

    #[test]
    fn test_first_empty_submission_is_same_search() {
        let mut last = LastSubmit::default();
        assert!(!last.submit(Vec::new()));
    }
}
