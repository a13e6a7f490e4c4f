use super::search::SearchResult;
use crate::api::client::MediaApi;
use crate::api::types::FileRef;
use bytes::Bytes;
use futures_util::future::join_all;

/// A page needs thumbnails when its first entry has none and no fetch for it
/// has finished yet.
pub fn page_needs_hydration(page: &[SearchResult]) -> bool {
    page.first().is_some_and(SearchResult::needs_thumbnail)
}

/// Ids of the entries on a page, in page order
pub fn page_ids(page: &[SearchResult]) -> Vec<Option<u64>> {
    page.iter().map(SearchResult::id).collect()
}

/// Fetch one thumbnail per id, all at once, and wait for every fetch to
/// settle. A failed fetch is logged and yields `None` for its slot; it never
/// affects the others.
pub async fn fetch_thumbnails(api: &dyn MediaApi, ids: &[Option<u64>]) -> Vec<Option<Bytes>> {
    let calls = ids.iter().map(|id| async move {
        let file = match id {
            Some(id) => FileRef::Id(*id),
            None => {
                tracing::warn!("result missing metadata, skipping thumbnail");
                return None;
            }
        };
        match api.get_thumbnail(&file).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(file = ?file, error = %e, "thumbnail fetch failed");
                None
            }
        }
    });

    join_all(calls).await
}

/// Write fetched thumbnails into a page, slot by slot. Every slot is marked as
/// attempted, including the ones whose fetch failed.
pub fn apply_thumbnails(page: &mut [SearchResult], thumbnails: Vec<Option<Bytes>>) {
    if page.len() != thumbnails.len() {
        tracing::debug!(
            page = page.len(),
            thumbnails = thumbnails.len(),
            "thumbnail count does not match page"
        );
    }
    for (result, thumbnail) in page.iter_mut().zip(thumbnails) {
        if thumbnail.is_some() {
            result.thumbnail = thumbnail;
        }
        result.thumbnail_attempted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Metadata;

    fn hydrated(id: u64) -> SearchResult {
        SearchResult::hydrated(Metadata {
            file_id: id,
            ..Default::default()
        })
    }

    #[test]
    fn test_needs_hydration_checks_first_item() {
        let mut page = vec![hydrated(1), hydrated(2)];
        assert!(page_needs_hydration(&page));

        page[0].thumbnail_attempted = true;
        assert!(!page_needs_hydration(&page));

        assert!(!page_needs_hydration(&[]));
    }

    #[test]
    fn test_apply_marks_failures_attempted() {
        let mut page = vec![hydrated(1), hydrated(2)];
        apply_thumbnails(&mut page, vec![Some(Bytes::from_static(b"png")), None]);

        assert_eq!(page[0].thumbnail.as_deref(), Some(&b"png"[..]));
        assert!(page[1].thumbnail.is_none());
        assert!(page.iter().all(|r| r.thumbnail_attempted));
    }
}
