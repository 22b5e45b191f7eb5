use futures::stream::{self, Stream, StreamExt, TryStreamExt};

use crate::api::{ApiError, Post, SearchSource};

enum PageCursor {
    First,
    Next(String),
    Exhausted,
}

/// The service's paged results as one lazy, ordered stream of posts.
///
/// Pages are fetched on demand; the stream ends when the service returns no
/// continuation cursor or an empty page. Nothing is buffered beyond the
/// page in flight.
pub fn post_stream<'a, S: SearchSource>(
    source: &'a S,
    query: &'a str,
) -> impl Stream<Item = Result<Post, ApiError>> + 'a {
    stream::try_unfold(PageCursor::First, move |cursor| async move {
        let cursor_param = match &cursor {
            PageCursor::First => None,
            PageCursor::Next(c) => Some(c.as_str()),
            PageCursor::Exhausted => return Ok::<_, ApiError>(None),
        };
        let page = source.search_page(query, cursor_param).await?;
        let next = match page.next_cursor {
            // An empty page with a cursor would loop forever; treat it as the end.
            Some(c) if !page.posts.is_empty() => PageCursor::Next(c),
            _ => PageCursor::Exhausted,
        };
        Ok(Some((page.posts, next)))
    })
    .map_ok(|posts| stream::iter(posts.into_iter().map(Ok::<Post, ApiError>)))
    .try_flatten()
}

/// Collect up to `limit` posts for one query.
///
/// Stops at the earlier of `limit` items or the end of the sequence, so the
/// result never exceeds `limit` and is shorter only on exhaustion. A source
/// failure aborts this query alone and is returned to the caller.
pub async fn collect_posts<S: SearchSource>(
    source: &S,
    query: &str,
    limit: usize,
) -> Result<Vec<Post>, ApiError> {
    post_stream(source, query).take(limit).try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SearchPage;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockSource {
        pages: Mutex<VecDeque<Result<SearchPage, ApiError>>>,
        cursors_seen: Mutex<Vec<Option<String>>>,
    }

    impl MockSource {
        fn with_pages(pages: Vec<Result<SearchPage, ApiError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                cursors_seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.cursors_seen.lock().unwrap().len()
        }
    }

    impl SearchSource for MockSource {
        async fn search_page(
            &self,
            _query: &str,
            cursor: Option<&str>,
        ) -> Result<SearchPage, ApiError> {
            self.cursors_seen
                .lock()
                .unwrap()
                .push(cursor.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SearchPage::default()))
        }
    }

    fn post(id: i64) -> Post {
        Post {
            id,
            date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            content: format!("post {id}"),
        }
    }

    fn page(ids: &[i64], next_cursor: Option<&str>) -> Result<SearchPage, ApiError> {
        Ok(SearchPage {
            posts: ids.iter().copied().map(post).collect(),
            next_cursor: next_cursor.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn stops_at_the_requested_cap() {
        let source = MockSource::with_pages(vec![
            page(&[1, 2, 3], Some("c1")),
            page(&[4, 5, 6], Some("c2")),
        ]);

        let posts = collect_posts(&source, "q", 4).await.unwrap();

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(source.calls(), 2);

        let cursors = source.cursors_seen.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, Some("c1".to_string())]);
    }

    #[tokio::test]
    async fn returns_fewer_when_sequence_ends_first() {
        let source = MockSource::with_pages(vec![page(&[1, 2], None)]);

        let posts = collect_posts(&source, "q", 10).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn empty_result_set_yields_empty_batch() {
        let source = MockSource::with_pages(vec![page(&[], None)]);

        let posts = collect_posts(&source, "q", 10).await.unwrap();

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn empty_page_with_cursor_ends_the_stream() {
        let source = MockSource::with_pages(vec![page(&[], Some("c1"))]);

        let posts = collect_posts(&source, "q", 10).await.unwrap();

        assert!(posts.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn cap_of_zero_fetches_nothing() {
        let source = MockSource::with_pages(vec![page(&[1], None)]);

        let posts = collect_posts(&source, "q", 0).await.unwrap();

        assert!(posts.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn source_failure_propagates_for_this_query() {
        let source = MockSource::with_pages(vec![
            page(&[1, 2], Some("c1")),
            Err(ApiError::RateLimited),
        ]);

        let result = collect_posts(&source, "q", 10).await;

        assert!(matches!(result, Err(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn order_is_preserved_across_pages() {
        let source = MockSource::with_pages(vec![
            page(&[9, 8], Some("c1")),
            page(&[7], None),
        ]);

        let posts = collect_posts(&source, "q", 10).await.unwrap();

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![9, 8, 7]);
    }
}
