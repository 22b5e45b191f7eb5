use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of search results as the service returns it.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub posts: Vec<ApiPost>,
    pub next_cursor: Option<String>,
    pub error: Option<ApiErrorBody>,
}

/// A raw result item. The service attaches plenty of metadata per post;
/// serde drops everything that is not listed here, and the conversion to
/// [`Post`] keeps exactly the three fields the pipeline stores.
#[derive(Debug, Deserialize)]
pub struct ApiPost {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
}

/// A collected post: identifier, timestamp, content. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub content: String,
}

impl From<ApiPost> for Post {
    fn from(raw: ApiPost) -> Self {
        Self {
            id: raw.id,
            date: raw.created_at,
            content: raw.text,
        }
    }
}

/// One page of the result sequence, reduced to domain posts. `next_cursor`
/// is `None` once the sequence is exhausted.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub posts: Vec<Post>,
    pub next_cursor: Option<String>,
}
