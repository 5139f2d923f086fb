use serde::{Deserialize, Serialize};

/// How much of the comment participates in the dedup key. Longer comments
/// with an identical head are treated as the same review.
const COMMENT_KEY_PREFIX_CHARS: usize = 30;

/// One scraped review card. All fields are raw display text; nothing is
/// parsed or normalized. Serialized field names match the on-disk and wire
/// format the service has always emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "Recommended")]
    pub recommended: String,
    #[serde(rename = "Hours Played")]
    pub hours_played: String,
    #[serde(rename = "Date Posted")]
    pub date_posted: String,
    #[serde(rename = "Comment")]
    pub comment: String,
}

impl Review {
    /// Derived identity used for dedup, never stored: the first three fields
    /// plus the head of the comment. The prefix is taken in characters, not
    /// bytes, since comments are user text and may be multi-byte.
    pub fn composite_key(&self) -> String {
        let prefix: String = self.comment.chars().take(COMMENT_KEY_PREFIX_CHARS).collect();
        format!(
            "{}-{}-{}-{}",
            self.recommended, self.hours_played, self.date_posted, prefix
        )
    }
}
