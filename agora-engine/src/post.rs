use std::fmt;

use crate::CommentId;

/// Identifier of a post. Posts and comments draw from the same counter, so a
/// `PostId` and a `CommentId` never carry the same number.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    /// Author username; not required to be a registered user
    pub author: String,

    pub content: String,

    /// Sum of the currently-recorded ledger votes, plus any baseline seeded
    /// by the workload generator
    pub votes: i64,

    /// Top-level comments in insertion order
    pub comments: Vec<CommentId>,
}

impl Post {
    pub fn new(author: String, content: String) -> Post {
        Post {
            author,
            content,
            votes: 0,
            comments: Vec::new(),
        }
    }
}
