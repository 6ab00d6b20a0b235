use std::fmt;

/// Identifier of a comment, drawn from the same counter as post identifiers
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One node of a comment tree. Children are ID references into the global
/// comment table, never owned subtrees, so nesting depth is unbounded and any
/// node can be replied to directly by ID.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub author: String,

    pub content: String,

    /// No operation mutates this; comments render with whatever is here
    pub votes: i64,

    /// Replies in insertion order
    pub replies: Vec<CommentId>,
}

impl Comment {
    pub fn new(author: String, content: String) -> Comment {
        Comment {
            author,
            content,
            votes: 0,
            replies: Vec::new(),
        }
    }
}
