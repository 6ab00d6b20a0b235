use std::collections::HashMap;

use crate::{Comment, CommentId, Post, PostId, Subreddit, User};

/// Every table of the store, in one place.
///
/// `Engine` keeps one `State` behind its lock; `Engine::dump` hands out a
/// clone of it so tests and drivers can inspect (and compare) whole stores.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct State {
    pub users: HashMap<String, User>,
    pub subreddits: HashMap<String, Subreddit>,
    pub posts: HashMap<PostId, Post>,
    pub comments: HashMap<CommentId, Comment>,

    /// Last vote value recorded per (voter, post); overwritten on revote
    pub votes: HashMap<(String, PostId), i64>,

    /// Observational only; no operation reads this
    pub disconnected: HashMap<String, bool>,

    /// Next identifier to hand out, shared by posts and comments
    pub next_id: u64,
}

impl State {
    pub fn new() -> State {
        State {
            users: HashMap::new(),
            subreddits: HashMap::new(),
            posts: HashMap::new(),
            comments: HashMap::new(),
            votes: HashMap::new(),
            disconnected: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Default for State {
    fn default() -> State {
        State::new()
    }
}

/// Sum of the ledger entries recorded against posts authored by `username`,
/// wrapped the same way the vote counters wrap.
pub(crate) fn settled_karma(
    posts: &HashMap<PostId, Post>,
    votes: &HashMap<(String, PostId), i64>,
    username: &str,
) -> i64 {
    votes
        .iter()
        .filter(|((_, post), _)| posts.get(post).map_or(false, |post| post.author == username))
        .fold(0, |karma, (_, value)| karma.wrapping_add(*value))
}
