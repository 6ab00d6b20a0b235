use std::collections::HashSet;

use crate::PostId;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Subreddit {
    /// Member usernames; membership only ever grows
    pub members: HashSet<String>,

    /// Posts in insertion order, which is also display order
    pub posts: Vec<PostId>,
}

impl Subreddit {
    /// A subreddit with its creator as sole member
    pub fn new(creator: String) -> Subreddit {
        let mut members = HashSet::new();
        members.insert(creator);
        Subreddit {
            members,
            posts: Vec::new(),
        }
    }

    /// A subreddit with no members yet, as seeded by the workload generator
    pub fn empty() -> Subreddit {
        Subreddit {
            members: HashSet::new(),
            posts: Vec::new(),
        }
    }
}
