use std::{collections::HashMap, slice};

use crate::{Comment, CommentId, Error, Resource, State};

/// Renders the feed of one subreddit: each post in insertion order, followed
/// by its comment trees depth-first and pre-order, one line per entity.
///
/// Read-only, so two consecutive calls with no mutation in between return
/// byte-identical text.
pub(crate) fn render(state: &State, subreddit: &str) -> Result<String, Error> {
    let sub = state
        .subreddits
        .get(subreddit)
        .ok_or(Error::NotFound(Resource::Subreddit))?;
    let mut out = format!("Feed for Subreddit: {subreddit}\n");
    for id in &sub.posts {
        let post = match state.posts.get(id) {
            Some(post) => post,
            None => {
                tracing::warn!(post = %id, "subreddit lists a post missing from the post table");
                continue;
            }
        };
        out.push_str(&format!(
            "Post ID: {id} | Author: {} | Votes: {} | Content: {}\n",
            post.author, post.votes, post.content
        ));
        for (depth, id, comment) in Walk::new(&state.comments, &post.comments) {
            let indent = "  ".repeat(depth);
            out.push_str(&format!(
                "{indent}Comment ID: {id} | Author: {} | Votes: {} | Content: {}\n",
                comment.author, comment.votes, comment.content
            ));
        }
    }
    Ok(out)
}

/// Lazy depth-first pre-order traversal of comment trees held in the arena.
///
/// The stack holds one child-ID iterator per open nesting level, so depth is
/// just the stack height: top-level comments come out at depth 1.
struct Walk<'a> {
    arena: &'a HashMap<CommentId, Comment>,
    stack: Vec<slice::Iter<'a, CommentId>>,
}

impl<'a> Walk<'a> {
    fn new(arena: &'a HashMap<CommentId, Comment>, top_level: &'a [CommentId]) -> Walk<'a> {
        Walk {
            arena,
            stack: vec![top_level.iter()],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, CommentId, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ids = self.stack.last_mut()?;
            match ids.next() {
                None => {
                    self.stack.pop();
                }
                Some(id) => {
                    let depth = self.stack.len();
                    match self.arena.get(id) {
                        Some(comment) => {
                            self.stack.push(comment.replies.iter());
                            return Some((depth, *id, comment));
                        }
                        None => {
                            tracing::warn!(
                                comment = %id,
                                "comment tree references a comment missing from the comment table"
                            );
                        }
                    }
                }
            }
        }
    }
}
