//! Canonical success strings, as rendered to clients by every transport.
//!
//! Adapters must not compose their own variants of these: the strings are
//! part of the engine's contract, and tests compare them byte-for-byte.

use crate::{CommentId, PostId};

pub const USER_REGISTERED: &str = "User registered successfully.";
pub const SUBREDDIT_CREATED: &str = "Subreddit created successfully.";
pub const VOTE_REGISTERED: &str = "Vote registered successfully.";
pub const MESSAGE_SENT: &str = "Message sent successfully.";
pub const NO_MESSAGES: &str = "No messages.";
pub const ZIPF_SIMULATED: &str =
    "Simulated Zipf distribution with enhanced posting and re-posting.";

pub fn post_created(id: PostId) -> String {
    format!("Post created successfully with ID {id}.")
}

pub fn comment_added(id: CommentId) -> String {
    format!("Comment added successfully with ID {id}.")
}

pub fn reply_added(id: CommentId) -> String {
    format!("Reply added successfully with ID {id}.")
}

pub fn connection_changed(username: &str, connected: bool) -> String {
    match connected {
        true => format!("{username} is now connected."),
        false => format!("{username} is now disconnected."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_visible_messages() {
        assert_eq!(USER_REGISTERED, "User registered successfully.");
        assert_eq!(SUBREDDIT_CREATED, "Subreddit created successfully.");
        assert_eq!(VOTE_REGISTERED, "Vote registered successfully.");
        assert_eq!(MESSAGE_SENT, "Message sent successfully.");
        assert_eq!(NO_MESSAGES, "No messages.");
        assert_eq!(
            ZIPF_SIMULATED,
            "Simulated Zipf distribution with enhanced posting and re-posting.",
        );
        assert_eq!(
            post_created(PostId(7)),
            "Post created successfully with ID 7.",
        );
        assert_eq!(
            comment_added(CommentId(8)),
            "Comment added successfully with ID 8.",
        );
        assert_eq!(
            reply_added(CommentId(9)),
            "Reply added successfully with ID 9.",
        );
        assert_eq!(connection_changed("alice", true), "alice is now connected.");
        assert_eq!(
            connection_changed("alice", false),
            "alice is now disconnected.",
        );
    }
}
