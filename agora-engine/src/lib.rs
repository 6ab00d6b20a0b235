mod comment;
pub use comment::{Comment, CommentId};

mod engine;
pub use engine::Engine;

mod error;
pub use error::{Error, Resource};

mod feed;

mod post;
pub use post::{Post, PostId};

pub mod reply;

mod state;
pub use state::State;

mod subreddit;
pub use subreddit::Subreddit;

mod user;
pub use user::{Message, User};

mod zipf;
