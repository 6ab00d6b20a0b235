use std::{collections::hash_map, sync::Arc};

use parking_lot::Mutex;

use crate::{
    feed, reply, zipf, Comment, CommentId, Error, Message, Post, PostId, Resource, State,
    Subreddit, User,
};

/// Handle on one shared store.
///
/// Clones are cheap and all point at the same state. Every operation holds
/// the one engine-wide lock for its whole duration, so the `State` invariants
/// are never observably violated from outside. No operation suspends or
/// touches I/O while holding the lock.
#[derive(Clone, Debug)]
pub struct Engine(Arc<Mutex<State>>);

impl Engine {
    pub fn new() -> Engine {
        Engine(Arc::new(Mutex::new(State::new())))
    }

    /// Clone of the whole store, for inspection and invariant checking
    pub fn dump(&self) -> State {
        self.0.lock().clone()
    }

    /// Fails on a taken username; the existing record is never touched.
    ///
    /// Votes recorded on this author's posts before the account existed are
    /// settled into the starting karma.
    pub fn register_user(&self, username: &str, password: &str) -> Result<(), Error> {
        let mut state = self.0.lock();
        let State {
            users,
            posts,
            votes,
            ..
        } = &mut *state;
        match users.entry(username.to_string()) {
            hash_map::Entry::Occupied(_) => Err(Error::AlreadyExists(Resource::Username)),
            hash_map::Entry::Vacant(entry) => {
                let mut user = User::new(password.to_string());
                user.karma = crate::state::settled_karma(posts, votes, username);
                entry.insert(user);
                Ok(())
            }
        }
    }

    /// The creator becomes sole initial member. Creators are not required to
    /// be registered users.
    pub fn create_subreddit(&self, name: &str, creator: &str) -> Result<(), Error> {
        let mut state = self.0.lock();
        match state.subreddits.entry(name.to_string()) {
            hash_map::Entry::Occupied(_) => Err(Error::AlreadyExists(Resource::Subreddit)),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(Subreddit::new(creator.to_string()));
                Ok(())
            }
        }
    }

    pub fn create_post(
        &self,
        subreddit: &str,
        author: &str,
        content: &str,
    ) -> Result<PostId, Error> {
        let mut state = self.0.lock();
        let State {
            subreddits,
            posts,
            next_id,
            ..
        } = &mut *state;
        let sub = subreddits
            .get_mut(subreddit)
            .ok_or(Error::NotFound(Resource::Subreddit))?;
        let id = PostId(*next_id);
        *next_id += 1;
        sub.posts.push(id);
        posts.insert(id, Post::new(author.to_string(), content.to_string()));
        Ok(id)
    }

    pub fn add_comment(
        &self,
        post: PostId,
        author: &str,
        content: &str,
    ) -> Result<CommentId, Error> {
        let mut state = self.0.lock();
        let State {
            posts,
            comments,
            next_id,
            ..
        } = &mut *state;
        let post = posts.get_mut(&post).ok_or(Error::NotFound(Resource::Post))?;
        let id = CommentId(*next_id);
        *next_id += 1;
        post.comments.push(id);
        comments.insert(id, Comment::new(author.to_string(), content.to_string()));
        Ok(id)
    }

    /// Replies can target any comment, top-level or nested, to any depth.
    pub fn reply_to_comment(
        &self,
        comment: CommentId,
        author: &str,
        content: &str,
    ) -> Result<CommentId, Error> {
        let mut state = self.0.lock();
        let State {
            comments, next_id, ..
        } = &mut *state;
        let parent = comments
            .get_mut(&comment)
            .ok_or(Error::NotFound(Resource::Comment))?;
        let id = CommentId(*next_id);
        *next_id += 1;
        parent.replies.push(id);
        comments.insert(id, Comment::new(author.to_string(), content.to_string()));
        Ok(id)
    }

    pub fn render_feed(&self, subreddit: &str) -> Result<String, Error> {
        feed::render(&self.0.lock(), subreddit)
    }

    /// Records `value` as the voter's current vote on the post, reversing
    /// whatever the same voter had recorded before: the post counter and the
    /// author's karma end up reflecting only the latest value per voter.
    /// Deltas wrap at the `i64` boundaries.
    pub fn vote_post(&self, voter: &str, post: PostId, value: i64) -> Result<(), Error> {
        let mut state = self.0.lock();
        let State {
            users,
            posts,
            votes,
            ..
        } = &mut *state;
        let target = posts.get_mut(&post).ok_or(Error::NotFound(Resource::Post))?;
        let previous = votes.insert((voter.to_string(), post), value).unwrap_or(0);
        let delta = value.wrapping_sub(previous);
        target.votes = target.votes.wrapping_add(delta);
        // authors are not required to be registered; karma settles only on
        // real accounts
        if let Some(author) = users.get_mut(&target.author) {
            author.karma = author.karma.wrapping_add(delta);
        }
        Ok(())
    }

    /// Senders need no account; recipients do.
    pub fn send_message(&self, sender: &str, recipient: &str, content: &str) -> Result<(), Error> {
        let mut state = self.0.lock();
        let recipient = state
            .users
            .get_mut(recipient)
            .ok_or(Error::NotFound(Resource::Recipient))?;
        recipient.inbox.push(Message {
            sender: sender.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    pub fn list_messages(&self, username: &str) -> Result<String, Error> {
        let state = self.0.lock();
        let user = state
            .users
            .get(username)
            .ok_or(Error::NotFound(Resource::User))?;
        if user.inbox.is_empty() {
            return Ok(String::from(reply::NO_MESSAGES));
        }
        let mut out = format!("Direct messages for {username}:\n");
        for (i, message) in user.inbox.iter().enumerate() {
            out.push_str(&format!(
                "{}. From {}: {}\n",
                i + 1,
                message.sender,
                message.content
            ));
        }
        Ok(out)
    }

    /// Flips the disconnected flag and returns the new connected state. The
    /// flag gates nothing; it exists for external observers.
    pub fn set_connection_status(&self, username: &str, connected: bool) -> Result<bool, Error> {
        let mut state = self.0.lock();
        if !state.users.contains_key(username) {
            return Err(Error::NotFound(Resource::User));
        }
        state.disconnected.insert(username.to_string(), !connected);
        Ok(connected)
    }

    /// Seeds the rank-skewed synthetic dataset, holding the lock for the
    /// whole multi-phase run.
    pub fn simulate_zipf(&self) {
        let mut state = self.0.lock();
        zipf::run(&mut state, &mut rand::thread_rng());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_post() -> (Engine, PostId) {
        let engine = Engine::new();
        engine
            .register_user("alice", "secret")
            .expect("registering alice");
        engine
            .create_subreddit("golang", "alice")
            .expect("creating golang");
        let post = engine
            .create_post("golang", "alice", "hi")
            .expect("creating post");
        (engine, post)
    }

    #[test]
    fn duplicate_registration_keeps_first_record() {
        let engine = Engine::new();
        engine.register_user("alice", "first").expect("registering");
        let before = engine.dump();
        assert_eq!(
            engine.register_user("alice", "second"),
            Err(Error::AlreadyExists(Resource::Username)),
        );
        assert_eq!(engine.dump(), before);
        assert_eq!(engine.dump().users["alice"].password, "first");
    }

    #[test]
    fn duplicate_subreddit_keeps_first_creator() {
        let engine = Engine::new();
        engine
            .create_subreddit("golang", "alice")
            .expect("creating golang");
        assert_eq!(
            engine.create_subreddit("golang", "bob"),
            Err(Error::AlreadyExists(Resource::Subreddit)),
        );
        let members = &engine.dump().subreddits["golang"].members;
        assert!(members.contains("alice"));
        assert!(!members.contains("bob"));
    }

    #[test]
    fn unknown_targets_leave_state_untouched() {
        let (engine, _post) = engine_with_post();
        let before = engine.dump();
        assert_eq!(
            engine.create_post("missing", "alice", "hi"),
            Err(Error::NotFound(Resource::Subreddit)),
        );
        assert_eq!(
            engine.add_comment(PostId(99), "alice", "hi"),
            Err(Error::NotFound(Resource::Post)),
        );
        assert_eq!(
            engine.reply_to_comment(CommentId(99), "alice", "hi"),
            Err(Error::NotFound(Resource::Comment)),
        );
        assert_eq!(
            engine.vote_post("bob", PostId(99), 1),
            Err(Error::NotFound(Resource::Post)),
        );
        assert_eq!(
            engine.send_message("alice", "nobody", "hi"),
            Err(Error::NotFound(Resource::Recipient)),
        );
        assert_eq!(
            engine.list_messages("nobody"),
            Err(Error::NotFound(Resource::User)),
        );
        assert_eq!(
            engine.set_connection_status("nobody", true),
            Err(Error::NotFound(Resource::User)),
        );
        assert_eq!(
            engine.render_feed("missing"),
            Err(Error::NotFound(Resource::Subreddit)),
        );
        assert_eq!(engine.dump(), before);
    }

    #[test]
    fn posts_and_comments_share_the_counter() {
        let engine = Engine::new();
        engine
            .create_subreddit("golang", "alice")
            .expect("creating golang");
        let post = engine
            .create_post("golang", "alice", "first")
            .expect("creating post");
        assert_eq!(post, PostId(1));
        let comment = engine
            .add_comment(post, "bob", "nice")
            .expect("adding comment");
        assert_eq!(comment, CommentId(2));
        let reply = engine
            .reply_to_comment(comment, "carol", "agreed")
            .expect("replying");
        assert_eq!(reply, CommentId(3));
        let second = engine
            .create_post("golang", "alice", "again")
            .expect("creating second post");
        assert_eq!(second, PostId(4));
    }

    #[test]
    fn revote_counts_only_the_latest_value() {
        let (engine, post) = engine_with_post();
        assert_eq!(post, PostId(1));
        engine.vote_post("bob", post, 1).expect("upvoting");
        assert_eq!(engine.dump().posts[&post].votes, 1);
        engine.vote_post("bob", post, -1).expect("downvoting");
        let dump = engine.dump();
        assert_eq!(dump.posts[&post].votes, -1);
        assert_eq!(dump.users["alice"].karma, -1);
        assert_eq!(dump.votes[&(String::from("bob"), post)], -1);
        assert_eq!(dump.votes.len(), 1);
    }

    #[test]
    fn revote_nets_to_latest_for_any_values() {
        bolero::check!()
            .with_type::<(i64, i64)>()
            .cloned()
            .for_each(|(first, second)| {
                let (engine, post) = engine_with_post();
                engine.vote_post("bob", post, first).expect("first vote");
                engine.vote_post("bob", post, second).expect("second vote");
                let dump = engine.dump();
                assert_eq!(dump.posts[&post].votes, second);
                assert_eq!(dump.users["alice"].karma, second);
            })
    }

    #[test]
    fn revotes_survive_the_integer_extremes() {
        let (engine, post) = engine_with_post();
        engine.vote_post("bob", post, -1).expect("first vote");
        engine.vote_post("bob", post, i64::MAX).expect("revoting to max");
        assert_eq!(engine.dump().posts[&post].votes, i64::MAX);
        engine
            .vote_post("bob", post, i64::MIN)
            .expect("revoting to min");
        let dump = engine.dump();
        assert_eq!(dump.posts[&post].votes, i64::MIN);
        assert_eq!(dump.users["alice"].karma, i64::MIN);
        assert_eq!(dump.votes[&(String::from("bob"), post)], i64::MIN);
    }

    #[test]
    fn distinct_voters_accumulate() {
        let (engine, post) = engine_with_post();
        engine.vote_post("bob", post, 1).expect("bob voting");
        engine.vote_post("carol", post, 1).expect("carol voting");
        engine.vote_post("dave", post, -1).expect("dave voting");
        let dump = engine.dump();
        assert_eq!(dump.posts[&post].votes, 1);
        assert_eq!(dump.users["alice"].karma, 1);
        assert_eq!(dump.votes.len(), 3);
    }

    #[test]
    fn votes_on_unregistered_authors_skip_karma() {
        let engine = Engine::new();
        engine
            .create_subreddit("golang", "ghost")
            .expect("creating golang");
        let post = engine
            .create_post("golang", "ghost", "boo")
            .expect("creating post");
        engine.vote_post("bob", post, 1).expect("voting");
        let dump = engine.dump();
        assert_eq!(dump.posts[&post].votes, 1);
        assert!(!dump.users.contains_key("ghost"));
        assert_eq!(dump.votes[&(String::from("bob"), post)], 1);
    }

    #[test]
    fn late_registration_settles_existing_votes() {
        let engine = Engine::new();
        engine
            .create_subreddit("golang", "ghost")
            .expect("creating golang");
        let post = engine
            .create_post("golang", "ghost", "boo")
            .expect("creating post");
        engine.vote_post("bob", post, 5).expect("early vote");
        engine
            .register_user("ghost", "secret")
            .expect("registering ghost");
        // the account starts with the recorded backlog, not at zero
        assert_eq!(engine.dump().users["ghost"].karma, 5);
        engine.vote_post("bob", post, 3).expect("revoting");
        let dump = engine.dump();
        assert_eq!(dump.posts[&post].votes, 3);
        assert_eq!(dump.users["ghost"].karma, 3);
        assert_eq!(dump.votes[&(String::from("bob"), post)], 3);
        assert_eq!(dump.votes.len(), 1);
    }

    #[test]
    fn feed_renders_nested_replies_indented() {
        let (engine, post) = engine_with_post();
        let comment = engine
            .add_comment(post, "bob", "nice")
            .expect("adding comment");
        let reply = engine
            .reply_to_comment(comment, "carol", "agreed")
            .expect("replying");
        let nested = engine
            .reply_to_comment(reply, "dave", "same")
            .expect("nesting");
        engine
            .add_comment(post, "erin", "hello")
            .expect("second comment");
        let feed = engine.render_feed("golang").expect("rendering");
        assert_eq!(
            feed,
            concat!(
                "Feed for Subreddit: golang\n",
                "Post ID: 1 | Author: alice | Votes: 0 | Content: hi\n",
                "  Comment ID: 2 | Author: bob | Votes: 0 | Content: nice\n",
                "    Comment ID: 3 | Author: carol | Votes: 0 | Content: agreed\n",
                "      Comment ID: 4 | Author: dave | Votes: 0 | Content: same\n",
                "  Comment ID: 5 | Author: erin | Votes: 0 | Content: hello\n",
            ),
        );
        // rendering mutates nothing: a second pass is byte-identical
        assert_eq!(feed, engine.render_feed("golang").expect("re-rendering"));
        // every tree node is also in the global comment table
        let dump = engine.dump();
        assert_eq!(dump.comments[&reply].replies, vec![nested]);
        assert!(dump.comments.contains_key(&nested));
    }

    #[test]
    fn inbox_listing_is_one_indexed() {
        let engine = Engine::new();
        engine
            .register_user("alice", "secret")
            .expect("registering alice");
        assert_eq!(
            engine.list_messages("alice").expect("empty inbox"),
            "No messages.",
        );
        // senders need no account of their own
        engine
            .send_message("bob", "alice", "hello")
            .expect("first message");
        engine
            .send_message("carol", "alice", "hi again")
            .expect("second message");
        assert_eq!(
            engine.list_messages("alice").expect("listing"),
            "Direct messages for alice:\n1. From bob: hello\n2. From carol: hi again\n",
        );
    }

    #[test]
    fn connection_status_flips_and_gates_nothing() {
        let engine = Engine::new();
        engine
            .register_user("alice", "secret")
            .expect("registering alice");
        assert_eq!(
            engine
                .set_connection_status("alice", false)
                .expect("disconnecting"),
            false,
        );
        assert_eq!(engine.dump().disconnected["alice"], true);
        assert_eq!(
            engine
                .set_connection_status("alice", true)
                .expect("reconnecting"),
            true,
        );
        assert_eq!(engine.dump().disconnected["alice"], false);
        // a disconnected user still receives messages
        engine
            .set_connection_status("alice", false)
            .expect("disconnecting again");
        engine
            .send_message("bob", "alice", "still there?")
            .expect("messaging disconnected user");
    }

    #[test]
    fn simulate_zipf_smoke() {
        let engine = Engine::new();
        engine.simulate_zipf();
        let dump = engine.dump();
        assert_eq!(dump.subreddits["subreddit_1"].members.len(), 100);
        assert_eq!(dump.subreddits["subreddit_10"].members.len(), 10);
        assert!(dump.posts.len() >= 27);
    }

    #[test]
    fn parallel_votes_reconcile() {
        let engine = Engine::new();
        engine
            .register_user("author", "secret")
            .expect("registering author");
        engine
            .create_subreddit("arena", "author")
            .expect("creating arena");
        let post = engine
            .create_post("arena", "author", "target")
            .expect("creating post");
        let mut handles = Vec::new();
        for voter in 0..8 {
            let engine = engine.clone();
            handles.push(std::thread::spawn(move || {
                let name = format!("voter_{voter}");
                for round in 0..100 {
                    let value = match (voter + round) % 2 {
                        0 => 1,
                        _ => -1,
                    };
                    engine.vote_post(&name, post, value).expect("voting");
                }
            }));
        }
        for handle in handles {
            handle.join().expect("joining voter thread");
        }
        let dump = engine.dump();
        let ledger: i64 = dump
            .votes
            .iter()
            .filter(|((_, p), _)| *p == post)
            .map(|(_, v)| *v)
            .sum();
        assert_eq!(dump.votes.len(), 8);
        assert_eq!(dump.posts[&post].votes, ledger);
        assert_eq!(dump.users["author"].karma, ledger);
    }

    #[test]
    fn parallel_creation_never_reuses_ids() {
        let engine = Engine::new();
        engine
            .create_subreddit("arena", "admin")
            .expect("creating arena");
        let mut handles = Vec::new();
        for worker in 0..4 {
            let engine = engine.clone();
            handles.push(std::thread::spawn(move || {
                let author = format!("worker_{worker}");
                let mut ids = Vec::new();
                for _ in 0..50 {
                    let post = engine
                        .create_post("arena", &author, "content")
                        .expect("creating post");
                    ids.push(post.0);
                    let comment = engine
                        .add_comment(post, &author, "note")
                        .expect("adding comment");
                    ids.push(comment.0);
                }
                ids
            }));
        }
        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().expect("joining worker thread"));
        }
        let count = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), count);
        assert_eq!(count, 400);
        let dump = engine.dump();
        assert_eq!(dump.next_id, 401);
        assert_eq!(dump.posts.len(), 200);
        assert_eq!(dump.comments.len(), 200);
    }
}
