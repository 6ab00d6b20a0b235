use rand::Rng;

use crate::{Post, PostId, State, Subreddit, User};

/// Number of synthetic communities, named `subreddit_1` through `subreddit_10`
const SUBREDDITS: u64 = 10;

/// Membership of the rank-1 community; rank `i` gets `MAX_MEMBERS / i`
const MAX_MEMBERS: u64 = 100;

/// Seeds a rank-skewed dataset: ten communities with harmonically decaying
/// membership, baseline posts with random popularity, then a repost pass
/// mirroring content across communities.
///
/// Runs entirely under the engine lock (the caller holds it), like any other
/// mutating operation. Existing users and communities are reused, never
/// overwritten, and every synthetic post takes a fresh identifier from the
/// shared allocator. Accounts created here settle karma against the vote
/// ledger the way `register_user` does.
pub(crate) fn run(state: &mut State, rng: &mut impl Rng) {
    let State {
        users,
        subreddits,
        posts,
        votes,
        next_id,
        ..
    } = state;

    for rank in 1..=SUBREDDITS {
        let name = format!("subreddit_{rank}");
        let sub = subreddits.entry(name.clone()).or_insert_with(Subreddit::empty);
        let members = MAX_MEMBERS / rank;
        for member in 1..=members {
            let username = format!("user_{member}");
            users.entry(username.clone()).or_insert_with(|| {
                let mut user = User::new(String::new());
                user.karma = crate::state::settled_karma(posts, votes, &username);
                user
            });
            sub.members.insert(username);
        }

        // Popular communities also post more
        for _ in 0..members / 10 {
            let author = format!("user_{}", rng.gen_range(1..=members));
            let id = PostId(*next_id);
            *next_id += 1;
            let content = format!("Post {id} in {name} by {author}");
            let mut post = Post::new(author, content);
            post.votes = rng.gen_range(0..100);
            posts.insert(id, post);
            sub.posts.push(id);
        }
    }

    // Repost pass. Every community with posts, synthetic or not, mirrors a
    // few posts sampled from the synthetic communities; a sample landing on
    // the community itself consumes the attempt. Counts are taken before any
    // repost lands, and names are sorted so a seeded rng reproduces the run.
    let mut passes = subreddits
        .iter()
        .filter(|(_, sub)| !sub.posts.is_empty())
        .map(|(name, sub)| (name.clone(), sub.posts.len()))
        .collect::<Vec<_>>();
    passes.sort();
    for (name, post_count) in passes {
        for _ in 0..post_count / 5 {
            let source_name = format!("subreddit_{}", rng.gen_range(1..=SUBREDDITS));
            if source_name == name {
                continue;
            }
            let source_id = match subreddits.get(&source_name) {
                Some(source) if !source.posts.is_empty() => {
                    source.posts[rng.gen_range(0..source.posts.len())]
                }
                _ => continue,
            };
            let source = match posts.get(&source_id) {
                Some(source) => source,
                None => continue,
            };
            let id = PostId(*next_id);
            *next_id += 1;
            let mut repost = Post::new(source.author.clone(), format!("[Repost] {}", source.content));
            repost.votes = source.votes / 2;
            posts.insert(id, repost);
            if let Some(sub) = subreddits.get_mut(&name) {
                sub.posts.push(id);
            }
        }
    }
}
