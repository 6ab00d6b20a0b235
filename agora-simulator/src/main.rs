use std::{collections::HashMap, time::Duration};

use anyhow::Context;
use futures::future::join_all;
use rand::{rngs::StdRng, Rng, SeedableRng};

use agora_engine::{CommentId, Engine, PostId, State};

#[derive(Debug, structopt::StructOpt)]
struct Opt {
    /// How many simulated users to run concurrently
    #[structopt(long, default_value = "50")]
    users: usize,

    /// How many actions each simulated user performs
    #[structopt(long, default_value = "40")]
    actions: usize,

    /// Seed for reproducible per-user action streams, random when not set
    #[structopt(long)]
    seed: Option<u64>,
}

fn random_post(engine: &Engine, rng: &mut StdRng) -> Option<PostId> {
    let mut ids = engine.dump().posts.keys().copied().collect::<Vec<_>>();
    ids.sort();
    match ids.is_empty() {
        true => None,
        false => Some(ids[rng.gen_range(0..ids.len())]),
    }
}

fn random_comment(engine: &Engine, rng: &mut StdRng) -> Option<CommentId> {
    let mut ids = engine.dump().comments.keys().copied().collect::<Vec<_>>();
    ids.sort();
    match ids.is_empty() {
        true => None,
        false => Some(ids[rng.gen_range(0..ids.len())]),
    }
}

/// One simulated account hammering the shared engine. Returns how many calls
/// the engine accepted and how many it rejected.
async fn simulate_user(
    engine: Engine,
    index: usize,
    users: usize,
    actions: usize,
    seed: u64,
) -> (u64, u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let username = format!("user_{index}");
    let mut performed = 0;
    let mut rejected = 0;

    match engine.register_user(&username, &lipsum::lipsum_words_with_rng(&mut rng, 2)) {
        Ok(()) => performed += 1,
        Err(_) => rejected += 1,
    }

    for _ in 0..actions {
        let outcome = match rng.gen_range(0..8) {
            0 => {
                let name = format!("community_{}", rng.gen_range(0..10));
                engine.create_subreddit(&name, &username).is_ok()
            }
            1 => {
                let name = format!("community_{}", rng.gen_range(0..10));
                let words = rng.gen_range(3..10);
                let content = lipsum::lipsum_words_with_rng(&mut rng, words);
                engine.create_post(&name, &username, &content).is_ok()
            }
            2 => {
                let post = match random_post(&engine, &mut rng) {
                    Some(post) => post,
                    None => continue,
                };
                let words = rng.gen_range(3..10);
                let content = lipsum::lipsum_words_with_rng(&mut rng, words);
                engine.add_comment(post, &username, &content).is_ok()
            }
            3 => {
                let parent = match random_comment(&engine, &mut rng) {
                    Some(parent) => parent,
                    None => continue,
                };
                let words = rng.gen_range(3..10);
                let content = lipsum::lipsum_words_with_rng(&mut rng, words);
                engine.reply_to_comment(parent, &username, &content).is_ok()
            }
            4 => {
                let post = match random_post(&engine, &mut rng) {
                    Some(post) => post,
                    None => continue,
                };
                let vote = rng.gen_range(0..2) * 2 - 1;
                engine.vote_post(&username, post, vote).is_ok()
            }
            5 => {
                let recipient = format!("user_{}", rng.gen_range(0..users));
                let words = rng.gen_range(2..6);
                let content = lipsum::lipsum_words_with_rng(&mut rng, words);
                engine.send_message(&username, &recipient, &content).is_ok()
            }
            6 => {
                let connected = rng.gen();
                engine.set_connection_status(&username, connected).is_ok()
            }
            _ => {
                let name = format!("community_{}", rng.gen_range(0..10));
                engine.render_feed(&name).is_ok()
            }
        };
        match outcome {
            true => performed += 1,
            false => rejected += 1,
        }
        tokio::time::sleep(Duration::from_millis(rng.gen_range(0..5))).await;
    }

    if let Ok(inbox) = engine.list_messages(&username) {
        tracing::debug!(username = %username, lines = inbox.lines().count(), "final inbox");
    }

    (performed, rejected)
}

/// Cross-checks the vote ledger against the materialized counters: every
/// ledger entry must point at a live post, per-post sums must equal the
/// post's vote counter, per-author sums must equal the author's karma, and
/// the ID counter must account for every post and comment.
fn verify_invariants(state: &State) -> anyhow::Result<()> {
    let mut per_post: HashMap<PostId, i64> = HashMap::new();
    let mut per_author: HashMap<&str, i64> = HashMap::new();
    for ((_, post), value) in &state.votes {
        let record = state
            .posts
            .get(post)
            .with_context(|| format!("ledger holds votes for missing post {post}"))?;
        *per_post.entry(*post).or_insert(0) += value;
        *per_author.entry(record.author.as_str()).or_insert(0) += value;
    }
    for (id, post) in &state.posts {
        let expected = per_post.get(id).copied().unwrap_or(0);
        anyhow::ensure!(
            post.votes == expected,
            "post {id} shows {} votes but the ledger sums to {expected}",
            post.votes,
        );
    }
    for (username, user) in &state.users {
        let expected = per_author.get(username.as_str()).copied().unwrap_or(0);
        anyhow::ensure!(
            user.karma == expected,
            "user {username} shows karma {} but the ledger sums to {expected}",
            user.karma,
        );
    }
    anyhow::ensure!(
        state.posts.len() + state.comments.len() == (state.next_id - 1) as usize,
        "next id {} does not account for {} posts and {} comments",
        state.next_id,
        state.posts.len(),
        state.comments.len(),
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let seed = opt.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, users = opt.users, actions = opt.actions, "starting simulation");

    let engine = Engine::new();
    let handles = (0..opt.users)
        .map(|index| {
            let engine = engine.clone();
            let task_seed = seed.wrapping_add(index as u64);
            tokio::spawn(simulate_user(
                engine,
                index,
                opt.users,
                opt.actions,
                task_seed,
            ))
        })
        .collect::<Vec<_>>();

    let mut performed = 0u64;
    let mut rejected = 0u64;
    for res in join_all(handles).await {
        let (done, missed) = res.context("joining simulation task")?;
        performed += done;
        rejected += missed;
    }

    let state = engine.dump();
    verify_invariants(&state)?;
    tracing::info!(
        performed,
        rejected,
        users = state.users.len(),
        subreddits = state.subreddits.len(),
        posts = state.posts.len(),
        comments = state.comments.len(),
        "simulation finished, counters reconcile with the vote ledger"
    );

    if let Some(name) = state.subreddits.keys().min() {
        let feed = engine.render_feed(name).context("rendering final feed")?;
        println!("{feed}");
    }
    Ok(())
}
