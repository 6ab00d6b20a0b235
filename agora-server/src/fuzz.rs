#![cfg(test)]

use async_recursion::async_recursion;
use axum::{
    http::{self, request, StatusCode},
    Router,
};
use std::{cmp, ops::RangeTo, panic::AssertUnwindSafe};
use tower::{Service, ServiceExt};

use agora_engine::{reply, CommentId, Engine, PostId};

use crate::{handlers::Reply, *};

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

// Tiny pools so that generated ops collide on the same records often.
const USERS: &[&str] = &["alice", "bob", "carol", "dave"];
const SUBREDDITS: &[&str] = &["golang", "rustlang", "emacs"];
const CONTENTS: &[&str] = &["hello", "lorem", "42", "warble"];

fn pick(pool: &[&'static str], fuzz_id: usize) -> &'static str {
    pool[resize_int(fuzz_id, ..pool.len()).expect("picking from an empty pool")]
}

// Small ids so that votes and comments sometimes land on live records and
// sometimes miss; id 0 is never allocated so it always misses.
fn fuzz_id(fuzz_id: usize) -> u64 {
    resize_int(fuzz_id, ..16).expect("resizing fuzz id") as u64
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    RegisterUser {
        username: usize,
        password: usize,
    },
    CreateSubreddit {
        name: usize,
        creator: usize,
    },
    CreatePost {
        subreddit: usize,
        author: usize,
        content: usize,
    },
    AddComment {
        post_id: usize,
        author: usize,
        content: usize,
    },
    ReplyToComment {
        comment_id: usize,
        author: usize,
        content: usize,
    },
    Feed {
        subreddit: usize,
    },
    VotePost {
        username: usize,
        post_id: usize,
        vote: i8,
    },
    SendMessage {
        sender: usize,
        recipient: usize,
        content: usize,
    },
    ListMessages {
        username: usize,
    },
    SimulateConnection {
        username: usize,
        connected: bool,
    },
}

fn encode(op: &FuzzOp) -> (&'static str, String) {
    match op {
        FuzzOp::RegisterUser { username, password } => (
            "POST",
            format!(
                "/api/register-user?username={}&password={}",
                pick(USERS, *username),
                pick(CONTENTS, *password)
            ),
        ),
        FuzzOp::CreateSubreddit { name, creator } => (
            "POST",
            format!(
                "/api/create-subreddit?name={}&creator={}",
                pick(SUBREDDITS, *name),
                pick(USERS, *creator)
            ),
        ),
        FuzzOp::CreatePost {
            subreddit,
            author,
            content,
        } => (
            "POST",
            format!(
                "/api/create-post?subreddit={}&author={}&content={}",
                pick(SUBREDDITS, *subreddit),
                pick(USERS, *author),
                pick(CONTENTS, *content)
            ),
        ),
        FuzzOp::AddComment {
            post_id,
            author,
            content,
        } => (
            "POST",
            format!(
                "/api/add-comment?post_id={}&author={}&content={}",
                fuzz_id(*post_id),
                pick(USERS, *author),
                pick(CONTENTS, *content)
            ),
        ),
        FuzzOp::ReplyToComment {
            comment_id,
            author,
            content,
        } => (
            "POST",
            format!(
                "/api/reply-to-comment?comment_id={}&author={}&content={}",
                fuzz_id(*comment_id),
                pick(USERS, *author),
                pick(CONTENTS, *content)
            ),
        ),
        FuzzOp::Feed { subreddit } => (
            "GET",
            format!("/api/feed?subreddit={}", pick(SUBREDDITS, *subreddit)),
        ),
        FuzzOp::VotePost {
            username,
            post_id,
            vote,
        } => (
            "POST",
            format!(
                "/api/vote-post?username={}&post_id={}&vote={}",
                pick(USERS, *username),
                fuzz_id(*post_id),
                vote
            ),
        ),
        FuzzOp::SendMessage {
            sender,
            recipient,
            content,
        } => (
            "POST",
            format!(
                "/api/send-message?sender={}&recipient={}&content={}",
                pick(USERS, *sender),
                pick(USERS, *recipient),
                pick(CONTENTS, *content)
            ),
        ),
        FuzzOp::ListMessages { username } => (
            "GET",
            format!("/api/list-messages?username={}", pick(USERS, *username)),
        ),
        FuzzOp::SimulateConnection {
            username,
            connected,
        } => (
            "POST",
            format!(
                "/api/simulate-connection?username={}&connected={}",
                pick(USERS, *username),
                connected
            ),
        ),
    }
}

/// Runs `op` directly against `engine`, returning the status and message the
/// HTTP layer is expected to produce for the same call.
fn apply(engine: &Engine, op: &FuzzOp) -> (StatusCode, String) {
    let res = match op {
        FuzzOp::RegisterUser { username, password } => engine
            .register_user(pick(USERS, *username), pick(CONTENTS, *password))
            .map(|()| reply::USER_REGISTERED.to_string()),
        FuzzOp::CreateSubreddit { name, creator } => engine
            .create_subreddit(pick(SUBREDDITS, *name), pick(USERS, *creator))
            .map(|()| reply::SUBREDDIT_CREATED.to_string()),
        FuzzOp::CreatePost {
            subreddit,
            author,
            content,
        } => engine
            .create_post(
                pick(SUBREDDITS, *subreddit),
                pick(USERS, *author),
                pick(CONTENTS, *content),
            )
            .map(reply::post_created),
        FuzzOp::AddComment {
            post_id,
            author,
            content,
        } => engine
            .add_comment(
                PostId(fuzz_id(*post_id)),
                pick(USERS, *author),
                pick(CONTENTS, *content),
            )
            .map(reply::comment_added),
        FuzzOp::ReplyToComment {
            comment_id,
            author,
            content,
        } => engine
            .reply_to_comment(
                CommentId(fuzz_id(*comment_id)),
                pick(USERS, *author),
                pick(CONTENTS, *content),
            )
            .map(reply::reply_added),
        FuzzOp::Feed { subreddit } => engine.render_feed(pick(SUBREDDITS, *subreddit)),
        FuzzOp::VotePost {
            username,
            post_id,
            vote,
        } => engine
            .vote_post(
                pick(USERS, *username),
                PostId(fuzz_id(*post_id)),
                i64::from(*vote),
            )
            .map(|()| reply::VOTE_REGISTERED.to_string()),
        FuzzOp::SendMessage {
            sender,
            recipient,
            content,
        } => engine
            .send_message(
                pick(USERS, *sender),
                pick(USERS, *recipient),
                pick(CONTENTS, *content),
            )
            .map(|()| reply::MESSAGE_SENT.to_string()),
        FuzzOp::ListMessages { username } => engine.list_messages(pick(USERS, *username)),
        FuzzOp::SimulateConnection {
            username,
            connected,
        } => engine
            .set_connection_status(pick(USERS, *username), *connected)
            .map(|connected| reply::connection_changed(pick(USERS, *username), connected)),
    };
    match res {
        Ok(message) => (StatusCode::OK, message),
        Err(err) => (err.status_code(), err.to_string()),
    }
}

async fn call(app: &mut Router, req: request::Request<axum::body::Body>) -> (StatusCode, String) {
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    let reply: Reply = serde_json::from_slice(&body)
        .unwrap_or_else(|err| panic!("parsing response body {err}, body is {body:?}"));
    (status, reply.message)
}

async fn run_on_app(app: &mut Router, method: &str, uri: &str) -> (StatusCode, String) {
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .expect("building request");
    call(app, req).await
}

fn compare(op: &FuzzOp, app_res: (StatusCode, String), engine_res: (StatusCode, String)) {
    assert_eq!(
        app_res, engine_res,
        "app and engine did not return the same result for {op:?}"
    );
}

struct ComparativeFuzzer {
    app: Router,
    engine: Engine,
}

impl ComparativeFuzzer {
    fn new() -> ComparativeFuzzer {
        ComparativeFuzzer {
            app: app(Engine::new()),
            engine: Engine::new(),
        }
    }

    #[async_recursion]
    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        match op {
            op @ FuzzOp::VotePost { .. } if self.engine.dump().posts.is_empty() => {
                // Make sure votes sometimes land on a live post.
                self.execute_fuzz_op(FuzzOp::CreateSubreddit {
                    name: 0,
                    creator: 0,
                })
                .await;
                self.execute_fuzz_op(FuzzOp::CreatePost {
                    subreddit: 0,
                    author: 0,
                    content: 0,
                })
                .await;
                self.execute_fuzz_op(op).await;
            }
            op => {
                let (method, uri) = encode(&op);
                let app_res = run_on_app(&mut self.app, method, &uri).await;
                let engine_res = apply(&self.engine, &op);
                compare(&op, app_res, engine_res);
            }
        }
    }
}

do_tokio_test!(
    compare_app_with_direct_calls,
    Vec<FuzzOp>,
    |test: Vec<FuzzOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new();
        for op in test {
            fuzzer.execute_fuzz_op(op).await;
        }
    }
);

#[tokio::test]
async fn discussion_flows_end_to_end() {
    let mut app = app(Engine::new());
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/register-user?username=alice&password=hunter2"
        )
        .await,
        (StatusCode::OK, "User registered successfully.".to_string())
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/create-subreddit?name=golang&creator=alice"
        )
        .await,
        (StatusCode::OK, "Subreddit created successfully.".to_string())
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/create-post?subreddit=golang&author=alice&content=hi"
        )
        .await,
        (
            StatusCode::OK,
            "Post created successfully with ID 1.".to_string()
        )
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/add-comment?post_id=1&author=bob&content=nice"
        )
        .await,
        (
            StatusCode::OK,
            "Comment added successfully with ID 2.".to_string()
        )
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/reply-to-comment?comment_id=2&author=alice&content=thanks"
        )
        .await,
        (
            StatusCode::OK,
            "Reply added successfully with ID 3.".to_string()
        )
    );

    // An up-vote later corrected to a down-vote only counts once.
    assert_eq!(
        run_on_app(&mut app, "POST", "/api/vote-post?username=bob&post_id=1&vote=1").await,
        (StatusCode::OK, "Vote registered successfully.".to_string())
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/vote-post?username=bob&post_id=1&vote=-1"
        )
        .await,
        (StatusCode::OK, "Vote registered successfully.".to_string())
    );

    let (status, feed) = run_on_app(&mut app, "GET", "/api/feed?subreddit=golang").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        feed,
        "Feed for Subreddit: golang\n\
         Post ID: 1 | Author: alice | Votes: -1 | Content: hi\n\
         \x20\x20Comment ID: 2 | Author: bob | Votes: 0 | Content: nice\n\
         \x20\x20\x20\x20Comment ID: 3 | Author: alice | Votes: 0 | Content: thanks\n"
    );
}

#[tokio::test]
async fn statuses_follow_the_failure_kind() {
    let mut app = app(Engine::new());
    assert_eq!(
        run_on_app(&mut app, "GET", "/api/feed?subreddit=nowhere").await,
        (
            StatusCode::NOT_FOUND,
            "Subreddit does not exist.".to_string()
        )
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/register-user?username=alice&password=a"
        )
        .await,
        (StatusCode::OK, "User registered successfully.".to_string())
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/register-user?username=alice&password=b"
        )
        .await,
        (StatusCode::CONFLICT, "Username already exists.".to_string())
    );
    assert_eq!(
        run_on_app(&mut app, "GET", "/api/list-messages?username=ghost").await,
        (StatusCode::NOT_FOUND, "User does not exist.".to_string())
    );
    assert_eq!(
        run_on_app(
            &mut app,
            "POST",
            "/api/send-message?sender=alice&recipient=ghost&content=hi"
        )
        .await,
        (
            StatusCode::NOT_FOUND,
            "Recipient does not exist.".to_string()
        )
    );
}

async fn status_of(app: &mut Router, method: &str, uri: &str) -> StatusCode {
    app.ready().await.expect("waiting for app to be ready");
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .expect("building request");
    app.call(req).await.expect("running request").status()
}

#[tokio::test]
async fn malformed_queries_are_rejected_before_the_engine() {
    let engine = Engine::new();
    let mut app = app(engine.clone());
    let before = engine.dump();

    // non-numeric id
    assert_eq!(
        status_of(
            &mut app,
            "POST",
            "/api/vote-post?username=alice&post_id=seven&vote=1"
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    // missing parameter
    assert_eq!(
        status_of(&mut app, "POST", "/api/create-post?subreddit=golang").await,
        StatusCode::BAD_REQUEST
    );
    // wrong method
    assert_eq!(
        status_of(
            &mut app,
            "GET",
            "/api/register-user?username=alice&password=a"
        )
        .await,
        StatusCode::METHOD_NOT_ALLOWED
    );

    assert_eq!(engine.dump(), before);
}

#[tokio::test]
async fn browser_preflight_is_allowed() {
    let mut app = app(Engine::new());
    app.ready().await.expect("waiting for app to be ready");
    let req = request::Builder::new()
        .method("OPTIONS")
        .uri("/api/feed")
        .header(http::header::ORIGIN, "http://localhost:8080")
        .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(axum::body::Body::empty())
        .expect("building request");
    let resp = app.call(req).await.expect("running request");
    assert!(
        resp.headers()
            .contains_key(http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "missing CORS response headers: {:?}",
        resp.headers()
    );
}

#[tokio::test]
async fn zipf_route_seeds_ten_subreddits() {
    let engine = Engine::new();
    let mut app = app(engine.clone());
    assert_eq!(
        run_on_app(&mut app, "POST", "/api/simulate-zipf").await,
        (
            StatusCode::OK,
            "Simulated Zipf distribution with enhanced posting and re-posting.".to_string()
        )
    );

    let state = engine.dump();
    assert_eq!(state.subreddits.len(), 10);
    assert!(!state.posts.is_empty());

    let (status, feed) = run_on_app(&mut app, "GET", "/api/feed?subreddit=subreddit_1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        feed.starts_with("Feed for Subreddit: subreddit_1\n"),
        "unexpected feed: {feed:?}"
    );
}
