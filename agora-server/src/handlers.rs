use axum::{
    extract::{Query, State},
    Json,
};

use agora_engine::{reply, CommentId, Engine, PostId};

use crate::Error;

/// Envelope around every response body, success or failure.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct Reply {
    pub message: String,
}

fn ack(message: impl Into<String>) -> Json<Reply> {
    Json(Reply {
        message: message.into(),
    })
}

#[derive(Debug, serde::Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub password: String,
}

pub async fn register_user(
    State(engine): State<Engine>,
    Query(req): Query<RegisterUser>,
) -> Result<Json<Reply>, Error> {
    engine.register_user(&req.username, &req.password)?;
    Ok(ack(reply::USER_REGISTERED))
}

#[derive(Debug, serde::Deserialize)]
pub struct CreateSubreddit {
    pub name: String,
    pub creator: String,
}

pub async fn create_subreddit(
    State(engine): State<Engine>,
    Query(req): Query<CreateSubreddit>,
) -> Result<Json<Reply>, Error> {
    engine.create_subreddit(&req.name, &req.creator)?;
    Ok(ack(reply::SUBREDDIT_CREATED))
}

#[derive(Debug, serde::Deserialize)]
pub struct CreatePost {
    pub subreddit: String,
    pub author: String,
    pub content: String,
}

pub async fn create_post(
    State(engine): State<Engine>,
    Query(req): Query<CreatePost>,
) -> Result<Json<Reply>, Error> {
    let id = engine.create_post(&req.subreddit, &req.author, &req.content)?;
    Ok(ack(reply::post_created(id)))
}

#[derive(Debug, serde::Deserialize)]
pub struct AddComment {
    pub post_id: PostId,
    pub author: String,
    pub content: String,
}

pub async fn add_comment(
    State(engine): State<Engine>,
    Query(req): Query<AddComment>,
) -> Result<Json<Reply>, Error> {
    let id = engine.add_comment(req.post_id, &req.author, &req.content)?;
    Ok(ack(reply::comment_added(id)))
}

#[derive(Debug, serde::Deserialize)]
pub struct ReplyToComment {
    pub comment_id: CommentId,
    pub author: String,
    pub content: String,
}

pub async fn reply_to_comment(
    State(engine): State<Engine>,
    Query(req): Query<ReplyToComment>,
) -> Result<Json<Reply>, Error> {
    let id = engine.reply_to_comment(req.comment_id, &req.author, &req.content)?;
    Ok(ack(reply::reply_added(id)))
}

#[derive(Debug, serde::Deserialize)]
pub struct Feed {
    pub subreddit: String,
}

pub async fn feed(
    State(engine): State<Engine>,
    Query(req): Query<Feed>,
) -> Result<Json<Reply>, Error> {
    Ok(ack(engine.render_feed(&req.subreddit)?))
}

#[derive(Debug, serde::Deserialize)]
pub struct VotePost {
    pub username: String,
    pub post_id: PostId,
    pub vote: i64,
}

pub async fn vote_post(
    State(engine): State<Engine>,
    Query(req): Query<VotePost>,
) -> Result<Json<Reply>, Error> {
    engine.vote_post(&req.username, req.post_id, req.vote)?;
    Ok(ack(reply::VOTE_REGISTERED))
}

#[derive(Debug, serde::Deserialize)]
pub struct SendMessage {
    pub sender: String,
    pub recipient: String,
    pub content: String,
}

pub async fn send_message(
    State(engine): State<Engine>,
    Query(req): Query<SendMessage>,
) -> Result<Json<Reply>, Error> {
    engine.send_message(&req.sender, &req.recipient, &req.content)?;
    Ok(ack(reply::MESSAGE_SENT))
}

#[derive(Debug, serde::Deserialize)]
pub struct ListMessages {
    pub username: String,
}

pub async fn list_messages(
    State(engine): State<Engine>,
    Query(req): Query<ListMessages>,
) -> Result<Json<Reply>, Error> {
    Ok(ack(engine.list_messages(&req.username)?))
}

#[derive(Debug, serde::Deserialize)]
pub struct SimulateConnection {
    pub username: String,
    pub connected: bool,
}

pub async fn simulate_connection(
    State(engine): State<Engine>,
    Query(req): Query<SimulateConnection>,
) -> Result<Json<Reply>, Error> {
    let connected = engine.set_connection_status(&req.username, req.connected)?;
    Ok(ack(reply::connection_changed(&req.username, connected)))
}

pub async fn simulate_zipf(State(engine): State<Engine>) -> Json<Reply> {
    engine.simulate_zipf();
    ack(reply::ZIPF_SIMULATED)
}
