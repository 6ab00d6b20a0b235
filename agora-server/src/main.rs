use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use agora_engine::Engine;

mod error;
mod fuzz;
mod handlers;

pub use error::Error;

pub fn app(engine: Engine) -> Router {
    Router::new()
        .route("/api/register-user", post(handlers::register_user))
        .route("/api/create-subreddit", post(handlers::create_subreddit))
        .route("/api/create-post", post(handlers::create_post))
        .route("/api/add-comment", post(handlers::add_comment))
        .route("/api/reply-to-comment", post(handlers::reply_to_comment))
        .route("/api/feed", get(handlers::feed))
        .route("/api/vote-post", post(handlers::vote_post))
        .route("/api/send-message", post(handlers::send_message))
        .route("/api/list-messages", get(handlers::list_messages))
        .route(
            "/api/simulate-connection",
            post(handlers::simulate_connection),
        )
        .route("/api/simulate-zipf", post(handlers::simulate_zipf))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let addr = match std::env::var("AGORA_ADDR") {
        Ok(addr) => addr
            .parse()
            .with_context(|| format!("parsing listen address {:?}", addr))?,
        Err(_) => SocketAddr::from(([127, 0, 0, 1], 3000)),
    };

    let app = app(Engine::new());

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
