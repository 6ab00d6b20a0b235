use axum::response::IntoResponse;

/// Wrapper that lets handlers bubble engine errors with `?`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] agora_engine::Error);

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let Error(err) = self;
        tracing::info!("returning error to client: {err}");
        (err.status_code(), err.contents()).into_response()
    }
}
