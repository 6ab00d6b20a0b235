use std::fmt;

use anyhow::{anyhow, Context};
use serde_json::json;

/// What an operation failed to find, or refused to create twice.
///
/// The variant picks the noun used in the client-visible message, so
/// `NotFound(Resource::User)` and `NotFound(Resource::Recipient)` are
/// distinct errors even though both mean a username lookup failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Resource {
    Comment,
    Post,
    Recipient,
    Subreddit,
    User,
    Username,
}

impl Resource {
    fn from_name(name: &str) -> Option<Resource> {
        Some(match name {
            "Comment" => Resource::Comment,
            "Post" => Resource::Post,
            "Recipient" => Resource::Recipient,
            "Subreddit" => Resource::Subreddit,
            "User" => Resource::User,
            "Username" => Resource::Username,
            _ => return None,
        })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Comment => "Comment",
            Resource::Post => "Post",
            Resource::Recipient => "Recipient",
            Resource::Subreddit => "Subreddit",
            Resource::User => "User",
            Resource::Username => "Username",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0} already exists.")]
    AlreadyExists(Resource),

    #[error("{0} does not exist.")]
    NotFound(Resource),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&json!({ "message": self.to_string() }))
            .expect("serializing error message")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = data
            .get("message")
            .and_then(|m| m.as_str())
            .ok_or_else(|| anyhow!("error message is not a string"))?;
        if let Some(name) = message.strip_suffix(" already exists.") {
            let resource = Resource::from_name(name)
                .ok_or_else(|| anyhow!("unknown resource in error message: {message:?}"))?;
            return Ok(Error::AlreadyExists(resource));
        }
        if let Some(name) = message.strip_suffix(" does not exist.") {
            let resource = Resource::from_name(name)
                .ok_or_else(|| anyhow!("unknown resource in error message: {message:?}"))?;
            return Ok(Error::NotFound(resource));
        }
        Err(anyhow!("error contents has unknown message: {message:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_visible_messages() {
        assert_eq!(
            Error::AlreadyExists(Resource::Username).to_string(),
            "Username already exists.",
        );
        assert_eq!(
            Error::AlreadyExists(Resource::Subreddit).to_string(),
            "Subreddit already exists.",
        );
        assert_eq!(
            Error::NotFound(Resource::Subreddit).to_string(),
            "Subreddit does not exist.",
        );
        assert_eq!(
            Error::NotFound(Resource::Post).to_string(),
            "Post does not exist.",
        );
        assert_eq!(
            Error::NotFound(Resource::Comment).to_string(),
            "Comment does not exist.",
        );
        assert_eq!(
            Error::NotFound(Resource::Recipient).to_string(),
            "Recipient does not exist.",
        );
        assert_eq!(
            Error::NotFound(Resource::User).to_string(),
            "User does not exist.",
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            Error::AlreadyExists(Resource::Username).status_code(),
            http::StatusCode::CONFLICT,
        );
        assert_eq!(
            Error::NotFound(Resource::Post).status_code(),
            http::StatusCode::NOT_FOUND,
        );
    }

    #[test]
    fn round_trips_through_contents() {
        bolero::check!()
            .with_type::<(bool, u8)>()
            .cloned()
            .for_each(|(exists, resource)| {
                let resource = match resource % 6 {
                    0 => Resource::Comment,
                    1 => Resource::Post,
                    2 => Resource::Recipient,
                    3 => Resource::Subreddit,
                    4 => Resource::User,
                    _ => Resource::Username,
                };
                let err = match exists {
                    true => Error::AlreadyExists(resource),
                    false => Error::NotFound(resource),
                };
                let parsed = Error::parse(&err.contents()).expect("parsing error contents");
                assert_eq!(err, parsed);
            })
    }
}
