#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    /// Opaque secret, stored as provided at registration
    pub password: String,

    /// Sum of the currently-recorded votes on this user's posts
    pub karma: i64,

    /// Direct messages in arrival order
    pub inbox: Vec<Message>,
}

impl User {
    pub fn new(password: String) -> User {
        User {
            password,
            karma: 0,
            inbox: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Message {
    pub sender: String,
    pub content: String,
}
