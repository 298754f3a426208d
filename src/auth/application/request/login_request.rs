use serde::Serialize;

/// Body of `POST /access/ticket`.
#[derive(Serialize)]
pub struct LoginRequest {
    /// Full user id (`user@realm`).
    pub username: String,
    pub password: String,
}
