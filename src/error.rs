//! Server error type.

/// Infrastructure failures surfaced by [`Server`](crate::Server).
///
/// Application-level errors (404, 500 from the gateway, etc.) are expressed
/// as HTTP [`Response`](crate::Response) values, not as `Error`s. This type
/// covers binding to a port and reading the bound address.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
