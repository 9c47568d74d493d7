use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build request url: {0}")]
    Url(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {path}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        path: String,
    },

    #[error("Beacon node returned no head header")]
    HeadNotFound,

    #[error("Shared in-flight fetch for slot {slot} failed")]
    SharedFlightFailed { slot: u64 },

    #[error("Client is shutting down")]
    Shutdown,
}
