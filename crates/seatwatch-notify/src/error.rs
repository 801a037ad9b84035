use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rejected the message: status {status}: {body}")]
    Api { status: u16, body: String },
}

impl From<Error> for seatwatch_core::Error {
    fn from(err: Error) -> Self {
        seatwatch_core::Error::Notify(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
