use thiserror::Error;

/// Fatal failure classes for a watch run.
///
/// Recoverable conditions (a dropdown that never matched, a missing control,
/// a missing results table) are expressed as return values by the components
/// that encounter them and never cross a component boundary as errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Mandatory context not established: {0}")]
    ContextNotEstablished(String),

    #[error("Notify error: {0}")]
    Notify(String),
}

pub type Result<T> = std::result::Result<T, Error>;
