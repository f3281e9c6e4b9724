use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] hibari_client::Error),

    #[error(transparent)]
    Validate(#[from] garde::Report),
}
