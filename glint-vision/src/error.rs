use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported landmark provider: {0}")]
    UnsupportedProvider(String),

    #[error("landmark {index} missing from {provider} set of {len} points")]
    MissingLandmark {
        provider: &'static str,
        index: usize,
        len: usize,
    },

    #[error("invalid source image: {0}")]
    InvalidSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
