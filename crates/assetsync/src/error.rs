use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load configuration")]
    Config(#[source] Box<figment::Error>),

    #[error("invalid manifest entry `{0}`: must be a bare file name")]
    ManifestEntry(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Fs(#[from] assetsync_fs::Error),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
