use thiserror::Error;

#[derive(Error, Debug)]
pub enum UrlError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL has no scheme: {0}")]
    MissingScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

pub type Result<T> = std::result::Result<T, UrlError>;
