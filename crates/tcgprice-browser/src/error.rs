use tcgprice_core::FetchError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("unexpected page content: {0}")]
    ParseError(String),
}

impl From<BrowserError> for FetchError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::ChromiumError(reason) => Self::Browser(reason),
            BrowserError::NavigationError(reason) => Self::Navigation {
                url: String::new(),
                reason,
            },
            BrowserError::Timeout(reason) => Self::Timeout(reason),
            BrowserError::InvalidSelector(reason) | BrowserError::ParseError(reason) => {
                Self::Parse(reason)
            }
        }
    }
}
