use std::fmt;

/// Centralized error type for the bot.
#[derive(Debug)]
pub enum BotError {
    /// Extraction backend returned no usable formats
    NoFormatsAvailable,
    /// Neither a muxed stream nor an audio fallback could be resolved
    MediaUnavailable,
    /// Shortening backend answered with a non-success status
    ShorteningFailed { status: u16, body: String },
    /// Link record store call failed
    StoreFailure(String),
    /// An external call exceeded its time bound
    UpstreamTimeout(&'static str),
    /// yt-dlp failed to spawn or exited non-zero
    ExtractionFailed(String),
    /// Data from an external system couldn't be parsed
    ParseError(String),
    /// Telegram API errors
    TelegramError(teloxide::RequestError),
    /// Missing or malformed startup configuration (fatal)
    ConfigError(String),
    /// Generic error with a description
    General(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::NoFormatsAvailable => write!(f, "no downloadable formats available"),
            BotError::MediaUnavailable => write!(f, "no muxed or audio stream available"),
            BotError::ShorteningFailed { status, body } => {
                write!(f, "shortening failed with status {}: {}", status, body)
            }
            BotError::StoreFailure(msg) => write!(f, "link store failure: {}", msg),
            BotError::UpstreamTimeout(what) => write!(f, "{} call timed out", what),
            BotError::ExtractionFailed(msg) => write!(f, "extraction failed: {}", msg),
            BotError::ParseError(msg) => write!(f, "parse error: {}", msg),
            BotError::TelegramError(e) => write!(f, "Telegram API error: {}", e),
            BotError::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            BotError::General(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::TelegramError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::TelegramError(err)
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::ParseError(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::ExtractionFailed(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BotError::UpstreamTimeout("http")
        } else {
            BotError::General(format!("HTTP error: {}", err))
        }
    }
}

impl BotError {
    pub fn extraction_failed(msg: impl Into<String>) -> Self {
        Self::ExtractionFailed(msg.into())
    }

    pub fn store_failure(msg: impl Into<String>) -> Self {
        Self::StoreFailure(msg.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }

    /// Text shown to the user when this error aborts a request.
    /// Every recoverable failure ends up here and the session returns to idle.
    pub fn user_message(&self) -> String {
        match self {
            BotError::NoFormatsAvailable => {
                "No downloadable formats found. Please try another video.".to_string()
            }
            BotError::MediaUnavailable => {
                "❌ Audio not found for this video. Try another quality or video.".to_string()
            }
            BotError::ShorteningFailed { .. } => {
                "❌ Couldn't generate a short link. Please try again later.".to_string()
            }
            BotError::StoreFailure(_) => {
                "❌ Couldn't save your download link. Please try again later.".to_string()
            }
            BotError::UpstreamTimeout(_) => {
                "❌ The request took too long. Please try again.".to_string()
            }
            BotError::ExtractionFailed(msg) => {
                format!("Error fetching link: {}\nTry another video.", msg)
            }
            other => format!("❌ Error: {}", other),
        }
    }
}

/// Result of bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Result for handlers
pub type HandlerResult = BotResult<()>;
