use std::fmt;

/// Top-level error for the tap loop.
#[derive(Debug)]
pub enum TapError {
    Channel(ChannelError),
    Parse(ParseError),
}

/// Failures on the debugging channel itself.
#[derive(Debug)]
pub enum ChannelError {
    ConnectFailed(String),
    CommandFailed { method: String, message: String },
    ChannelClosed,
    AlreadySubscribed,
    Protocol(String),
}

/// Failures while decoding a fetched body. These are captured as values in
/// the decoded payload, not raised, so handlers can interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Json(String),
    MissingBody,
}

impl fmt::Display for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapError::Channel(e) => write!(f, "Channel error: {}", e),
            TapError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::ConnectFailed(msg) => write!(f, "Connect failed: {}", msg),
            ChannelError::CommandFailed { method, message } => {
                write!(f, "Command {} failed: {}", method, message)
            }
            ChannelError::ChannelClosed => write!(f, "Channel is closed"),
            ChannelError::AlreadySubscribed => write!(f, "Event stream already taken"),
            ChannelError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Json(msg) => write!(f, "JSON parse error: {}", msg),
            ParseError::MissingBody => write!(f, "No body present"),
        }
    }
}

impl std::error::Error for TapError {}
impl std::error::Error for ChannelError {}
impl std::error::Error for ParseError {}

impl From<ChannelError> for TapError {
    fn from(error: ChannelError) -> Self {
        TapError::Channel(error)
    }
}

impl From<ParseError> for TapError {
    fn from(error: ParseError) -> Self {
        TapError::Parse(error)
    }
}
