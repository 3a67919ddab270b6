use std::fmt;

/// Crate-level error.
#[derive(Debug)]
pub enum Error {
    Tone(ToneError),
    Note(NoteError),
    Config(ConfigError),
    Render(RenderError),
}

/// Value a tone resolves with when it runs to its scheduled end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneEnded;

/// Failure side of a tone outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneError {
    /// The tone was cancelled by `ToneEngine::stop` before it ended.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    Empty,
    UnknownName { name: String },
    InvalidOctave { text: String },
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug)]
pub enum RenderError {
    Wav(hound::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Tone(e) => write!(f, "Tone error: {e}"),
            Error::Note(e) => write!(f, "Note error: {e}"),
            Error::Config(e) => write!(f, "Config error: {e}"),
            Error::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for ToneEnded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tone ended")
    }
}

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneError::Aborted => f.write_str("tone aborted"),
        }
    }
}

impl std::error::Error for ToneError {}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteError::Empty => f.write_str("Empty note"),
            NoteError::UnknownName { name } => write!(f, "Unknown note name '{name}'"),
            NoteError::InvalidOctave { text } => write!(f, "Invalid octave '{text}'"),
        }
    }
}

impl std::error::Error for NoteError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "Malformed config: {e}"),
            ConfigError::Invalid { field, reason } => write!(f, "Invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Wav(e) => write!(f, "WAV encoding failed: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Wav(e) => Some(e),
        }
    }
}

impl From<ToneError> for Error {
    fn from(e: ToneError) -> Self {
        Error::Tone(e)
    }
}

impl From<NoteError> for Error {
    fn from(e: NoteError) -> Self {
        Error::Note(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::Render(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<hound::Error> for RenderError {
    fn from(e: hound::Error) -> Self {
        RenderError::Wav(e)
    }
}
