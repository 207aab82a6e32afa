use thiserror::Error;

/// Main error type for the recorder
#[derive(Error, Debug)]
pub enum WriterError {
    /// A standard I/O error while persisting segments or playlists
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The (input, output) sample rate pair has no resample mode
    #[error("Unsupported rate ratio: input={input_rate} Hz, output={output_rate} Hz")]
    UnsupportedRateRatio { input_rate: u32, output_rate: u32 },

    /// A separable segment or index was requested before any init segment
    #[error("No initialization segment recorded for stream: {0}")]
    NoInitializationSegment(String),

    /// The encoder cannot take more input right now
    #[error("Encoder not ready for more media data")]
    EncoderNotReady,

    /// The encoder failed to start, failed mid-stream or failed to drain
    #[error("Encoder session error: {0}")]
    EncoderSession(String),

    /// An error occurred while handling segment reports
    #[error("Muxing error: {0}")]
    Muxing(String),

    /// A stream failed earlier and no longer accepts input or closes
    #[error("Stream aborted: {0}")]
    StreamAborted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input was sent to a session that has already been closed
    #[error("Session already closed")]
    SessionClosed,
}

impl WriterError {
    /// Errors that are recovered locally by dropping the current unit.
    pub fn is_transient(&self) -> bool {
        matches!(self, WriterError::EncoderNotReady)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WriterError>;
