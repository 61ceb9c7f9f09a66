use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a sprite could not be produced.
///
/// Every variant is terminal for the job at hand; the worker reports it and
/// never retries inside this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{tool} is not installed or not on PATH")]
    ToolNotFound { tool: String },

    /// The tool ran but exited non-zero, or exited cleanly without writing
    /// its output. `message` carries the exit code and trimmed stderr.
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("input does not exist: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input path cannot be turned into a sprite path.
    #[error("unusable input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_tool_and_path() {
        assert_eq!(
            Error::tool_failed("ffmpeg", "exit code 1").to_string(),
            "ffmpeg failed: exit code 1"
        );
        assert_eq!(
            Error::tool_not_found("ffmpeg").to_string(),
            "ffmpeg is not installed or not on PATH"
        );
        assert_eq!(
            Error::file_not_found("/tmp/missing.mp4").to_string(),
            "input does not exist: /tmp/missing.mp4"
        );
    }
}
