// ABOUTME: Error types for the terminal image engine with user-facing hints
// ABOUTME: Only terminal-mode, I/O, decode, encode and process failures ever reach the caller

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermImgError {
    #[error("Failed to change terminal mode: {0}")]
    TerminalMode(#[source] nix::Error),

    #[error("Standard input is not a terminal")]
    NotATerminal,

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to run {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode sixel: {0}")]
    SixelEncode(String),

    #[error("Unknown image protocol '{0}'")]
    UnknownProtocol(String),
}

impl TermImgError {
    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            TermImgError::TerminalMode(_) => {
                Some("The terminal may be left in an odd state; run `stty sane` to reset it")
            }
            TermImgError::NotATerminal => {
                Some("Run the command from an interactive terminal, not through a pipe")
            }
            TermImgError::Process { .. } => {
                Some("Install ImageMagick or build with the `native-sixel` feature")
            }
            TermImgError::UnknownProtocol(_) => {
                Some("Valid protocols: auto, kitty, kitty+, iterm, sixel, none")
            }
            _ => None,
        }
    }

    /// True when the error leaves the terminal in an unknown line-discipline state.
    pub fn is_terminal_state_lost(&self) -> bool {
        matches!(self, TermImgError::TerminalMode(_))
    }
}

pub type Result<T> = std::result::Result<T, TermImgError>;
