// ABOUTME: Terminal inline image engine: capability probing plus kitty, iTerm2 and sixel output
// ABOUTME: Restores the terminal's line discipline on every path that changes it

pub mod constants;
pub mod decoder;
pub mod detection;
pub mod error;
pub mod executable;
pub mod image_protocols;
pub mod probe;
pub mod protocol;
pub mod scaling;
pub mod terminal;
pub mod viewer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use detection::Capabilities;
pub use error::{Result, TermImgError};
pub use executable::find_executable;
pub use image_protocols::ControlParams;
pub use protocol::Protocol;
pub use scaling::scale_fit;
pub use terminal::{TerminalIo, TerminalSession, Tty};
pub use viewer::{ImageSource, ImageViewer, ProtocolSelection, ShowOptions};
