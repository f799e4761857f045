// ABOUTME: Controlling-terminal access: line-discipline control, reply reads, output stream
// ABOUTME: TerminalIo is the seam between the engine and a real or scripted terminal

use crate::error::Result;
use std::io::Write;
use std::time::Duration;

pub mod mode;
pub mod session;
pub mod tty;

pub use mode::RawModeGuard;
pub use session::TerminalSession;
pub use tty::Tty;

/// A terminal the engine can probe and draw on.
///
/// Writes go to the terminal's output stream; reads come from its input.
pub trait TerminalIo: Write {
    /// Disable canonical input and echo, discarding pending input.
    fn set_raw_like(&mut self) -> Result<()>;

    /// Reapply the line discipline captured when the terminal was opened.
    fn restore_saved(&mut self) -> Result<()>;

    /// Wait until input is available. `Ok(false)` means the timeout elapsed.
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool>;

    /// Read a single byte; `None` on end of input.
    fn read_byte(&mut self) -> std::io::Result<Option<u8>>;
}
