// ABOUTME: One interactive terminal session per process with its memoized capabilities
// ABOUTME: Owns the terminal handle, the capability cache and the chosen sixel backend

use super::{TerminalIo, Tty};
use crate::detection::Capabilities;
use crate::error::Result;
use crate::image_protocols::sixel::SixelBackend;

pub struct TerminalSession<T: TerminalIo = Tty> {
    pub(crate) term: T,
    pub(crate) capabilities: Capabilities,
    pub(crate) sixel_backend: Option<SixelBackend>,
}

impl TerminalSession<Tty> {
    /// Open the controlling terminal on stdin.
    pub fn open() -> Result<Self> {
        Ok(Self::new(Tty::from_stdin()?))
    }
}

impl<T: TerminalIo> TerminalSession<T> {
    pub fn new(term: T) -> Self {
        Self {
            term,
            capabilities: Capabilities::default(),
            sixel_backend: None,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn terminal(&self) -> &T {
        &self.term
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.term
    }

    pub fn into_terminal(self) -> T {
        self.term
    }

    /// Override the sixel backend instead of detecting it on first use.
    pub fn set_sixel_backend(&mut self, backend: SixelBackend) {
        self.sixel_backend = Some(backend);
    }

    /// The sixel backend, detected once and then reused.
    pub fn sixel_backend(&mut self) -> &SixelBackend {
        self.sixel_backend.get_or_insert_with(SixelBackend::detect)
    }

    /// Write bytes to the terminal's output stream and flush.
    pub fn write_output(&mut self, bytes: &[u8]) -> Result<()> {
        self.term.write_all(bytes)?;
        self.term.flush()?;
        Ok(())
    }
}
