// ABOUTME: Real controlling terminal backed by stdin/stdout and POSIX termios
// ABOUTME: Captures the original line discipline and restores it at exit or on a fatal interrupt

use super::TerminalIo;
use crate::error::{Result, TermImgError};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use std::fs::File;
use std::io::{self, IsTerminal, Read, Stdout, Write};
use std::os::fd::AsFd;
use std::sync::OnceLock;
use std::time::Duration;

/// Settings to reapply to stdin when the process exits.
static EXIT_RESTORE: OnceLock<libc::termios> = OnceLock::new();

extern "C" fn restore_at_exit() {
    if let Some(saved) = EXIT_RESTORE.get() {
        // SAFETY: `saved` is a fully initialized termios captured from this tty
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, saved);
        }
    }
}

fn register_exit_restore(saved: &Termios) {
    let raw: libc::termios = saved.clone().into();
    if EXIT_RESTORE.set(raw).is_ok() {
        // SAFETY: the handler only reads a static that is never written again
        let rc = unsafe { libc::atexit(restore_at_exit) };
        if rc != 0 {
            log::warn!("Could not register terminal restore at exit");
        }
    }
}

/// Keyboard and termination signals that would otherwise kill the process mid-probe.
const INTERRUPT_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTERM];

extern "C" fn restore_and_reraise(signum: libc::c_int) {
    restore_at_exit();
    // SAFETY: signal and raise are async-signal-safe
    unsafe {
        libc::signal(signum, libc::SIG_DFL);
        libc::raise(signum);
    }
}

/// Handlers that restore the saved settings before a fatal signal is redelivered.
///
/// Only default dispositions are replaced; handlers and ignores installed by
/// the application stay in effect. Dropping puts the previous actions back.
struct InterruptRestore {
    previous: Vec<(Signal, SigAction)>,
}

impl InterruptRestore {
    fn install() -> Result<Self> {
        let action = SigAction::new(
            SigHandler::Handler(restore_and_reraise),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let mut installed = Self {
            previous: Vec::with_capacity(INTERRUPT_SIGNALS.len()),
        };

        for sig in INTERRUPT_SIGNALS {
            // SAFETY: the handler only makes async-signal-safe calls
            let previous =
                unsafe { signal::sigaction(sig, &action) }.map_err(TermImgError::TerminalMode)?;
            if previous.handler() != SigHandler::SigDfl {
                // SAFETY: reinstates the action that was just replaced
                unsafe { signal::sigaction(sig, &previous) }.map_err(TermImgError::TerminalMode)?;
                continue;
            }
            installed.previous.push((sig, previous));
        }
        Ok(installed)
    }
}

impl Drop for InterruptRestore {
    fn drop(&mut self) {
        for (sig, previous) in self.previous.drain(..) {
            // SAFETY: reinstates an action previously returned by sigaction
            if let Err(e) = unsafe { signal::sigaction(sig, &previous) } {
                log::warn!("Failed to reset the {} handler: {}", sig, e);
            }
        }
    }
}

pub struct Tty {
    input: File,
    output: Stdout,
    saved: Termios,
    interrupts: Option<InterruptRestore>,
}

impl Tty {
    /// Open the controlling terminal on stdin, capturing its current settings.
    pub fn from_stdin() -> Result<Self> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(TermImgError::NotATerminal);
        }

        // Unbuffered handle so single-byte reads never swallow a later reply
        let input = File::from(stdin.as_fd().try_clone_to_owned()?);
        let saved = termios::tcgetattr(&input).map_err(TermImgError::TerminalMode)?;
        register_exit_restore(&saved);

        Ok(Self {
            input,
            output: io::stdout(),
            saved,
            interrupts: None,
        })
    }

    /// Line discipline captured when the terminal was opened.
    pub fn saved_settings(&self) -> &Termios {
        &self.saved
    }
}

impl TerminalIo for Tty {
    fn set_raw_like(&mut self) -> Result<()> {
        let mut raw = termios::tcgetattr(&self.input).map_err(TermImgError::TerminalMode)?;
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);

        if self.interrupts.is_none() {
            self.interrupts = Some(InterruptRestore::install()?);
        }
        termios::tcsetattr(&self.input, SetArg::TCSAFLUSH, &raw)
            .map_err(TermImgError::TerminalMode)
    }

    fn restore_saved(&mut self) -> Result<()> {
        let restored = termios::tcsetattr(&self.input, SetArg::TCSAFLUSH, &self.saved)
            .map_err(TermImgError::TerminalMode);
        // A signal still pending is delivered after the settings are back
        self.interrupts = None;
        restored
    }

    fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.input.as_fd(), PollFlags::POLLIN)];

        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(ready) => Ok(ready > 0),
            Err(nix::Error::EINTR) => Ok(false),
            Err(e) => Err(TermImgError::Io(io::Error::from(e))),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.output.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.lock().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn current_handler(signum: libc::c_int) -> libc::sighandler_t {
        // SAFETY: a null action only queries the current disposition
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            libc::sigaction(signum, std::ptr::null(), &mut action);
            action.sa_sigaction
        }
    }

    #[test]
    #[serial]
    fn test_interrupt_handlers_live_only_while_installed() {
        assert_eq!(current_handler(libc::SIGQUIT), libc::SIG_DFL);

        let installed = InterruptRestore::install().unwrap();
        assert_eq!(
            current_handler(libc::SIGQUIT),
            restore_and_reraise as libc::sighandler_t
        );
        assert_eq!(
            current_handler(libc::SIGINT),
            restore_and_reraise as libc::sighandler_t
        );

        drop(installed);
        assert_eq!(current_handler(libc::SIGQUIT), libc::SIG_DFL);
        assert_eq!(current_handler(libc::SIGINT), libc::SIG_DFL);
    }

    #[test]
    #[serial]
    fn test_ignored_signals_stay_ignored() {
        // SAFETY: test-only disposition changes, reset below
        unsafe {
            libc::signal(libc::SIGQUIT, libc::SIG_IGN);
        }

        let installed = InterruptRestore::install().unwrap();
        assert_eq!(current_handler(libc::SIGQUIT), libc::SIG_IGN);
        drop(installed);
        assert_eq!(current_handler(libc::SIGQUIT), libc::SIG_IGN);

        unsafe {
            libc::signal(libc::SIGQUIT, libc::SIG_DFL);
        }
    }
}
