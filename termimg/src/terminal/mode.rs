// ABOUTME: Scoped raw-like terminal mode with guaranteed restoration
// ABOUTME: Dropping the guard restores the saved line discipline on every exit path

use super::TerminalIo;
use crate::error::Result;
use std::ops::{Deref, DerefMut};

pub struct RawModeGuard<'a, T: TerminalIo + ?Sized> {
    term: &'a mut T,
    active: bool,
}

impl<'a, T: TerminalIo + ?Sized> RawModeGuard<'a, T> {
    /// Switch the terminal to raw-like mode for the lifetime of the guard.
    pub fn acquire(term: &'a mut T) -> Result<Self> {
        if let Err(e) = term.set_raw_like() {
            // The set call may have partially applied; put the saved settings back
            if let Err(restore_err) = term.restore_saved() {
                log::warn!("Failed to restore terminal after mode error: {}", restore_err);
            }
            return Err(e);
        }
        Ok(Self { term, active: true })
    }

    /// Restore the saved mode now, surfacing a failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.active = false;
        self.term.restore_saved()
    }
}

impl<T: TerminalIo + ?Sized> Deref for RawModeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.term
    }
}

impl<T: TerminalIo + ?Sized> DerefMut for RawModeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.term
    }
}

impl<T: TerminalIo + ?Sized> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.term.restore_saved() {
                log::warn!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}
