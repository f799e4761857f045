// ABOUTME: Request/response round-trips with the terminal and parsing of its replies
// ABOUTME: Timeouts and malformed replies collapse to the (-1, -1) sentinel or "unsupported"

use crate::constants::{UNKNOWN_SIZE, framing, probes, terminators, timeouts};
use crate::error::Result;
use crate::terminal::{RawModeGuard, TerminalIo, TerminalSession};
use std::time::Duration;

/// Send `command` and collect the reply up to and including a terminator.
///
/// Returns an empty string when the terminal does not start answering within
/// `timeout`. The terminal is in raw-like mode only for the duration of the call.
pub fn request<T: TerminalIo + ?Sized>(
    term: &mut T,
    command: &[u8],
    terminators: &[&[u8]],
    timeout: Duration,
) -> Result<String> {
    let mut guard = RawModeGuard::acquire(term)?;
    guard.write_all(command)?;
    guard.flush()?;

    let reply = read_reply(&mut *guard, terminators, timeout)?;
    guard.release()?;

    let reply = String::from_utf8_lossy(&reply).into_owned();
    log::debug!("Terminal request {:?} -> {:?}", String::from_utf8_lossy(command), reply);
    Ok(reply)
}

fn read_reply<T: TerminalIo + ?Sized>(
    term: &mut T,
    terminators: &[&[u8]],
    timeout: Duration,
) -> Result<Vec<u8>> {
    let mut reply = Vec::new();

    while reply.len() < framing::MAX_REPLY_LEN {
        // A stalled partial reply ends the read rather than blocking forever
        if !term.wait_readable(timeout)? {
            break;
        }
        match term.read_byte() {
            Ok(Some(byte)) => {
                reply.push(byte);
                if terminators.iter().any(|t| reply.ends_with(t)) {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("Reading terminal reply failed: {}", e);
                break;
            }
        }
    }

    Ok(reply)
}

/// Parse an xterm window report `ESC [ <code> ; a ; b t` into `(a, b)`.
pub fn parse_window_report(reply: &str, code: char) -> (i32, i32) {
    let parts: Vec<&str> = reply.split(';').collect();
    if parts.len() < 3 || !parts[0].ends_with(code) {
        return UNKNOWN_SIZE;
    }

    let first = parts[1].parse::<i32>();
    let second = parts[2].strip_suffix('t').unwrap_or(parts[2]).parse::<i32>();
    match (first, second) {
        (Ok(a), Ok(b)) => (a, b),
        _ => UNKNOWN_SIZE,
    }
}

/// Parse `ESC ] 1337 ; ReportCellSize=H ; W [; F] <BEL|ST>` into rounded `(H*F, W*F)`.
pub fn parse_iterm_cell_size(reply: &str) -> (i32, i32) {
    let body = reply
        .strip_suffix('\x07')
        .or_else(|| reply.strip_suffix("\x1b\\"))
        .unwrap_or(reply);

    let parts: Vec<&str> = body.split(';').collect();
    if !(3..=4).contains(&parts.len()) {
        return UNKNOWN_SIZE;
    }
    let Some(height) = parts[1].strip_prefix("ReportCellSize=") else {
        return UNKNOWN_SIZE;
    };

    let height = height.parse::<f64>();
    let width = parts[2].parse::<f64>();
    let factor = parts.get(3).map_or(Ok(1.0), |f| f.parse::<f64>());
    match (height, width, factor) {
        (Ok(h), Ok(w), Ok(f)) => ((h * f).round() as i32, (w * f).round() as i32),
        _ => UNKNOWN_SIZE,
    }
}

/// Any graphics reply means the terminal understood the basic query.
pub fn kitty_reply_supported(reply: &str) -> bool {
    reply.contains("OK") || reply.contains("_G")
}

/// Only an explicit OK proves JPEG passthrough; an error reply does not.
pub fn kitty_extended_reply_supported(reply: &str) -> bool {
    reply.contains("OK")
}

/// Device Attributes `ESC [ ? p1 ; p2 ; ... c` with parameter `4` means sixel.
pub fn device_attributes_have_sixel(reply: &str) -> bool {
    reply
        .strip_prefix("\x1b[?")
        .and_then(|params| params.strip_suffix('c'))
        .is_some_and(|params| params.split(';').any(|p| p == "4"))
}

impl<T: TerminalIo> TerminalSession<T> {
    pub(crate) fn request(&mut self, command: &[u8], terminators: &[&[u8]]) -> Result<String> {
        request(&mut self.term, command, terminators, timeouts::PROBE_TIMEOUT)
    }

    /// Text area size in pixels as `(height, width)`.
    pub fn pixel_size(&mut self) -> Result<(i32, i32)> {
        let reply = self.request(probes::PIXEL_SIZE, &[terminators::WINDOW_REPORT])?;
        Ok(parse_window_report(&reply, '4'))
    }

    /// Character cell size in pixels as `(height, width)`.
    pub fn cell_size(&mut self) -> Result<(i32, i32)> {
        let reply = self.request(probes::CELL_SIZE, &[terminators::WINDOW_REPORT])?;
        Ok(parse_window_report(&reply, '6'))
    }

    /// Text area size in cells as `(lines, columns)`.
    pub fn terminal_size(&mut self) -> Result<(i32, i32)> {
        let reply = self.request(probes::TERMINAL_SIZE, &[terminators::WINDOW_REPORT])?;
        Ok(parse_window_report(&reply, '8'))
    }

    /// iTerm2 cell size in pixels as `(height, width)`, scaled for retina displays.
    pub fn iterm_cell_size(&mut self) -> Result<(i32, i32)> {
        let reply = self.request(
            probes::ITERM_CELL_SIZE,
            &[terminators::BEL, terminators::ST],
        )?;
        Ok(parse_iterm_cell_size(&reply))
    }
}
