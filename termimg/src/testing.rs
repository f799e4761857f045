// ABOUTME: In-memory terminal for tests: scripted replies, recorded output, counted mode changes
// ABOUTME: Also builds small PNG/JPEG fixtures with the image crate

use crate::error::{Result, TermImgError};
use crate::terminal::TerminalIo;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::{self, Cursor, Write};
use std::time::Duration;

/// A terminal that answers known commands with canned replies.
///
/// A reply is queued when a flushed write matches a scripted command exactly,
/// which mirrors how probes write a whole request and then flush.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    replies: Vec<(Vec<u8>, Vec<u8>)>,
    pending: VecDeque<u8>,
    output: Vec<u8>,
    unflushed_from: usize,
    flushed: Vec<Vec<u8>>,
    raw_like: bool,
    fail_mode_changes: bool,
    fail_reads: bool,
    fail_polls: bool,
    acquisitions: usize,
    restorations: usize,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_to(mut self, command: impl AsRef<[u8]>, reply: impl AsRef<[u8]>) -> Self {
        self.replies
            .push((command.as_ref().to_vec(), reply.as_ref().to_vec()));
        self
    }

    /// Make every raw-like mode switch fail as if `tcsetattr` returned EIO.
    pub fn failing_mode_changes(mut self) -> Self {
        self.fail_mode_changes = true;
        self
    }

    /// Make every byte read fail with EIO, as a hung-up terminal does.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_polls(mut self) -> Self {
        self.fail_polls = true;
        self
    }

    /// Everything written to the terminal so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        self.unflushed_from = 0;
        std::mem::take(&mut self.output)
    }

    /// How many times `command` was written and flushed.
    pub fn requests_sent(&self, command: &[u8]) -> usize {
        self.flushed.iter().filter(|c| c.as_slice() == command).count()
    }

    pub fn is_raw_like(&self) -> bool {
        self.raw_like
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    pub fn restorations(&self) -> usize {
        self.restorations
    }
}

impl TerminalIo for ScriptedTerminal {
    fn set_raw_like(&mut self) -> Result<()> {
        if self.fail_mode_changes {
            return Err(TermImgError::TerminalMode(nix::Error::EIO));
        }
        self.raw_like = true;
        self.acquisitions += 1;
        Ok(())
    }

    fn restore_saved(&mut self) -> Result<()> {
        self.raw_like = false;
        self.restorations += 1;
        Ok(())
    }

    fn wait_readable(&mut self, _timeout: Duration) -> Result<bool> {
        if self.fail_polls {
            return Err(TermImgError::Io(io::Error::from(nix::Error::EIO)));
        }
        Ok(!self.pending.is_empty())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.fail_reads {
            return Err(io::Error::from(nix::Error::EIO));
        }
        Ok(self.pending.pop_front())
    }
}

impl Write for ScriptedTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let chunk = self.output[self.unflushed_from..].to_vec();
        self.unflushed_from = self.output.len();

        if let Some((_, reply)) = self.replies.iter().find(|(cmd, _)| *cmd == chunk) {
            self.pending.extend(reply.iter().copied());
        }
        self.flushed.push(chunk);
        Ok(())
    }
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128])
    });
    DynamicImage::ImageRgb8(img)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .expect("encoding an in-memory fixture should not fail");
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Jpeg)
}
