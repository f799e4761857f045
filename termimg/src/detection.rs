// ABOUTME: Terminal capability detection for image protocol support
// ABOUTME: Each capability is probed at most once per session and cached as a tri-state

use crate::constants::{FORCE_PROTOCOL_ENV, UNKNOWN_SIZE, probes, terminators};
use crate::error::Result;
use crate::probe;
use crate::protocol::Protocol;
use crate::terminal::{TerminalIo, TerminalSession};
use std::env;

/// Probe results; `None` means not probed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub kitty: Option<bool>,
    pub kitty_extended: Option<bool>,
    pub sixel: Option<bool>,
    pub iterm: Option<bool>,
}

impl Capabilities {
    /// Record the extended kitty result. Support implies basic kitty support;
    /// a failure says nothing about it.
    pub fn record_kitty_extended(&mut self, supported: bool) {
        self.kitty_extended = Some(supported);
        if supported && self.kitty.is_none() {
            self.kitty = Some(true);
        }
    }
}

impl<T: TerminalIo> TerminalSession<T> {
    pub fn have_kitty(&mut self) -> Result<bool> {
        if let Some(known) = self.capabilities.kitty {
            return Ok(known);
        }
        let reply = self.request(probes::KITTY_BASIC, &[terminators::ST])?;
        let supported = probe::kitty_reply_supported(&reply);
        log::debug!("Kitty graphics support: {}", supported);
        self.capabilities.kitty = Some(supported);
        Ok(supported)
    }

    pub fn have_extended_kitty(&mut self) -> Result<bool> {
        if let Some(known) = self.capabilities.kitty_extended {
            return Ok(known);
        }
        let reply = self.request(probes::KITTY_EXTENDED, &[terminators::ST])?;
        let supported = probe::kitty_extended_reply_supported(&reply);
        log::debug!("Kitty JPEG passthrough support: {}", supported);
        self.capabilities.record_kitty_extended(supported);
        Ok(supported)
    }

    pub fn have_sixel(&mut self) -> Result<bool> {
        if let Some(known) = self.capabilities.sixel {
            return Ok(known);
        }
        let reply = self.request(probes::DEVICE_ATTRIBUTES, &[terminators::DEVICE_ATTRIBUTES])?;
        let supported = probe::device_attributes_have_sixel(&reply);
        log::debug!("Sixel support: {}", supported);
        self.capabilities.sixel = Some(supported);
        Ok(supported)
    }

    pub fn have_iterm(&mut self) -> Result<bool> {
        if let Some(known) = self.capabilities.iterm {
            return Ok(known);
        }
        let (height, width) = self.iterm_cell_size()?;
        let supported = height != UNKNOWN_SIZE.0 && width != UNKNOWN_SIZE.1;
        log::debug!("iTerm2 inline image support: {}", supported);
        self.capabilities.iterm = Some(supported);
        Ok(supported)
    }

    /// Pick the best protocol the terminal supports.
    ///
    /// `TERMIMG_FORCE_PROTOCOL` short-circuits probing when it names a
    /// protocol (or `none`); otherwise the order is extended kitty, iTerm2,
    /// basic kitty, then sixel.
    pub fn auto_protocol(&mut self) -> Result<Option<Protocol>> {
        if let Ok(forced) = env::var(FORCE_PROTOCOL_ENV) {
            match Protocol::parse_optional(&forced) {
                Ok(protocol) => {
                    log::debug!("Protocol forced by {}: {:?}", FORCE_PROTOCOL_ENV, protocol);
                    return Ok(protocol);
                }
                Err(_) => log::warn!(
                    "Unknown protocol '{}' in {}. Valid values: kitty, kitty+, iterm, sixel, none",
                    forced,
                    FORCE_PROTOCOL_ENV
                ),
            }
        }

        let protocol = if self.have_extended_kitty()? {
            Some(Protocol::KITTY_EXTENDED)
        } else if self.have_iterm()? {
            Some(Protocol::Iterm)
        } else if self.have_kitty()? {
            Some(Protocol::KITTY)
        } else if self.have_sixel()? {
            Some(Protocol::Sixel)
        } else {
            None
        };

        log::debug!("Detected image protocol: {:?}", protocol);
        Ok(protocol)
    }
}
