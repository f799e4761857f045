// ABOUTME: High-level image display: pick a protocol, fit the image, encode and write it
// ABOUTME: A viewer without a protocol accepts every call and draws nothing

use crate::decoder;
use crate::error::{Result, TermImgError};
use crate::image_protocols::{
    ControlParams, ITerm2Protocol, ImageProtocol, KittyProtocol, kitty_remove_placement,
};
use crate::protocol::Protocol;
use crate::scaling::scale_fit;
use crate::terminal::{TerminalIo, TerminalSession, Tty};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use typed_builder::TypedBuilder;

/// Image to display: a file on disk or encoded bytes in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

/// How a viewer chooses its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolSelection {
    /// Probe the terminal
    #[default]
    Auto,
    Fixed(Protocol),
    /// Never draw
    Disabled,
}

impl FromStr for ProtocolSelection {
    type Err = TermImgError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ProtocolSelection::Auto);
        }
        Ok(match Protocol::parse_optional(s)? {
            Some(protocol) => ProtocolSelection::Fixed(protocol),
            None => ProtocolSelection::Disabled,
        })
    }
}

/// Per-call display options. Width and height are pixels; `-1` leaves the
/// axis unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ShowOptions {
    #[builder(default = -1)]
    pub width: i32,
    #[builder(default = -1)]
    pub height: i32,
    /// Print a newline after an iTerm2 or kitty image
    #[builder(default)]
    pub newline: bool,
    /// Use the terminal's pixel width as the width
    #[builder(default)]
    pub fit_width: bool,
    /// Use the terminal's pixel height as the height
    #[builder(default)]
    pub fit_height: bool,
    #[builder(default)]
    pub upscale: bool,
    /// Force kitty JPEG passthrough on or off instead of using the probe result
    #[builder(default, setter(strip_option))]
    pub extended: Option<bool>,
    #[builder(default)]
    pub params: ControlParams,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct ImageViewer<T: TerminalIo = Tty> {
    session: TerminalSession<T>,
    protocol: Option<Protocol>,
}

impl ImageViewer<Tty> {
    /// Open the controlling terminal and select a protocol.
    pub fn open(selection: ProtocolSelection) -> Result<Self> {
        Self::new(TerminalSession::open()?, selection)
    }
}

impl<T: TerminalIo> ImageViewer<T> {
    pub fn new(session: TerminalSession<T>, selection: ProtocolSelection) -> Result<Self> {
        let mut viewer = Self::with_protocol(session, None);
        match selection {
            ProtocolSelection::Auto => {
                viewer.auto_protocol()?;
            }
            ProtocolSelection::Fixed(protocol) => viewer.protocol = Some(protocol),
            ProtocolSelection::Disabled => {}
        }
        Ok(viewer)
    }

    pub fn with_protocol(session: TerminalSession<T>, protocol: Option<Protocol>) -> Self {
        Self { session, protocol }
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    pub fn set_protocol(&mut self, protocol: Option<Protocol>) {
        self.protocol = protocol;
    }

    /// Probe for the best protocol and remember it.
    pub fn auto_protocol(&mut self) -> Result<Option<Protocol>> {
        self.protocol = self.session.auto_protocol()?;
        Ok(self.protocol)
    }

    pub fn session(&self) -> &TerminalSession<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TerminalSession<T> {
        &mut self.session
    }

    pub fn into_session(self) -> TerminalSession<T> {
        self.session
    }

    pub fn show_image(&mut self, image: impl Into<ImageSource>, opts: &ShowOptions) -> Result<()> {
        let Some(protocol) = self.protocol else {
            log::debug!("No image protocol selected, skipping image");
            return Ok(());
        };

        let (mut width, mut height) = (opts.width, opts.height);
        if opts.fit_width || opts.fit_height {
            let (pixel_height, pixel_width) = self.session.pixel_size()?;
            if opts.fit_width {
                width = pixel_width;
            }
            if opts.fit_height {
                height = pixel_height;
            }
        }

        match protocol {
            Protocol::Sixel => match image.into() {
                ImageSource::Path(path) => self.render_sixel(&path, width, height),
                ImageSource::Bytes(bytes) => {
                    let mut file = tempfile::Builder::new().prefix("termimg-").tempfile()?;
                    file.write_all(&bytes)?;
                    file.flush()?;
                    self.render_sixel(file.path(), width, height)
                }
            },
            Protocol::Iterm => {
                self.render_inline(&ITerm2Protocol, image.into(), width, height, opts)
            }
            Protocol::Kitty { extended } => {
                let extended = opts.extended.unwrap_or(
                    extended || self.session.capabilities().kitty_extended == Some(true),
                );
                let kitty = KittyProtocol::new(extended);
                self.render_inline(&kitty, image.into(), width, height, opts)
            }
        }
    }

    /// Clear kitty placements at z-index `id`.
    pub fn kitty_remove_placement(&mut self, id: i32) -> Result<()> {
        self.session.write_output(&kitty_remove_placement(id))
    }

    fn render_sixel(&mut self, path: &Path, width: i32, height: i32) -> Result<()> {
        let backend = self.session.sixel_backend().clone();
        backend.render(path, width, height, &mut self.session.term)
    }

    fn render_inline(
        &mut self,
        encoder: &dyn ImageProtocol,
        image: ImageSource,
        width: i32,
        height: i32,
        opts: &ShowOptions,
    ) -> Result<()> {
        // Only files are fitted; in-memory bytes are sent as given
        let data = match image {
            ImageSource::Path(path) if width > 0 || height > 0 => {
                fit_to_box(&fs::read(&path)?, width, height, opts.upscale)?
            }
            ImageSource::Path(path) => fs::read(&path)?,
            ImageSource::Bytes(bytes) => bytes,
        };

        log::debug!("Drawing {} byte image with {}", data.len(), encoder.name());
        let encoded = encoder.encode(&data, &opts.params)?;
        self.session.write_output(&encoded)?;
        if opts.newline {
            self.session.write_output(b"\n")?;
        }
        Ok(())
    }
}

/// Resize encoded image bytes to fit a `width x height` pixel box, keeping aspect.
fn fit_to_box(data: &[u8], width: i32, height: i32, upscale: bool) -> Result<Vec<u8>> {
    let decoded = decoder::inspect(data)?;
    let original_width = i32::try_from(decoded.width()).unwrap_or(i32::MAX);
    let original_height = i32::try_from(decoded.height()).unwrap_or(i32::MAX);
    let (w, h) = scale_fit(width, height, original_width, original_height, true, upscale);
    log::debug!(
        "Fitting {}x{} image into {}x{} -> {}x{}",
        original_width,
        original_height,
        width,
        height,
        w,
        h
    );
    decoded.resized(w.max(1) as u32, h.max(1) as u32)
}
