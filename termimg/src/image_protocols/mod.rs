// ABOUTME: Image protocol encoders for terminal inline image display
// ABOUTME: Shared control parameters and the encoder trait for kitty and iTerm2; sixel renders from files

use crate::error::Result;
use typed_builder::TypedBuilder;

pub mod iterm2;
pub mod kitty;
pub mod sixel;

pub use iterm2::ITerm2Protocol;
pub use kitty::{KittyProtocol, kitty_remove_placement};
pub use sixel::{ConvertProcess, SixelBackend, SixelOptions};

pub trait ImageProtocol {
    /// Encode image data as the terminal escape sequence(s) that display it
    fn encode(&self, data: &[u8], params: &ControlParams) -> Result<Vec<u8>>;

    fn name(&self) -> &'static str;
}

/// Caller-supplied control keys passed through to the encoders.
///
/// The single-letter names are the kitty graphics keys each field maps to.
/// iTerm2 only looks at `cursor_movement` and `display_width`.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
#[builder(field_defaults(default, setter(strip_option)))]
pub struct ControlParams {
    /// `C`: 1 keeps the cursor where it was
    pub cursor_movement: Option<u32>,
    /// `p`
    pub placement_id: Option<u32>,
    /// `i`
    pub image_id: Option<u32>,
    /// `z`
    pub z_index: Option<i32>,
    /// `a`
    pub action: Option<char>,
    /// `f`: 24 (RGB), 32 (RGBA) or 100 (PNG)
    pub format: Option<u32>,
    /// `q`
    pub quiet: Option<u8>,
    /// `s`
    pub source_width: Option<u32>,
    /// `v`
    pub source_height: Option<u32>,
    /// `c`
    pub columns: Option<u32>,
    /// `r`
    pub rows: Option<u32>,
    /// iTerm2 `width=`, e.g. `40`, `100px`, `50%` or `auto`
    pub display_width: Option<String>,
}

impl ControlParams {
    /// Set kitty keys in transmission order.
    pub fn kitty_keys(&self) -> Vec<(&'static str, String)> {
        fn key<V: ToString>(
            name: &'static str,
            value: Option<V>,
        ) -> Option<(&'static str, String)> {
            value.map(|v| (name, v.to_string()))
        }

        [
            key("C", self.cursor_movement),
            key("p", self.placement_id),
            key("i", self.image_id),
            key("z", self.z_index),
            key("a", self.action),
            key("f", self.format),
            key("q", self.quiet),
            key("s", self.source_width),
            key("v", self.source_height),
            key("c", self.columns),
            key("r", self.rows),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
