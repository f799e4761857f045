// ABOUTME: iTerm2 terminal inline image protocol implementation
// ABOUTME: Handles base64 encoding with iTerm2-specific escape sequences

use super::{ControlParams, ImageProtocol};
use crate::error::Result;
use base64::{Engine, engine::general_purpose::STANDARD};

#[derive(Debug, Clone, Copy, Default)]
pub struct ITerm2Protocol;

impl ImageProtocol for ITerm2Protocol {
    fn encode(&self, data: &[u8], params: &ControlParams) -> Result<Vec<u8>> {
        let base64_data = STANDARD.encode(data);

        // \x1b]1337;File=inline=1[;doNotMoveCursor=1][;width=n]:base64data\x07
        let mut extras = String::new();
        if params.cursor_movement == Some(1) {
            extras.push_str(";doNotMoveCursor=1");
        }
        if let Some(width) = &params.display_width {
            extras.push_str(&format!(";width={}", width));
        }

        log::debug!("iTerm2 image: {} base64 bytes", base64_data.len());
        Ok(format!("\x1b]1337;File=inline=1{}:{}\x07", extras, base64_data).into_bytes())
    }

    fn name(&self) -> &'static str {
        "iterm"
    }
}
