// ABOUTME: Kitty terminal graphics protocol implementation
// ABOUTME: Handles base64 encoding, chunking and control keys of the kitty graphics protocol

use super::{ControlParams, ImageProtocol};
use crate::constants::framing::KITTY_CHUNK_SIZE;
use crate::decoder;
use crate::error::Result;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Kitty encoder; `extended` sends any container format as-is under `f=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KittyProtocol {
    pub extended: bool,
}

impl KittyProtocol {
    pub fn new(extended: bool) -> Self {
        Self { extended }
    }

    /// Escape sequences for one image, one per transmitted chunk.
    pub fn frames(&self, data: &[u8], params: &ControlParams) -> Result<Vec<Vec<u8>>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let (pixels, params) = self.payload(data, params)?;
        let encoded = STANDARD.encode(pixels);
        Ok(frame_payload(&header(&params), &encoded))
    }

    fn payload(&self, data: &[u8], params: &ControlParams) -> Result<(Vec<u8>, ControlParams)> {
        if self.extended {
            return Ok((data.to_vec(), params.clone()));
        }

        let decoded = decoder::inspect(data)?;
        if decoded.is_png() {
            return Ok((data.to_vec(), params.clone()));
        }

        // Anything but PNG travels as raw RGB with explicit dimensions
        let mut params = params.clone();
        params.format = Some(24);
        params.source_width = Some(decoded.width());
        params.source_height = Some(decoded.height());
        Ok((decoded.rgb8(), params))
    }
}

impl ImageProtocol for KittyProtocol {
    fn encode(&self, data: &[u8], params: &ControlParams) -> Result<Vec<u8>> {
        let frames = self.frames(data, params)?;
        log::debug!("Kitty image: {} bytes in {} frames", data.len(), frames.len());
        Ok(frames.concat())
    }

    fn name(&self) -> &'static str {
        if self.extended { "kitty+" } else { "kitty" }
    }
}

/// Control header sent with the first chunk, each key as `k=v,`.
///
/// Starts from `a=T,f=100,q=2`; caller keys overwrite those in place and new
/// keys are appended in their allow-list order.
pub fn header(params: &ControlParams) -> String {
    let mut keys: Vec<(&str, String)> = vec![
        ("a", "T".to_string()),
        ("f", "100".to_string()),
        ("q", "2".to_string()),
    ];

    for (name, value) in params.kitty_keys() {
        match keys.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => keys.push((name, value)),
        }
    }

    keys.iter().map(|(k, v)| format!("{}={},", k, v)).collect()
}

/// Split base64 text into `ESC_G` frames. Only the first carries `header`;
/// `m=1` marks every frame but the last.
pub fn frame_payload(header: &str, encoded: &str) -> Vec<Vec<u8>> {
    let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(KITTY_CHUNK_SIZE).collect();
    let last = chunks.len().saturating_sub(1);

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut frame = Vec::with_capacity(chunk.len() + header.len() + 16);
            frame.extend_from_slice(b"\x1b_G");
            if i == 0 {
                frame.extend_from_slice(header.as_bytes());
            }
            frame.extend_from_slice(format!("m={};", u8::from(i < last)).as_bytes());
            frame.extend_from_slice(chunk);
            frame.extend_from_slice(b"\x1b\\");
            frame
        })
        .collect()
}

/// Delete directive for the placements at z-index `id`.
pub fn kitty_remove_placement(id: i32) -> Vec<u8> {
    format!("\x1b_Ga=d,d=z,z={},q=2,i=-1\x1b\\", id).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg_bytes, png_bytes};

    fn split_frame(frame: &[u8]) -> (String, Vec<u8>) {
        let text = String::from_utf8(frame.to_vec()).unwrap();
        let body = text
            .strip_prefix("\x1b_G")
            .and_then(|t| t.strip_suffix("\x1b\\"))
            .unwrap();
        let (control, data) = body.split_once(';').unwrap();
        (control.to_string(), data.as_bytes().to_vec())
    }

    #[test]
    fn test_png_header_and_payload() {
        let png = png_bytes(2, 2);
        let frames = KittyProtocol::new(false)
            .frames(&png, &ControlParams::default())
            .unwrap();

        assert_eq!(frames.len(), 1);
        let (control, data) = split_frame(&frames[0]);
        assert_eq!(control, "a=T,f=100,q=2,m=0");
        assert_eq!(STANDARD.decode(data).unwrap(), png);
    }

    #[test]
    fn test_jpeg_without_extended_sends_rgb() {
        let jpeg = jpeg_bytes(1, 1);
        let frames = KittyProtocol::new(false)
            .frames(&jpeg, &ControlParams::default())
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with(b"\x1b_Ga=T,f=24,q=2,s=1,v=1,m=0;"));
        let (_, data) = split_frame(&frames[0]);
        assert_eq!(STANDARD.decode(data).unwrap().len(), 3);
    }

    #[test]
    fn test_jpeg_with_extended_sends_bytes_as_is() {
        let jpeg = jpeg_bytes(4, 4);
        let frames = KittyProtocol::new(true)
            .frames(&jpeg, &ControlParams::default())
            .unwrap();

        let (control, data) = split_frame(&frames[0]);
        assert_eq!(control, "a=T,f=100,q=2,m=0");
        assert_eq!(STANDARD.decode(data).unwrap(), jpeg);
    }

    #[test]
    fn test_caller_keys_override_and_append() {
        let params = ControlParams::builder()
            .action('t')
            .quiet(1)
            .cursor_movement(1)
            .columns(40)
            .build();

        assert_eq!(header(&params), "a=t,f=100,q=1,C=1,c=40,");
    }

    #[test]
    fn test_chunking() {
        for len in [1usize, 4095, 4096, 4097, 8192, 10_000] {
            let encoded = "A".repeat(len);
            let frames = frame_payload("a=T,f=100,q=2,", &encoded);

            assert_eq!(frames.len(), len.div_ceil(KITTY_CHUNK_SIZE), "len {}", len);

            let mut reassembled = Vec::new();
            for (i, frame) in frames.iter().enumerate() {
                let (control, data) = split_frame(frame);
                let more = if i + 1 < frames.len() { "m=1" } else { "m=0" };
                if i == 0 {
                    assert_eq!(control, format!("a=T,f=100,q=2,{}", more));
                } else {
                    assert_eq!(control, more);
                }
                assert!(data.len() <= KITTY_CHUNK_SIZE);
                reassembled.extend(data);
            }
            assert_eq!(reassembled, encoded.as_bytes());
        }
    }

    #[test]
    fn test_empty_payload_has_no_frames() {
        assert!(frame_payload("a=T,", "").is_empty());
        let frames = KittyProtocol::new(true)
            .frames(&[], &ControlParams::default())
            .unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_decode_failure_without_extended() {
        let result = KittyProtocol::new(false).encode(b"not an image", &ControlParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_placement() {
        assert_eq!(kitty_remove_placement(-1), b"\x1b_Ga=d,d=z,z=-1,q=2,i=-1\x1b\\");
        assert_eq!(kitty_remove_placement(5), b"\x1b_Ga=d,d=z,z=5,q=2,i=-1\x1b\\");
    }
}
