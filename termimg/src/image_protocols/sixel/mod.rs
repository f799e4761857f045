// ABOUTME: Sixel rendering through the icy_sixel encoder or ImageMagick's convert
// ABOUTME: The backend is chosen once per session; without one a diagnostic is printed instead

use crate::constants::NO_RENDERER_MESSAGE;
use crate::error::{Result, TermImgError};
use crate::executable::find_executable;
use crate::scaling::scale_fit;
use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SixelBackend {
    /// Encode in-process with icy_sixel
    #[cfg(feature = "native-sixel")]
    Native,
    /// Shell out to an ImageMagick `convert` binary
    External(ConvertProcess),
    /// Nothing can render sixel
    Unavailable,
}

impl SixelBackend {
    #[cfg(feature = "native-sixel")]
    pub fn detect() -> Self {
        log::debug!("Using icy_sixel for sixel output");
        SixelBackend::Native
    }

    #[cfg(not(feature = "native-sixel"))]
    pub fn detect() -> Self {
        Self::detect_external()
    }

    /// Look for `convert` on PATH.
    pub fn detect_external() -> Self {
        match find_executable("convert") {
            Some(program) => {
                log::debug!("Using {} for sixel output", program.display());
                SixelBackend::External(ConvertProcess::new(program))
            }
            None => {
                log::debug!("No sixel renderer found");
                SixelBackend::Unavailable
            }
        }
    }

    /// Render the image file at `path`, writing the sixel stream to `out`.
    ///
    /// Non-positive `width`/`height` leave that axis to the renderer.
    pub fn render(&self, path: &Path, width: i32, height: i32, out: &mut dyn Write) -> Result<()> {
        match self {
            #[cfg(feature = "native-sixel")]
            SixelBackend::Native => render_native(path, SixelOptions::new(width, height), out),
            SixelBackend::External(convert) => convert.render(path, width, height, out),
            SixelBackend::Unavailable => {
                out.write_all(NO_RENDERER_MESSAGE.as_bytes())?;
                out.flush()?;
                Ok(())
            }
        }
    }
}

/// One requested sixel axis: `auto` or an exact pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SixelDimension {
    Auto,
    Pixels(u32),
}

impl SixelDimension {
    pub fn from_request(value: i32) -> Self {
        match u32::try_from(value) {
            Ok(pixels) if pixels > 0 => SixelDimension::Pixels(pixels),
            _ => SixelDimension::Auto,
        }
    }

    fn as_request(self) -> i32 {
        match self {
            SixelDimension::Auto => -1,
            SixelDimension::Pixels(p) => i32::try_from(p).unwrap_or(i32::MAX),
        }
    }
}

impl fmt::Display for SixelDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SixelDimension::Auto => f.write_str("auto"),
            SixelDimension::Pixels(p) => write!(f, "{}", p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixelOptions {
    pub width: SixelDimension,
    pub height: SixelDimension,
}

impl SixelOptions {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: SixelDimension::from_request(width),
            height: SixelDimension::from_request(height),
        }
    }

    /// Output size for an `original_width x original_height` image.
    ///
    /// An `auto` axis follows the other one by aspect ratio; when both are
    /// given the image is fitted inside that box, as `convert -geometry` does.
    pub fn resolve(&self, original_width: u32, original_height: u32) -> (u32, u32) {
        let (w, h) = scale_fit(
            self.width.as_request(),
            self.height.as_request(),
            i32::try_from(original_width).unwrap_or(i32::MAX),
            i32::try_from(original_height).unwrap_or(i32::MAX),
            true,
            true,
        );
        (w.max(1) as u32, h.max(1) as u32)
    }
}

#[cfg(feature = "native-sixel")]
fn render_native(path: &Path, options: SixelOptions, out: &mut dyn Write) -> Result<()> {
    use icy_sixel::{DiffusionMethod, MethodForLargest, MethodForRep, PixelFormat, Quality};
    use image::imageops::FilterType;

    let bytes = std::fs::read(path)?;
    let decoded = crate::decoder::inspect(&bytes)?;
    let (width, height) = options.resolve(decoded.width(), decoded.height());
    log::debug!(
        "Sixel {}x{} -> {}x{} (width={}, height={})",
        decoded.width(),
        decoded.height(),
        width,
        height,
        options.width,
        options.height
    );

    let mut image = decoded.into_image();
    if (image.width(), image.height()) != (width, height) {
        image = image.resize_exact(width, height, FilterType::Lanczos3);
    }

    let rgb = image.to_rgb8();
    let sixel = icy_sixel::sixel_string(
        rgb.as_raw(),
        i32::try_from(rgb.width()).unwrap_or(i32::MAX),
        i32::try_from(rgb.height()).unwrap_or(i32::MAX),
        PixelFormat::RGB888,
        DiffusionMethod::Stucki,
        MethodForLargest::Auto,
        MethodForRep::Auto,
        Quality::HIGH,
    )
    .map_err(|e| TermImgError::SixelEncode(e.to_string()))?;

    out.write_all(sixel.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// An ImageMagick `convert` invocation writing sixel to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertProcess {
    program: PathBuf,
}

impl ConvertProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments after the program name.
    pub fn args(&self, path: &Path, width: i32, height: i32) -> Vec<OsString> {
        let mut args = vec![path.as_os_str().to_os_string()];
        if let Some(geometry) = geometry(width, height) {
            args.push("-geometry".into());
            args.push(geometry.into());
        }
        args.push("sixel:-".into());
        args
    }

    pub fn render(&self, path: &Path, width: i32, height: i32, out: &mut dyn Write) -> Result<()> {
        let args = self.args(path, width, height);
        log::debug!("Running {} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| TermImgError::Process {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            log::warn!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        out.write_all(&output.stdout)?;
        out.flush()?;
        Ok(())
    }
}

/// `WxH` geometry with an empty side for each axis left unspecified.
pub fn geometry(width: i32, height: i32) -> Option<String> {
    if width <= 0 && height <= 0 {
        return None;
    }
    let side = |v: i32| if v > 0 { v.to_string() } else { String::new() };
    Some(format!("{}x{}", side(width), side(height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_geometry() {
        assert_eq!(geometry(-1, -1), None);
        assert_eq!(geometry(0, 0), None);
        assert_eq!(geometry(100, -1).as_deref(), Some("100x"));
        assert_eq!(geometry(-1, 50).as_deref(), Some("x50"));
        assert_eq!(geometry(100, 50).as_deref(), Some("100x50"));
    }

    #[test]
    fn test_convert_args() {
        let convert = ConvertProcess::new("convert");
        let path = Path::new("/tmp/comic.png");

        assert_eq!(
            convert.args(path, 100, -1),
            vec!["/tmp/comic.png", "-geometry", "100x", "sixel:-"]
        );
        assert_eq!(convert.args(path, -1, -1), vec!["/tmp/comic.png", "sixel:-"]);
    }

    #[test]
    #[serial]
    fn test_convert_output_is_written_verbatim() {
        // echo prints its argv, standing in for convert's sixel stream
        let convert = ConvertProcess::new("echo");
        let mut out = Vec::new();

        convert
            .render(Path::new("picture.png"), 30, 20, &mut out)
            .unwrap();

        assert_eq!(out, b"picture.png -geometry 30x20 sixel:-\n");
    }

    #[test]
    fn test_convert_launch_failure() {
        let convert = ConvertProcess::new("/nonexistent/convert");
        let mut out = Vec::new();

        let result = convert.render(Path::new("x.png"), -1, -1, &mut out);

        assert!(matches!(result, Err(TermImgError::Process { .. })));
        assert!(out.is_empty());
    }

    #[test]
    #[serial]
    fn test_convert_failed_exit_still_succeeds() {
        let convert = ConvertProcess::new("false");
        let mut out = Vec::new();

        assert!(convert.render(Path::new("x.png"), -1, -1, &mut out).is_ok());
        assert!(out.is_empty());
    }

    #[test]
    fn test_unavailable_writes_diagnostic() {
        let mut out = Vec::new();
        SixelBackend::Unavailable
            .render(Path::new("x.png"), -1, -1, &mut out)
            .unwrap();
        assert_eq!(out, b"Could not find a terminal image renderer.\n");
    }

    #[test]
    fn test_options_text_form() {
        let options = SixelOptions::new(120, -1);
        assert_eq!(options.width.to_string(), "120");
        assert_eq!(options.height.to_string(), "auto");
        assert_eq!(SixelOptions::new(0, 0).width, SixelDimension::Auto);
    }

    #[test]
    fn test_options_resolve() {
        assert_eq!(SixelOptions::new(-1, -1).resolve(80, 40), (80, 40));
        assert_eq!(SixelOptions::new(40, -1).resolve(80, 40), (40, 20));
        assert_eq!(SixelOptions::new(-1, 10).resolve(80, 40), (20, 10));
        // Both axes given: fitted inside the box, and upscaling is allowed
        assert_eq!(SixelOptions::new(200, 10).resolve(80, 40), (20, 10));
        assert_eq!(SixelOptions::new(160, 200).resolve(80, 40), (160, 80));
    }

    #[test]
    #[serial]
    fn test_detect_external_searches_path() {
        let dir = TempDir::new().unwrap();
        let original_path = env::var_os("PATH");

        unsafe {
            env::set_var("PATH", dir.path());
        }
        let missing = SixelBackend::detect_external();

        let convert = dir.path().join("convert");
        fs::write(&convert, "#!/bin/sh\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&convert, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let found = SixelBackend::detect_external();

        unsafe {
            match original_path {
                Some(val) => env::set_var("PATH", val),
                None => env::remove_var("PATH"),
            }
        }

        assert_eq!(missing, SixelBackend::Unavailable);
        assert_eq!(found, SixelBackend::External(ConvertProcess::new(convert)));
    }

    #[cfg(feature = "native-sixel")]
    #[test]
    fn test_native_render_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        fs::write(&path, crate::testing::png_bytes(4, 2)).unwrap();

        let mut out = Vec::new();
        SixelBackend::Native.render(&path, 2, -1, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1bP"), "{:?}", text);
        assert!(text.contains('q'));
        assert!(text.ends_with("\x1b\\"), "{:?}", text);
    }

    #[cfg(feature = "native-sixel")]
    #[test]
    fn test_native_render_missing_file() {
        let mut out = Vec::new();
        let result = SixelBackend::Native.render(Path::new("/nonexistent.png"), -1, -1, &mut out);
        assert!(matches!(result, Err(TermImgError::Io(_))));
    }
}
