// ABOUTME: Centralized constants for the terminal image engine
// ABOUTME: Contains probe escape sequences, reply terminators, timeouts and framing limits

/// Timeouts for terminal round-trips
pub mod timeouts {
    use std::time::Duration;

    /// How long a capability probe waits for the terminal to start replying
    pub const PROBE_TIMEOUT: Duration = Duration::from_millis(200);
}

/// Escape sequences sent to the terminal to query its capabilities
pub mod probes {
    /// Window size in pixels, answered with `ESC[4;H;Wt`
    pub const PIXEL_SIZE: &[u8] = b"\x1b[14t";

    /// Character cell size in pixels, answered with `ESC[6;H;Wt`
    pub const CELL_SIZE: &[u8] = b"\x1b[16t";

    /// Text area size in cells, answered with `ESC[8;L;Ct`
    pub const TERMINAL_SIZE: &[u8] = b"\x1b[18t";

    /// iTerm2 proprietary cell size report
    pub const ITERM_CELL_SIZE: &[u8] = b"\x1b]1337;ReportCellSize\x07";

    /// Primary Device Attributes
    pub const DEVICE_ATTRIBUTES: &[u8] = b"\x1b[c";

    /// Query-only transmission of a 1x1 RGB image
    pub const KITTY_BASIC: &[u8] = b"\x1b_Gi=31,s=1,v=1,a=q,t=d,f=24;AAAA\x1b\\";

    /// Query-only transmission of a 1x1 JPEG tagged as f=100
    pub const KITTY_EXTENDED: &[u8] = concat!(
        "\x1b_Gi=31,s=1,v=1,a=q,t=d,f=100;",
        "/9j/2wBDAAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQ",
        "EBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQH/",
        "wgALCAABAAEBAREA/8QAFAABAAAAAAAAAAAAAAAAAAAAA//aAAgBAQAAAAE//9k=",
        "\x1b\\"
    )
    .as_bytes();
}

/// Reply terminators
pub mod terminators {
    pub const BEL: &[u8] = b"\x07";
    pub const ST: &[u8] = b"\x1b\\";
    pub const WINDOW_REPORT: &[u8] = b"t";
    pub const DEVICE_ATTRIBUTES: &[u8] = b"c";
}

/// Wire framing limits
pub mod framing {
    /// Kitty payload chunk size; many terminals cap a single escape sequence
    pub const KITTY_CHUNK_SIZE: usize = 4096;

    /// Upper bound on a probe reply before the read loop gives up
    pub const MAX_REPLY_LEN: usize = 4096;
}

/// Sentinel returned by size probes when the terminal did not answer
pub const UNKNOWN_SIZE: (i32, i32) = (-1, -1);

/// Written in place of a sixel image when no renderer exists
pub const NO_RENDERER_MESSAGE: &str = "Could not find a terminal image renderer.\n";

/// Environment variable that forces a protocol instead of probing
pub const FORCE_PROTOCOL_ENV: &str = "TERMIMG_FORCE_PROTOCOL";
