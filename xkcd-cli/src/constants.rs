// ABOUTME: Centralized constants for the xkcd terminal viewer
// ABOUTME: Contains upstream URLs, cache defaults, timeouts and output widths

/// xkcd upstream URLs
pub mod urls {
    pub const BASE_URL: &str = "https://xkcd.com";

    /// Single page listing every comic ever published
    pub const ARCHIVE_ENDPOINT: &str = "/archive/";

    /// Comic image sources are protocol-relative
    pub const IMAGE_SCHEME: &str = "https:";
}

/// Comic list cache defaults
pub mod cache {
    use std::time::Duration;

    pub const CACHE_DIR_NAME: &str = "xkcd-cli";
    pub const CACHE_FILE_NAME: &str = "cache.json";

    /// Refresh the cached comic list once it is older than this
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Timeout configurations for network operations
pub mod timeouts {
    use std::time::Duration;

    pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Terminal output formatting
pub mod ui {
    /// Titles and alt text are wrapped to this many columns
    pub const TERM_MAX_WIDTH_CHARS: usize = 80;
}

/// Environment variables read by the CLI
pub mod env {
    /// Fallback fuzzy selector when `fzf` is not on PATH
    pub const FZF_CMD: &str = "FZF_CMD";
}

pub const USER_AGENT: &str = concat!("xkcd-cli/", env!("CARGO_PKG_VERSION"));

/// Shown when a comic id is not in the comic list
pub fn unknown_comic_message(id: u32) -> String {
    format!(
        "Comic with ID {} is unknown. Sometimes this happens because the cache is \
         outdated. Please use the 'update-cache' command to fetch most recent comics \
         from xkcd upstream.",
        id
    )
}

/// Shown when the interactive selection is aborted
pub const ABORT_MESSAGE: &str = "Unknown index. Abort.";
