// ABOUTME: CLI argument definitions for the xkcd terminal viewer
// ABOUTME: Defines the command-line interface structure using clap derive macros

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xkcd")]
#[command(about = "xkcd terminal viewer")]
#[command(
    long_about = "Fetches xkcd comics from upstream and lets you pick one by its title.\n\n\
                  Relies on fzf for fuzzy searching the comic titles and on a terminal with \
                  graphics support (kitty, iTerm2 or sixel) to render the images inline."
)]
#[command(version)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the latest comic list from the xkcd archive into the cache
    UpdateCache {
        /// Path to the cache file
        #[arg(long, value_name = "PATH")]
        cache_path: Option<PathBuf>,
    },
    /// Show an individual xkcd comic
    Show(ShowArgs),
}

#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct ShowArgs {
    /// Render the image inside the terminal window when supported
    #[arg(long, overrides_with = "no_terminal_graphics")]
    pub terminal_graphics: bool,

    /// Open the image with xdg-open instead of rendering it in the terminal
    #[arg(long, overrides_with = "terminal_graphics")]
    pub no_terminal_graphics: bool,

    /// Path to the fuzzy finder used for selection
    #[arg(long, value_name = "PATH")]
    pub fzf_cmd: Option<String>,

    /// Target width of the comic in pixels; otherwise fit to the window
    #[arg(long, allow_hyphen_values = true)]
    pub width: Option<i32>,

    /// Scale small images up to the window size (ignored with an explicit width)
    #[arg(long, overrides_with = "no_scale_up")]
    pub scale_up: bool,

    /// Never scale images beyond their natural size
    #[arg(long, overrides_with = "scale_up")]
    pub no_scale_up: bool,

    /// Show the latest comic without a selection
    #[arg(long, conflicts_with_all = ["random", "comic_id"])]
    pub latest: bool,

    /// Show a random comic
    #[arg(long, conflicts_with = "comic_id")]
    pub random: bool,

    /// Show the comic with this ID
    #[arg(long, value_name = "ID")]
    pub comic_id: Option<u32>,

    /// Fetch the comic list from the archive instead of the cache (slower)
    #[arg(long)]
    pub no_cache: bool,

    /// Path to the cache file
    #[arg(long, value_name = "PATH")]
    pub cache_path: Option<PathBuf>,

    /// Image protocol: auto, kitty, kitty+, iterm, sixel or none
    #[arg(long)]
    pub protocol: Option<String>,
}

impl ShowArgs {
    /// Explicit `--terminal-graphics`/`--no-terminal-graphics`, if given.
    pub fn terminal_graphics(&self) -> Option<bool> {
        flag_pair(self.terminal_graphics, self.no_terminal_graphics)
    }

    pub fn scale_up(&self) -> Option<bool> {
        flag_pair(self.scale_up, self.no_scale_up)
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}
