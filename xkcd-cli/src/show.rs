// ABOUTME: The show and update-cache commands: list, select, fetch and render a comic
// ABOUTME: Flags override config values, which override built-in defaults

use crate::archive::{ComicMeta, XkcdClient};
use crate::cache::{default_cache_path, load_or_refresh, update_cache};
use crate::cli::ShowArgs;
use crate::config::Config;
use crate::constants::{ABORT_MESSAGE, cache, unknown_comic_message};
use crate::display::ComicPrinter;
use crate::picker::Picker;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use termimg::{ImageViewer, ProtocolSelection, ShowOptions, TermImgError};

/// Which comic to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Random,
    Latest,
    Id(u32),
    Interactive,
}

impl Selection {
    pub fn from_args(args: &ShowArgs) -> Self {
        if args.random {
            Selection::Random
        } else if args.latest {
            Selection::Latest
        } else if let Some(id) = args.comic_id {
            Selection::Id(id)
        } else {
            Selection::Interactive
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowSettings {
    pub selection: Selection,
    pub protocol: ProtocolSelection,
    pub width: i32,
    pub scale_up: bool,
    /// `None` bypasses the cache
    pub cache_path: Option<PathBuf>,
    pub cache_timeout: Duration,
}

impl ShowSettings {
    pub fn resolve(args: &ShowArgs, config: &Config) -> Result<Self> {
        let terminal_graphics = args
            .terminal_graphics()
            .or(config.terminal_graphics)
            .unwrap_or(true);

        let protocol = if !terminal_graphics {
            ProtocolSelection::Disabled
        } else if let Some(ref name) = args.protocol {
            ProtocolSelection::from_str(name).map_err(|e| anyhow!("Invalid --protocol: {}", e))?
        } else {
            config.protocol_selection()?
        };

        let cache_path = if args.no_cache {
            None
        } else {
            Some(cache_path(args.cache_path.as_deref(), config)?)
        };

        Ok(Self {
            selection: Selection::from_args(args),
            protocol,
            width: args.width.or(config.width).unwrap_or(-1),
            scale_up: args.scale_up().or(config.scale_up).unwrap_or(true),
            cache_path,
            cache_timeout: config.cache_timeout().unwrap_or(cache::DEFAULT_TIMEOUT),
        })
    }

    /// Fit to the window unless an explicit width was asked for.
    pub fn show_options(&self) -> ShowOptions {
        let fit = self.width <= 0;
        ShowOptions::builder()
            .width(self.width)
            .newline(true)
            .fit_width(fit)
            .fit_height(fit)
            .upscale(self.scale_up)
            .build()
    }
}

fn cache_path(flag: Option<&Path>, config: &Config) -> Result<PathBuf> {
    match flag.or(config.cache_path.as_deref()) {
        Some(path) => Ok(path.to_path_buf()),
        None => default_cache_path(),
    }
}

/// Pick a comic from `comics`, newest first. `pick` runs only for interactive selection.
pub fn select_comic<'a, F>(
    comics: &'a [ComicMeta],
    selection: Selection,
    pick: F,
) -> Result<&'a ComicMeta>
where
    F: FnOnce(&[ComicMeta]) -> Result<Option<u32>>,
{
    if comics.is_empty() {
        return Err(anyhow!("The comic list is empty"));
    }

    let id = match selection {
        Selection::Random => return Ok(&comics[random_index(comics.len())]),
        Selection::Latest => return Ok(&comics[0]),
        Selection::Id(id) => id,
        Selection::Interactive => pick(comics)?.ok_or_else(|| anyhow!(ABORT_MESSAGE))?,
    };

    comics
        .iter()
        .find(|comic| comic.id == id)
        .ok_or_else(|| anyhow!(unknown_comic_message(id)))
}

fn random_index(len: usize) -> usize {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos() as usize)
        .unwrap_or(0);
    nanos % len
}

/// Viewer for the controlling terminal, or `None` when nothing can be drawn.
fn open_viewer(selection: ProtocolSelection) -> Result<Option<ImageViewer>> {
    if selection == ProtocolSelection::Disabled {
        return Ok(None);
    }
    match ImageViewer::open(selection) {
        Ok(viewer) if viewer.protocol().is_some() => {
            log::debug!("Rendering with {:?}", viewer.protocol());
            Ok(Some(viewer))
        }
        Ok(_) => Ok(None),
        Err(TermImgError::NotATerminal) => {
            log::debug!("Not running in a terminal, images open externally");
            Ok(None)
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to query terminal graphics support")),
    }
}

pub async fn run_show(args: &ShowArgs, config: &Config, use_color: bool) -> Result<()> {
    let settings = ShowSettings::resolve(args, config)?;
    let mut viewer = open_viewer(settings.protocol)?;
    let client = XkcdClient::new()?;

    let comics = match settings.cache_path {
        Some(ref path) => load_or_refresh(path, settings.cache_timeout, &client).await?.comics,
        None => client.fetch_archive().await?,
    };

    let meta = select_comic(&comics, settings.selection, |comics| {
        Picker::resolve(args.fzf_cmd.as_deref(), config.fzf_cmd.as_deref())?.choose(comics)
    })?;
    let comic = client.fetch_comic(meta).await?;

    let printer = ComicPrinter::new(use_color);
    println!("{}", printer.title(&comic));

    let tempdir = tempfile::TempDir::new().context("Failed to create a temporary directory")?;
    let image_path = tempdir.path().join(format!("{}.png", comic.id));
    client.download_image(&comic.img_src, &image_path).await?;

    match viewer {
        Some(ref mut viewer) => viewer
            .show_image(image_path.as_path(), &settings.show_options())
            .context("Failed to render the comic")?,
        None => open_externally(&image_path)?,
    }

    println!("{}", printer.subtext(&comic));
    Ok(())
}

fn open_externally(path: &Path) -> Result<()> {
    let status = Command::new("xdg-open")
        .arg(path)
        .status()
        .context("Failed to run xdg-open")?;
    if !status.success() {
        log::warn!("xdg-open exited with {}", status);
    }
    Ok(())
}

pub async fn run_update_cache(cache_path_flag: Option<&Path>, config: &Config) -> Result<()> {
    let path = cache_path(cache_path_flag, config)?;
    let client = XkcdClient::new()?;
    update_cache(&path, &client).await?;
    println!("Cache updated 👍");
    Ok(())
}
