// ABOUTME: Interactive comic selection through an external fuzzy finder such as fzf
// ABOUTME: Feeds "<id>: <title>" lines on stdin and reads the chosen line from stdout

use crate::archive::ComicMeta;
use crate::constants::env::FZF_CMD;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use termimg::find_executable;

pub struct Picker {
    program: PathBuf,
}

impl Picker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the finder from the flag, the config, `fzf` on PATH, then `$FZF_CMD`.
    pub fn resolve(flag: Option<&str>, configured: Option<&str>) -> Result<Self> {
        if let Some(program) = flag.or(configured) {
            return Ok(Self::new(program));
        }
        if let Some(program) = find_executable("fzf") {
            return Ok(Self::new(program));
        }
        match env::var(FZF_CMD) {
            Ok(program) if !program.trim().is_empty() => Ok(Self::new(program)),
            _ => Err(anyhow!(
                "No fuzzy finder available. Install fzf, set {} or pass --fzf-cmd",
                FZF_CMD
            )),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Let the user pick a comic; `None` when the selection was aborted.
    pub fn choose(&self, comics: &[ComicMeta]) -> Result<Option<u32>> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        let lines = choice_lines(comics);
        if let Some(mut stdin) = child.stdin.take() {
            // The finder may exit before reading everything
            if let Err(e) = stdin.write_all(lines.as_bytes()) {
                log::debug!("Picker closed its input early: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {}", self.program.display()))?;
        log::debug!("Picker exited with {}", output.status);

        Ok(parse_choice(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub fn choice_lines(comics: &[ComicMeta]) -> String {
    comics
        .iter()
        .map(|comic| format!("{}: {}", comic.id, comic.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comic id from a picked `"<id>: <title>"` line.
pub fn parse_choice(choice: &str) -> Option<u32> {
    let (id, _title) = choice.trim().split_once(':')?;
    id.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn comics() -> Vec<ComicMeta> {
        vec![
            ComicMeta {
                id: 327,
                href: "/327/".to_string(),
                title: "Exploits of a Mom".to_string(),
            },
            ComicMeta {
                id: 1,
                href: "/1/".to_string(),
                title: "Barrel: Part 1".to_string(),
            },
        ]
    }

    #[cfg(unix)]
    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_choice_lines() {
        assert_eq!(
            choice_lines(&comics()),
            "327: Exploits of a Mom\n1: Barrel: Part 1"
        );
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("327: Exploits of a Mom\n"), Some(327));
        assert_eq!(parse_choice("1: Barrel: Part 1"), Some(1));
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("no separator"), None);
        assert_eq!(parse_choice("abc: title"), None);
    }

    #[test]
    fn test_flag_wins_over_config() {
        let picker = Picker::resolve(Some("sk"), Some("fzy")).unwrap();
        assert_eq!(picker.program(), Path::new("sk"));

        let picker = Picker::resolve(None, Some("fzy")).unwrap();
        assert_eq!(picker.program(), Path::new("fzy"));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_fzf_on_path_is_found() {
        let dir = TempDir::new().unwrap();
        let fzf = script(&dir, "fzf", "exit 0");
        let original_path = env::var_os("PATH");

        unsafe {
            env::set_var("PATH", dir.path());
        }
        let picker = Picker::resolve(None, None);
        unsafe {
            match original_path {
                Some(val) => env::set_var("PATH", val),
                None => env::remove_var("PATH"),
            }
        }

        assert_eq!(picker.unwrap().program(), fzf.as_path());
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_choose_reads_the_picked_line() {
        let dir = TempDir::new().unwrap();
        // Picks the last line it was given
        let picker = Picker::new(script(&dir, "pick-last", "tail -n 1"));

        assert_eq!(picker.choose(&comics()).unwrap(), Some(1));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_aborted_choice() {
        let dir = TempDir::new().unwrap();
        let picker = Picker::new(script(&dir, "abort", "cat > /dev/null; exit 130"));

        assert_eq!(picker.choose(&comics()).unwrap(), None);
    }

    #[test]
    fn test_missing_picker_is_an_error() {
        let picker = Picker::new("/nonexistent/fuzzy-finder");
        let err = picker.choose(&comics()).unwrap_err();
        assert!(err.to_string().contains("Failed to run"));
    }
}
