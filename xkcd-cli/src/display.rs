// ABOUTME: Text output for comics: bold wrapped titles and wrapped mouse-over text
// ABOUTME: Wrapping is greedy on whitespace and splits words longer than the line

use crate::archive::Comic;
use crate::constants::ui::TERM_MAX_WIDTH_CHARS;
use owo_colors::OwoColorize;

pub struct ComicPrinter {
    use_color: bool,
    width: usize,
}

impl ComicPrinter {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            width: TERM_MAX_WIDTH_CHARS,
        }
    }

    pub fn title(&self, comic: &Comic) -> String {
        let title = wrap(&comic.title, self.width).join("\n");
        if self.use_color {
            format!("{} ({})", title.bold(), comic.id)
        } else {
            format!("{} ({})", title, comic.id)
        }
    }

    pub fn subtext(&self, comic: &Comic) -> String {
        wrap(&comic.subtext, self.width).join("\n")
    }
}

/// Break `text` into lines of at most `width` characters.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        if line_len > 0 && line_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }

        while word.len() > width {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line_len += word.len();
        line.extend(word);
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines
}
