// ABOUTME: xkcd upstream access: archive listing, single comic pages and image downloads
// ABOUTME: HTML extraction is done with targeted regexes over the two page shapes xkcd serves

use crate::constants::{USER_AGENT, timeouts, urls};
use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A comic as listed on the archive page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicMeta {
    pub id: u32,
    pub href: String,
    pub title: String,
}

/// A comic with the details from its own page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comic {
    pub id: u32,
    pub href: String,
    pub title: String,
    pub img_src: String,
    /// Mouse-over text of the image
    pub subtext: String,
}

static ARCHIVE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a\s[^>]*?href="(/(\d+)/)"[^>]*>(.*?)</a>"#).expect("valid regex")
});

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<img\s[^>]*>").expect("valid regex"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z][\w:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static DIV_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)div\b").expect("valid regex"));

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").expect("valid regex"));

pub struct XkcdClient {
    client: Client,
    base_url: String,
}

impl XkcdClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(urls::BASE_URL)
    }

    /// Client against a different host, e.g. a mock server in tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeouts::HTTP_REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch every comic listed on the archive page, newest first.
    pub async fn fetch_archive(&self) -> Result<Vec<ComicMeta>> {
        let url = format!("{}{}", self.base_url, urls::ARCHIVE_ENDPOINT);
        let html = self.get_text(&url).await?;
        let comics = parse_archive(&html)?;
        log::debug!("Archive lists {} comics", comics.len());
        Ok(comics)
    }

    pub async fn fetch_comic(&self, meta: &ComicMeta) -> Result<Comic> {
        let url = format!("{}{}", self.base_url, meta.href);
        let html = self.get_text(&url).await?;
        parse_comic_page(&html, meta).with_context(|| format!("Failed to parse comic page {}", url))
    }

    /// Download `url` into the file at `dest`.
    pub async fn download_image(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed for {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP request failed with status {}: {}",
                response.status(),
                url
            ));
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read image body from {}", url))?;
        std::fs::write(dest, &bytes)
            .with_context(|| format!("Failed to write image to {}", dest.display()))?;

        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(())
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed for {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP request failed with status {}: {}",
                response.status(),
                url
            ));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

/// Extract the comic links from the archive page's `#middleContainer`.
pub fn parse_archive(html: &str) -> Result<Vec<ComicMeta>> {
    let container = element_by_id(html, "middleContainer")
        .ok_or_else(|| anyhow!("Archive page has no #middleContainer"))?;

    ARCHIVE_LINK
        .captures_iter(container)
        .map(|caps| -> Result<ComicMeta> {
            let id = caps[2]
                .parse::<u32>()
                .with_context(|| format!("Invalid comic id in {}", &caps[1]))?;
            Ok(ComicMeta {
                id,
                href: caps[1].to_string(),
                title: unescape_html(caps[3].trim()),
            })
        })
        .collect()
}

/// Extract image source and mouse-over text from the `#comic` element.
pub fn parse_comic_page(html: &str, meta: &ComicMeta) -> Result<Comic> {
    let container =
        element_by_id(html, "comic").ok_or_else(|| anyhow!("Comic page has no #comic element"))?;
    let img = IMG_TAG
        .find(container)
        .ok_or_else(|| anyhow!("Comic page has no image"))?;

    let attribute = |name: &str| {
        ATTRIBUTE
            .captures_iter(img.as_str())
            .find(|caps| caps[1].eq_ignore_ascii_case(name))
            .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
            .map(|m| unescape_html(m.as_str()))
    };

    let src = attribute("src").ok_or_else(|| anyhow!("Comic image has no src"))?;
    let subtext = attribute("title").ok_or_else(|| anyhow!("Comic image has no title text"))?;
    let img_src = if src.starts_with("//") {
        format!("{}{}", urls::IMAGE_SCHEME, src)
    } else {
        src
    };

    Ok(Comic {
        id: meta.id,
        href: meta.href.clone(),
        title: meta.title.clone(),
        img_src,
        subtext,
    })
}

/// Inner HTML of the `<div>` with the given id, matching nested divs.
fn element_by_id<'a>(html: &'a str, id: &str) -> Option<&'a str> {
    let marker = Regex::new(&format!(r#"id\s*=\s*["']{}["']"#, regex::escape(id))).ok()?;
    let found = marker.find(html)?;
    let open_end = found.end() + html[found.end()..].find('>')? + 1;

    let mut depth = 1usize;
    for caps in DIV_TAG.captures_iter(&html[open_end..]) {
        let Some(tag) = caps.get(0) else { continue };
        if caps[1].is_empty() {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(&html[open_end..open_end + tag.start()]);
            }
        }
    }
    Some(&html[open_end..])
}

/// Decode the character references xkcd titles and alt texts use.
pub fn unescape_html(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| name.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE_HTML: &str = r#"
<html><body>
<div id="topContainer"><a href="/1/">Not in the archive list</a></div>
<div id="middleContainer" class="box">
<h1>Comics:</h1>
(Hover mouse over title to view publication date)<br /><br />
<a href="/3000/" title="2024-10-14">Latest &amp; Greatest</a><br/>
<div class="inner"><a href="/2999/" title="2024-10-11">Nested</a></div>
<a href="/1/" title="2006-1-1">Barrel - Part 1</a><br/>
</div>
<div id="bottom"><a href="/about/">About</a></div>
</body></html>
"#;

    const COMIC_HTML: &str = r#"
<div id="ctitle">Barrel - Part 1</div>
<div id="comic">
<img src="//imgs.xkcd.com/comics/barrel_cropped_(1).jpg" title="Don&#39;t we all." alt="Barrel - Part 1" />
</div>
"#;

    fn meta(id: u32, title: &str) -> ComicMeta {
        ComicMeta {
            id,
            href: format!("/{}/", id),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_parse_archive() {
        let comics = parse_archive(ARCHIVE_HTML).unwrap();
        assert_eq!(
            comics,
            vec![
                meta(3000, "Latest & Greatest"),
                meta(2999, "Nested"),
                meta(1, "Barrel - Part 1"),
            ]
        );
    }

    #[test]
    fn test_parse_archive_without_container() {
        let err = parse_archive("<html></html>").unwrap_err();
        assert!(err.to_string().contains("middleContainer"));
    }

    #[test]
    fn test_parse_comic_page() {
        let comic = parse_comic_page(COMIC_HTML, &meta(1, "Barrel - Part 1")).unwrap();

        assert_eq!(comic.id, 1);
        assert_eq!(comic.title, "Barrel - Part 1");
        assert_eq!(
            comic.img_src,
            "https://imgs.xkcd.com/comics/barrel_cropped_(1).jpg"
        );
        assert_eq!(comic.subtext, "Don't we all.");
    }

    #[test]
    fn test_parse_comic_page_without_image() {
        let html = r#"<div id="comic"><p>interactive</p></div>"#;
        assert!(parse_comic_page(html, &meta(1608, "Hoverboard")).is_err());
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("a &lt;b&gt; &amp; &quot;c&quot;"), "a <b> & \"c\"");
        assert_eq!(unescape_html("&#233;t&#xE9;"), "été");
        assert_eq!(unescape_html("&unknown; stays"), "&unknown; stays");
    }

    #[tokio::test]
    async fn test_fetch_archive_from_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/archive/")
            .with_status(200)
            .with_body(ARCHIVE_HTML)
            .create_async()
            .await;

        let client = XkcdClient::with_base_url(server.url()).unwrap();
        let comics = client.fetch_archive().await.unwrap();

        mock.assert_async().await;
        assert_eq!(comics.len(), 3);
        assert_eq!(comics[0].id, 3000);
    }

    #[tokio::test]
    async fn test_fetch_comic_from_server() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/1/")
            .with_status(200)
            .with_body(COMIC_HTML)
            .create_async()
            .await;

        let client = XkcdClient::with_base_url(format!("{}/", server.url())).unwrap();
        let comic = client.fetch_comic(&meta(1, "Barrel - Part 1")).await.unwrap();
        assert_eq!(comic.subtext, "Don't we all.");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/archive/")
            .with_status(503)
            .create_async()
            .await;

        let client = XkcdClient::with_base_url(server.url()).unwrap();
        let err = client.fetch_archive().await.unwrap_err();
        assert!(err.to_string().contains("503"), "{}", err);
    }

    #[tokio::test]
    async fn test_download_image() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/comics/barrel.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"\x89PNG fake")
            .create_async()
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("1.png");
        let client = XkcdClient::with_base_url(server.url()).unwrap();

        client
            .download_image(&format!("{}/comics/barrel.png", server.url()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(dest).unwrap(), b"\x89PNG fake");
    }
}
