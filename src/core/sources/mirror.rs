// ─── Mirror scraping ───
// OptiFine-style download pages: a listing with one `.downloadLineMirror`
// cell per release, each linking to a mirror page whose `span#Download`
// holds the real link.
//
// `scraper::Html` is not `Send`, so every parse happens in a plain function
// that returns owned strings before the next `.await`.

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, info};

use super::artifact::{sanitize_file_name, ResolvedArtifact};
use crate::core::downloader::Downloader;
use crate::core::error::{SetupError, SetupResult};

const MIRROR_CELL: &str = ".downloadLineMirror";
const DOWNLOAD_SPAN: &str = "span#Download";

pub struct MirrorScraper {
    downloader: Downloader,
    default_page: String,
}

impl MirrorScraper {
    pub fn new(downloader: Downloader, default_page: &str) -> Self {
        Self {
            downloader,
            default_page: default_page.to_string(),
        }
    }

    pub async fn locate(
        &self,
        catalog_page_url: Option<&str>,
        minecraft_version: &str,
    ) -> SetupResult<ResolvedArtifact> {
        let page_url = parse_url(catalog_page_url.unwrap_or(&self.default_page))?;

        let listing = self.downloader.text(page_url.as_str()).await?;
        let links = mirror_links(&listing, minecraft_version)?;
        let first = links.into_iter().next().ok_or_else(|| {
            SetupError::version_unavailable(page_url.as_str(), minecraft_version)
        })?;

        let mirror_url = join(&page_url, &first)?;
        debug!("Following mirror {}", mirror_url);

        let mirror_page = self.downloader.text(mirror_url.as_str()).await?;
        let (href, file_name) = download_link(&mirror_page)?;
        let download_url = join(&mirror_url, &href)?;

        info!("Selected {} from {}", file_name, page_url);
        ResolvedArtifact::new(download_url.to_string(), &file_name)
    }
}

fn selector(css: &str) -> SetupResult<Selector> {
    Selector::parse(css).map_err(|e| SetupError::Structure(format!("bad selector '{css}': {e:?}")))
}

fn parse_url(raw: &str) -> SetupResult<Url> {
    Url::parse(raw).map_err(|e| SetupError::Structure(format!("bad page URL '{raw}': {e}")))
}

fn join(base: &Url, href: &str) -> SetupResult<Url> {
    base.join(href)
        .map_err(|e| SetupError::Structure(format!("bad link '{href}' on {base}: {e}")))
}

/// Mirror hrefs, in page order, whose target mentions `minecraft_version`.
///
/// A mirror cell without a link is a structural error; a page with no
/// matching cells simply yields an empty list.
pub fn mirror_links(html: &str, minecraft_version: &str) -> SetupResult<Vec<String>> {
    let document = Html::parse_document(html);
    let cells = selector(MIRROR_CELL)?;
    let anchor = selector("a")?;

    let mut links = Vec::new();
    for cell in document.select(&cells) {
        let href = cell
            .select(&anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| SetupError::Structure(format!("{MIRROR_CELL} without a link")))?;
        if href.contains(minecraft_version) {
            links.push(href.to_string());
        }
    }

    Ok(links)
}

/// The final download href and the file name shown in its label.
///
/// The label reads `Download <file name>`; the leading word is dropped.
pub fn download_link(html: &str) -> SetupResult<(String, String)> {
    let document = Html::parse_document(html);
    let span = document
        .select(&selector(DOWNLOAD_SPAN)?)
        .next()
        .ok_or_else(|| SetupError::Structure(format!("mirror page has no {DOWNLOAD_SPAN}")))?;

    let href = span
        .select(&selector("a")?)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| SetupError::Structure(format!("{DOWNLOAD_SPAN} has no link")))?
        .to_string();

    let label = span.text().collect::<String>();
    let label = label.trim();
    let name = label
        .strip_prefix("Download")
        .unwrap_or(label)
        .trim();

    Ok((href, sanitize_file_name(name)?))
}
