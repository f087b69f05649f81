//! The fetch pipeline: probe, download, extract, attach, fan out.
//!
//! Each admitted resource runs through one fetch task. Failures at any
//! stage drop the resource silently; its descendants are simply never
//! discovered. The response body is buffered once and both the title and
//! link extraction passes run over the same parsed document.

use std::sync::Arc;

use mime::Mime;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use scraper::Html;
use tracing::{debug, trace};
use url::Url;

use crate::html;
use crate::resource::Resource;
use crate::worker::{FetchGuard, Worker, WorkerStatus};

use super::Crawler;

/// Normalises `href` against the page it was found on.
///
/// Relative references resolve against `base`; anything that lands on a
/// different host or a non-http(s) scheme is rejected. This is the only
/// place same-host scoping is enforced: every admitted ancestor passed the
/// same test, so `base` always carries the seed host.
pub(crate) fn normalise(href: &str, base: &Url) -> Option<Url> {
    let resolved = Url::options().base_url(Some(base)).parse(href).ok()?;

    if resolved.host_str() != base.host_str() {
        return None;
    }

    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }

    Some(resolved)
}

/// Downloads one resource, attaches it to its worker's tree, and enqueues
/// the in-domain links it contains.
pub(crate) async fn fetch(
    crawler: Arc<Crawler>,
    worker: Arc<Worker>,
    mut resource: Resource,
    _guard: FetchGuard,
) {
    let _permit = match crawler.throttle.acquire().await {
        Ok(permit) => permit,
        Err(_) => return,
    };

    if crawler.queue.is_closed() {
        return;
    }

    match is_html(&crawler, &resource.url).await {
        Ok(true) => {}
        Ok(false) => {
            trace!(url = %resource.url_string, "content type is not text/html, skipping");
            crawler.stats.increment_mime_rejects();
            return;
        }
        Err(e) => {
            debug!(url = %resource.url_string, error = %e, "content type probe failed");
            crawler.stats.increment_fetch_failures();
            return;
        }
    }

    if worker.status() != WorkerStatus::InProgress {
        worker.set_status(WorkerStatus::InProgress);
    }

    let response = match crawler
        .http
        .get(resource.url.clone())
        .header(USER_AGENT, &crawler.config.user_agent)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            debug!(url = %resource.url_string, error = %e, "fetch failed");
            crawler.stats.increment_fetch_failures();
            return;
        }
    };

    resource.http_status_code = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(url = %resource.url_string, error = %e, "failed to read response body");
            crawler.stats.increment_fetch_failures();
            return;
        }
    };

    crawler.stats.increment_pages_fetched();
    crawler.stats.record_response_status(resource.http_status_code);
    crawler.stats.add_bytes_downloaded(body.len());

    // Html is not Send; extract everything before the next await point.
    let (title, links) = {
        let doc = Html::parse_document(&body);
        (html::page_title(&doc), html::collect_links(&doc))
    };
    resource.title = title;

    let base = resource.url.clone();
    let root = resource.root.clone();
    let mut ancestry = resource.parent.clone();
    ancestry.push(resource.url_string.clone());
    let child_depth = resource.depth + 1;

    // Attach before fanning out, so a child can never reach the tree
    // ahead of its parent.
    worker.attach(resource);

    for link in links {
        let Some(absolute) = normalise(&link, &base) else {
            continue;
        };
        crawler.stats.increment_links_discovered();

        if crawler.queue.is_closed() {
            return;
        }

        let child = Resource::child(absolute, root.clone(), ancestry.clone(), child_depth);
        crawler.stats.increment_resources_enqueued();
        if crawler.queue.push(child).await.is_err() {
            return;
        }
    }
}

/// Issues a HEAD request and reports whether the response advertises
/// `text/html` content.
async fn is_html(crawler: &Crawler, url: &Url) -> Result<bool, reqwest::Error> {
    let response = crawler
        .http
        .head(url.clone())
        .header(USER_AGENT, &crawler.config.user_agent)
        .send()
        .await?;

    let Some(content_type) = response.headers().get(CONTENT_TYPE) else {
        return Ok(false);
    };
    let Ok(raw) = content_type.to_str() else {
        return Ok(false);
    };
    let Ok(media_type) = raw.parse::<Mime>() else {
        return Ok(false);
    };

    Ok(media_type.type_() == mime::TEXT && media_type.subtype() == mime::HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn relative_href_resolves_against_the_base() {
        let base = base("http://example.com/sub");
        let absolute = normalise("/resource", &base).unwrap();
        assert_eq!(absolute.as_str(), "http://example.com/resource");
    }

    #[test]
    fn base_itself_normalises_to_base() {
        let base = base("https://example.com/page");
        let absolute = normalise(base.as_str(), &base).unwrap();
        assert_eq!(absolute, base);
    }

    #[test]
    fn foreign_host_is_rejected() {
        let base = base("https://example.com/");
        assert!(normalise("https://other.test/page", &base).is_none());
        assert!(normalise("//other.test/page", &base).is_none());
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        let base = base("https://example.com/");
        assert!(normalise("mailto:someone@example.com", &base).is_none());
        assert!(normalise("javascript:void(0)", &base).is_none());
    }

    #[test]
    fn fragment_variants_stay_distinct() {
        let base = base("https://example.com/");
        let plain = normalise("/page", &base).unwrap();
        let fragment = normalise("/page#top", &base).unwrap();
        assert_ne!(plain.as_str(), fragment.as_str());
    }
}
