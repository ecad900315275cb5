use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::metadata::LinkMetadata;

const UNKNOWN_TITLE: &str = "Unknown";

/// Title and icon of an HTML page. Relative icon hrefs are resolved against
/// `page_url`; pages without an icon link fall back to Google's favicon
/// service for the host.
pub fn parse_metadata(html: &str, page_url: &Url) -> LinkMetadata {
    let document = Html::parse_document(html);

    let title = first_match(&document, "title")
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let icon = first_match(&document, r#"link[rel~="icon"]"#)
        .and_then(|e| e.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| fallback_icon(page_url));

    LinkMetadata { title, icon }
}

pub fn fallback_icon(page_url: &Url) -> String {
    match page_url.host_str() {
        Some(host) => format!("https://www.google.com/s2/favicons?domain={}", host),
        None => String::new(),
    }
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn extracts_title_and_relative_icon() {
        let html = r#"<html><head>
            <title>  What is GDPR?  </title>
            <link rel="icon" href="/static/favicon.png">
        </head><body></body></html>"#;

        let meta = parse_metadata(html, &url("https://gdpr.eu/what-is-gdpr/"));
        assert_eq!(meta.title, "What is GDPR?");
        assert_eq!(meta.icon, "https://gdpr.eu/static/favicon.png");
    }

    #[test]
    fn shortcut_icon_matches() {
        let html = r#"<head><link rel="shortcut icon" href="https://cdn.example.com/i.ico"></head>"#;
        let meta = parse_metadata(html, &url("https://example.com/page"));
        assert_eq!(meta.icon, "https://cdn.example.com/i.ico");
        assert_eq!(meta.title, "Unknown");
    }

    #[test]
    fn missing_icon_uses_favicon_service() {
        let meta = parse_metadata("<title>ICO</title>", &url("https://ico.org.uk/for-organisations/"));
        assert_eq!(meta.title, "ICO");
        assert_eq!(meta.icon, "https://www.google.com/s2/favicons?domain=ico.org.uk");
    }
}
