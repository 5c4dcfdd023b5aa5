use crate::error::{IndexError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, info};

/// Fetch a sitemap document and extract the URLs it lists.
///
/// Any network or parse error is fatal; the caller decides what to do with it.
pub async fn fetch_urls(client: &Client, sitemap_url: &str) -> Result<Vec<String>> {
    info!("Fetching sitemap from {}", sitemap_url);
    let response = client.get(sitemap_url).send().await?;
    let body = response.text().await?;
    let urls = parse_sitemap(&body)?;
    info!("Sitemap listed {} URLs", urls.len());
    Ok(urls)
}

/// Extract the `<loc>` value of every `<url>` entry, in document order.
///
/// Duplicates are kept. Entries without a `<loc>` are skipped. Works with or
/// without the sitemap namespace prefix since matching is on local names.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut current_loc = String::new();

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"url" => {
                    in_url = true;
                    current_loc.clear();
                }
                b"loc" if in_url => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_loc {
                    let text = e
                        .unescape()
                        .map_err(|e| IndexError::ParseError(e.to_string()))?;
                    current_loc.push_str(text.trim());
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = false,
                b"url" => {
                    if in_url && !current_loc.is_empty() {
                        debug!("Found sitemap entry: {}", current_loc);
                        urls.push(current_loc.clone());
                    }
                    in_url = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(IndexError::ParseError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_sitemap_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url>
                <loc>https://example.com/</loc>
                <lastmod>2026-01-01</lastmod>
            </url>
            <url>
                <loc>https://example.com/about</loc>
            </url>
            <url>
                <loc>https://example.com/contact</loc>
                <priority>0.5</priority>
            </url>
        </urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/contact",
            ]
        );
    }

    #[test]
    fn test_parse_sitemap_keeps_duplicates() {
        let xml = r#"<urlset>
            <url><loc>https://example.com/page</loc></url>
            <url><loc>https://example.com/page</loc></url>
        </urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], urls[1]);
    }

    #[test]
    fn test_parse_sitemap_skips_entries_without_loc() {
        let xml = r#"<urlset>
            <url><lastmod>2026-01-01</lastmod></url>
            <url><loc>https://example.com/kept</loc></url>
        </urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls, vec!["https://example.com/kept"]);
    }

    #[test]
    fn test_parse_sitemap_with_namespace_prefix() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sm:url><sm:loc>https://example.com/prefixed</sm:loc></sm:url>
        </sm:urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls, vec!["https://example.com/prefixed"]);
    }

    #[test]
    fn test_parse_sitemap_ignores_loc_outside_url() {
        let xml = r#"<sitemapindex>
            <sitemap><loc>https://example.com/sitemap-posts.xml</loc></sitemap>
        </sitemapindex>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_parse_sitemap_malformed() {
        let xml = "<urlset><url><loc>https://example.com/</urlset>";

        let result = parse_sitemap(xml);
        assert!(matches!(result, Err(IndexError::ParseError(_))));
    }

    #[test]
    fn test_parse_sitemap_unescapes_entities() {
        let xml = r#"<urlset>
            <url><loc>https://example.com/search?a=1&amp;b=2</loc></url>
        </urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls, vec!["https://example.com/search?a=1&b=2"]);
    }

    #[tokio::test]
    async fn test_fetch_urls() {
        let mock_server = MockServer::start().await;

        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><loc>https://example.com/</loc></url>
            <url><loc>https://example.com/quiz</loc></url>
        </urlset>"#;

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(body),
            )
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let urls = fetch_urls(&client, &format!("{}/sitemap.xml", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://example.com/");
        assert_eq!(urls[1], "https://example.com/quiz");
    }

    #[tokio::test]
    async fn test_fetch_urls_unreachable_is_fatal() {
        let client = Client::new();
        // Nothing listens on this port.
        let result = fetch_urls(&client, "http://127.0.0.1:1/sitemap.xml").await;
        assert!(matches!(result, Err(IndexError::HttpError(_))));
    }
}
