//! The single-page extraction pipeline.
//!
//! ```text
//! normalize URL -> fetch (retry) -> classify Content-Type
//!     opaque: entities over the raw body
//!     html:   HTML extractor -> social buckets -> entities over text
//! -> ExtractionRecord
//! ```

use crate::classify::{ContentKind, classify};
use crate::entities::{find_emails, find_phones};
use crate::error::{ExtractError, Result};
use crate::fetch::{FetchOptions, ReqwestTransport, RetryFetch, Sleeper, TokioSleeper, Transport};
use crate::html::extract_html;
use crate::models::{ExtractionRecord, FetchResult, Meta};
use crate::social::classify_social;
use crate::utils::{normalize_url, truncate_chars};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Upper bound on the `text` facet of a non-HTML response, in characters.
pub const MAX_OPAQUE_TEXT_CHARS: usize = 50_000;

/// Runs extractions over an injected transport.
///
/// Holds no per-request state; one instance can serve any number of
/// sequential or concurrent extractions.
#[derive(Debug)]
pub struct Extractor<T, S = TokioSleeper> {
    fetcher: RetryFetch<T, S>,
}

impl Extractor<ReqwestTransport, TokioSleeper> {
    /// Extractor over the real network.
    ///
    /// # Errors
    ///
    /// [`ExtractError::Client`] if the HTTP client cannot be built from
    /// `options`.
    pub fn from_options(options: &FetchOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(options).map_err(ExtractError::Client)?;
        Ok(Self {
            fetcher: RetryFetch::new(transport, options),
        })
    }
}

impl<T: Transport, S: Sleeper> Extractor<T, S> {
    pub fn new(fetcher: RetryFetch<T, S>) -> Self {
        Self { fetcher }
    }

    /// Fetch `url` and extract its facts.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidInput`] before any network I/O
    /// - [`ExtractError::Fetch`] once retries are exhausted
    /// - [`ExtractError::Parse`] if the document cannot be processed
    #[instrument(level = "info", skip(self))]
    pub async fn extract(&self, url: &str) -> Result<ExtractionRecord> {
        let (request_str, request_url) = normalize_url(url)?;
        let fetched = self.fetcher.fetch(&request_url).await?;

        let record = match classify(fetched.content_type.as_deref()) {
            ContentKind::Opaque => assemble_opaque(&request_str, fetched),
            ContentKind::Html => {
                let facts = extract_html(&fetched.body, &request_url, &request_str)?;
                let social_links = classify_social(&facts.links);
                ExtractionRecord {
                    url: request_str,
                    final_url: fetched.final_url,
                    content_type: fetched.content_type.unwrap_or_default(),
                    title: facts.title,
                    meta: facts.meta,
                    emails: find_emails(&facts.text),
                    phones: find_phones(&facts.text),
                    links: facts.links,
                    social_links,
                    tables: facts.tables,
                    forms: facts.forms,
                    text: facts.text,
                }
            }
        };

        info!(
            title = %record.title,
            emails = record.emails.len(),
            phones = record.phones.len(),
            links = record.links.len(),
            social = record.social_links.len(),
            tables = record.tables.len(),
            text_chars = record.text.chars().count(),
            "Extraction complete"
        );
        Ok(record)
    }
}

/// Record for a non-HTML body: entities are scanned over the whole body
/// before `text` is cut down.
fn assemble_opaque(request_str: &str, fetched: FetchResult) -> ExtractionRecord {
    let emails = find_emails(&fetched.body);
    let phones = find_phones(&fetched.body);
    let text = truncate_chars(&fetched.body, MAX_OPAQUE_TEXT_CHARS);

    ExtractionRecord {
        url: request_str.to_string(),
        final_url: fetched.final_url,
        content_type: fetched.content_type.unwrap_or_default(),
        title: request_str.to_string(),
        meta: Meta::default(),
        emails,
        phones,
        links: Vec::new(),
        social_links: BTreeMap::new(),
        tables: Vec::new(),
        forms: Vec::new(),
        text,
    }
}

/// Fetch `url` over the network with default options and extract its facts.
///
/// # Errors
///
/// See [`Extractor::extract`].
pub async fn extract(url: &str) -> Result<ExtractionRecord> {
    Extractor::from_options(&FetchOptions::default())?
        .extract(url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;
    use crate::fetch::RawResponse;
    use crate::fetch::testing::{RecordingSleeper, ScriptedTransport, ok_response};
    use pretty_assertions::assert_eq;

    async fn run_with(
        url: &str,
        script: Vec<std::result::Result<RawResponse, FetchFailure>>,
    ) -> (Result<ExtractionRecord>, usize, Vec<String>) {
        let transport = ScriptedTransport::new(script);
        let sleeper = RecordingSleeper::default();
        let extractor = Extractor::new(RetryFetch::with_sleeper(
            &transport,
            &sleeper,
            &FetchOptions::default(),
        ));
        let result = extractor.extract(url).await;
        let requested = transport.requested.borrow().clone();
        (result, transport.calls(), requested)
    }

    #[tokio::test]
    async fn test_html_page_end_to_end() {
        let html = r#"<html><head><title>Acme</title>
            <meta name="description" content="Widgets">
            <meta property="keywords" content="widgets, tools"></head>
            <body>
              <p>Mail sales@acme.test or info@acme.test, call +1 555-123-4567.</p>
              <a href="/about">About</a>
              <a href="https://github.com/acme">Code</a>
              <a href="https://twitter.com/acme"></a>
              <table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td><td>3</td></tr></table>
              <script>var hidden = "nobody@hidden.test";</script>
            </body></html>"#;
        let (result, calls, requested) = run_with(
            "acme.test/home",
            vec![Ok(ok_response("https://acme.test/home", "text/html; charset=utf-8", html))],
        )
        .await;
        let record = result.unwrap();

        assert_eq!(calls, 1);
        assert_eq!(requested, vec!["https://acme.test/home"]);
        assert_eq!(record.url, "https://acme.test/home");
        assert_eq!(record.title, "Acme");
        assert_eq!(record.meta.description, "Widgets");
        assert_eq!(record.meta.keywords, "widgets, tools");
        assert_eq!(
            record.emails.iter().collect::<Vec<_>>(),
            vec!["info@acme.test", "sales@acme.test"]
        );
        assert!(record.phones.contains("+1 555-123-4567"));
        assert_eq!(record.links.len(), 3);
        assert_eq!(record.links[0].href, "https://acme.test/about");
        assert_eq!(record.links[2].text, "https://twitter.com/acme");
        assert_eq!(
            record.social_links.keys().collect::<Vec<_>>(),
            vec!["github", "twitter"]
        );
        assert_eq!(record.tables.len(), 1);
        assert_eq!(
            record.tables[0].rows[0].get("col_3").map(String::as_str),
            Some("3")
        );
        assert!(!record.text.contains("hidden"));
    }

    #[tokio::test]
    async fn test_opaque_body_scans_entities_beyond_text_limit() {
        let mut body = "x".repeat(MAX_OPAQUE_TEXT_CHARS + 10);
        body.push_str(" late@tail.test 020 7946 0958");
        let (result, _, _) = run_with(
            "https://files.test/report.pdf",
            vec![Ok(ok_response(
                "https://cdn.files.test/report.pdf",
                "application/pdf",
                &body,
            ))],
        )
        .await;
        let record = result.unwrap();

        assert_eq!(record.title, "https://files.test/report.pdf");
        assert_eq!(record.url, "https://files.test/report.pdf");
        assert_eq!(record.final_url, "https://cdn.files.test/report.pdf");
        assert_eq!(record.meta, Meta::default());
        assert!(record.links.is_empty());
        assert!(record.tables.is_empty());
        assert!(record.social_links.is_empty());
        assert_eq!(record.text, "x".repeat(MAX_OPAQUE_TEXT_CHARS));
        assert!(record.emails.contains("late@tail.test"));
        assert!(record.phones.contains("020 7946 0958"));
    }

    #[tokio::test]
    async fn test_opaque_body_keeps_markup_untouched() {
        let body = "<a href=\"/x\">not parsed</a>";
        let (result, _, _) = run_with(
            "https://ex.com/data.txt",
            vec![Ok(ok_response("https://ex.com/data.txt", "text/plain", body))],
        )
        .await;
        let record = result.unwrap();
        assert_eq!(record.text, body);
        assert!(record.links.is_empty());
    }

    #[tokio::test]
    async fn test_three_network_errors_fail_the_extraction() {
        let err = || Err(FetchFailure::Transport("connection reset".into()));
        let (result, calls, _) = run_with("https://ex.com/", vec![err(), err(), err()]).await;

        assert!(matches!(
            result,
            Err(ExtractError::Fetch { attempts: 3, .. })
        ));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_invalid_input_never_touches_the_network() {
        let (result, calls, _) = run_with("   ", vec![]).await;
        assert!(matches!(result, Err(ExtractError::InvalidInput { .. })));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_record_echoes_request_not_redirect_target() {
        let (result, _, _) = run_with(
            "http://ex.com/p",
            vec![Ok(ok_response(
                "https://www.ex.com/landing",
                "text/html",
                r#"<a href="/x">go</a>"#,
            ))],
        )
        .await;
        let record = result.unwrap();
        assert_eq!(record.url, "http://ex.com/p");
        assert_eq!(record.title, "http://ex.com/p");
        assert_eq!(record.final_url, "https://www.ex.com/landing");
        // links resolve against the request URL
        assert_eq!(record.links[0].href, "http://ex.com/x");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_opaque() {
        let body = "<title>Looks like HTML</title> mail ops@ex.com";
        let (result, _, _) = run_with(
            "https://ex.com/raw",
            vec![Ok(RawResponse {
                final_url: "https://ex.com/raw".into(),
                status: 200,
                content_type: None,
                body: body.into(),
            })],
        )
        .await;
        let record = result.unwrap();

        assert_eq!(record.content_type, "");
        assert_eq!(record.title, "https://ex.com/raw");
        assert_eq!(record.text, body);
        assert!(record.links.is_empty());
        assert!(record.emails.contains("ops@ex.com"));
    }

    #[tokio::test]
    async fn test_xhtml_takes_the_html_path() {
        let body = r#"<html><head><title>Strict</title></head>
            <body><p>Write to web@ex.com</p><a href="/feed">Feed</a></body></html>"#;
        let (result, _, _) = run_with(
            "https://ex.com/",
            vec![Ok(ok_response(
                "https://ex.com/",
                "application/xhtml+xml; charset=utf-8",
                body,
            ))],
        )
        .await;
        let record = result.unwrap();

        assert_eq!(record.content_type, "application/xhtml+xml; charset=utf-8");
        assert_eq!(record.title, "Strict");
        assert_eq!(record.text, "Strict Write to web@ex.com Feed");
        assert_eq!(record.links.len(), 1);
        assert_eq!(record.links[0].href, "https://ex.com/feed");
        assert!(record.emails.contains("web@ex.com"));
    }

    #[test]
    fn test_client_setup_failure_is_not_a_fetch_error() {
        let options = FetchOptions {
            user_agent: "bad\nagent".into(),
            ..FetchOptions::default()
        };
        let err = Extractor::from_options(&options).err();
        assert!(matches!(
            err,
            Some(ExtractError::Client(FetchFailure::Transport(_)))
        ));
    }
}
