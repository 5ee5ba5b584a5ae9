//! HTML parsing and structured extraction.
//!
//! [`PageDom`] is a thin typed wrapper over [`scraper::Html`] exposing the
//! handful of tree capabilities the extractors need: find the first or all
//! matching elements, read attributes and text, and drop whole subtrees.
//!
//! [`extract_html`] runs the extractors in a fixed order. Title and meta
//! tags are read from the untouched document; `<script>`, `<style>` and
//! `<noscript>` subtrees are then removed, and text, links, tables and forms
//! are taken from what remains.

use crate::error::{ExtractError, Result};
use crate::models::{FormField, Link, Meta, Table};
use crate::tables::extract_tables;
use crate::utils::{collapse_whitespace, truncate_chars};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

/// Upper bound on the `text` facet of an HTML page, in characters.
pub const MAX_HTML_TEXT_CHARS: usize = 200_000;

/// Compile a CSS selector, reporting failures as [`ExtractError::Parse`].
pub fn css(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ExtractError::Parse(format!("bad selector {selector:?}: {e}")))
}

/// Text of an element and its descendants.
///
/// Each text node is trimmed on its own and the non-empty pieces are
/// concatenated with no separator, so indentation between inline children
/// never leaks into titles, link text or cells.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// A parsed HTML document.
pub struct PageDom {
    html: Html,
}

impl PageDom {
    /// Parse a full document. The parser is lenient and never fails.
    pub fn parse(raw: &str) -> Self {
        let html = Html::parse_document(raw);
        if !html.errors.is_empty() {
            debug!(count = html.errors.len(), "Recovered from malformed markup");
        }
        Self { html }
    }

    pub fn find_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    pub fn find_all<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// Detach every element matching `selector` together with its subtree.
    ///
    /// Returns how many elements matched.
    pub fn remove_subtrees(&mut self, selector: &Selector) -> usize {
        let ids: Vec<_> = self.html.select(selector).map(|el| el.id()).collect();
        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }
        ids.len()
    }

    /// Visible text: trimmed non-empty text nodes joined by single spaces.
    pub fn text(&self) -> String {
        self.html
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything the HTML path contributes to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlFacts {
    pub title: String,
    pub meta: Meta,
    pub text: String,
    pub links: Vec<Link>,
    pub tables: Vec<Table>,
    pub forms: Vec<FormField>,
}

/// Extract title, meta, text, links, tables and forms from `raw`.
///
/// `request_url` is both the base for relative URLs and the title fallback;
/// `request_str` is its original spelling as echoed in the record.
#[instrument(level = "debug", skip_all, fields(url = %request_str, bytes = raw.len()))]
pub fn extract_html(raw: &str, request_url: &Url, request_str: &str) -> Result<HtmlFacts> {
    let mut dom = PageDom::parse(raw);

    let title = match dom.find_first(&css("title")?) {
        Some(el) => element_text(el),
        None => request_str.to_string(),
    };
    let meta = Meta {
        description: meta_content(&dom, "description")?,
        keywords: meta_content(&dom, "keywords")?,
    };

    let removed = dom.remove_subtrees(&css("script, style, noscript")?);
    debug!(removed, "Dropped non-visible subtrees");

    let text = truncate_chars(&collapse_whitespace(&dom.text()), MAX_HTML_TEXT_CHARS);
    let links = extract_links(&dom, request_url)?;
    let tables = extract_tables(&dom)?;
    let forms = extract_forms(&dom, request_url)?;

    Ok(HtmlFacts {
        title,
        meta,
        text,
        links,
        tables,
        forms,
    })
}

/// `content` of the first `<meta name=..>`, else the first `<meta property=..>`.
fn meta_content(dom: &PageDom, key: &str) -> Result<String> {
    let by_name = css(&format!(r#"meta[name="{key}"]"#))?;
    let by_property = css(&format!(r#"meta[property="{key}"]"#))?;

    let found = dom
        .find_first(&by_name)
        .or_else(|| dom.find_first(&by_property));
    Ok(found
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default())
}

fn extract_links(dom: &PageDom, base: &Url) -> Result<Vec<Link>> {
    let anchors = css("a[href]")?;
    let mut links = Vec::new();

    for anchor in dom.find_all(&anchors) {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() {
            continue;
        }
        let absolute = match base.join(href) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                warn!(%href, error = %e, "Skipping unresolvable href");
                continue;
            }
        };
        let text = match element_text(anchor) {
            t if t.is_empty() => absolute.clone(),
            t => t,
        };
        links.push(Link {
            text,
            href: absolute,
        });
    }

    Ok(links)
}

fn extract_forms(dom: &PageDom, base: &Url) -> Result<Vec<FormField>> {
    let forms = css("form")?;
    let controls = css("input, select, textarea")?;
    let mut fields = Vec::new();

    for form in dom.find_all(&forms) {
        let action_attr = form.value().attr("action").unwrap_or_default().trim();
        let action = if action_attr.is_empty() {
            base.to_string()
        } else {
            base.join(action_attr)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| action_attr.to_string())
        };

        for control in form.select(&controls) {
            let element = control.value();
            let input_type = match element.name() {
                "input" => element.attr("type").unwrap_or("text").to_string(),
                other => other.to_string(),
            };
            fields.push(FormField {
                action: action.clone(),
                input_name: element.attr("name").unwrap_or_default().to_string(),
                input_type,
            });
        }
    }

    Ok(fields)
}
