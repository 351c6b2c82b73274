//! HTML parsing for Google Scholar result pages.
//!
//! Turns author-search and publication-search pages into [`Record`]s keyed
//! the way the projections expect. Fields the page shows are always
//! populated (empty string or zero when the element is blank); identifiers
//! the page lacks are left out so that projection fails loudly.

use crate::error::{ScholarError, Result};
use crate::record::Record;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Placeholder for bibliographic fields the snippet does not show
const NOT_AVAILABLE: &str = "NA";

/// One parsed author-search page
#[derive(Debug, Default)]
pub struct AuthorPage {
    pub records: Vec<Record>,
    /// Site-relative link to the next page, if the "next" button is enabled
    pub next: Option<String>,
}

/// Whether Scholar served its bot check instead of results.
///
/// Only the check's own markup counts; result snippets can mention the same
/// phrases Scholar uses in its explanation text.
pub fn is_captcha(html: &str) -> bool {
    html.contains("gs_captcha_ccl")
        || html.contains("g-recaptcha")
        || html.contains("Solving the above CAPTCHA")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScholarError::Parse(format!("{}: {}", css, e)))
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ScholarError::Parse(e.to_string()))
}

fn collapse_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// `[PDF]`, `[CITATION]`, `[BOOK]` and similar type badges
fn is_type_badge(element: ElementRef<'_>) -> bool {
    element.value().name() == "span"
        && element.value().classes().any(|c| c.starts_with("gs_ct"))
}

/// Title text without the type badges Scholar puts in front of it
fn title_text(element: ElementRef<'_>) -> String {
    let text: String = element
        .descendants()
        .filter_map(|node| {
            let text: &str = node.value().as_text()?;
            let in_badge = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(is_type_badge);
            (!in_badge).then(|| text.to_string())
        })
        .collect();
    collapse_whitespace(&text)
}

fn absolute(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url, href)
    }
}

fn user_id(user_re: &Regex, href: &str) -> Option<String> {
    user_re
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a `view_op=search_authors` page
pub fn parse_author_page(html: &str, base_url: &str) -> Result<AuthorPage> {
    let document = Html::parse_document(html);

    let item_selector = selector("div.gsc_1usr")?;
    let name_selector = selector("h3.gs_ai_name a")?;
    let affiliation_selector = selector("div.gs_ai_aff")?;
    let email_selector = selector("div.gs_ai_eml")?;
    let cited_selector = selector("div.gs_ai_cby")?;
    let interest_selector = selector("a.gs_ai_one_int")?;
    let next_selector = selector("button.gsc_pgn_pnx")?;

    let user_re = regex(r"[?&]user=([\w-]+)")?;

    let mut page = AuthorPage::default();

    for item in document.select(&item_selector) {
        let mut record = Record::new();
        record.insert("container_type", "Author");
        record.insert("filled", false);
        record.insert("source", "SEARCH_AUTHOR_SNIPPETS");

        if let Some(link) = item.select(&name_selector).next() {
            record.insert("name", text_of(link));
            if let Some(id) = link.value().attr("href").and_then(|h| user_id(&user_re, h)) {
                record.insert(
                    "url_picture",
                    format!("{}/citations?view_op=medium_photo&user={}", base_url, id),
                );
                record.insert("scholar_id", id);
            }
        }

        let affiliation = item
            .select(&affiliation_selector)
            .next()
            .map(text_of)
            .unwrap_or_default();
        record.insert("affiliation", affiliation);

        let email_domain = item
            .select(&email_selector)
            .next()
            .map(text_of)
            .and_then(|text| {
                text.trim_start_matches("Verified email at")
                    .split_whitespace()
                    .next()
                    .map(|domain| format!("@{}", domain))
            })
            .unwrap_or_default();
        record.insert("email_domain", email_domain);

        let interests: Vec<Value> = item
            .select(&interest_selector)
            .map(|a| Value::from(text_of(a)))
            .collect();
        record.insert("interests", interests);

        let citedby = item
            .select(&cited_selector)
            .next()
            .map(text_of)
            .and_then(|text| {
                text.chars()
                    .filter(char::is_ascii_digit)
                    .collect::<String>()
                    .parse::<u64>()
                    .ok()
            })
            .unwrap_or(0);
        record.insert("citedby", citedby);

        page.records.push(record);
    }

    page.next = document
        .select(&next_selector)
        .find(|button| button.value().attr("disabled").is_none())
        .and_then(|button| button.value().attr("onclick"))
        .and_then(decode_onclick);

    Ok(page)
}

/// Extract the target of `window.location='...'`, undoing Scholar's `\xNN` escapes
fn decode_onclick(onclick: &str) -> Option<String> {
    const PREFIX: &str = "window.location='";
    let start = onclick.find(PREFIX)? + PREFIX.len();
    let rest = &onclick[start..];
    let end = rest.find('\'')?;
    Some(
        rest[..end]
            .replace("\\x3d", "=")
            .replace("\\x26", "&")
            .replace("\\x2f", "/"),
    )
}

/// Parse a `/scholar?q=` result page.
///
/// `rank_offset` is the number of results on earlier pages; ranks are 1-based.
pub fn parse_publication_page(
    html: &str,
    base_url: &str,
    query: &str,
    rank_offset: usize,
) -> Result<Vec<Record>> {
    let document = Html::parse_document(html);

    let item_selector = selector("div.gs_r.gs_or.gs_scl")?;
    let title_selector = selector("h3.gs_rt")?;
    let link_selector = selector("h3.gs_rt a")?;
    let meta_selector = selector("div.gs_a")?;
    let meta_link_selector = selector("div.gs_a a")?;
    let snippet_selector = selector("div.gs_rs")?;
    let cite_selector = selector("div.gs_fl a")?;
    let eprint_selector = selector("div.gs_ggs a")?;

    let user_re = regex(r"[?&]user=([\w-]+)")?;
    let year_re = regex(r"\b(19|20)\d{2}\b")?;
    let cite_re = regex(r"Cited by\s*(\d+)")?;

    let mut records = Vec::new();

    for item in document.select(&item_selector) {
        let (title, pub_url) = match item.select(&link_selector).next() {
            Some(link) => (
                title_text(link),
                link.value()
                    .attr("href")
                    .map(|h| absolute(base_url, h))
                    .unwrap_or_default(),
            ),
            None => (
                item.select(&title_selector)
                    .next()
                    .map(title_text)
                    .unwrap_or_default(),
                String::new(),
            ),
        };

        // Only keep entries with a title
        if title.is_empty() {
            continue;
        }

        let gsrank = rank_offset + records.len() + 1;

        let mut authors: Vec<String> = Vec::new();
        let mut venue = NOT_AVAILABLE.to_string();
        let mut year = NOT_AVAILABLE.to_string();
        let mut linked_ids: HashMap<String, String> = HashMap::new();

        if let Some(meta) = item.select(&meta_selector).next() {
            let meta_text = text_of(meta);
            let parts: Vec<&str> = meta_text.split(" - ").collect();

            authors = parts[0]
                .split(',')
                .map(|a| a.trim().trim_end_matches('…').trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();

            if parts.len() >= 2 {
                let venue_year = parts[1];
                if let Some(found) = year_re.find(venue_year) {
                    year = found.as_str().to_string();
                    let before = venue_year[..found.start()].trim().trim_end_matches(',');
                    if !before.is_empty() {
                        venue = before.to_string();
                    }
                } else if !venue_year.trim().is_empty() {
                    venue = venue_year.trim().to_string();
                }
            }

            for link in meta.select(&meta_link_selector) {
                if let Some(id) = link.value().attr("href").and_then(|h| user_id(&user_re, h)) {
                    linked_ids.insert(text_of(link), id);
                }
            }
        }

        let author_id: Vec<Value> = authors
            .iter()
            .map(|a| Value::from(linked_ids.get(a).cloned().unwrap_or_default()))
            .collect();

        let abstract_text = item
            .select(&snippet_selector)
            .next()
            .map(text_of)
            .unwrap_or_default();

        let mut bib = serde_json::Map::new();
        bib.insert("title".to_string(), Value::from(title));
        bib.insert("author".to_string(), Value::from(authors));
        bib.insert("pub_year".to_string(), Value::from(year));
        bib.insert("venue".to_string(), Value::from(venue));
        bib.insert("abstract".to_string(), Value::from(abstract_text));

        let mut record = Record::new();
        record.insert("container_type", "Publication");
        record.insert("source", "PUBLICATION_SEARCH_SNIPPET");
        record.insert("bib", bib);
        record.insert("filled", false);
        record.insert("gsrank", gsrank);
        record.insert("pub_url", pub_url);
        record.insert("author_id", author_id);

        let mut num_citations = 0u64;
        let mut citedby_url = String::new();
        for link in item.select(&cite_selector) {
            let href = link.value().attr("href").unwrap_or("");
            if !href.contains("cites=") {
                continue;
            }
            let text = text_of(link);
            if let Some(count) = cite_re.captures(&text).and_then(|c| c.get(1)) {
                num_citations = count.as_str().parse().unwrap_or(0);
                citedby_url = absolute(base_url, href);
                break;
            }
        }
        record.insert("num_citations", num_citations);
        record.insert("citedby_url", citedby_url);

        if let Some(href) = item
            .select(&eprint_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            record.insert("eprint_url", absolute(base_url, href));
        }

        if let Some(cid) = item.value().attr("data-cid") {
            record.insert(
                "url_scholarbib",
                format!(
                    "{}/scholar?hl=en&q=info:{}:scholar.google.com/&output=cite&scirp={}&hl=en",
                    base_url,
                    cid,
                    gsrank - 1
                ),
            );
            record.insert("url_add_sclib", add_to_library_url(base_url, cid, query)?);
            record.insert(
                "url_related_articles",
                format!("{}/scholar?q=related:{}:scholar.google.com/&hl=en", base_url, cid),
            );
        }

        records.push(record);
    }

    Ok(records)
}

fn add_to_library_url(base_url: &str, cid: &str, query: &str) -> Result<String> {
    let mut url = Url::parse(&format!("{}/citations", base_url))
        .map_err(|e| ScholarError::Config(format!("Invalid base URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("hl", "en")
        .append_pair("update_op", "library_add")
        .append_pair("info", cid)
        .append_pair("citilm", "1")
        .append_pair("continue", &format!("/scholar?q={}&hl=en&as_sdt=0,33", query));
    Ok(url.into())
}
