//! Field projection from upstream records to flat output objects.
//!
//! Each projection copies a fixed whitelist of fields verbatim. Field order
//! in the structs is the key order of the emitted JSON.

use crate::error::Result;
use crate::record::Record;
use serde::Serialize;
use serde_json::Value;

/// A flat, serializable view over one upstream [`Record`].
pub trait Projection: Serialize + Sized {
    /// Output keys, in emission order
    const KEYS: &'static [&'static str];

    /// Extract the whitelisted fields, failing on the first missing one
    fn project(record: &Record) -> Result<Self>;
}

/// Author search result as printed by `search_author`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorProjection {
    pub container_type: Value,
    pub scholar_id: Value,
    pub url_picture: Value,
    pub name: Value,
    pub affiliation: Value,
    pub email_domain: Value,
    pub interests: Value,
    pub citedby: Value,
}

impl Projection for AuthorProjection {
    const KEYS: &'static [&'static str] = &[
        "container_type",
        "scholar_id",
        "url_picture",
        "name",
        "affiliation",
        "email_domain",
        "interests",
        "citedby",
    ];

    fn project(record: &Record) -> Result<Self> {
        Ok(Self {
            container_type: record.require("container_type")?,
            scholar_id: record.require("scholar_id")?,
            url_picture: record.require("url_picture")?,
            name: record.require("name")?,
            affiliation: record.require("affiliation")?,
            email_domain: record.require("email_domain")?,
            interests: record.require("interests")?,
            citedby: record.require("citedby")?,
        })
    }
}

/// Publication search result as printed by `search_paper`
///
/// Bibliographic fields are lifted out of the record's nested `bib` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationProjection {
    pub author_id: Value,
    #[serde(rename = "abstract")]
    pub abstract_text: Value,
    pub authors: Value,
    pub year: Value,
    pub title: Value,
    pub venue: Value,
    pub num_citations: Value,
    pub citedby_url: Value,
    /// `null` when the record has no e-print link
    pub eprint_url: Value,
    pub gsrank: Value,
    pub pub_url: Value,
    pub url_add_sclib: Value,
    pub url_scholarbib: Value,
}

impl Projection for PublicationProjection {
    const KEYS: &'static [&'static str] = &[
        "author_id",
        "abstract",
        "authors",
        "year",
        "title",
        "venue",
        "num_citations",
        "citedby_url",
        "eprint_url",
        "gsrank",
        "pub_url",
        "url_add_sclib",
        "url_scholarbib",
    ];

    fn project(record: &Record) -> Result<Self> {
        Ok(Self {
            author_id: record.require("author_id")?,
            abstract_text: record.require("bib.abstract")?,
            authors: record.require("bib.author")?,
            year: record.require("bib.pub_year")?,
            title: record.require("bib.title")?,
            venue: record.require("bib.venue")?,
            num_citations: record.require("num_citations")?,
            citedby_url: record.require("citedby_url")?,
            eprint_url: record.optional("eprint_url"),
            gsrank: record.require("gsrank")?,
            pub_url: record.require("pub_url")?,
            url_add_sclib: record.require("url_add_sclib")?,
            url_scholarbib: record.require("url_scholarbib")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScholarError;
    use serde_json::json;

    fn publication() -> Record {
        Record::try_from(json!({
            "container_type": "Publication",
            "source": "PUBLICATION_SEARCH_SNIPPET",
            "bib": {
                "title": "Attention is all you need",
                "author": ["A Vaswani", "N Shazeer"],
                "pub_year": "2017",
                "venue": "Advances in neural information processing systems",
                "abstract": "The dominant sequence transduction models"
            },
            "filled": false,
            "gsrank": 1,
            "pub_url": "https://proceedings.neurips.cc/paper/7181",
            "author_id": ["oR9sCGYAAAAJ", ""],
            "url_scholarbib": "/scholar?q=info:5Gohgn6QFikJ:scholar.google.com/&output=cite&scirp=0&hl=en",
            "url_add_sclib": "/citations?hl=en&update_op=library_add&info=5Gohgn6QFikJ",
            "num_citations": 100000,
            "citedby_url": "/scholar?cites=2960712678066186980",
            "url_related_articles": "/scholar?q=related:5Gohgn6QFikJ:scholar.google.com/"
        }))
        .expect("object record")
    }

    fn keys_of(value: &Value) -> Vec<String> {
        value
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_publication_key_order_and_null_eprint() {
        let projected = PublicationProjection::project(&publication()).expect("projects");
        let value = serde_json::to_value(&projected).expect("serializes");
        let keys = keys_of(&value);
        assert_eq!(keys.len(), 13);
        for key in PublicationProjection::KEYS {
            assert!(keys.iter().any(|k| k == key), "missing {}", key);
        }
        assert_eq!(value["eprint_url"], Value::Null);
        assert_eq!(value["authors"], json!(["A Vaswani", "N Shazeer"]));
        assert_eq!(value["year"], json!("2017"));
    }

    #[test]
    fn test_publication_eprint_copied_verbatim() {
        let mut record = publication();
        record.insert("eprint_url", "https://arxiv.org/pdf/1706.03762");
        let projected = PublicationProjection::project(&record).expect("projects");
        assert_eq!(projected.eprint_url, json!("https://arxiv.org/pdf/1706.03762"));
    }

    #[test]
    fn test_publication_missing_title_fails() {
        let mut value = serde_json::to_value(publication()).expect("to value");
        if let Some(bib) = value["bib"].as_object_mut() {
            bib.remove("title");
        }
        let record = Record::try_from(value).expect("object record");
        match PublicationProjection::project(&record) {
            Err(ScholarError::MissingField(path)) => assert_eq!(path, "bib.title"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_author_drops_extra_fields() {
        let record = Record::try_from(json!({
            "container_type": "Author",
            "filled": false,
            "source": "SEARCH_AUTHOR_SNIPPETS",
            "scholar_id": "JicYPdAAAAAJ",
            "url_picture": "https://scholar.google.com/citations?view_op=medium_photo&user=JicYPdAAAAAJ",
            "name": "Geoffrey Hinton",
            "affiliation": "Emeritus Prof. Computer Science, University of Toronto",
            "email_domain": "@cs.toronto.edu",
            "interests": ["machine learning", "psychology"],
            "citedby": 638099
        }))
        .expect("object record");
        let value = serde_json::to_value(AuthorProjection::project(&record).expect("projects"))
            .expect("serializes");
        assert_eq!(keys_of(&value).len(), AuthorProjection::KEYS.len());
        assert!(value.get("filled").is_none());
        assert_eq!(value["citedby"], json!(638099));
    }
}
