//! Search index payloads
//!
//! Documents and index definitions for full-text search over ASNs and prefix
//! allocations. Talking to the search engine is left to the caller; this module
//! fixes the payload shape, the analyzer and the field mappings, and offers
//! [`keyword_analyze`] to normalize query terms the same way the index does.

use crate::lens::registry::{AsnDetails, PrefixWhoisDetails};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Name of the analyzer used on `name` and `description`
pub const KEYWORD_ANALYZER: &str = "string_lowercase";

/// ASN document as indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnIndexDocument {
    pub asn: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub country_code: Option<String>,
}

impl From<&AsnDetails> for AsnIndexDocument {
    fn from(details: &AsnDetails) -> Self {
        Self {
            asn: details.asn,
            name: details.name.clone(),
            description: details.description.clone(),
            country_code: details.country_code.clone(),
        }
    }
}

/// Prefix allocation document as indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixIndexDocument {
    pub ip: String,
    pub cidr: u8,
    pub name: Option<String>,
    pub description: Option<String>,
    pub country_code: Option<String>,
}

impl From<&PrefixWhoisDetails> for PrefixIndexDocument {
    fn from(details: &PrefixWhoisDetails) -> Self {
        Self {
            ip: details.ip.clone(),
            cidr: details.cidr,
            name: details.name.clone(),
            description: details.description.clone(),
            country_code: details.country_code.clone(),
        }
    }
}

/// Apply the index's keyword analyzer to `text`
///
/// The whole value is one token: ASCII-folded, lowercased, with everything
/// other than `a-z`, `0-9` and space removed.
pub fn keyword_analyze(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_char(c) {
            Some(replacement) => folded.push_str(replacement),
            None => folded.push(c),
        }
    }

    folded
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect()
}

/// ASCII equivalent of Latin-1 Supplement and Latin Extended-A letters
fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à'..='å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => "C",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'Ð' | 'Ď' | 'Đ' => "D",
        'ð' | 'ď' | 'đ' => "d",
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => "G",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'Ĥ' | 'Ħ' => "H",
        'ĥ' | 'ħ' => "h",
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => "I",
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'Ĳ' => "IJ",
        'ĳ' => "ij",
        'Ĵ' => "J",
        'ĵ' => "j",
        'Ķ' => "K",
        'ķ' | 'ĸ' => "k",
        'Ĺ' | 'Ļ' | 'Ľ' | 'Ŀ' | 'Ł' => "L",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' | 'Ŋ' => "N",
        'ñ' | 'ń' | 'ņ' | 'ň' | 'ŉ' | 'ŋ' => "n",
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => "O",
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ŕ' | 'Ŗ' | 'Ř' => "R",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => "S",
        'ś' | 'ŝ' | 'ş' | 'š' | 'ſ' => "s",
        'ß' => "ss",
        'Ţ' | 'Ť' | 'Ŧ' => "T",
        'ţ' | 'ť' | 'ŧ' => "t",
        'Þ' => "TH",
        'þ' => "th",
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'Ŵ' => "W",
        'ŵ' => "w",
        'Ý' | 'Ŷ' | 'Ÿ' => "Y",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Analyzer settings shared by the ASN and prefix indices
pub fn index_settings() -> Value {
    json!({
        "analysis": {
            "analyzer": {
                KEYWORD_ANALYZER: {
                    "tokenizer": "keyword",
                    "filter": ["asciifolding", "lowercase", "custom_replace"]
                }
            },
            "filter": {
                "custom_replace": {
                    "type": "pattern_replace",
                    "pattern": "[^a-z0-9 ]",
                    "replacement": ""
                }
            }
        }
    })
}

/// Field mappings of the ASN index
pub fn asn_mapping() -> Value {
    json!({
        "properties": {
            "name": {"type": "text", "analyzer": KEYWORD_ANALYZER},
            "description": {"type": "text", "analyzer": KEYWORD_ANALYZER},
            "asn": {
                "type": "keyword",
                "fields": {"sort": {"type": "long"}}
            }
        }
    })
}

/// Field mappings of the prefix WHOIS indices
pub fn prefix_mapping() -> Value {
    json!({
        "properties": {
            "ip": {"type": "keyword", "index": true},
            "name": {"type": "text", "analyzer": KEYWORD_ANALYZER, "fielddata": true},
            "description": {"type": "text", "analyzer": KEYWORD_ANALYZER, "fielddata": true}
        }
    })
}
