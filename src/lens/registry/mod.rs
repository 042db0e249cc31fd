//! Registry record normalizer
//!
//! Pure functions turning stored registry columns (raw WHOIS dumps, JSON-encoded
//! description and address lines, linked email rows) into clean fields. None of
//! them fail: undecodable or missing input degrades to empty or `None` output.
//!
//! Every function is idempotent on its own output, so records that went through
//! normalization once (e.g. snapshots written back as [`StoredLines::Lines`])
//! come out unchanged.

pub mod types;

pub use types::{AsnDetails, PrefixWhoisDetails};

use crate::database::registry::{AsnRecord, EmailRecord, PrefixWhoisRecord, StoredLines};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Decode a JSON-bearing column into its lines
///
/// Returns `None` for JSON `null` and for text that is not JSON at all.
fn decode_lines(stored: &StoredLines) -> Option<Vec<String>> {
    let text = match stored {
        StoredLines::Lines(lines) => return Some(lines.clone()),
        StoredLines::Encoded(text) => text,
    };

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Undecodable registry column {:?}: {}", text, e);
            return None;
        }
    };

    let items = match value {
        Value::Null => return None,
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        scalar => vec![scalar],
    };

    Some(
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    )
}

/// All description lines of a record, in stored order
pub fn description_lines(stored: Option<&StoredLines>) -> Vec<String> {
    stored.and_then(decode_lines).unwrap_or_default()
}

/// Single-line description: the first line carrying at least one ASCII letter
/// or digit, otherwise `name`
pub fn canonical_description(lines: &[String], name: Option<&str>) -> Option<String> {
    lines
        .iter()
        .find(|line| line.chars().any(|c| c.is_ascii_alphanumeric()))
        .cloned()
        .or_else(|| name.map(str::to_string))
}

/// Flat list of address pieces
///
/// Each stored fragment is split on commas (runs of commas count as one), and
/// every piece is trimmed. Empty pieces are dropped for ASN and prefix WHOIS
/// records alike. Returns `None` when nothing is left.
pub fn owner_address_lines(stored: Option<&StoredLines>) -> Option<Vec<String>> {
    let fragments = stored.and_then(decode_lines)?;

    let pieces: Vec<String> = fragments
        .iter()
        .flat_map(|fragment| {
            collapse_commas(fragment)
                .split(',')
                .map(|piece| piece.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|piece| !piece.is_empty())
        .collect();

    if pieces.is_empty() {
        None
    } else {
        Some(pieces)
    }
}

fn collapse_commas(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut previous_comma = false;
    for c in fragment.chars() {
        let is_comma = c == ',';
        if !(is_comma && previous_comma) {
            out.push(c);
        }
        previous_comma = is_comma;
    }
    out
}

/// Raw WHOIS text without its leading `source:` header line(s)
///
/// Only `source:` lines are dropped. A first line that is not a `source:` header is
/// kept, so `"first\nsecond"` comes back unchanged.
pub fn display_raw_whois(raw: Option<&str>) -> Option<String> {
    let mut rest = raw?;
    loop {
        match rest.split_once('\n') {
            Some((first, tail)) if is_source_header(first) => rest = tail,
            None if is_source_header(rest) => return Some(String::new()),
            _ => return Some(rest.to_string()),
        }
    }
}

fn is_source_header(line: &str) -> bool {
    line.trim_start().to_ascii_lowercase().starts_with("source:")
}

/// Every linked email address, in store order
pub fn email_contacts(emails: &[EmailRecord]) -> Vec<String> {
    emails.iter().map(|e| e.email_address.clone()).collect()
}

/// Linked email addresses flagged as abuse contacts
pub fn abuse_contacts(emails: &[EmailRecord]) -> Vec<String> {
    emails
        .iter()
        .filter(|e| e.abuse_email)
        .map(|e| e.email_address.clone())
        .collect()
}

pub(crate) fn rir_name(rir_id: Option<u32>, rir_names: &HashMap<u32, String>) -> Option<String> {
    let id = rir_id.filter(|id| *id != 0)?;
    let name = rir_names.get(&id).cloned();
    if name.is_none() {
        warn!("Registry record references unknown RIR id {}", id);
    }
    name
}

/// Normalized view of an ASN record
///
/// The ASN's own `description` column is kept as stored; only prefix WHOIS
/// records derive theirs from the description lines.
pub fn normalize_asn(
    record: &AsnRecord,
    emails: &[EmailRecord],
    rir_names: &HashMap<u32, String>,
) -> AsnDetails {
    AsnDetails {
        asn: record.asn,
        name: record.name.clone(),
        description: record.description.clone(),
        description_full: description_lines(record.description_full.as_ref()),
        country_code: record.country_code.clone(),
        rir_name: rir_name(record.rir_id, rir_names),
        owner_address: owner_address_lines(record.owner_address.as_ref()),
        email_contacts: email_contacts(emails),
        abuse_contacts: abuse_contacts(emails),
        raw_whois: display_raw_whois(record.raw_whois.as_deref()),
    }
}

/// Normalized view of a prefix WHOIS record
pub fn normalize_prefix_whois(
    record: &PrefixWhoisRecord,
    emails: &[EmailRecord],
    rir_names: &HashMap<u32, String>,
) -> PrefixWhoisDetails {
    let description_full = description_lines(record.description_full.as_ref());
    PrefixWhoisDetails {
        prefix: format!("{}/{}", record.ip, record.cidr),
        ip: record.ip.clone(),
        cidr: record.cidr,
        name: record.name.clone(),
        description: canonical_description(&description_full, record.name.as_deref()),
        description_full,
        country_code: record.country_code.clone(),
        rir_name: rir_name(record.rir_id, rir_names),
        parent_ip: record.parent_ip.clone(),
        parent_cidr: record.parent_cidr,
        status: record.status.clone(),
        owner_address: owner_address_lines(record.owner_address.as_ref()),
        email_contacts: email_contacts(emails),
        abuse_contacts: abuse_contacts(emails),
        raw_whois: display_raw_whois(record.raw_whois.as_deref()),
    }
}
