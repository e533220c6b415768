//! Metalink 4 (RFC 5854) XML reader.

use quick_xml::de::from_str;
use serde::Deserialize;

use super::{Checksum, FileEntry, MetalinkError};

#[derive(Debug, Deserialize, Default)]
struct MetalinkDocument {
    #[serde(default, rename = "file")]
    files: Vec<MetalinkFile>,
}

#[derive(Debug, Deserialize)]
struct MetalinkFile {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default, rename = "hash")]
    hashes: Vec<MetalinkHash>,
    #[serde(default, rename = "url")]
    urls: Vec<MetalinkUrl>,
}

#[derive(Debug, Deserialize)]
struct MetalinkHash {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "$text")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct MetalinkUrl {
    #[serde(default, rename = "@priority")]
    priority: Option<u32>,
    #[serde(rename = "$text")]
    location: String,
}

/// Parse a metalink document into file entries, in document order.
pub(super) fn parse(xml: &str) -> Result<Vec<FileEntry>, MetalinkError> {
    let doc: MetalinkDocument = from_str(xml).map_err(|e| MetalinkError::Xml(e.to_string()))?;
    doc.files.into_iter().map(into_entry).collect()
}

fn into_entry(file: MetalinkFile) -> Result<FileEntry, MetalinkError> {
    let name = file.name.trim().to_string();
    if name.is_empty() {
        return Err(MetalinkError::MissingName);
    }
    if !is_plain_file_name(&name) {
        return Err(MetalinkError::UnsafeName(name));
    }

    // Stable sort: equal priorities keep document order, unranked go last.
    let mut urls = file.urls;
    urls.sort_by_key(|u| u.priority.unwrap_or(u32::MAX));
    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.location.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    if urls.is_empty() {
        return Err(MetalinkError::NoUrl(name));
    }

    let mut entry = FileEntry::new(name, urls);
    entry.identity = non_empty(file.identity);
    entry.version = non_empty(file.version);
    entry.size = file.size;
    entry.checksum = select_checksum(&file.hashes);
    Ok(entry)
}

/// Names become paths inside the package cache and must stay there.
fn is_plain_file_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

fn select_checksum(hashes: &[MetalinkHash]) -> Option<Checksum> {
    let find = |kind: &str| {
        hashes
            .iter()
            .find(|h| h.kind.eq_ignore_ascii_case(kind))
            .map(|h| h.value.trim().to_ascii_lowercase())
    };

    find("sha-256")
        .map(Checksum::Sha256)
        .or_else(|| find("md5").map(Checksum::Md5))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
