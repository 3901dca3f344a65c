// record.rs - Search Result Records
// Input records handed over by the search collaborator, and the per-slot
// result of fetching their thumbnails.

use serde::{Deserialize, Serialize};

use super::error::FetchError;

/// One search result as produced by the illustration search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRecord {
    #[serde(alias = "pid")]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub thumb_url: String,
}

impl ThumbnailRecord {
    pub fn new(id: u64, title: &str, author: &str, thumb_url: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            author: author.to_string(),
            thumb_url: thumb_url.trim().to_string(),
        }
    }
}

/// A record together with the outcome of fetching its thumbnail
#[derive(Debug)]
pub struct FetchedThumbnail {
    pub record: ThumbnailRecord,
    pub content: Result<Vec<u8>, FetchError>,
}

impl FetchedThumbnail {
    pub fn is_loaded(&self) -> bool {
        self.content.is_ok()
    }
}

/// A thumbnail whose bytes are available, ready for the compositor
#[derive(Debug, Clone)]
pub struct LoadedThumbnail {
    pub record: ThumbnailRecord,
    pub bytes: Vec<u8>,
}

/// Parse a JSON array of records (as attached to a ^preview command)
pub fn parse_records(json: &str) -> Result<Vec<ThumbnailRecord>, serde_json::Error> {
    let json = json.strip_prefix('\u{feff}').unwrap_or(json);
    let mut records: Vec<ThumbnailRecord> = serde_json::from_str(json)?;
    for record in &mut records {
        record.thumb_url = record.thumb_url.trim().to_string();
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_accepts_pid_alias() {
        let json = r#"[
            {"pid": 1001, "title": "Sunset", "author": "alice", "thumb_url": " https://i.example/1.jpg "},
            {"id": 1002, "title": "Rain", "author": "bob", "thumb_url": "file:///tmp/2.jpg"}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1001);
        assert_eq!(records[0].thumb_url, "https://i.example/1.jpg");
        assert_eq!(records[1], ThumbnailRecord::new(1002, "Rain", "bob", "file:///tmp/2.jpg"));
    }

    #[test]
    fn test_parse_records_missing_text_fields_default_to_empty() {
        let records = parse_records(r#"[{"id": 7, "thumb_url": "a.png"}]"#).unwrap();
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].author, "");
    }

    #[test]
    fn test_parse_records_rejects_missing_url() {
        assert!(parse_records(r#"[{"id": 7, "title": "x"}]"#).is_err());
    }
}
