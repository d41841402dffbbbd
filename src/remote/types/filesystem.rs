use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    #[default]
    Unknown,
}

impl EntryKind {
    /// Classify from the first character of an `ls -l` permission string.
    pub fn from_mode_char(c: char) -> Self {
        match c {
            'd' => EntryKind::Directory,
            'l' => EntryKind::Symlink,
            _ => EntryKind::File,
        }
    }

    /// Classify from the `%F` field printed by `stat`.
    pub fn from_stat_type(raw: &str) -> Self {
        let raw = raw.to_lowercase();
        if raw.contains("directory") {
            EntryKind::Directory
        } else if raw.contains("link") {
            EntryKind::Symlink
        } else if raw.contains("regular") {
            EntryKind::File
        } else {
            EntryKind::Unknown
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileSystemEntry {
    pub name: String,
    /// Requested root joined with `name`, or the validated path that was stat'ed
    pub path: String,
    pub kind: EntryKind,
    #[schemars(schema_with = "crate::api::schema::uint")]
    pub size: u64,
    pub permissions: String,
    pub owner: String,
    pub group: String,
    pub modified_at: Option<Timestamp>,
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl FileSystemEntry {
    pub fn is_hidden_name(name: &str) -> bool {
        name.starts_with('.')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileSystemListing {
    pub path: String,
    pub entries: Vec<FileSystemEntry>,
    pub recursive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mode_char() {
        assert_eq!(EntryKind::from_mode_char('d'), EntryKind::Directory);
        assert_eq!(EntryKind::from_mode_char('l'), EntryKind::Symlink);
        assert_eq!(EntryKind::from_mode_char('-'), EntryKind::File);
        assert_eq!(EntryKind::from_mode_char('c'), EntryKind::File);
    }

    #[test]
    fn test_kind_from_stat_type() {
        assert_eq!(EntryKind::from_stat_type("directory"), EntryKind::Directory);
        assert_eq!(EntryKind::from_stat_type("regular file"), EntryKind::File);
        assert_eq!(EntryKind::from_stat_type("regular empty file"), EntryKind::File);
        assert_eq!(EntryKind::from_stat_type("symbolic link"), EntryKind::Symlink);
        assert_eq!(EntryKind::from_stat_type("socket"), EntryKind::Unknown);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(EntryKind::Directory).unwrap(),
            serde_json::json!("directory")
        );
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(FileSystemEntry::default()).unwrap();
        assert!(json.get("mime_type").is_none());
        assert!(json.get("preview").is_none());
        assert_eq!(json["kind"], "unknown");
    }
}
