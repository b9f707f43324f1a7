//! `files.list` query builders
//!
//! String literals in drive queries are single-quoted; quotes and
//! backslashes inside names must be escaped.

use crate::types::FOLDER_MIME_TYPE;

/// Escape a value for use inside a single-quoted query literal
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Non-trashed folder with the given name
pub fn folder_by_name(name: &str) -> String {
    format!(
        "mimeType='{}' and name='{}' and trashed=false",
        FOLDER_MIME_TYPE,
        escape(name)
    )
}

/// Non-trashed file with the given name directly inside `parent_id`
pub fn file_in_folder(name: &str, parent_id: &str) -> String {
    format!(
        "name='{}' and '{}' in parents and trashed=false",
        escape(name),
        escape(parent_id)
    )
}
