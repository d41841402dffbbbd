//! Filesystem command builders.
//!
//! Every path is canonicalized and single-quoted through the sanitizer
//! before it reaches a command string. `ls` runs under `LC_ALL=C` so month
//! names and the time column keep the layout the listing parser expects.

use crate::remote::sanitize::{escape_single_quotes, quote_path};

/// Default `find -maxdepth` for searches.
pub const DEFAULT_SEARCH_DEPTH: u32 = 10;

/// Number of lines returned as a text file preview.
pub const PREVIEW_LINES: u32 = 10;

/// `stat` format: name, type, size, owner, group, permissions, mtime (epoch).
pub const STAT_FORMAT: &str = "%n|%F|%s|%U|%G|%A|%Y";

/// Long listing of a directory, optionally including dot entries.
pub fn list_directory(path: &str, include_hidden: bool) -> String {
    let flags = if include_hidden { "-la" } else { "-l" };
    format!("LC_ALL=C ls {} {}", flags, quote_path(path))
}

/// Every file, directory and symlink below `path`, one path per line.
///
/// Hidden entries are pruned (with their subtrees) unless requested.
pub fn find_recursive(path: &str, include_hidden: bool) -> String {
    let root = quote_path(path);
    if include_hidden {
        format!("find {root} -mindepth 1 \\( -type f -o -type d -o -type l \\) -print")
    } else {
        format!(
            "find {root} -mindepth 1 -name '.*' -prune -o \
             \\( -type f -o -type d -o -type l \\) -print"
        )
    }
}

pub fn stat(path: &str) -> String {
    format!("stat -c '{}' {}", STAT_FORMAT, quote_path(path))
}

pub fn mime_type(path: &str) -> String {
    format!("file --mime-type -b {}", quote_path(path))
}

pub fn preview(path: &str) -> String {
    format!("head -n {} {}", PREVIEW_LINES, quote_path(path))
}

/// Files and directories below `path` whose name contains `pattern`.
pub fn find_by_name(path: &str, pattern: &str, max_depth: u32) -> String {
    format!(
        "find {} -maxdepth {} \\( -type f -o -type d \\) -name '*{}*'",
        quote_path(path),
        max_depth,
        escape_single_quotes(pattern)
    )
}

/// Files below `path` whose content matches `pattern`.
pub fn find_by_content(path: &str, pattern: &str, max_depth: u32) -> String {
    format!(
        "find {} -maxdepth {} -type f -exec grep -l -e '{}' {{}} + 2>/dev/null",
        quote_path(path),
        max_depth,
        escape_single_quotes(pattern)
    )
}
