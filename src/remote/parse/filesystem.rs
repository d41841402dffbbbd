//! Parsers for `ls -l`, `find` and `stat` output.
//!
//! Entry paths are never taken verbatim from the remote side. Listings join
//! the requested root with the parsed name; `find` output is canonicalized
//! and kept only when it stays below the requested root.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::remote::sanitize::{clean_path, join_path};
use crate::remote::types::{EntryKind, FileSystemEntry, Timestamp};

static LS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([bcdlps-][rwxsStT-]{9}[.+@]?)\s+(\d+)\s+(\S+)\s+(\S+)\s+(?:\d+,\s*)?(\d+)\s+(\w{3})\s+(\d{1,2})\s+(\d{1,2}:\d{2}|\d{4})\s+(.+)$",
    )
    .expect("ls line regex")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const SYMLINK_ARROW: &str = " -> ";

/// Parse a full `ls -l` listing of `root`.
///
/// The `total` line, `.` and `..` are skipped along with any line that does
/// not have the long-listing layout.
pub fn listing(output: &str, root: &str, now: DateTime<Utc>) -> Vec<FileSystemEntry> {
    let root = clean_path(root);
    output
        .lines()
        .filter(|line| !line.starts_with("total "))
        .filter_map(|line| ls_line(line, &root, now))
        .filter(|entry| entry.name != "." && entry.name != "..")
        .collect()
}

/// Parse one `ls -l` line into an entry below `root`.
pub fn ls_line(line: &str, root: &str, now: DateTime<Utc>) -> Option<FileSystemEntry> {
    let caps = LS_LINE.captures(line.trim_end())?;

    let permissions = caps[1].to_string();
    let kind = permissions
        .chars()
        .next()
        .map(EntryKind::from_mode_char)
        .unwrap_or_default();

    let mut name = caps[9].to_string();
    if kind == EntryKind::Symlink
        && let Some((link, _target)) = name.split_once(SYMLINK_ARROW)
    {
        name = link.to_string();
    }

    Some(FileSystemEntry {
        path: join_path(root, &name),
        hidden: FileSystemEntry::is_hidden_name(&name),
        name,
        kind,
        size: caps[5].parse().ok()?,
        permissions,
        owner: caps[3].to_string(),
        group: caps[4].to_string(),
        modified_at: Some(ls_timestamp(&caps[6], &caps[7], &caps[8], now)),
        mime_type: None,
        preview: None,
    })
}

/// Resolve the `month day time-or-year` columns of `ls -l`.
///
/// Recent files print a time instead of a year; those are placed in the
/// current year and moved back one year when that lands after `now`.
fn ls_timestamp(month: &str, day: &str, time_or_year: &str, now: DateTime<Utc>) -> Timestamp {
    let raw = || Timestamp::Raw(format!("{month} {day} {time_or_year}"));

    let Some(month_index) = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(month))
    else {
        return raw();
    };
    let month_number = month_index as u32 + 1;
    let Ok(day) = day.parse::<u32>() else {
        return raw();
    };

    let at = match time_or_year.split_once(':') {
        Some((hour, minute)) => {
            let (Ok(hour), Ok(minute)) = (hour.parse::<u32>(), minute.parse::<u32>()) else {
                return raw();
            };
            let at_year = |year: i32| {
                NaiveDate::from_ymd_opt(year, month_number, day)
                    .and_then(|date| date.and_hms_opt(hour, minute, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive))
            };
            match at_year(now.year()) {
                Some(at) if at > now => at_year(now.year() - 1),
                other => other,
            }
        }
        None => time_or_year.parse::<i32>().ok().and_then(|year| {
            NaiveDate::from_ymd_opt(year, month_number, day)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }),
    };

    at.map(Timestamp::Parsed).unwrap_or_else(raw)
}

/// Parse `stat -c '%n|%F|%s|%U|%G|%A|%Y'` output for `path`.
///
/// The entry name and path come from `path`, not from the `%n` column.
pub fn stat_entry(output: &str, path: &str) -> Option<FileSystemEntry> {
    let line = output.lines().find(|line| !line.trim().is_empty())?;

    // %n may itself contain the separator, so split from the right.
    let mut fields = line.trim_end().rsplitn(7, '|');
    let modified = fields.next()?;
    let permissions = fields.next()?;
    let group = fields.next()?;
    let owner = fields.next()?;
    let size = fields.next()?;
    let file_type = fields.next()?;
    fields.next()?;

    let path = clean_path(path);
    let name = match path.rsplit('/').next() {
        Some("") | None => path.clone(),
        Some(name) => name.to_string(),
    };

    Some(FileSystemEntry {
        hidden: FileSystemEntry::is_hidden_name(&name),
        name,
        path,
        kind: EntryKind::from_stat_type(file_type),
        size: size.trim().parse().ok()?,
        permissions: permissions.to_string(),
        owner: owner.to_string(),
        group: group.to_string(),
        modified_at: Timestamp::from_epoch(modified),
        mime_type: None,
        preview: None,
    })
}

/// Canonicalize one line of `find` output, keeping it only when it lies below `root`.
pub fn path_within(line: &str, root: &str) -> Option<String> {
    if line.trim().is_empty() || !line.starts_with('/') {
        return None;
    }
    let root = clean_path(root);
    let path = clean_path(line);
    let prefix = if root.ends_with('/') {
        root.clone()
    } else {
        format!("{root}/")
    };
    (path != root && path.starts_with(&prefix)).then_some(path)
}

/// Validated, de-duplicated paths from `find` output, in output order.
pub fn find_paths(output: &str, root: &str) -> Vec<String> {
    union_paths(
        output.lines().filter_map(|line| path_within(line, root)),
        std::iter::empty(),
    )
}

/// Union of two path sets, keeping first-seen order.
pub fn union_paths(
    first: impl IntoIterator<Item = String>,
    second: impl IntoIterator<Item = String>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<Timestamp> {
        Some(Timestamp::Parsed(
            Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap(),
        ))
    }

    mod ls {
        use super::*;

        #[test]
        fn test_directory_line() {
            let entry =
                ls_line("drwxr-xr-x 2 root root 4096 Jan 2 14:30 logs", "/var", now()).unwrap();
            assert_eq!(entry.kind, EntryKind::Directory);
            assert_eq!(entry.owner, "root");
            assert_eq!(entry.group, "root");
            assert_eq!(entry.size, 4096);
            assert_eq!(entry.name, "logs");
            assert_eq!(entry.path, "/var/logs");
            assert!(!entry.hidden);
            assert_eq!(entry.modified_at, at(2024, 1, 2, 14, 30));
        }

        #[test]
        fn test_future_time_rolls_back_a_year() {
            let entry =
                ls_line("-rw-r--r-- 1 ops ops 12 Dec 31 23:59 notes.txt", "/home/ops", now())
                    .unwrap();
            assert_eq!(entry.modified_at, at(2023, 12, 31, 23, 59));
        }

        #[test]
        fn test_year_column() {
            let entry =
                ls_line("-rw-r--r-- 1 ops ops 12 Mar  5  2021 old.tar", "/", now()).unwrap();
            assert_eq!(entry.modified_at, at(2021, 3, 5, 0, 0));
            assert_eq!(entry.path, "/old.tar");
        }

        #[test]
        fn test_symlink_target_stripped() {
            let entry = ls_line(
                "lrwxrwxrwx 1 root root 7 Feb 10 09:00 bin -> usr/bin",
                "/",
                now(),
            )
            .unwrap();
            assert_eq!(entry.kind, EntryKind::Symlink);
            assert_eq!(entry.name, "bin");
            assert_eq!(entry.path, "/bin");
        }

        #[test]
        fn test_names_with_spaces_and_hidden() {
            let entry = ls_line(
                "-rw-------+ 1 ops staff 220 Apr 1 08:15 .my notes",
                "/home/ops/",
                now(),
            )
            .unwrap();
            assert_eq!(entry.name, ".my notes");
            assert_eq!(entry.path, "/home/ops/.my notes");
            assert!(entry.hidden);
            assert_eq!(entry.kind, EntryKind::File);
            assert_eq!(entry.permissions, "-rw-------+");
        }

        #[test]
        fn test_device_file() {
            let entry =
                ls_line("crw-rw---- 1 root tty 4, 1 May 3 10:00 tty1", "/dev", now()).unwrap();
            assert_eq!(entry.size, 1);
            assert_eq!(entry.kind, EntryKind::File);
        }

        #[test]
        fn test_invalid_date_kept_raw() {
            let entry =
                ls_line("-rw-r--r-- 1 a b 1 Feb 30 10:00 odd", "/tmp", now()).unwrap();
            assert_eq!(
                entry.modified_at,
                Some(Timestamp::Raw("Feb 30 10:00".to_string()))
            );
        }

        #[test]
        fn test_listing_skips_total_and_dots() {
            let output = "\
total 12
drwxr-xr-x  3 root root 4096 Jan  2 14:30 .
drwxr-xr-x 20 root root 4096 Jan  1 09:00 ..
-rw-r--r--  1 root root  180 Jan  2 14:29 app.log
garbage line
";
            let entries = listing(output, "/var/log", now());
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].name, "app.log");
            assert_eq!(entries[0].path, "/var/log/app.log");
        }
    }

    mod stat {
        use super::*;

        #[test]
        fn test_regular_file() {
            let entry = stat_entry(
                "/etc/hosts|regular file|221|root|root|-rw-r--r--|1700000000\n",
                "/etc/hosts",
            )
            .unwrap();
            assert_eq!(entry.name, "hosts");
            assert_eq!(entry.path, "/etc/hosts");
            assert_eq!(entry.kind, EntryKind::File);
            assert_eq!(entry.size, 221);
            assert_eq!(entry.permissions, "-rw-r--r--");
            assert_eq!(entry.modified_at, Timestamp::from_epoch("1700000000"));
        }

        #[test]
        fn test_separator_in_name() {
            let entry = stat_entry(
                "/srv/a|b|directory|4096|ops|ops|drwxr-xr-x|1700000000",
                "/srv/a|b",
            )
            .unwrap();
            assert_eq!(entry.name, "a|b");
            assert_eq!(entry.kind, EntryKind::Directory);
        }

        #[test]
        fn test_symbolic_link() {
            let entry = stat_entry(
                "/usr/bin/python|symbolic link|9|root|root|lrwxrwxrwx|1700000000",
                "/usr/bin/python",
            )
            .unwrap();
            assert_eq!(entry.kind, EntryKind::Symlink);
        }

        #[test]
        fn test_root_path_name() {
            let entry =
                stat_entry("/|directory|4096|root|root|drwxr-xr-x|1700000000", "/").unwrap();
            assert_eq!(entry.name, "/");
        }

        #[test]
        fn test_malformed() {
            assert!(stat_entry("", "/x").is_none());
            assert!(stat_entry("/x|regular file|12", "/x").is_none());
            assert!(stat_entry("/x|regular file|big|a|b|-rw-r--r--|1", "/x").is_none());
        }
    }

    mod paths {
        use super::*;

        #[test]
        fn test_paths_outside_root_rejected() {
            assert_eq!(path_within("/srv/app/conf", "/srv/app"), Some("/srv/app/conf".into()));
            assert_eq!(path_within("/srv/app/../../etc/shadow", "/srv/app"), None);
            assert_eq!(path_within("/srv/application", "/srv/app"), None);
            assert_eq!(path_within("/srv/app", "/srv/app"), None);
            assert_eq!(path_within("relative/path", "/srv/app"), None);
        }

        #[test]
        fn test_root_directory() {
            assert_eq!(path_within("/etc", "/"), Some("/etc".into()));
            assert_eq!(path_within("/", "/"), None);
        }

        #[test]
        fn test_find_paths_deduplicates() {
            let output = "/data/a\n/data/b\n\n/data/./a\n/tmp/x\n";
            assert_eq!(find_paths(output, "/data"), vec!["/data/a", "/data/b"]);
        }

        #[test]
        fn test_union_keeps_first_seen_order() {
            let names = vec!["/d/b".to_string(), "/d/a".to_string()];
            let contents = vec!["/d/a".to_string(), "/d/c".to_string()];
            assert_eq!(union_paths(names, contents), vec!["/d/b", "/d/a", "/d/c"]);
        }
    }
}
