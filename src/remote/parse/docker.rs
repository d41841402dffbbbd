//! Parsers for docker's tabular and line-oriented output.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::remote::command::docker::FIELD_SEPARATOR;
use crate::remote::error::is_in_use_line;
use crate::remote::types::{ContainerSummary, ImageDeleteResponse, ImageSummary};

/// Header of the default `docker ps` table layout.
const PS_TABLE_HEADER: &str = "CONTAINER ID";

/// Column gap in docker's default table layout.
static COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Parse `docker ps -a` output.
///
/// Expects the pipe-delimited `--format` rows, but also accepts the default
/// table layout when the output starts with its header.
pub fn containers(output: &str) -> Vec<ContainerSummary> {
    let mut lines = output.lines().filter(|line| !line.trim().is_empty()).peekable();

    match lines.peek() {
        Some(first) if first.trim_start().starts_with(PS_TABLE_HEADER) => {
            lines.skip(1).filter_map(container_table_row).collect()
        }
        _ => lines.filter_map(container_row).collect(),
    }
}

/// One `--format` row: `id|image|command|created|status|ports|names`.
///
/// The command column may itself contain separators, so two fields are
/// taken from the left, four from the right and the rest is the command.
fn container_row(line: &str) -> Option<ContainerSummary> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < 7 {
        return None;
    }

    let tail = fields.len() - 4;
    let command = fields[2..tail].join("|");

    let container_id = fields[0].trim();
    if container_id.is_empty() {
        return None;
    }

    Some(ContainerSummary {
        container_id: container_id.to_string(),
        image: fields[1].trim().to_string(),
        command: unquote(command.trim()).to_string(),
        created: fields[tail].trim().to_string(),
        status: fields[tail + 1].trim().to_string(),
        ports: fields[tail + 2].trim().to_string(),
        names: fields[tail + 3].trim().to_string(),
    })
}

/// One row of the default table layout.
///
/// The quoted command column is located first; the remaining columns are
/// separated by runs of two or more spaces.
fn container_table_row(line: &str) -> Option<ContainerSummary> {
    let (head, command, rest) = match split_quoted(line) {
        Some((head, command, rest)) => (head, command.to_string(), rest),
        None => {
            let columns: Vec<&str> = COLUMN_GAP.split(line.trim()).collect();
            if columns.len() < 6 {
                return None;
            }
            let id_image = format!("{}  {}", columns[0], columns[1]);
            let rest = columns[3..].join("  ");
            return table_columns(&id_image, unquote(columns[2]).to_string(), &rest);
        }
    };

    table_columns(head, command, rest)
}

fn table_columns(head: &str, command: String, rest: &str) -> Option<ContainerSummary> {
    let mut head_fields = head.split_whitespace();
    let container_id = head_fields.next()?;
    let image = head_fields.next()?;

    let columns: Vec<&str> = COLUMN_GAP
        .split(rest.trim())
        .filter(|column| !column.is_empty())
        .collect();

    let (created, status, ports, names) = match columns.as_slice() {
        [created, status, ports, names, ..] => (*created, *status, *ports, *names),
        [created, status, names] => (*created, *status, "", *names),
        _ => return None,
    };

    Some(ContainerSummary {
        container_id: container_id.to_string(),
        image: image.to_string(),
        command,
        created: created.to_string(),
        status: status.to_string(),
        ports: ports.to_string(),
        names: names.to_string(),
    })
}

/// Split a line around its first double-quoted section.
fn split_quoted(line: &str) -> Option<(&str, &str, &str)> {
    let start = line.find('"')?;
    let end = start + 1 + line[start + 1..].find('"')?;
    Some((&line[..start], &line[start + 1..end], &line[end + 1..]))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse `docker images` rows: `repository|tag|id|created|size|digest`.
///
/// Rows missing the trailing digest column get an empty digest.
pub fn images(output: &str) -> Vec<ImageSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
            if fields.len() < 5 {
                return None;
            }
            Some(ImageSummary {
                repository: fields[0].to_string(),
                tag: fields[1].to_string(),
                image_id: fields[2].to_string(),
                created: fields[3].to_string(),
                size: fields[4].to_string(),
                digest: fields.get(5).copied().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Parse `docker rmi` output.
///
/// `Untagged:` and `Deleted:` lines are collected; lines reporting an image
/// in use or a conflict become errors. Anything else is ignored.
pub fn image_delete(output: &str) -> ImageDeleteResponse {
    let mut response = ImageDeleteResponse::default();

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(reference) = line.strip_prefix("Untagged:") {
            response.untagged.push(reference.trim().to_string());
        } else if let Some(reference) = line.strip_prefix("Deleted:") {
            response.deleted.push(reference.trim().to_string());
        } else if is_in_use_line(line) {
            response.errors.push(line.to_string());
        }
    }

    response
}

/// Container ID printed by a detached `docker run`: the last non-empty stdout line.
pub fn run_container_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .filter(|line| line.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_string)
}

/// Warning lines docker printed on stderr while starting a container.
pub fn run_warnings(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.to_ascii_uppercase().starts_with("WARNING"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod container_rows {
        use super::*;

        #[test]
        fn test_format_row() {
            let output = "4f2e8a7c1b2d|nginx:latest|\"/docker-entrypoint.…\"|3 days ago|Up 3 days|0.0.0.0:80->80/tcp|web\n";
            let containers = containers(output);
            assert_eq!(containers.len(), 1);
            let c = &containers[0];
            assert_eq!(c.container_id, "4f2e8a7c1b2d");
            assert_eq!(c.image, "nginx:latest");
            assert_eq!(c.command, "/docker-entrypoint.…");
            assert_eq!(c.created, "3 days ago");
            assert_eq!(c.status, "Up 3 days");
            assert_eq!(c.ports, "0.0.0.0:80->80/tcp");
            assert_eq!(c.names, "web");
        }

        #[test]
        fn test_separator_inside_command() {
            let output = "abc|alpine|\"sh -c 'ls | wc'\"|1 hour ago|Exited (0) 1 hour ago||job\n";
            let c = &containers(output)[0];
            assert_eq!(c.command, "sh -c 'ls | wc'");
            assert_eq!(c.status, "Exited (0) 1 hour ago");
            assert_eq!(c.ports, "");
            assert_eq!(c.names, "job");
        }

        #[test]
        fn test_short_rows_skipped() {
            let output = "abc|alpine|oops\n\nxyz|redis|\"redis\"|2 days ago|Up|6379/tcp|cache\n";
            let parsed = containers(output);
            assert_eq!(parsed.len(), 1);
            assert_eq!(parsed[0].names, "cache");
        }

        #[test]
        fn test_empty_output() {
            assert!(containers("").is_empty());
            assert!(containers("\n\n").is_empty());
        }
    }

    mod container_table {
        use super::*;

        const TABLE: &str = "\
CONTAINER ID   IMAGE          COMMAND                  CREATED        STATUS                    PORTS                NAMES
4f2e8a7c1b2d   nginx:latest   \"/docker-entrypoint.…\"   4 days ago     Up 4 days                 0.0.0.0:80->80/tcp   web
9a8b7c6d5e4f   alpine         \"sh\"                     2 weeks ago    Exited (0) 2 weeks ago                         scratch
";

        #[test]
        fn test_header_skipped() {
            assert_eq!(containers(TABLE).len(), 2);
        }

        #[test]
        fn test_row_with_ports() {
            let c = &containers(TABLE)[0];
            assert_eq!(c.container_id, "4f2e8a7c1b2d");
            assert_eq!(c.image, "nginx:latest");
            assert_eq!(c.command, "/docker-entrypoint.…");
            assert_eq!(c.created, "4 days ago");
            assert_eq!(c.status, "Up 4 days");
            assert_eq!(c.ports, "0.0.0.0:80->80/tcp");
            assert_eq!(c.names, "web");
        }

        #[test]
        fn test_row_without_ports() {
            let c = &containers(TABLE)[1];
            assert_eq!(c.command, "sh");
            assert_eq!(c.created, "2 weeks ago");
            assert_eq!(c.status, "Exited (0) 2 weeks ago");
            assert_eq!(c.ports, "");
            assert_eq!(c.names, "scratch");
        }
    }

    mod image_rows {
        use super::*;

        #[test]
        fn test_empty_digest() {
            let images = images("nginx|latest|abc123|2 days ago|133MB|\n");
            assert_eq!(
                images,
                vec![ImageSummary {
                    repository: "nginx".to_string(),
                    tag: "latest".to_string(),
                    image_id: "abc123".to_string(),
                    created: "2 days ago".to_string(),
                    size: "133MB".to_string(),
                    digest: String::new(),
                }]
            );
        }

        #[test]
        fn test_with_digest() {
            let images = images("redis|7|d1e2f3|3 weeks ago|117MB|sha256:9f8e\n");
            assert_eq!(images[0].digest, "sha256:9f8e");
        }

        #[test]
        fn test_missing_digest_column() {
            let images = images("redis|7|d1e2f3|3 weeks ago|117MB");
            assert_eq!(images.len(), 1);
            assert_eq!(images[0].digest, "");
        }

        #[test]
        fn test_malformed_rows_skipped() {
            assert!(images("REPOSITORY TAG IMAGE ID\nnot|enough\n").is_empty());
        }
    }

    mod image_delete {
        use super::*;

        #[test]
        fn test_untagged_and_deleted() {
            let output = "Untagged: nginx:latest\n\
                          Untagged: nginx@sha256:aa11\n\
                          Deleted: sha256:bb22\n\
                          Deleted: sha256:cc33\n";
            let response = image_delete(output);
            assert_eq!(response.untagged, vec!["nginx:latest", "nginx@sha256:aa11"]);
            assert_eq!(response.deleted, vec!["sha256:bb22", "sha256:cc33"]);
            assert!(response.errors.is_empty());
        }

        #[test]
        fn test_conflict_becomes_error() {
            let output = "Error response from daemon: conflict: unable to delete 605c77e624dd \
                          (cannot be forced) - image is being used by running container 4f2e8a7c1b2d\n";
            let response = image_delete(output);
            assert_eq!(response.errors.len(), 1);
            assert!(response.deleted.is_empty());
        }
    }

    mod run_output {
        use super::*;

        #[test]
        fn test_container_id_is_last_line() {
            let stdout = "Unable to find image 'nginx:latest' locally\n\
                          4f2e8a7c1b2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f\n";
            assert_eq!(
                run_container_id(stdout).as_deref(),
                Some("4f2e8a7c1b2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f")
            );
        }

        #[test]
        fn test_non_hex_last_line_is_not_an_id() {
            assert_eq!(run_container_id("hello world\n"), None);
            assert_eq!(run_container_id(""), None);
        }

        #[test]
        fn test_warnings_from_stderr() {
            let stderr = "WARNING: The requested image's platform (linux/arm64) does not match\n\
                          latest: Pulling from library/nginx\n\
                          Warning: memory limit ignored\n";
            assert_eq!(run_warnings(stderr).len(), 2);
        }
    }
}
