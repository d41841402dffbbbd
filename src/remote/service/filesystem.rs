//! Filesystem browsing and search.

use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::debug;

use super::{SessionRunner, run_stdout};
use crate::remote::command::filesystem::{self as command, DEFAULT_SEARCH_DEPTH};
use crate::remote::error::{CoreError, ExecutionError};
use crate::remote::parse::filesystem as parse;
use crate::remote::sanitize::clean_path;
use crate::remote::session::RemoteSession;
use crate::remote::types::{EntryKind, FileSystemEntry, FileSystemListing};

/// Maximum `stat` channels in flight per request.
const STAT_CONCURRENCY: usize = 8;

const TEXT_MIME_PREFIX: &str = "text/";

const NO_SUCH_FILE: &str = "No such file or directory";

#[derive(Clone)]
pub struct FileSystemService {
    runner: SessionRunner,
}

impl FileSystemService {
    pub fn new(runner: SessionRunner) -> Self {
        Self { runner }
    }

    /// List a directory, or every entry below it when `recursive` is set.
    pub async fn list(
        &self,
        session_id: &str,
        path: &str,
        recursive: bool,
        include_hidden: bool,
    ) -> Result<FileSystemListing, CoreError> {
        let root = absolute_path(path)?;
        let session = self.runner.session(session_id)?;

        let entries = if recursive {
            let output = run_stdout(&session, &command::find_recursive(&root, include_hidden)).await?;
            stat_all(&session, parse::find_paths(&output, &root)).await?
        } else {
            let output = run_stdout(&session, &command::list_directory(&root, include_hidden)).await?;
            parse::listing(&output, &root, Utc::now())
        };

        Ok(FileSystemListing {
            path: root,
            entries,
            recursive,
        })
    }

    /// Stat one path; regular files also get a MIME type and, for text, a preview.
    pub async fn details(&self, session_id: &str, path: &str) -> Result<FileSystemEntry, CoreError> {
        let path = absolute_path(path)?;
        let session = self.runner.session(session_id)?;

        let mut entry = stat_one(&session, &path).await.map_err(|e| {
            let missing = matches!(
                &e,
                CoreError::Execution {
                    source: ExecutionError::NonZeroExit { stderr, .. },
                    ..
                } if stderr.contains(NO_SUCH_FILE)
            );
            if missing { CoreError::not_found(path.clone()) } else { e }
        })?;

        if entry.kind != EntryKind::File {
            return Ok(entry);
        }

        match run_stdout(&session, &command::mime_type(&path)).await {
            Ok(mime) if !mime.trim().is_empty() => entry.mime_type = Some(mime.trim().to_string()),
            Ok(_) => {}
            Err(e) => debug!("No MIME type for {}: {}", path, e),
        }

        if entry
            .mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with(TEXT_MIME_PREFIX))
        {
            match run_stdout(&session, &command::preview(&path)).await {
                Ok(preview) => entry.preview = Some(preview),
                Err(e) => debug!("No preview for {}: {}", path, e),
            }
        }

        Ok(entry)
    }

    /// Entries below `path` whose name contains `pattern` or whose content matches it.
    ///
    /// A non-positive or missing `max_depth` uses [`DEFAULT_SEARCH_DEPTH`].
    pub async fn search(
        &self,
        session_id: &str,
        path: &str,
        pattern: &str,
        max_depth: Option<i64>,
    ) -> Result<Vec<FileSystemEntry>, CoreError> {
        if pattern.is_empty() {
            return Err(CoreError::validation("search pattern is required"));
        }
        let root = absolute_path(path)?;
        let depth = max_depth
            .filter(|depth| *depth > 0)
            .and_then(|depth| u32::try_from(depth).ok())
            .unwrap_or(DEFAULT_SEARCH_DEPTH);
        let session = self.runner.session(session_id)?;

        let by_name = command::find_by_name(&root, pattern, depth);
        let by_content = command::find_by_content(&root, pattern, depth);
        let (names, contents) = futures::join!(
            run_stdout(&session, &by_name),
            run_stdout(&session, &by_content),
        );

        let names = names?;
        // grep exits non-zero when nothing matches
        let contents = match contents {
            Ok(output) => output,
            Err(CoreError::Execution {
                source: ExecutionError::NonZeroExit { .. },
                ..
            }) => String::new(),
            Err(e) => return Err(e),
        };

        let paths = parse::union_paths(
            parse::find_paths(&names, &root),
            parse::find_paths(&contents, &root),
        );
        debug!(session_id, "Search for {:?} below {} matched {} paths", pattern, root, paths.len());

        stat_all(&session, paths).await
    }
}

/// Canonicalize a caller path, defaulting to `/`.
fn absolute_path(path: &str) -> Result<String, CoreError> {
    let path = path.trim();
    if path.is_empty() {
        return Ok("/".to_string());
    }
    if !path.starts_with('/') {
        return Err(CoreError::validation(format!("path must be absolute: {path}")));
    }
    Ok(clean_path(path))
}

async fn stat_one(session: &RemoteSession, path: &str) -> Result<FileSystemEntry, CoreError> {
    let output = run_stdout(session, &command::stat(path)).await?;
    parse::stat_entry(&output, path).ok_or_else(|| CoreError::parse("stat output", output.trim()))
}

/// Stat every path, keeping output order.
///
/// Paths that vanish or cannot be read are dropped; a transport failure
/// aborts the whole batch.
async fn stat_all(
    session: &RemoteSession,
    paths: Vec<String>,
) -> Result<Vec<FileSystemEntry>, CoreError> {
    let entries: Vec<Option<FileSystemEntry>> = stream::iter(paths)
        .map(|path| async move {
            match stat_one(session, &path).await {
                Ok(entry) => Ok(Some(entry)),
                Err(e) if e.is_transport() => Err(e),
                Err(e) => {
                    debug!("Dropping {}: {}", path, e);
                    Ok(None)
                }
            }
        })
        .buffered(STAT_CONCURRENCY)
        .try_collect()
        .await?;

    Ok(entries.into_iter().flatten().collect())
}
