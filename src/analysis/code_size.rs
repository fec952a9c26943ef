use chrono::NaiveDate;
use git2::{Commit, Repository, Sort};
use std::path::Path;

/// Outcome of a point-in-time lookup of the designated training file.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Abbreviated commit id (7 hex chars).
    pub commit: String,
    /// Filename the content came from: primary or legacy name.
    pub file: String,
    /// Raw line count of the blob, blank lines included.
    pub line_count: usize,
}

/// Resolve the designated file as of the most recent commit at or before the
/// end of `target_date` (UTC).
///
/// Prefers the most recent commit that touched `primary`; when none exists
/// by that date, falls back to the most recent commit of any kind, then
/// reads `primary` and finally `legacy` from its tree. Returns `Ok(None)`
/// when no history exists at or before the date, or when neither filename
/// is present there.
pub fn resolve_file_at_date(
    repo: &Repository,
    primary: &str,
    legacy: &str,
    target_date: NaiveDate,
) -> Result<Option<ResolvedSource>, String> {
    let cutoff = end_of_day(target_date);

    let commit_id = match find_commit_touching(repo, primary, cutoff)? {
        Some(id) => Some(id),
        None => find_latest_commit(repo, cutoff)?,
    };

    let Some(commit_id) = commit_id else {
        return Ok(None);
    };

    let commit = repo
        .find_commit(commit_id)
        .map_err(|e| format!("Git error: {e}"))?;
    let tree = commit.tree().map_err(|e| format!("Git error: {e}"))?;

    for name in [primary, legacy] {
        let Ok(entry) = tree.get_path(Path::new(name)) else {
            continue;
        };
        let blob = repo
            .find_blob(entry.id())
            .map_err(|e| format!("Git error: {e}"))?;
        let content = String::from_utf8_lossy(blob.content()).into_owned();

        return Ok(Some(ResolvedSource {
            commit: commit_id.to_string().chars().take(7).collect(),
            file: name.to_string(),
            line_count: content.lines().count(),
        }));
    }

    Ok(None)
}

/// Most recent commit at or before `cutoff` whose diff against its first
/// parent touches `path`. Commits newer than the cutoff are passed over so
/// future code never leaks into a past record.
fn find_commit_touching(
    repo: &Repository,
    path: &str,
    cutoff: i64,
) -> Result<Option<git2::Oid>, String> {
    for oid in walk_by_time(repo)? {
        let commit = match repo.find_commit(oid) {
            Ok(c) => c,
            Err(_) => continue,
        };

        if commit.time().seconds() > cutoff {
            continue;
        }

        if commit_touches_path(repo, &commit, path) {
            return Ok(Some(oid));
        }
    }

    Ok(None)
}

/// Most recent commit of any kind at or before `cutoff`.
fn find_latest_commit(repo: &Repository, cutoff: i64) -> Result<Option<git2::Oid>, String> {
    for oid in walk_by_time(repo)? {
        let commit = match repo.find_commit(oid) {
            Ok(c) => c,
            Err(_) => continue,
        };

        if commit.time().seconds() <= cutoff {
            return Ok(Some(oid));
        }
    }

    Ok(None)
}

fn walk_by_time(repo: &Repository) -> Result<impl Iterator<Item = git2::Oid> + '_, String> {
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| format!("Revwalk error: {e}"))?;
    revwalk.push_head().ok();
    revwalk.set_sorting(Sort::TIME).ok();
    Ok(revwalk.flatten())
}

fn commit_touches_path(repo: &Repository, commit: &Commit, path: &str) -> bool {
    let Ok(tree) = commit.tree() else {
        return false;
    };

    // First-parent diff; a root commit diffs against the empty tree.
    let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

    let Ok(diff) = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None) else {
        return false;
    };

    let target = Path::new(path);
    let mut touched = false;
    diff.foreach(
        &mut |delta, _| {
            if delta.new_file().path() == Some(target) || delta.old_file().path() == Some(target) {
                touched = true;
            }
            true
        },
        None,
        None,
        None,
    )
    .ok();

    touched
}

fn end_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(i64::MIN)
}
