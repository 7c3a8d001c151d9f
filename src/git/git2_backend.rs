//! libgit2-backed [`Engine`] implementation.

use super::{Author, CloneOptions, Engine, PullResult, PushReport, StatusEntry, METADATA_DIR};
use crate::error::{Error, Result};
use crate::transport::ResolvedTransport;
use git2::{
    build::CheckoutBuilder, AutotagOption, BranchType, Commit, ErrorCode, FetchOptions, Oid,
    PushOptions, Remote, Repository, RepositoryInitOptions, Signature, StatusOptions,
};
use tempfile::TempDir;
use std::cell::RefCell;
use std::path::Path;

/// Name given to the remote recorded by a clone
const ORIGIN: &str = "origin";

/// Engine backed by libgit2
///
/// Stateless: every call opens the repository at the given directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Engine;

impl Git2Engine {
    pub fn new() -> Self {
        Self
    }
}

/// Build fetch options carrying the token credentials.
///
/// `depth` is ignored by transports that cannot fetch shallow history.
fn fetch_opts<'a>(transport: &ResolvedTransport, depth: Option<u32>) -> FetchOptions<'a> {
    let mut callbacks = transport.remote_callbacks();
    callbacks.transfer_progress(|progress| {
        tracing::trace!(
            received = progress.received_objects(),
            total = progress.total_objects(),
            "fetch progress"
        );
        true
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(callbacks);
    fo.download_tags(AutotagOption::None);
    if let Some(depth) = depth.filter(|_| supports_shallow(&transport.effective_url)) {
        fo.depth(depth as i32);
    }
    fo
}

/// libgit2's local transport cannot negotiate shallow history.
fn supports_shallow(url: &str) -> bool {
    !(url.starts_with("file://") || Path::new(url).is_absolute() || url.starts_with('.'))
}

/// Open the repository in `dir`, creating it with HEAD on `branch` if absent.
///
/// The flag is true when the repository was created by this call.
fn open_or_init(dir: &Path, branch: &str) -> Result<(Repository, bool)> {
    match Repository::open(dir) {
        Ok(repo) => Ok((repo, false)),
        Err(_) => {
            let mut opts = RepositoryInitOptions::new();
            opts.initial_head(branch);
            Ok((Repository::init_opts(dir, &opts)?, true))
        }
    }
}

/// Remove repository metadata so the directory reads as "no repository" again.
fn discard_metadata(dir: &Path) {
    let metadata = dir.join(METADATA_DIR);
    match std::fs::remove_dir_all(&metadata) {
        Ok(()) => {
            tracing::info!(path = %metadata.display(), "removed metadata of failed clone")
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %metadata.display(), "could not remove metadata")
        }
    }
}

/// The commit HEAD points at, or `None` on an unborn branch.
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetch `branch` into its `origin` tracking ref.
///
/// Returns the fetched tip, or `None` when the remote has no such branch,
/// which includes a remote with no refs at all. The advertised ref list is
/// never read through `Remote::list`: libgit2 reports an empty
/// advertisement as a null array, which git2 cannot turn into a slice.
fn fetch_branch(
    repo: &Repository,
    remote: &mut Remote<'_>,
    transport: &ResolvedTransport,
    branch: &str,
    depth: Option<u32>,
) -> Result<Option<Oid>> {
    let refspec = format!(
        "+refs/heads/{b}:refs/remotes/{origin}/{b}",
        b = branch,
        origin = ORIGIN
    );
    let mut fo = fetch_opts(transport, depth);
    remote.fetch(&[refspec.as_str()], Some(&mut fo), None)?;
    fetched_tip(repo, branch)
}

/// Find the commit fetched for `branch`, via the tracking ref or FETCH_HEAD.
fn fetched_tip(repo: &Repository, branch: &str) -> Result<Option<Oid>> {
    let tracking = format!("refs/remotes/{}/{}", ORIGIN, branch);
    if let Ok(oid) = repo.refname_to_id(&tracking) {
        return Ok(Some(oid));
    }

    let wanted = format!("refs/heads/{}", branch);
    let mut found = None;
    let walk = repo.fetchhead_foreach(|name, _url, oid, _is_merge| {
        if name == wanted {
            found = Some(*oid);
            false
        } else {
            true
        }
    });

    match walk {
        Ok(()) => Ok(found),
        // Stopping the walk early is reported as a user error
        Err(e) if e.code() == ErrorCode::User => Ok(found),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Check out `commit` without touching uncommitted work, then point the
/// local branch and HEAD at it.
fn adopt_commit(repo: &Repository, branch: &str, oid: Oid, reflog: &str) -> Result<()> {
    let commit = repo.find_commit(oid)?;
    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;

    let refname = format!("refs/heads/{}", branch);
    repo.reference(&refname, oid, true, reflog)?;
    repo.set_head(&refname)?;
    Ok(())
}

/// Point `origin` at the remote, fetch the branch and check it out.
///
/// A remote without the branch leaves HEAD unborn on it.
fn clone_from_origin(
    repo: &Repository,
    transport: &ResolvedTransport,
    opts: &CloneOptions,
) -> Result<()> {
    if repo.find_remote(ORIGIN).is_ok() {
        repo.remote_set_url(ORIGIN, &transport.effective_url)?;
    } else {
        repo.remote(ORIGIN, &transport.effective_url)?;
    }
    let mut remote = repo.find_remote(ORIGIN)?;

    let tip = match fetch_branch(repo, &mut remote, transport, &opts.branch, opts.depth)? {
        Some(tip) => tip,
        None => {
            tracing::info!(branch = %opts.branch, "remote has no such branch, leaving it unborn");
            repo.set_head(&format!("refs/heads/{}", opts.branch))?;
            return Ok(());
        }
    };
    adopt_commit(repo, &opts.branch, tip, "clone: from remote")?;

    match repo.find_branch(&opts.branch, BranchType::Local) {
        Ok(mut local) => {
            if let Err(e) = local.set_upstream(Some(&format!("{}/{}", ORIGIN, opts.branch))) {
                tracing::warn!(error = %e, "could not set upstream branch");
            }
        }
        Err(e) => tracing::warn!(error = %e, "cloned branch not found"),
    }

    Ok(())
}

impl Engine for Git2Engine {
    fn init(&self, dir: &Path, branch: &str) -> Result<()> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(branch);
        Repository::init_opts(dir, &opts)?;
        tracing::debug!(dir = %dir.display(), branch, "repository initialized");
        Ok(())
    }

    fn clone_into(
        &self,
        dir: &Path,
        transport: &ResolvedTransport,
        opts: &CloneOptions,
    ) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|source| Error::FileWriteError {
            path: dir.to_path_buf(),
            source,
        })?;

        let (repo, created) = open_or_init(dir, &opts.branch)?;
        let result = clone_from_origin(&repo, transport, opts);

        // A half-finished clone must not leave the vault looking like a repository
        if result.is_err() && created {
            drop(repo);
            discard_metadata(dir);
        }

        result
    }

    fn status_matrix(&self, dir: &Path) -> Result<Vec<StatusEntry>> {
        let repo = Repository::open(dir)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_unmodified(true)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts))?;
        let entries = statuses
            .iter()
            .filter_map(|entry| {
                entry
                    .path()
                    .map(|path| StatusEntry::from_git2(path, entry.status()))
            })
            .collect();

        Ok(entries)
    }

    fn add(&self, dir: &Path, path: &str) -> Result<()> {
        let repo = Repository::open(dir)?;
        let mut index = repo.index()?;
        index.add_path(Path::new(path))?;
        index.write()?;
        Ok(())
    }

    fn remove(&self, dir: &Path, path: &str) -> Result<()> {
        let repo = Repository::open(dir)?;
        let mut index = repo.index()?;
        index.remove_path(Path::new(path))?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str, author: &Author) -> Result<String> {
        let repo = Repository::open(dir)?;
        let sig = Signature::now(&author.name, &author.email)?;

        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = head_commit(&repo)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(oid.to_string())
    }

    fn push(&self, dir: &Path, transport: &ResolvedTransport, branch: &str) -> Result<PushReport> {
        let repo = Repository::open(dir)?;
        let mut remote = repo.remote_anonymous(&transport.effective_url)?;

        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut callbacks = transport.remote_callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected.borrow_mut().push(format!("{}: {}", refname, status));
            }
            Ok(())
        });

        let mut po = PushOptions::new();
        po.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{b}:refs/heads/{b}", b = branch);
        remote.push(&[refspec.as_str()], Some(&mut po))?;
        drop(po);

        let errors = rejected.take();
        if !errors.is_empty() {
            return Ok(PushReport::rejected(errors));
        }

        // Keep the tracking ref in step so `git status` agrees after a push
        if let Some(head) = head_commit(&repo)? {
            let tracking = format!("refs/remotes/{}/{}", ORIGIN, branch);
            let updated = repo.reference(&tracking, head.id(), true, "push: update tracking ref");
            if let Err(e) = updated {
                tracing::warn!(error = %e, "could not update tracking ref");
            }
        }

        Ok(PushReport::accepted())
    }

    fn pull(
        &self,
        dir: &Path,
        transport: &ResolvedTransport,
        branch: &str,
        author: &Author,
    ) -> Result<PullResult> {
        let repo = Repository::open(dir)?;
        let mut remote = repo.remote_anonymous(&transport.effective_url)?;

        let tip = fetch_branch(&repo, &mut remote, transport, branch, None)?.ok_or_else(|| {
            Error::RemoteBranchNotFound {
                branch: branch.to_string(),
            }
        })?;
        let fetched = repo.find_annotated_commit(tip)?;
        let (analysis, _) = repo.merge_analysis(&[&fetched])?;

        if analysis.is_up_to_date() {
            return Ok(PullResult::UpToDate);
        }

        if analysis.is_unborn() {
            adopt_commit(&repo, branch, tip, "pull: initial")?;
            return Ok(PullResult::Adopted);
        }

        if analysis.is_fast_forward() {
            let target = repo.find_commit(tip)?;
            repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))?;
            repo.head()?.set_target(tip, "pull: fast-forward")?;
            return Ok(PullResult::FastForward);
        }

        let local = repo.head()?.peel_to_commit()?;
        let theirs = repo.find_commit(tip)?;
        let mut merged = repo.merge_commits(&local, &theirs, None)?;

        if merged.has_conflicts() {
            let mut paths = Vec::new();
            for conflict in merged.conflicts()? {
                let conflict = conflict?;
                if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                    paths.push(String::from_utf8_lossy(&entry.path).into_owned());
                }
            }
            return Err(Error::MergeConflict { paths });
        }

        let tree_id = merged.write_tree_to(&repo)?;
        let tree = repo.find_tree(tree_id)?;
        repo.checkout_tree(tree.as_object(), Some(CheckoutBuilder::new().safe()))?;

        let sig = Signature::now(&author.name, &author.email)?;
        let message = format!("Merge branch '{}' of {}", branch, transport.effective_url);
        repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &[&local, &theirs])?;

        Ok(PullResult::Merged)
    }

    /// Fetches the branch tip into a throwaway bare repository, shallow
    /// where the transport allows it.
    fn remote_has_branch(&self, transport: &ResolvedTransport, branch: &str) -> Result<bool> {
        let scratch = TempDir::new()?;
        let repo = Repository::init_bare(scratch.path())?;
        let mut remote = repo.remote_anonymous(&transport.effective_url)?;

        let found = fetch_branch(&repo, &mut remote, transport, branch, Some(1))?.is_some();
        tracing::debug!(branch, found, "remote branch lookup");
        Ok(found)
    }
}
