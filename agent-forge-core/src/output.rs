//! Reading input documents and writing generated projects to disk

use crate::error::{PipelineError, Result};
use crate::state::{FileMap, PipelineInput};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Read and parse an input document
pub async fn read_input(path: &Path) -> Result<PipelineInput> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::InputRead { path: path.to_path_buf(), source })?;
    parse_input(&content)
}

pub fn parse_input(content: &str) -> Result<PipelineInput> {
    Ok(serde_json::from_str(content)?)
}

/// Scripts that get the executable bit
pub fn is_script(path: &str) -> bool {
    path.ends_with(".sh") || path.contains("setup.sh") || path.contains("run.sh")
}

/// Relative, parent-free paths only
fn checked_relative(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    let safe = !path.is_empty()
        && relative.components().all(|component| matches!(component, Component::Normal(_)));
    if safe { Ok(relative) } else { Err(PipelineError::UnsafePath(path.to_string())) }
}

/// Write every file under `<out_dir>/<pipeline_id>/` and return that directory
pub async fn write_project(out_dir: &Path, pipeline_id: &str, files: &FileMap) -> Result<PathBuf> {
    let root = out_dir.join(checked_relative(pipeline_id)?);

    for (path, content) in files {
        let target = root.join(checked_relative(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| PipelineError::Write { path: parent.to_path_buf(), source })?;
        }
        fs::write(&target, content)
            .await
            .map_err(|source| PipelineError::Write { path: target.clone(), source })?;
        debug!(file = %target.display(), bytes = content.len(), "wrote file");

        if is_script(path) {
            make_executable(&target).await;
        }
    }

    info!(dir = %root.display(), files = files.len(), "project written");
    Ok(root)
}

/// Directory names never read back from a written project
const SKIPPED_DIRS: [&str; 4] = [".venv", "__pycache__", ".git", ".pytest_cache"];

/// Read a written project back into a file map with `/`-separated relative keys.
/// Non-UTF-8 files are skipped.
pub fn read_project(dir: &Path) -> Result<FileMap> {
    let read_err =
        |path: &Path, source| PipelineError::InputRead { path: path.to_path_buf(), source };

    let mut files = FileMap::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries: Vec<_> = std::fs::read_dir(&current)
            .map_err(|e| read_err(&current, e))?
            .collect::<std::io::Result<_>>()
            .map_err(|e| read_err(&current, e))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                if !SKIPPED_DIRS.contains(&name.as_str()) {
                    pending.push(path);
                }
                continue;
            }

            let Ok(relative) = path.strip_prefix(dir) else { continue };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    files.insert(key, content);
                }
                Err(e) => debug!(file = %path.display(), "skipping unreadable file: {e}"),
            }
        }
    }

    files.sort_keys();
    Ok(files)
}

#[cfg(unix)]
async fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let result: std::io::Result<()> = async {
        let mut permissions = fs::metadata(path).await?.permissions();
        permissions.set_mode(permissions.mode() | 0o111);
        fs::set_permissions(path, permissions).await
    }
    .await;

    if let Err(e) = result {
        warn!(file = %path.display(), "could not mark script executable: {e}");
    }
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> FileMap {
        let mut files = FileMap::new();
        files.insert("agent.py".into(), "root_agent = None\n".into());
        files.insert("tools/__init__.py".into(), "".into());
        files.insert("setup.sh".into(), "#!/bin/bash\n".into());
        files
    }

    #[tokio::test]
    async fn test_write_project_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_project(dir.path(), "p-1", &files()).await.unwrap();

        assert_eq!(root, dir.path().join("p-1"));
        assert_eq!(std::fs::read_to_string(root.join("agent.py")).unwrap(), "root_agent = None\n");
        assert!(root.join("tools/__init__.py").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = write_project(dir.path(), "p-1", &files()).await.unwrap();

        let script = std::fs::metadata(root.join("setup.sh")).unwrap().permissions().mode();
        assert_eq!(script & 0o111, 0o111);
        let module = std::fs::metadata(root.join("agent.py")).unwrap().permissions().mode();
        assert_eq!(module & 0o111, 0);
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileMap::new();
        files.insert("../outside.py".into(), "x = 1".into());

        let err = write_project(dir.path(), "p-1", &files).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsafePath(_)));
        let absolute = write_project(dir.path(), "/abs", &FileMap::new()).await;
        assert!(matches!(absolute, Err(PipelineError::UnsafePath(_))));
    }

    #[tokio::test]
    async fn test_read_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(read_input(&missing).await, Err(PipelineError::InputNotFound(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(read_input(&bad).await, Err(PipelineError::MalformedInput(_))));
    }

    #[tokio::test]
    async fn test_read_project_round_trips_written_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_project(dir.path(), "p-1", &files()).await.unwrap();
        std::fs::create_dir_all(root.join(".venv/lib")).unwrap();
        std::fs::write(root.join(".venv/lib/site.py"), "x = 1").unwrap();

        let read = read_project(&root).unwrap();
        let keys: Vec<&str> = read.keys().map(String::as_str).collect();
        assert_eq!(keys, ["agent.py", "setup.sh", "tools/__init__.py"]);
    }

    #[test]
    fn test_is_script() {
        assert!(is_script("setup.sh"));
        assert!(is_script("bin/deploy.sh"));
        assert!(!is_script("setup.py"));
    }
}
