use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{MatvizError, MatvizResult};

pub const VIDEO_SUFFIX: &str = ".mp4";

/// Find the video the renderer wrote for `scene` somewhere below `dir`.
///
/// Candidates are files whose name starts with `scene` and ends with [`VIDEO_SUFFIX`]; when
/// several exist the lexicographically smallest path wins.
pub fn find_video(dir: &Path, scene: &str) -> MatvizResult<PathBuf> {
    let mut found = Vec::new();
    if dir.is_dir() {
        collect(dir, scene, &mut found)?;
    }
    found.sort();
    found.into_iter().next().ok_or_else(|| {
        MatvizError::not_found(format!(
            "no '{scene}*{VIDEO_SUFFIX}' video under '{}'",
            dir.display()
        ))
    })
}

/// Delete every video [`find_video`] could pick up for `scene`, leaving other files in place.
///
/// Returns how many files were removed.
pub fn remove_videos(dir: &Path, scene: &str) -> MatvizResult<usize> {
    let mut found = Vec::new();
    if dir.is_dir() {
        collect(dir, scene, &mut found)?;
    }
    for path in &found {
        std::fs::remove_file(path)
            .with_context(|| format!("remove previous video '{}'", path.display()))?;
    }
    Ok(found.len())
}

fn collect(dir: &Path, scene: &str, out: &mut Vec<PathBuf>) -> MatvizResult<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read directory '{}'", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat '{}'", path.display()))?;
        if file_type.is_dir() {
            collect(&path, scene, out)?;
        } else if file_type.is_file() && is_match(&path, scene) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_match(path: &Path, scene: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(scene) && n.ends_with(VIDEO_SUFFIX))
}
