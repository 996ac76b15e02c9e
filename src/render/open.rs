use std::path::Path;

use crate::error::{MatvizError, MatvizResult};

/// Hand `path` to `app`, or to the desktop's default application when `app` is `None`.
pub fn open_video(path: &Path, app: Option<&str>) -> MatvizResult<()> {
    let result = match app {
        Some(app) => open::with(path, app),
        None => open::that(path),
    };
    result.map_err(|e| {
        MatvizError::playback(format!(
            "could not open '{}' with {}: {e}",
            path.display(),
            app.unwrap_or("the default application")
        ))
    })
}
