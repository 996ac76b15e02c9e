//! Render orchestration: run the external renderer on a scene script and find its video.

pub mod classify;
pub mod locate;
pub mod lock;
pub mod open;
pub mod process;

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    config::MatvizConfig,
    env_check::{self, Tool, ToolStatus},
    error::{MatvizError, MatvizResult},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Playback {
    Opened,
    Skipped,
    /// The video exists but could not be handed to a player.
    Failed(String),
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderOutcome {
    pub video: PathBuf,
    pub playback: Playback,
    pub warnings: Vec<String>,
}

pub struct Renderer {
    cfg: MatvizConfig,
}

impl Renderer {
    pub fn new(cfg: MatvizConfig) -> Self {
        Self { cfg }
    }

    /// `<renderer> [renderer_args] <quality> [--disable_caching] --media_dir <dir> <script> <scene>`
    pub fn command(&self, script_path: &Path) -> Command {
        let mut cmd = Command::new(&self.cfg.renderer);
        cmd.args(&self.cfg.renderer_args).arg(self.cfg.quality.flag());
        if self.cfg.disable_caching {
            cmd.arg("--disable_caching");
        }
        cmd.arg("--media_dir")
            .arg(&self.cfg.media_dir)
            .arg(script_path)
            .arg(&self.cfg.scene_name);
        cmd
    }

    #[tracing::instrument(skip(self), fields(renderer = %self.cfg.renderer))]
    pub fn render(&self, script_path: &Path) -> MatvizResult<RenderOutcome> {
        let mut warnings = Vec::new();

        let removed = locate::remove_videos(&self.cfg.media_dir, &self.cfg.scene_name)?;
        if removed > 0 {
            tracing::debug!(
                removed,
                dir = %self.cfg.media_dir.display(),
                "removed previous videos"
            );
        }

        if self.cfg.probe_latex
            && let ToolStatus::Missing { reason } = env_check::probe(&Tool::latex())
        {
            let msg = format!(
                "LaTeX toolchain not available ({reason}); equations may fail to render. Try: {}",
                Tool::latex().install_hint()
            );
            tracing::warn!("{msg}");
            warnings.push(msg);
        }

        tracing::info!(script = %script_path.display(), "starting render");
        let out = process::run_with_timeout(self.command(script_path), self.cfg.timeout())?;
        if !out.success() {
            let c = classify::classify(&out.stderr, &out.stdout);
            tracing::error!(status = %out.status, kind = %c.kind, "renderer failed");
            return Err(MatvizError::render(c.kind, c.message));
        }

        let video = locate::find_video(&self.cfg.media_dir, &self.cfg.scene_name)?;
        tracing::info!(video = %video.display(), "render finished");

        let playback = if !self.cfg.open_video {
            Playback::Skipped
        } else {
            match open::open_video(&video, self.cfg.opener.as_deref()) {
                Ok(()) => Playback::Opened,
                Err(e) => {
                    tracing::warn!(video = %video.display(), "{e}");
                    Playback::Failed(e.to_string())
                }
            }
        };

        Ok(RenderOutcome {
            video,
            playback,
            warnings,
        })
    }
}
