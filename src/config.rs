use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::{error::MatvizResult, format::NumberFormat, scene::SCENE_NAME};

/// manim render quality presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
    Production,
}

impl Quality {
    pub fn flag(self) -> &'static str {
        match self {
            Quality::Low => "-ql",
            Quality::Medium => "-qm",
            Quality::High => "-qh",
            Quality::Production => "-qp",
        }
    }
}

/// Everything a request needs besides the matrices themselves.
///
/// Loaded from an optional JSON file; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatvizConfig {
    /// Renderer executable.
    pub renderer: String,
    /// Arguments placed before the renderer's own flags, e.g. `["-m", "manim"]` for `python`.
    pub renderer_args: Vec<String>,
    pub quality: Quality,
    pub disable_caching: bool,
    pub timeout_secs: u64,
    pub media_dir: PathBuf,
    pub script_path: PathBuf,
    pub scene_name: String,
    pub number_format: NumberFormat,
    pub probe_latex: bool,
    pub open_video: bool,
    /// Player for the finished video; the desktop default when unset.
    pub opener: Option<String>,
    pub lock_path: PathBuf,
}

impl Default for MatvizConfig {
    fn default() -> Self {
        Self {
            renderer: "manim".to_string(),
            renderer_args: Vec::new(),
            quality: Quality::Low,
            disable_caching: true,
            timeout_secs: 60,
            media_dir: PathBuf::from("media"),
            script_path: PathBuf::from("matrix_visualization.py"),
            scene_name: SCENE_NAME.to_string(),
            number_format: NumberFormat::Trimmed,
            probe_latex: true,
            open_video: true,
            opener: None,
            lock_path: PathBuf::from(".matviz.lock"),
        }
    }
}

impl MatvizConfig {
    pub fn load(path: &Path) -> MatvizResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> MatvizResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
