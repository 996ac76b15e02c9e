//! One user submission, captured by value, and the pipeline that serves it.

use std::time::Duration;

use crate::{
    config::MatvizConfig,
    error::MatvizResult,
    matrix::{Matrix, multiply, parse_vector},
    render::{RenderOutcome, Renderer, lock::RenderLock},
    scene::{ScenePlan, SceneStyle, write_script},
};

/// Extra time beyond the render timeout before a leftover lock counts as abandoned.
const LOCK_GRACE: Duration = Duration::from_secs(30);

/// Raw user input for one submission.
///
/// Both matrices share the declared `rows x cols` shape; `point`, when present, must have one
/// coordinate per column of the first matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualizeRequest {
    pub first: String,
    pub second: String,
    pub rows: usize,
    pub cols: usize,
    pub point: Option<String>,
}

impl VisualizeRequest {
    pub fn parse_matrices(&self) -> MatvizResult<(Matrix, Matrix)> {
        let first = Matrix::parse(&self.first, self.rows, self.cols)?;
        let second = Matrix::parse(&self.second, self.rows, self.cols)?;
        Ok((first, second))
    }

    /// `second · first` without building a scene.
    pub fn product(&self) -> MatvizResult<Matrix> {
        let (first, second) = self.parse_matrices()?;
        multiply(&first, &second)
    }

    pub fn plan(&self) -> MatvizResult<ScenePlan> {
        let (first, second) = self.parse_matrices()?;
        let point = match &self.point {
            Some(text) => Some(parse_vector(text)?),
            None => None,
        };
        ScenePlan::new(first, second, point)
    }
}

pub fn scene_style(cfg: &MatvizConfig) -> SceneStyle {
    SceneStyle {
        scene_name: cfg.scene_name.clone(),
        number_format: cfg.number_format,
    }
}

/// Plan the scene and write its script to `cfg.script_path`.
pub fn generate(req: &VisualizeRequest, cfg: &MatvizConfig) -> MatvizResult<ScenePlan> {
    let plan = req.plan()?;
    write_script(&plan, &cfg.script_path, &scene_style(cfg))?;
    Ok(plan)
}

/// Plan, write, and render one request.
///
/// Only one visualization runs at a time per lock file; a concurrent request fails with
/// [`crate::MatvizError::Busy`] instead of racing on the script and media paths.
#[tracing::instrument(skip_all, fields(rows = req.rows, cols = req.cols))]
pub fn visualize(
    req: &VisualizeRequest,
    cfg: &MatvizConfig,
) -> MatvizResult<(ScenePlan, RenderOutcome)> {
    let plan = req.plan()?;
    let _lock = RenderLock::acquire(&cfg.lock_path, cfg.timeout() + LOCK_GRACE)?;
    write_script(&plan, &cfg.script_path, &scene_style(cfg))?;
    let outcome = Renderer::new(cfg.clone()).render(&cfg.script_path)?;
    Ok((plan, outcome))
}
