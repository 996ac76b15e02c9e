//! matviz composes two small matrices and renders the combined linear transformation as a
//! manim animation.
//!
//! - Parse user text into a [`Matrix`] and compose with [`multiply`] (`second · first`)
//! - Plan a scene ([`ScenePlan`]) and write its script
//! - Run the renderer ([`Renderer`]) and locate the resulting video
#![forbid(unsafe_code)]

pub mod config;
pub mod env_check;
pub mod error;
pub mod format;
pub mod matrix;
pub mod render;
pub mod request;
pub mod scene;

pub use config::{MatvizConfig, Quality};
pub use env_check::{EnvReport, Tool, ToolStatus};
pub use error::{MatvizError, MatvizResult};
pub use format::NumberFormat;
pub use matrix::{Matrix, multiply, parse_vector};
pub use render::{Playback, RenderOutcome, Renderer, classify::FailureKind};
pub use request::VisualizeRequest;
pub use scene::{Dimension, SceneMode, ScenePlan, SceneStyle, SCENE_NAME};
