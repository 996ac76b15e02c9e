//! Startup check that the external tools a render needs are reachable.

use std::{process::Command, time::Duration};

use crate::{
    config::MatvizConfig,
    error::{MatvizError, MatvizResult},
    render::process::run_with_timeout,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRole {
    Renderer,
    Encoder,
    Latex,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Tool {
    pub program: String,
    pub role: ToolRole,
    /// Arguments of the version probe.
    pub args: Vec<String>,
    /// Absent optional tools only produce a warning.
    pub required: bool,
    /// Text the first stdout line must contain for the probe to count.
    pub banner: Option<String>,
}

impl Tool {
    pub fn renderer(program: impl Into<String>, prefix_args: &[String]) -> Self {
        let mut args = prefix_args.to_vec();
        args.push("--version".to_string());
        Self {
            program: program.into(),
            role: ToolRole::Renderer,
            args,
            required: true,
            banner: None,
        }
    }

    pub fn ffmpeg() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            role: ToolRole::Encoder,
            args: vec!["-version".to_string()],
            required: true,
            banner: Some("ffmpeg version".to_string()),
        }
    }

    pub fn latex() -> Self {
        Self {
            program: "latex".to_string(),
            role: ToolRole::Latex,
            args: vec!["--version".to_string()],
            required: false,
            banner: None,
        }
    }

    pub fn install_hint(&self) -> &'static str {
        install_hint(self.role, std::env::consts::OS)
    }
}

/// The tools a render with `cfg` depends on.
pub fn required_tools(cfg: &MatvizConfig) -> Vec<Tool> {
    vec![
        Tool::renderer(&cfg.renderer, &cfg.renderer_args),
        Tool::ffmpeg(),
        Tool::latex(),
    ]
}

pub fn install_hint(role: ToolRole, os: &str) -> &'static str {
    match (role, os) {
        (ToolRole::Renderer, _) => "pip install manim",
        (ToolRole::Encoder, "windows") => "winget install Gyan.FFmpeg (Admin PowerShell)",
        (ToolRole::Encoder, "macos") => "brew install ffmpeg",
        (ToolRole::Encoder, _) => "sudo apt install ffmpeg",
        (ToolRole::Latex, "windows") => "install MiKTeX from https://miktex.org",
        (ToolRole::Latex, "macos") => "brew install --cask mactex-no-gui",
        (ToolRole::Latex, _) => "sudo apt install texlive texlive-latex-extra",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    Found { version: String },
    Missing { reason: String },
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ToolReport {
    pub tool: Tool,
    pub status: ToolStatus,
}

impl ToolReport {
    pub fn is_found(&self) -> bool {
        matches!(self.status, ToolStatus::Found { .. })
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EnvReport {
    pub tools: Vec<ToolReport>,
}

impl EnvReport {
    pub fn missing_required(&self) -> impl Iterator<Item = &ToolReport> {
        self.tools
            .iter()
            .filter(|r| r.tool.required && !r.is_found())
    }

    pub fn missing_optional(&self) -> impl Iterator<Item = &ToolReport> {
        self.tools
            .iter()
            .filter(|r| !r.tool.required && !r.is_found())
    }

    pub fn is_ok(&self) -> bool {
        self.missing_required().next().is_none()
    }

    /// Startup gate: [`MatvizError::ToolMissing`] naming every absent required tool.
    pub fn into_result(self) -> MatvizResult<Self> {
        let missing: Vec<String> = self
            .missing_required()
            .map(|r| r.tool.program.clone())
            .collect();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(MatvizError::ToolMissing(missing))
        }
    }
}

/// Run `tool`'s version probe. Never fails; any problem becomes [`ToolStatus::Missing`].
pub fn probe(tool: &Tool) -> ToolStatus {
    let mut cmd = Command::new(&tool.program);
    cmd.args(&tool.args);

    let out = match run_with_timeout(cmd, PROBE_TIMEOUT) {
        Ok(out) => out,
        Err(MatvizError::ToolMissing(_)) => {
            return ToolStatus::Missing {
                reason: "not found on PATH".to_string(),
            };
        }
        Err(e) => {
            return ToolStatus::Missing {
                reason: e.to_string(),
            };
        }
    };

    if !out.success() {
        return ToolStatus::Missing {
            reason: format!(
                "'{} {}' exited with {}",
                tool.program,
                tool.args.join(" "),
                out.status
            ),
        };
    }

    let first_line = out.stdout.lines().next().unwrap_or("").trim().to_string();
    if let Some(banner) = &tool.banner
        && !first_line.contains(banner.as_str())
    {
        return ToolStatus::Missing {
            reason: format!("unexpected version output: '{first_line}'"),
        };
    }

    ToolStatus::Found {
        version: first_line,
    }
}

#[tracing::instrument(skip_all)]
pub fn verify(tools: &[Tool]) -> EnvReport {
    let tools = tools
        .iter()
        .map(|tool| {
            let status = probe(tool);
            match &status {
                ToolStatus::Found { version } => {
                    tracing::debug!(program = %tool.program, %version, "tool found");
                }
                ToolStatus::Missing { reason } if tool.required => {
                    tracing::warn!(program = %tool.program, %reason, "required tool missing");
                }
                ToolStatus::Missing { reason } => {
                    tracing::info!(program = %tool.program, %reason, "optional tool missing");
                }
            }
            ToolReport {
                tool: tool.clone(),
                status,
            }
        })
        .collect();
    EnvReport { tools }
}
