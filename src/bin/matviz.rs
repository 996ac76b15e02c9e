use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use matviz::{
    MatvizConfig, NumberFormat, Playback, Quality, VisualizeRequest, env_check, format, request,
};

#[derive(Parser, Debug)]
#[command(name = "matviz", version)]
struct Cli {
    /// JSON config file; fields it leaves out keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the renderer, ffmpeg, and LaTeX are installed.
    Check,
    /// Print the product `second x first`.
    Multiply(MatrixArgs),
    /// Write the scene script without rendering it.
    Script(ScriptArgs),
    /// Write the scene script, render it, and open the video.
    Visualize(VisualizeArgs),
}

#[derive(Args, Debug)]
struct MatrixArgs {
    /// Matrix applied first. Rows on separate lines or separated by ';', or @FILE.
    #[arg(long, allow_hyphen_values = true)]
    first: String,

    /// Matrix applied second, same format as --first.
    #[arg(long, allow_hyphen_values = true)]
    second: String,

    /// Rows of each matrix.
    #[arg(long, default_value_t = 2)]
    rows: usize,

    /// Columns of each matrix.
    #[arg(long, default_value_t = 2)]
    cols: usize,

    /// Number format for printed values.
    #[arg(long, value_enum)]
    number_format: Option<FormatChoice>,
}

#[derive(Args, Debug)]
struct ScriptArgs {
    #[command(flatten)]
    matrices: MatrixArgs,

    /// Point to follow through both transformations, e.g. "1 2", or @FILE.
    #[arg(long, allow_hyphen_values = true)]
    point: Option<String>,

    /// Script path (overrides the config's script_path).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VisualizeArgs {
    #[command(flatten)]
    script: ScriptArgs,

    /// Render quality.
    #[arg(long, value_enum)]
    quality: Option<QualityChoice>,

    /// Seconds before the render is abandoned.
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not open the finished video.
    #[arg(long)]
    no_open: bool,

    /// Skip the startup tool check.
    #[arg(long)]
    skip_check: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Fixed,
    Trimmed,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityChoice {
    Low,
    Medium,
    High,
    Production,
}

impl From<FormatChoice> for NumberFormat {
    fn from(c: FormatChoice) -> Self {
        match c {
            FormatChoice::Fixed => NumberFormat::Fixed,
            FormatChoice::Trimmed => NumberFormat::Trimmed,
        }
    }
}

impl From<QualityChoice> for Quality {
    fn from(c: QualityChoice) -> Self {
        match c {
            QualityChoice::Low => Quality::Low,
            QualityChoice::Medium => Quality::Medium,
            QualityChoice::High => Quality::High,
            QualityChoice::Production => Quality::Production,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = MatvizConfig::load_or_default(cli.config.as_deref())?;
    match cli.cmd {
        Command::Check => cmd_check(&cfg),
        Command::Multiply(args) => cmd_multiply(args, cfg),
        Command::Script(args) => cmd_script(args, cfg),
        Command::Visualize(args) => cmd_visualize(args, cfg),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `@path` reads the text from a file; otherwise `;` separates rows.
fn read_input(arg: &str) -> anyhow::Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("read input file '{path}'"))
        }
        None => Ok(arg.replace(';', "\n")),
    }
}

fn build_request(m: &MatrixArgs, point: Option<&str>) -> anyhow::Result<VisualizeRequest> {
    Ok(VisualizeRequest {
        first: read_input(&m.first)?,
        second: read_input(&m.second)?,
        rows: m.rows,
        cols: m.cols,
        point: point.map(read_input).transpose()?,
    })
}

fn apply_script_overrides(args: &ScriptArgs, cfg: &mut MatvizConfig) {
    if let Some(f) = args.matrices.number_format {
        cfg.number_format = f.into();
    }
    if let Some(out) = &args.out {
        cfg.script_path = out.clone();
    }
}

fn cmd_check(cfg: &MatvizConfig) -> anyhow::Result<()> {
    let report = env_check::verify(&env_check::required_tools(cfg));
    for r in &report.tools {
        match &r.status {
            env_check::ToolStatus::Found { version } => {
                println!("ok       {:<8} {version}", r.tool.program);
            }
            env_check::ToolStatus::Missing { reason } => {
                let label = if r.tool.required { "missing" } else { "optional" };
                println!("{label:<8} {:<8} {reason}", r.tool.program);
                println!("         install: {}", r.tool.install_hint());
            }
        }
    }
    report.into_result()?;
    Ok(())
}

fn cmd_multiply(args: MatrixArgs, mut cfg: MatvizConfig) -> anyhow::Result<()> {
    if let Some(f) = args.number_format {
        cfg.number_format = f.into();
    }
    let req = build_request(&args, None)?;
    let product = req.product()?;
    println!("{}", format::matrix_grid(&product, cfg.number_format));
    println!("{}", format::matrix_tex(&product, cfg.number_format));
    Ok(())
}

fn cmd_script(args: ScriptArgs, mut cfg: MatvizConfig) -> anyhow::Result<()> {
    apply_script_overrides(&args, &mut cfg);
    let req = build_request(&args.matrices, args.point.as_deref())?;
    let plan = request::generate(&req, &cfg)?;
    println!("{}", format::matrix_grid(&plan.product, cfg.number_format));
    eprintln!("wrote {}", cfg.script_path.display());
    Ok(())
}

fn cmd_visualize(args: VisualizeArgs, mut cfg: MatvizConfig) -> anyhow::Result<()> {
    apply_script_overrides(&args.script, &mut cfg);
    if let Some(q) = args.quality {
        cfg.quality = q.into();
    }
    if let Some(t) = args.timeout {
        cfg.timeout_secs = t;
    }
    if args.no_open {
        cfg.open_video = false;
    }

    if !args.skip_check {
        env_check::verify(&env_check::required_tools(&cfg)).into_result()?;
    }

    let req = build_request(&args.script.matrices, args.script.point.as_deref())?;
    let (plan, outcome) = request::visualize(&req, &cfg)?;

    println!("{}", format::matrix_grid(&plan.product, cfg.number_format));
    for w in &outcome.warnings {
        eprintln!("warning: {w}");
    }
    match outcome.playback {
        Playback::Opened | Playback::Skipped => {
            eprintln!("wrote {}", outcome.video.display());
        }
        Playback::Failed(reason) => {
            eprintln!(
                "wrote {} (could not open it automatically: {reason})",
                outcome.video.display()
            );
        }
    }
    Ok(())
}
