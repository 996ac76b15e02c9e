//! End-to-end runs of the visualize pipeline against stand-in renderers written as shell scripts.
#![cfg(unix)]

use std::path::PathBuf;

use matviz::{
    FailureKind, MatvizConfig, MatvizError, Playback, SCENE_NAME, VisualizeRequest,
    request::visualize,
};

/// Writes its video where a real renderer would, from the `--media_dir` and scene arguments.
const SUCCEEDS: &str = r#"
media=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--media_dir" ]; then media="$a"; fi
  prev="$a"
  scene="$a"
done
mkdir -p "$media/videos/scene/480p15/partial_movie_files"
: > "$media/videos/scene/480p15/partial_movie_files/00000.mp4"
: > "$media/videos/scene/480p15/$scene.mp4"
echo "File ready"
"#;

const LATEX_FAILS: &str = r#"
echo "Manim Community v0.18.0"
echo "Rendering frames..." >&2
echo "Traceback (most recent call last):" >&2
echo "ValueError: latex error converting to dvi. See log output above." >&2
echo "! LaTeX Error: File standalone.cls not found." >&2
exit 1
"#;

const HANGS: &str = "sleep 30\n";

struct Fixture {
    dir: PathBuf,
    cfg: MatvizConfig,
}

fn fixture(name: &str, renderer_body: &str) -> Fixture {
    let dir = PathBuf::from("target").join("render_pipeline").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let fake = dir.join("fake_manim.sh");
    std::fs::write(&fake, renderer_body).unwrap();

    let cfg = MatvizConfig {
        renderer: "sh".to_string(),
        renderer_args: vec![fake.to_string_lossy().into_owned()],
        timeout_secs: 10,
        media_dir: dir.join("media"),
        script_path: dir.join("matrix_visualization.py"),
        probe_latex: false,
        open_video: false,
        lock_path: dir.join("render.lock"),
        ..MatvizConfig::default()
    };
    Fixture { dir, cfg }
}

fn request() -> VisualizeRequest {
    VisualizeRequest {
        first: "1 1\n0 1".to_string(),
        second: "0 -1\n1 0".to_string(),
        rows: 2,
        cols: 2,
        point: Some("2 1".to_string()),
    }
}

#[test]
fn successful_render_returns_the_scene_video() {
    let fx = fixture("success", SUCCEEDS);
    // Leftovers from an earlier run must not be picked up.
    let stale = fx.cfg.media_dir.join("a").join(format!("{SCENE_NAME}.mp4"));
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, b"old").unwrap();
    let keep = fx.cfg.media_dir.join("notes.txt");
    std::fs::write(&keep, b"keep me").unwrap();

    let (plan, outcome) = visualize(&request(), &fx.cfg).unwrap();

    assert_eq!(
        outcome.video,
        fx.cfg
            .media_dir
            .join("videos/scene/480p15")
            .join(format!("{SCENE_NAME}.mp4"))
    );
    assert_eq!(outcome.playback, Playback::Skipped);
    assert!(!stale.exists());
    assert!(keep.exists());

    assert_eq!(plan.product.to_rows(), vec![vec![0.0, -1.0], vec![1.0, 1.0]]);
    let point = plan.point.unwrap();
    assert_eq!(point.midpoint, vec![3.0, 1.0]);
    assert_eq!(point.transformed, vec![-1.0, 3.0]);

    let script = std::fs::read_to_string(&fx.cfg.script_path).unwrap();
    assert!(script.contains("transformed = np.array([-1.0, 3.0])"));
    assert!(!fx.cfg.lock_path.exists());
}

#[test]
fn latex_failure_is_classified_not_dumped() {
    let fx = fixture("latex", LATEX_FAILS);

    let err = visualize(&request(), &fx.cfg).unwrap_err();
    let (kind, message) = match err {
        MatvizError::Render { kind, message } => (kind, message),
        other => panic!("expected a render error, got {other}"),
    };
    assert_eq!(kind, FailureKind::Latex);
    assert!(message.contains("LaTeX Error: File standalone.cls not found."), "{message}");
    assert!(!message.contains("Rendering frames"));
    assert!(!message.contains("Manim Community"));
    assert!(!fx.cfg.lock_path.exists());
}

#[test]
fn renderer_that_exits_cleanly_without_video_is_not_found() {
    let fx = fixture("no_video", "echo done\n");

    let err = visualize(&request(), &fx.cfg).unwrap_err();
    assert!(matches!(err, MatvizError::NotFound(_)), "{err}");
}

#[test]
fn hung_renderer_times_out() {
    let mut fx = fixture("timeout", HANGS);
    fx.cfg.timeout_secs = 1;

    let err = visualize(&request(), &fx.cfg).unwrap_err();
    assert!(matches!(err, MatvizError::Timeout(_)), "{err}");
    assert!(!fx.cfg.lock_path.exists());
}

#[test]
fn concurrent_request_is_refused() {
    let fx = fixture("busy", SUCCEEDS);
    std::fs::write(&fx.cfg.lock_path, "12345\n").unwrap();

    let err = visualize(&request(), &fx.cfg).unwrap_err();
    assert!(matches!(err, MatvizError::Busy(_)), "{err}");
    assert!(!fx.cfg.script_path.exists());
    assert!(fx.dir.join("render.lock").exists());
}

#[test]
fn failed_playback_still_reports_the_video() {
    let mut fx = fixture("playback_failed", SUCCEEDS);
    fx.cfg.open_video = true;
    fx.cfg.opener = Some("matviz-no-such-player".to_string());

    let (_, outcome) = visualize(&request(), &fx.cfg).unwrap();
    assert!(outcome.video.ends_with(format!("{SCENE_NAME}.mp4")));
    assert!(outcome.video.exists());
    match outcome.playback {
        Playback::Failed(reason) => assert!(reason.contains("matviz-no-such-player"), "{reason}"),
        other => panic!("expected a playback failure, got {other:?}"),
    }
}

#[test]
fn configured_player_receives_the_video() {
    let mut fx = fixture("playback_opened", SUCCEEDS);
    fx.cfg.open_video = true;
    fx.cfg.opener = Some("true".to_string());

    let (_, outcome) = visualize(&request(), &fx.cfg).unwrap();
    assert_eq!(outcome.playback, Playback::Opened);
}
