//! Classification of renderer failures from captured output.
//!
//! Rules are checked in order; each rule looks at stderr, then stdout. The first rule with a
//! matching line decides the kind, and the message is that line plus a few following lines of
//! the same stream, never the whole log.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// TeX could not typeset one of the scene's expressions.
    Latex,
    /// The renderer's Python environment lacks a module.
    MissingModule,
    /// The generated script failed inside the renderer.
    Script,
    Generic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Latex => "latex",
            FailureKind::MissingModule => "missing module",
            FailureKind::Script => "script",
            FailureKind::Generic => "renderer",
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub pattern: &'static str,
    pub kind: FailureKind,
}

const fn rule(pattern: &'static str, kind: FailureKind) -> Rule {
    Rule { pattern, kind }
}

pub const RULES: &[Rule] = &[
    rule("LaTeX Error", FailureKind::Latex),
    rule("latex error converting to dvi", FailureKind::Latex),
    rule("LaTeX compilation error", FailureKind::Latex),
    rule("! Undefined control sequence", FailureKind::Latex),
    rule("ModuleNotFoundError", FailureKind::MissingModule),
    rule("No module named", FailureKind::MissingModule),
    rule("SyntaxError", FailureKind::Script),
    rule("Traceback (most recent call last)", FailureKind::Script),
];

/// Lines kept after the matching line.
const CONTEXT_LINES: usize = 2;
/// Lines kept from the end of the log when no rule matches.
const TAIL_LINES: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified {
    pub kind: FailureKind,
    pub message: String,
}

pub fn classify(stderr: &str, stdout: &str) -> Classified {
    let streams: [Vec<&str>; 2] = [
        non_empty_lines(stderr).collect(),
        non_empty_lines(stdout).collect(),
    ];

    for r in RULES {
        for lines in &streams {
            if let Some(idx) = lines.iter().position(|l| l.contains(r.pattern)) {
                let end = (idx + 1 + CONTEXT_LINES).min(lines.len());
                return Classified {
                    kind: r.kind,
                    message: excerpt(r.kind, &lines[idx..end]),
                };
            }
        }
    }

    let [err_lines, out_lines] = streams;
    let source = if err_lines.is_empty() {
        out_lines
    } else {
        err_lines
    };
    let message = if source.is_empty() {
        "renderer exited without output".to_string()
    } else {
        let start = source.len().saturating_sub(TAIL_LINES);
        source[start..].join("\n")
    };
    Classified {
        kind: FailureKind::Generic,
        message,
    }
}

fn non_empty_lines(s: &str) -> impl Iterator<Item = &str> {
    s.lines().map(str::trim_end).filter(|l| !l.trim().is_empty())
}

fn excerpt(kind: FailureKind, lines: &[&str]) -> String {
    let body = lines.join("\n");
    match kind {
        FailureKind::Latex => format!("LaTeX could not typeset the scene: {body}"),
        FailureKind::MissingModule => format!("renderer environment is incomplete: {body}"),
        FailureKind::Script | FailureKind::Generic => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latex_errors_are_excerpted() {
        let stderr = "\
Rendering scene...
Traceback (most recent call last):
  File \"scene.py\", line 3
ValueError: latex error converting to dvi. See log output above or the log file: media/Tex/x.log
  extra line 1
  extra line 2
  extra line 3
";
        let c = classify(stderr, "");
        assert_eq!(c.kind, FailureKind::Latex);
        assert!(c.message.starts_with("LaTeX could not typeset the scene: ValueError: latex error"));
        assert!(c.message.contains("extra line 2"));
        assert!(!c.message.contains("extra line 3"));
        assert!(!c.message.contains("Rendering scene"));
    }

    #[test]
    fn earlier_rules_win_over_later_ones() {
        let stderr = "Traceback (most recent call last):\nModuleNotFoundError: No module named 'manim'";
        assert_eq!(classify(stderr, "").kind, FailureKind::MissingModule);
    }

    #[test]
    fn context_stays_within_one_stream() {
        let c = classify("! LaTeX Error: Missing $ inserted.", "Manim Community v0.18.0");
        assert_eq!(c.message, "LaTeX could not typeset the scene: ! LaTeX Error: Missing $ inserted.");
    }

    #[test]
    fn stdout_is_searched_too() {
        let c = classify("", "! LaTeX Error: File `standalone.cls' not found.");
        assert_eq!(c.kind, FailureKind::Latex);
    }

    #[test]
    fn unmatched_output_keeps_the_tail() {
        let stderr = (1..=8).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let c = classify(&stderr, "");
        assert_eq!(c.kind, FailureKind::Generic);
        assert_eq!(c.message, "line 4\nline 5\nline 6\nline 7\nline 8");
    }

    #[test]
    fn silent_failure_has_a_message() {
        let c = classify("", "  \n");
        assert_eq!(c.kind, FailureKind::Generic);
        assert_eq!(c.message, "renderer exited without output");
    }

    #[test]
    fn rules_cover_every_non_generic_kind() {
        for kind in [
            FailureKind::Latex,
            FailureKind::MissingModule,
            FailureKind::Script,
        ] {
            assert!(RULES.iter().any(|r| r.kind == kind), "{kind}");
        }
    }
}
