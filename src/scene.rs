//! Scene script generation.
//!
//! A [`ScenePlan`] holds every number the animation shows, computed up front in Rust. The
//! script embeds those numbers as literal numpy arrays and TeX expressions, so the renderer
//! only draws; it never recomputes the product.

use std::path::Path;

use anyhow::Context as _;

use crate::{
    error::{MatvizError, MatvizResult},
    format::{self, NumberFormat},
    matrix::{Matrix, multiply},
};

/// Default manim scene class name; the renderer names its output video after it.
pub const SCENE_NAME: &str = "MatrixMultiplicationScene";

const BASIS_COLORS: [&str; 3] = ["RED", "GREEN", "BLUE"];
const POINT_COLOR: &str = "YELLOW";
const MIN_AXIS_EXTENT: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    pub fn from_size(n: usize) -> Option<Self> {
        match n {
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    TransformOnly,
    TransformWithPoint,
}

/// A point followed through both transformations.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PointPath {
    pub point: Vec<f64>,
    /// `first · point`
    pub midpoint: Vec<f64>,
    /// `product · point`
    pub transformed: Vec<f64>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ScenePlan {
    pub first: Matrix,
    pub second: Matrix,
    pub product: Matrix,
    pub dimension: Dimension,
    pub point: Option<PointPath>,
}

#[derive(Clone, Debug)]
pub struct SceneStyle {
    pub scene_name: String,
    pub number_format: NumberFormat,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            scene_name: SCENE_NAME.to_string(),
            number_format: NumberFormat::default(),
        }
    }
}

/// Entries that overflowed `f64` cannot be drawn or written as Python literals.
fn ensure_finite<'a>(what: &str, mut values: impl Iterator<Item = &'a f64>) -> MatvizResult<()> {
    if values.any(|v| !v.is_finite()) {
        return Err(MatvizError::dimension(format!(
            "{what} has entries outside the representable range"
        )));
    }
    Ok(())
}

impl ScenePlan {
    pub fn new(first: Matrix, second: Matrix, point: Option<Vec<f64>>) -> MatvizResult<Self> {
        let product = multiply(&first, &second)?;

        let point = match point {
            Some(p) => {
                if p.len() != first.cols() {
                    return Err(MatvizError::dimension(format!(
                        "point has {} coordinates but the first matrix has {} columns",
                        p.len(),
                        first.cols()
                    )));
                }
                let midpoint = first.apply(&p)?;
                let transformed = product.apply(&p)?;
                Some(PointPath {
                    point: p,
                    midpoint,
                    transformed,
                })
            }
            None => None,
        };

        let dimension = visual_dimension(&first, &second)?;
        ensure_finite("product", product.iter_rows().flatten())?;
        if let Some(p) = &point {
            ensure_finite("point path", p.midpoint.iter().chain(&p.transformed))?;
        }

        Ok(Self {
            first,
            second,
            product,
            dimension,
            point,
        })
    }

    pub fn mode(&self) -> SceneMode {
        match self.point {
            Some(_) => SceneMode::TransformWithPoint,
            None => SceneMode::TransformOnly,
        }
    }

    /// Half-width of every axis: the largest coordinate drawn, rounded up, never below 5.
    pub fn axis_extent(&self) -> f64 {
        let mut max = 1.0f64;
        for m in [&self.first, &self.product] {
            for row in m.iter_rows() {
                max = row.iter().fold(max, |acc, v| acc.max(v.abs()));
            }
        }
        if let Some(p) = &self.point {
            for v in p.point.iter().chain(&p.midpoint).chain(&p.transformed) {
                max = max.max(v.abs());
            }
        }
        (max.ceil() + 1.0).max(MIN_AXIS_EXTENT)
    }

    pub fn script(&self, style: &SceneStyle) -> String {
        ScriptWriter::new(self, style).finish()
    }
}

/// Only square operands of a shared size 2 or 3 can be drawn.
fn visual_dimension(first: &Matrix, second: &Matrix) -> MatvizResult<Dimension> {
    if !first.is_square() || !second.is_square() || first.rows() != second.rows() {
        return Err(MatvizError::dimension(format!(
            "visualization needs two square matrices of the same size, got {}x{} and {}x{}",
            first.rows(),
            first.cols(),
            second.rows(),
            second.cols()
        )));
    }
    Dimension::from_size(first.rows()).ok_or_else(|| {
        MatvizError::dimension(format!(
            "visualization supports 2x2 and 3x3 matrices, got {}x{}",
            first.rows(),
            first.cols()
        ))
    })
}

#[tracing::instrument(skip(plan, style), fields(dimension = ?plan.dimension, mode = ?plan.mode()))]
pub fn write_script(plan: &ScenePlan, path: &Path, style: &SceneStyle) -> MatvizResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create script directory '{}'", parent.display()))?;
    }
    std::fs::write(path, plan.script(style))
        .with_context(|| format!("write scene script '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote scene script");
    Ok(())
}

struct ScriptWriter<'a> {
    plan: &'a ScenePlan,
    style: &'a SceneStyle,
    out: String,
    depth: usize,
}

impl<'a> ScriptWriter<'a> {
    fn new(plan: &'a ScenePlan, style: &'a SceneStyle) -> Self {
        Self {
            plan,
            style,
            out: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn three_d(&self) -> bool {
        self.plan.dimension == Dimension::Three
    }

    fn tex(&self, m: &Matrix) -> String {
        format::matrix_tex(m, self.style.number_format)
    }

    fn finish(mut self) -> String {
        self.header();
        self.data();
        self.equations();
        self.axes();
        self.basis();
        self.steps();
        self.combined();
        self.out
    }

    fn header(&mut self) {
        let base = if self.three_d() { "ThreeDScene" } else { "Scene" };
        self.line("from manim import *");
        self.line("import numpy as np");
        self.blank();
        self.blank();
        self.line(format!("class {}({base}):", self.style.scene_name));
        self.depth = 1;
        self.line("def construct(self):");
        self.depth = 2;
        if self.three_d() {
            self.line("self.set_camera_orientation(phi=70 * DEGREES, theta=-45 * DEGREES)");
        }
    }

    fn data(&mut self) {
        let plan = self.plan;
        self.line(format!("first = np.array({})", format::matrix_literal(&plan.first)));
        self.line(format!("second = np.array({})", format::matrix_literal(&plan.second)));
        self.line(format!("product = np.array({})", format::matrix_literal(&plan.product)));
        if let Some(p) = &plan.point {
            self.line(format!("point = np.array({})", format::vector_literal(&p.point)));
            self.line(format!("midpoint = np.array({})", format::vector_literal(&p.midpoint)));
            self.line(format!(
                "transformed = np.array({})",
                format::vector_literal(&p.transformed)
            ));
        }
        self.blank();
    }

    fn equations(&mut self) {
        let plan = self.plan;
        let (first, second, product) = (
            self.tex(&plan.first),
            self.tex(&plan.second),
            self.tex(&plan.product),
        );
        self.line(format!(
            r#"first_tex = MathTex(r"A = {first}").scale(0.7).to_corner(UL)"#
        ));
        self.line(format!(
            r#"second_tex = MathTex(r"B = {second}").scale(0.7).next_to(first_tex, DOWN, aligned_edge=LEFT, buff=0.4)"#
        ));
        self.line(format!(
            r#"product_tex = MathTex(r"B \times A = {product}").scale(0.7).next_to(second_tex, DOWN, aligned_edge=LEFT, buff=0.4)"#
        ));
        self.show(&["first_tex", "second_tex"]);
        self.line("self.wait(1)");
        self.show(&["product_tex"]);
        if let Some(p) = &plan.point {
            let v = format::vector_tex(&p.point, self.style.number_format);
            self.line(format!(
                r#"point_tex = MathTex(r"v = {v}").scale(0.7).next_to(product_tex, DOWN, aligned_edge=LEFT, buff=0.4)"#
            ));
            self.show(&["point_tex"]);
        }
        self.line("self.wait(1)");
        self.blank();
    }

    fn axes(&mut self) {
        let r = self.plan.axis_extent();
        let step = if r > 10.0 { (r / 5.0).ceil() } else { 1.0 };
        let range = format!("[{}, {}, {}]", -r, r, step);
        if self.three_d() {
            self.line(format!(
                "axes = ThreeDAxes(x_range={range}, y_range={range}, z_range={range}, x_length=6, y_length=6, z_length=6)"
            ));
        } else {
            self.line(format!(
                r#"axes = Axes(x_range={range}, y_range={range}, x_length=6, y_length=6, axis_config={{"color": GREY}}).to_edge(RIGHT)"#
            ));
        }
        self.line("self.play(Create(axes))");
        self.blank();
    }

    /// Arrow from the origin to the coordinates held by the Python expression `target`.
    fn arrow(&self, target: &str, color: &str) -> String {
        if self.three_d() {
            format!("Arrow3D(start=axes.c2p(0, 0, 0), end=axes.c2p(*{target}), color={color})")
        } else {
            format!("Arrow(axes.c2p(0, 0), axes.c2p(*{target}), buff=0, color={color})")
        }
    }

    fn grow(&self) -> &'static str {
        if self.three_d() { "Create" } else { "GrowArrow" }
    }

    fn arrows_group(&mut self, name: &str, source: &str) {
        let n = self.plan.dimension.size();
        self.line(format!("{name} = VGroup("));
        self.depth += 1;
        for (i, color) in BASIS_COLORS.iter().take(n).enumerate() {
            let arrow = self.arrow(&format!("{source}[:, {i}]"), color);
            self.line(format!("{arrow},"));
        }
        self.depth -= 1;
        self.line(")");
    }

    fn basis(&mut self) {
        self.line("identity = np.identity(first.shape[0])");
        self.arrows_group("basis", "identity");
        let grow = self.grow();
        self.line(format!("self.play(*[{grow}(v) for v in basis])"));
        if self.plan.point.is_some() {
            let arrow = self.arrow("point", POINT_COLOR);
            self.line(format!("point_arrow = {arrow}"));
            self.line(format!("self.play({grow}(point_arrow))"));
        }
        self.line("self.wait(1)");
        self.blank();
    }

    fn steps(&mut self) {
        self.title("title", r"Transformation by matrix $A$");
        self.show(&["title"]);
        self.arrows_group("step_a", "first");
        self.transform_to("step_a", "midpoint");
        self.blank();

        self.title("next_title", r"Transformation by matrix $B$");
        self.swap_title();
        self.arrows_group("step_b", "product");
        self.transform_to("step_b", "transformed");
        self.blank();
    }

    fn combined(&mut self) {
        self.title("next_title", r"Combined transformation ($B \times A$)");
        self.swap_title();
        let plan = self.plan;
        let product = self.tex(&plan.product);
        self.line(format!(
            r#"combined_tex = MathTex(r"B \times A = {product}").scale(0.6).next_to(title, DOWN)"#
        ));
        self.show(&["combined_tex"]);
        if let Some(p) = &plan.point {
            let v = format::vector_tex(&p.transformed, self.style.number_format);
            self.line(format!(
                r#"result_tex = MathTex(r"(B \times A)\,v = {v}").scale(0.6).next_to(combined_tex, DOWN)"#
            ));
            self.show(&["result_tex"]);
        }
        self.line("self.wait(2)");
    }

    fn title(&mut self, name: &str, text: &str) {
        self.line(format!(
            r#"{name} = Tex(r"{text}").scale(0.6).to_edge(UP)"#
        ));
    }

    fn swap_title(&mut self) {
        if self.three_d() {
            self.line("self.add_fixed_in_frame_mobjects(next_title)");
            self.line("self.remove(next_title)");
        }
        self.line("self.play(FadeOut(title), Write(next_title))");
        self.line("title = next_title");
    }

    fn transform_to(&mut self, group: &str, point_target: &str) {
        let mut anims = format!("*[Transform(v, t) for v, t in zip(basis, {group})]");
        if self.plan.point.is_some() {
            let arrow = self.arrow(point_target, POINT_COLOR);
            anims.push_str(&format!(", Transform(point_arrow, {arrow})"));
        }
        self.line(format!("self.play({anims})"));
        self.line("self.wait(1)");
    }

    /// Write text mobjects; 3D scenes pin them to the camera frame first.
    fn show(&mut self, names: &[&str]) {
        if self.three_d() {
            self.line(format!("self.add_fixed_in_frame_mobjects({})", names.join(", ")));
            self.line(format!("self.remove({})", names.join(", ")));
        }
        let writes: Vec<String> = names.iter().map(|n| format!("Write({n})")).collect();
        self.line(format!("self.play({})", writes.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    fn rotate_then_scale() -> ScenePlan {
        ScenePlan::new(
            m(&[&[0.0, -1.0], &[1.0, 0.0]]),
            m(&[&[2.0, 0.0], &[0.0, 3.0]]),
            None,
        )
        .unwrap()
    }

    #[test]
    fn overflowing_product_is_rejected_before_scripting() {
        let big = m(&[&[1e200, 0.0], &[0.0, 1e200]]);
        let err = ScenePlan::new(big.clone(), big, None).unwrap_err();
        assert!(matches!(err, MatvizError::Dimension(_)), "{err}");

        let err = ScenePlan::new(
            m(&[&[1e200, 0.0], &[0.0, 1.0]]),
            Matrix::identity(2),
            Some(vec![1e200, 0.0]),
        )
        .unwrap_err();
        assert!(matches!(err, MatvizError::Dimension(_)), "{err}");
    }

    #[test]
    fn plan_computes_second_times_first() {
        let plan = rotate_then_scale();
        assert_eq!(plan.product, m(&[&[0.0, -2.0], &[3.0, 0.0]]));
        assert_eq!(plan.dimension, Dimension::Two);
        assert_eq!(plan.mode(), SceneMode::TransformOnly);
    }

    #[test]
    fn point_is_followed_through_both_steps() {
        let plan = ScenePlan::new(
            m(&[&[0.0, -1.0], &[1.0, 0.0]]),
            m(&[&[2.0, 0.0], &[0.0, 3.0]]),
            Some(vec![1.0, 2.0]),
        )
        .unwrap();
        let p = plan.point.as_ref().unwrap();
        assert_eq!(p.midpoint, vec![-2.0, 1.0]);
        assert_eq!(p.transformed, vec![-4.0, 3.0]);
        assert_eq!(plan.mode(), SceneMode::TransformWithPoint);
    }

    #[test]
    fn point_length_must_match_first_columns() {
        let err = ScenePlan::new(
            Matrix::identity(2),
            Matrix::identity(2),
            Some(vec![1.0, 2.0, 3.0]),
        )
        .unwrap_err();
        assert!(matches!(err, MatvizError::Dimension(_)));
    }

    #[test]
    fn only_square_2_or_3_matrices_are_drawn() {
        assert!(matches!(
            ScenePlan::new(Matrix::identity(4), Matrix::identity(4), None),
            Err(MatvizError::Dimension(_))
        ));
        let wide = m(&[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]]);
        let tall = m(&[&[1.0, 0.0], &[0.0, 1.0], &[0.0, 0.0]]);
        assert!(matches!(
            ScenePlan::new(wide, tall, None),
            Err(MatvizError::Dimension(_))
        ));
        assert_eq!(
            ScenePlan::new(Matrix::identity(3), Matrix::identity(3), None)
                .unwrap()
                .dimension,
            Dimension::Three
        );
    }

    #[test]
    fn script_embeds_literal_values() {
        let script = rotate_then_scale().script(&SceneStyle::default());
        assert!(script.contains("class MatrixMultiplicationScene(Scene):"));
        assert!(script.contains("first = np.array([[0.0, -1.0], [1.0, 0.0]])"));
        assert!(script.contains("second = np.array([[2.0, 0.0], [0.0, 3.0]])"));
        assert!(script.contains("product = np.array([[0.0, -2.0], [3.0, 0.0]])"));
        assert!(script.contains(r"B \times A = \begin{bmatrix} 0 & -2 \\ 3 & 0 \end{bmatrix}"));
        assert!(!script.contains("point"));
    }

    #[test]
    fn script_uses_the_configured_number_format() {
        let style = SceneStyle {
            number_format: NumberFormat::Fixed,
            ..SceneStyle::default()
        };
        let script = rotate_then_scale().script(&style);
        assert!(script.contains(r"A = \begin{bmatrix} 0.00 & -1.00 \\ 1.00 & 0.00 \end{bmatrix}"));
    }

    #[test]
    fn three_d_script_uses_3d_primitives() {
        let plan = ScenePlan::new(
            Matrix::identity(3),
            m(&[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 2.0]]),
            Some(vec![1.0, 1.0, 1.0]),
        )
        .unwrap();
        let script = plan.script(&SceneStyle::default());
        assert!(script.contains("(ThreeDScene):"));
        assert!(script.contains("ThreeDAxes("));
        assert!(script.contains("Arrow3D("));
        assert!(script.contains("transformed = np.array([1.0, 1.0, 2.0])"));
        assert!(script.contains("add_fixed_in_frame_mobjects"));
        assert!(!script.contains("GrowArrow"));
    }

    #[test]
    fn axis_extent_covers_every_vector() {
        assert_eq!(rotate_then_scale().axis_extent(), 5.0);
        let plan = ScenePlan::new(
            Matrix::identity(2),
            m(&[&[7.5, 0.0], &[0.0, 1.0]]),
            Some(vec![1.0, 0.0]),
        )
        .unwrap();
        assert_eq!(plan.axis_extent(), 9.0);
    }

    #[test]
    fn script_lines_are_consistently_indented() {
        let script = rotate_then_scale().script(&SceneStyle::default());
        for line in script.lines().filter(|l| !l.is_empty()) {
            let indent = line.len() - line.trim_start().len();
            assert_eq!(indent % 4, 0, "bad indent: {line:?}");
        }
    }

    #[test]
    fn write_script_overwrites() {
        let dir = std::path::PathBuf::from("target").join("scene_write");
        let path = dir.join("matrix_visualization.py");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "stale").unwrap();

        write_script(&rotate_then_scale(), &path, &SceneStyle::default()).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("from manim import *"));
    }
}
