// src/render/svg.rs
use super::surface::{FillStyle, RasterImage, Shadow, StrokeStyle, Surface};
use crate::math::types::{Bbox, Point};
use std::path::Path as FsPath;
use svg::node::element::{
    ClipPath, Definitions, Element, Filter, Group, Image, Path, Pattern, Rectangle, SVG,
};
use svg::{Document, Node};
use tracing::info;

/// Affine Matrix im Canvas-Format `[a, b, c, d, e, f]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine([f64; 6]);

impl Affine {
    const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        let [a, b, c, d, ..] = self.0;
        self.0[4] += a * dx + c * dy;
        self.0[5] += b * dx + d * dy;
    }

    fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        let [a, b, c, d, ..] = self.0;
        self.0[0] = a * cos + c * sin;
        self.0[1] = b * cos + d * sin;
        self.0[2] = c * cos - a * sin;
        self.0[3] = d * cos - b * sin;
    }

    fn to_attr(self) -> String {
        let [a, b, c, d, e, f] = self.0;
        format!("matrix({a} {b} {c} {d} {e} {f})")
    }
}

#[derive(Debug, Clone)]
struct State {
    matrix: Affine,
    clip: Option<String>,
    shadow: Option<String>,
}

/// Zeichenfläche, die jede Operation als SVG-Element festhält.
///
/// Pfade werden in absolute Koordinaten umgerechnet; Clip-Regionen werden
/// als verschachtelte `clipPath`-Definitionen geschnitten.
pub struct SvgSurface {
    width: f64,
    height: f64,
    defs: Definitions,
    body: Group,
    state: State,
    stack: Vec<State>,
    path: String,
    next_id: usize,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            defs: Definitions::new(),
            body: Group::new(),
            state: State {
                matrix: Affine::IDENTITY,
                clip: None,
                shadow: None,
            },
            stack: Vec::new(),
            path: String::new(),
            next_id: 0,
        }
    }

    pub fn into_document(self) -> Document {
        Document::new()
            .set("width", self.width)
            .set("height", self.height)
            .set("viewBox", format!("0 0 {} {}", self.width, self.height))
            .set("xmlns:xlink", "http://www.w3.org/1999/xlink")
            .add(self.defs)
            .add(self.body)
    }

    /// Schreibt das Dokument in eine Datei.
    pub fn write_to<P: AsRef<FsPath>>(self, path: P) -> std::io::Result<()> {
        let path = path.as_ref().to_path_buf();
        svg::save(&path, &self.into_document())?;
        info!("SVG '{}' wurde erstellt.", path.display());
        Ok(())
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn push_point(&mut self, cmd: char, points: &[Point]) {
        self.path.push(cmd);
        for p in points {
            let q = self.state.matrix.apply(*p);
            self.path.push_str(&format!(" {:.3} {:.3}", q.x, q.y));
        }
        self.path.push(' ');
    }

    /// Hängt das Element an den Körper an, beschnitten und beschattet nach Zustand.
    fn emit<T>(&mut self, node: T)
    where
        T: Into<Box<dyn Node>>,
    {
        let mut group = Group::new();
        if let Some(clip) = &self.state.clip {
            group.assign("clip-path", format!("url(#{clip})"));
        }
        if let Some(shadow) = &self.state.shadow {
            group.assign("filter", format!("url(#{shadow})"));
        }
        group.append(node);
        self.body.append(group);
    }
}

impl Surface for SvgSurface {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.matrix.translate(dx, dy);
    }

    fn rotate(&mut self, angle: f64) {
        self.state.matrix.rotate(angle);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Point) {
        self.push_point('M', &[p]);
    }

    fn line_to(&mut self, p: Point) {
        self.push_point('L', &[p]);
    }

    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.push_point('C', &[c1, c2, p]);
    }

    fn rect(&mut self, rect: &Bbox) {
        self.push_point('M', &[rect.tl]);
        self.push_point('L', &[Point::new(rect.br.x, rect.tl.y)]);
        self.push_point('L', &[rect.br]);
        self.push_point('L', &[Point::new(rect.tl.x, rect.br.y)]);
        self.path.push_str("Z ");
    }

    fn close_path(&mut self) {
        self.path.push_str("Z ");
    }

    fn clip(&mut self) {
        let id = self.fresh_id("clip");
        let mut clip = ClipPath::new()
            .set("id", id.clone())
            .add(Path::new().set("d", self.path.trim().to_string()));
        if let Some(parent) = &self.state.clip {
            clip.assign("clip-path", format!("url(#{parent})"));
        }
        self.defs.append(clip);
        self.state.clip = Some(id);
    }

    fn fill(&mut self, style: &FillStyle) {
        let fill = match style {
            FillStyle::Color(color) => color.clone(),
            FillStyle::Pattern {
                image,
                base_color,
                alpha,
            } => {
                let id = self.fresh_id("pattern");
                let (w, h) = (image.width.max(1), image.height.max(1));
                let pattern = Pattern::new()
                    .set("id", id.clone())
                    .set("patternUnits", "userSpaceOnUse")
                    .set("width", w)
                    .set("height", h)
                    .add(
                        Rectangle::new()
                            .set("width", w)
                            .set("height", h)
                            .set("fill", base_color.as_str()),
                    )
                    .add(
                        Image::new()
                            .set("href", image.url.as_str())
                            .set("width", w)
                            .set("height", h)
                            .set("opacity", *alpha),
                    );
                self.defs.append(pattern);
                format!("url(#{id})")
            }
        };
        let path = Path::new()
            .set("d", self.path.trim().to_string())
            .set("fill", fill)
            .set("fill-rule", "evenodd");
        self.emit(path);
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        let mut path = Path::new()
            .set("d", self.path.trim().to_string())
            .set("fill", "none")
            .set("stroke", style.color.as_str())
            .set("stroke-width", style.width);
        if !style.dash.is_empty() {
            let dash: Vec<String> = style.dash.iter().map(|d| d.to_string()).collect();
            path.assign("stroke-dasharray", dash.join(","));
        }
        self.emit(path);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow.map(|s| {
            let id = self.fresh_id("shadow");
            let mut drop = Element::new("feDropShadow");
            drop.assign("dx", s.offset_x);
            drop.assign("dy", s.offset_y);
            drop.assign("stdDeviation", s.blur / 2.0);
            drop.assign("flood-color", s.color);
            let filter = Filter::new()
                .set("id", id.clone())
                .set("x", "-20%")
                .set("y", "-20%")
                .set("width", "140%")
                .set("height", "140%")
                .add(drop);
            self.defs.append(filter);
            id
        });
    }

    fn draw_image(&mut self, image: &RasterImage, src: &Bbox, dst: &Bbox) {
        let viewport = SVG::new()
            .set("x", dst.tl.x)
            .set("y", dst.tl.y)
            .set("width", dst.width())
            .set("height", dst.height())
            .set(
                "viewBox",
                format!("{} {} {} {}", src.tl.x, src.tl.y, src.width(), src.height()),
            )
            .set("preserveAspectRatio", "none")
            .add(
                Image::new()
                    .set("href", image.url.as_str())
                    .set("width", image.width)
                    .set("height", image.height),
            );
        let placed = Group::new()
            .set("transform", self.state.matrix.to_attr())
            .add(viewport);
        self.emit(placed);
    }
}
