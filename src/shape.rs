use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Highlight outline shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    Circle,
    Rhombus,
    RoundedSquare,
    #[default]
    Squircle,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Rhombus => "rhombus",
            Shape::RoundedSquare => "rounded_square",
            Shape::Squircle => "squircle",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "circle" => Some(Shape::Circle),
            "rhombus" => Some(Shape::Rhombus),
            "rounded_square" => Some(Shape::RoundedSquare),
            "squircle" => Some(Shape::Squircle),
            _ => None,
        }
    }
}

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Unknown names fall back to the default shape rather than failing.
        Ok(Shape::from_name(&raw).unwrap_or_default())
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Circle => write!(f, "Circle"),
            Shape::Rhombus => write!(f, "Rhombus"),
            Shape::RoundedSquare => write!(f, "Rounded Sq."),
            Shape::Squircle => write!(f, "Squircle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of side `size` centered on the origin.
    pub fn centered_square(size: f32) -> Self {
        Self::new(-size / 2.0, -size / 2.0, size, size)
    }

    pub fn mid_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Rect shrunk by `d` on every side. Collapses to a zero-size rect at the
    /// center when `d` exceeds the half-extent.
    pub fn inset(&self, d: f32) -> Self {
        let dx = d.min(self.width / 2.0);
        let dy = d.min(self.height / 2.0);
        Self::new(
            self.x + dx,
            self.y + dy,
            self.width - 2.0 * dx,
            self.height - 2.0 * dy,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEl {
    MoveTo(Point),
    LineTo(Point),
    /// Quadratic curve: control point, end point.
    QuadTo(Point, Point),
    /// Cubic curve: two control points, end point.
    CubicTo(Point, Point, Point),
    Close,
}

/// A closed 2-D outline as a command list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    els: Vec<PathEl>,
}

/// Circle-from-cubics constant: distance of the control points from the arc
/// endpoints, as a fraction of the radius.
const KAPPA: f32 = 0.552_284_75;

/// Superellipse exponent for the squircle.
const SQUIRCLE_N: f32 = 1.6;

/// Angular samples for the squircle polygon.
const SQUIRCLE_SEGMENTS: usize = 100;

impl Path {
    fn move_to(&mut self, p: Point) {
        self.els.push(PathEl::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.els.push(PathEl::LineTo(p));
    }

    fn quad_to(&mut self, ctrl: Point, p: Point) {
        self.els.push(PathEl::QuadTo(ctrl, p));
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.els.push(PathEl::CubicTo(c1, c2, p));
    }

    fn close(&mut self) {
        self.els.push(PathEl::Close);
    }

    pub fn elements(&self) -> &[PathEl] {
        &self.els
    }

    pub fn is_empty(&self) -> bool {
        self.els.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.els.last(), Some(PathEl::Close))
    }

    /// Polygonal approximation, sampling each curve at `curve_steps` points.
    pub fn flatten(&self, curve_steps: usize) -> Vec<Point> {
        let steps = curve_steps.max(1);
        let mut out = Vec::new();
        let mut start = Point::default();
        let mut cur = Point::default();
        for el in &self.els {
            match *el {
                PathEl::MoveTo(p) => {
                    start = p;
                    cur = p;
                    out.push(p);
                }
                PathEl::LineTo(p) => {
                    cur = p;
                    out.push(p);
                }
                PathEl::QuadTo(c, p) => {
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        out.push(quad_point(cur, c, p, t));
                    }
                    cur = p;
                }
                PathEl::CubicTo(c1, c2, p) => {
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        out.push(cubic_point(cur, c1, c2, p, t));
                    }
                    cur = p;
                }
                PathEl::Close => {
                    out.push(start);
                    cur = start;
                }
            }
        }
        out
    }

    /// Bounding box of the flattened outline.
    pub fn bounds(&self) -> Option<Rect> {
        let pts = self.flatten(16);
        let first = *pts.first()?;
        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x;
        let mut max_y = first.y;
        for p in &pts[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

fn quad_point(p0: Point, c: Point, p1: Point, t: f32) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * p0.x + 2.0 * u * t * c.x + t * t * p1.x,
        u * u * p0.y + 2.0 * u * t * c.y + t * t * p1.y,
    )
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f32) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * u * p0.x + 3.0 * u * u * t * c1.x + 3.0 * u * t * t * c2.x + t * t * t * p1.x,
        u * u * u * p0.y + 3.0 * u * u * t * c1.y + 3.0 * u * t * t * c2.y + t * t * t * p1.y,
    )
}

/// Closed outline for `shape` inscribed in `rect`.
pub fn path_for(shape: Shape, rect: Rect) -> Path {
    match shape {
        Shape::Circle => ellipse_path(rect),
        Shape::Rhombus => rounded_rhombus_path(rect, rect.width * 0.15),
        Shape::RoundedSquare => rounded_rect_path(rect, rect.width * 0.2),
        Shape::Squircle => superellipse_path(rect, SQUIRCLE_N),
    }
}

fn ellipse_path(rect: Rect) -> Path {
    let cx = rect.mid_x();
    let cy = rect.mid_y();
    let a = rect.width / 2.0;
    let b = rect.height / 2.0;
    let ka = KAPPA * a;
    let kb = KAPPA * b;

    let mut path = Path::default();
    path.move_to(Point::new(cx + a, cy));
    path.cubic_to(
        Point::new(cx + a, cy + kb),
        Point::new(cx + ka, cy + b),
        Point::new(cx, cy + b),
    );
    path.cubic_to(
        Point::new(cx - ka, cy + b),
        Point::new(cx - a, cy + kb),
        Point::new(cx - a, cy),
    );
    path.cubic_to(
        Point::new(cx - a, cy - kb),
        Point::new(cx - ka, cy - b),
        Point::new(cx, cy - b),
    );
    path.cubic_to(
        Point::new(cx + ka, cy - b),
        Point::new(cx + a, cy - kb),
        Point::new(cx + a, cy),
    );
    path.close();
    path
}

fn rounded_rect_path(rect: Rect, radius: f32) -> Path {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let k = KAPPA * r;
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.max_x(), rect.max_y());

    let mut path = Path::default();
    path.move_to(Point::new(x0 + r, y0));
    path.line_to(Point::new(x1 - r, y0));
    path.cubic_to(
        Point::new(x1 - r + k, y0),
        Point::new(x1, y0 + r - k),
        Point::new(x1, y0 + r),
    );
    path.line_to(Point::new(x1, y1 - r));
    path.cubic_to(
        Point::new(x1, y1 - r + k),
        Point::new(x1 - r + k, y1),
        Point::new(x1 - r, y1),
    );
    path.line_to(Point::new(x0 + r, y1));
    path.cubic_to(
        Point::new(x0 + r - k, y1),
        Point::new(x0, y1 - r + k),
        Point::new(x0, y1 - r),
    );
    path.line_to(Point::new(x0, y0 + r));
    path.cubic_to(
        Point::new(x0, y0 + r - k),
        Point::new(x0 + r - k, y0),
        Point::new(x0 + r, y0),
    );
    path.close();
    path
}

/// Superellipse (squircle): |x/a|^n + |y/b|^n = 1, sampled with a 45-degree
/// phase offset so the cardinal points land at top/bottom/left/right.
fn superellipse_path(rect: Rect, n: f32) -> Path {
    let cx = rect.mid_x();
    let cy = rect.mid_y();
    let a = rect.width / 2.0;
    let b = rect.height / 2.0;
    let exponent = 2.0 / n;

    let mut path = Path::default();
    for i in 0..=SQUIRCLE_SEGMENTS {
        let t = i as f32 / SQUIRCLE_SEGMENTS as f32 * std::f32::consts::TAU
            + std::f32::consts::FRAC_PI_4;
        let (sin_t, cos_t) = t.sin_cos();
        let x = cx + a * cos_t.signum() * cos_t.abs().powf(exponent);
        let y = cy + b * sin_t.signum() * sin_t.abs().powf(exponent);
        if i == 0 {
            path.move_to(Point::new(x, y));
        } else {
            path.line_to(Point::new(x, y));
        }
    }
    path.close();
    path
}

/// Diamond with vertices at the rect's edge midpoints, each corner rounded by
/// a quadratic curve whose control point is the sharp vertex.
fn rounded_rhombus_path(rect: Rect, corner_radius: f32) -> Path {
    let cx = rect.mid_x();
    let cy = rect.mid_y();
    let hw = rect.width / 2.0;
    let hh = rect.height / 2.0;
    // Clamped so two roundings on the same edge never overlap.
    let r = corner_radius.min(hw.min(hh) * 0.5).max(0.0);

    let top = Point::new(cx, cy - hh);
    let right = Point::new(cx + hw, cy);
    let bottom = Point::new(cx, cy + hh);
    let left = Point::new(cx - hw, cy);

    // Point at distance `dist` from `from` along the edge toward `to`.
    fn toward(from: Point, to: Point, dist: f32) -> Point {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            return from;
        }
        let t = dist / len;
        Point::new(from.x + dx * t, from.y + dy * t)
    }

    let start = toward(top, right, r);

    let mut path = Path::default();
    path.move_to(start);
    path.line_to(toward(right, top, r));
    path.quad_to(right, toward(right, bottom, r));
    path.line_to(toward(bottom, right, r));
    path.quad_to(bottom, toward(bottom, left, r));
    path.line_to(toward(left, bottom, r));
    path.quad_to(left, toward(left, top, r));
    path.line_to(toward(top, left, r));
    path.quad_to(top, start);
    path.close();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPES: [Shape; 4] = [
        Shape::Circle,
        Shape::Rhombus,
        Shape::RoundedSquare,
        Shape::Squircle,
    ];

    fn assert_within(bounds: Rect, rect: Rect, tol: f32) {
        assert!(bounds.x >= rect.x - tol, "{bounds:?} vs {rect:?}");
        assert!(bounds.y >= rect.y - tol, "{bounds:?} vs {rect:?}");
        assert!(bounds.max_x() <= rect.max_x() + tol, "{bounds:?} vs {rect:?}");
        assert!(bounds.max_y() <= rect.max_y() + tol, "{bounds:?} vs {rect:?}");
    }

    #[test]
    fn every_shape_produces_a_closed_path() {
        let rect = Rect::centered_square(105.0);
        for shape in SHAPES {
            let path = path_for(shape, rect);
            assert!(path.is_closed(), "{shape} not closed");
            assert!(!path.is_empty(), "{shape} empty");
        }
    }

    #[test]
    fn bounds_stay_inside_the_supplied_rect() {
        for size in [1.0_f32, 30.0, 105.0, 400.0] {
            let rect = Rect::centered_square(size);
            for shape in SHAPES {
                let bounds = path_for(shape, rect).bounds().expect("bounds");
                assert_within(bounds, rect, size * 1e-3);
            }
        }
    }

    #[test]
    fn circle_and_rounded_square_touch_the_rect_edges() {
        let rect = Rect::centered_square(100.0);
        for shape in [Shape::Circle, Shape::RoundedSquare] {
            let bounds = path_for(shape, rect).bounds().expect("bounds");
            assert!((bounds.width - rect.width).abs() < 0.5, "{shape}");
            assert!((bounds.height - rect.height).abs() < 0.5, "{shape}");
        }
    }

    #[test]
    fn squircle_sampling_is_deterministic() {
        let rect = Rect::new(3.5, -7.25, 105.0, 105.0);
        let a = path_for(Shape::Squircle, rect);
        let b = path_for(Shape::Squircle, rect);
        assert_eq!(a.elements().len(), b.elements().len());
        for (ea, eb) in a.elements().iter().zip(b.elements()) {
            match (ea, eb) {
                (PathEl::MoveTo(pa), PathEl::MoveTo(pb))
                | (PathEl::LineTo(pa), PathEl::LineTo(pb)) => {
                    assert_eq!(pa.x.to_bits(), pb.x.to_bits());
                    assert_eq!(pa.y.to_bits(), pb.y.to_bits());
                }
                (PathEl::Close, PathEl::Close) => {}
                other => panic!("mismatched elements {other:?}"),
            }
        }
    }

    #[test]
    fn squircle_has_the_expected_vertex_count() {
        let path = path_for(Shape::Squircle, Rect::centered_square(50.0));
        // MoveTo + 100 LineTo + Close
        assert_eq!(path.elements().len(), SQUIRCLE_SEGMENTS + 2);
    }

    #[test]
    fn rhombus_rounding_radius_is_clamped() {
        // A flat rect forces the clamp: r <= half the shorter half-extent.
        let rect = Rect::new(0.0, 0.0, 100.0, 10.0);
        let path = path_for(Shape::Rhombus, rect);
        assert!(path.is_closed());
        let bounds = path.bounds().expect("bounds");
        assert_within(bounds, rect, 0.1);
    }

    #[test]
    fn shape_names_round_trip_through_serde() {
        for shape in SHAPES {
            let json = serde_json::to_string(&shape).expect("serialize");
            let back: Shape = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(shape, back);
        }
        // Unknown names fall back instead of failing the settings load.
        let fallback: Shape = serde_json::from_str("\"hexagon\"").expect("fallback");
        assert_eq!(fallback, Shape::Squircle);
    }
}
