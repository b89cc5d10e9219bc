// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometric types for the Flatpage detector: points, Hough lines, the
// ordered four-corner set, and the projective transform used for the warp.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FlatpageError, Result};

/// A point in image coordinates (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Absolute difference between two undirected angles in degrees, in [0, 90].
///
/// Angles are taken modulo 180 so that 2° and 178° are 4° apart.
pub fn angle_between_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(180.0);
    d.min(180.0 - d)
}

// -- Hough lines --------------------------------------------------------------

/// An infinite line in Hough normal form, `x cos θ + y sin θ = offset`.
///
/// `angle_deg` is the clockwise angle of the line normal from the x axis, in
/// `[0, 180)`: 0° is a vertical line, 90° a horizontal one. `votes` is the
/// number of edge pixels supporting the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoughLine {
    pub angle_deg: f64,
    pub offset: f64,
    pub votes: u32,
}

impl HoughLine {
    pub fn new(angle_deg: f64, offset: f64, votes: u32) -> Self {
        Self {
            angle_deg,
            offset,
            votes,
        }
    }

    /// Line through `point` whose normal points at `angle_deg`.
    pub fn through(point: Point, angle_deg: f64, votes: u32) -> Self {
        let theta = angle_deg.to_radians();
        Self::new(
            angle_deg,
            point.x * theta.cos() + point.y * theta.sin(),
            votes,
        )
    }

    fn normal(&self) -> (f64, f64) {
        let theta = self.angle_deg.to_radians();
        (theta.cos(), theta.sin())
    }

    /// Direction of the line itself (normal rotated by 90°), in `[0, 180)`.
    pub fn direction_deg(&self) -> f64 {
        (self.angle_deg + 90.0).rem_euclid(180.0)
    }

    /// Signed distance from `p` to the line.
    pub fn signed_distance(&self, p: Point) -> f64 {
        let (c, s) = self.normal();
        p.x * c + p.y * s - self.offset
    }

    /// The y coordinate where the line crosses the column `x`, if it does.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let (c, s) = self.normal();
        (s.abs() > 1e-9).then(|| (self.offset - x * c) / s)
    }

    /// The x coordinate where the line crosses the row `y`, if it does.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        let (c, s) = self.normal();
        (c.abs() > 1e-9).then(|| (self.offset - y * s) / c)
    }

    /// Intersection point with `other`, or `None` if the lines are (nearly) parallel.
    pub fn intersect(&self, other: &HoughLine) -> Option<Point> {
        let (ca, sa) = self.normal();
        let (cb, sb) = other.normal();

        let denom = ca * sb - sa * cb;
        if denom.abs() < 1e-9 {
            return None;
        }

        let x = (self.offset * sb - other.offset * sa) / denom;
        let y = (other.offset * ca - self.offset * cb) / denom;
        Some(Point::new(x, y))
    }

    /// The segment of this line visible inside a `width` x `height` image.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<(Point, Point)> {
        let (w, h) = (width as f64, height as f64);
        let mut hits: Vec<Point> = Vec::with_capacity(4);

        for x in [0.0, w] {
            if let Some(y) = self.y_at(x).filter(|y| (0.0..=h).contains(y)) {
                hits.push(Point::new(x, y));
            }
        }
        for y in [0.0, h] {
            if let Some(x) = self.x_at(y).filter(|x| (0.0..=w).contains(x)) {
                hits.push(Point::new(x, y));
            }
        }

        // A line through a corner of the frame is hit twice at the same spot.
        let first = *hits.first()?;
        let second = hits
            .iter()
            .copied()
            .max_by(|a, b| first.distance(a).total_cmp(&first.distance(b)))?;
        (first.distance(&second) > 0.0).then_some((first, second))
    }
}

// -- Corner set ---------------------------------------------------------------

/// Four document corners in (top-left, top-right, bottom-left, bottom-right)
/// order.
///
/// Only constructible from points that form a non-degenerate convex
/// quadrilateral; the ordering is derived from the geometry, never from the
/// order the points were supplied in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CornerSet {
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    bottom_right: Point,
}

impl CornerSet {
    /// Order four arbitrary points and validate that they form a convex quad.
    pub fn from_points(points: [Point; 4]) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(FlatpageError::InvalidInput(format!(
                "corner coordinates must be finite, got ({}, {})",
                bad.x, bad.y
            )));
        }

        let cyclic = clockwise_from_top_left(points);
        if !is_strictly_convex(&cyclic) {
            return Err(FlatpageError::Geometry(
                "corners do not form a convex quadrilateral".into(),
            ));
        }

        let [top_left, top_right, bottom_right, bottom_left] = cyclic;
        Ok(Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        })
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn top_right(&self) -> Point {
        self.top_right
    }

    pub fn bottom_left(&self) -> Point {
        self.bottom_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    /// Corners as `[top_left, top_right, bottom_left, bottom_right]`.
    pub fn points(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Corners in clockwise drawing order, starting at top-left.
    pub fn polygon(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn top_width(&self) -> f64 {
        self.top_left.distance(&self.top_right)
    }

    pub fn bottom_width(&self) -> f64 {
        self.bottom_left.distance(&self.bottom_right)
    }

    pub fn left_height(&self) -> f64 {
        self.top_left.distance(&self.bottom_left)
    }

    pub fn right_height(&self) -> f64 {
        self.top_right.distance(&self.bottom_right)
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f64 {
        shoelace_area(&self.polygon())
    }

    /// Largest per-corner distance to `other`, after matching corners by role.
    pub fn max_corner_distance(&self, other: &CornerSet) -> f64 {
        self.points()
            .iter()
            .zip(other.points().iter())
            .map(|(a, b)| a.distance(b))
            .fold(0.0, f64::max)
    }
}

/// Area of a simple polygon given in drawing order.
pub fn shoelace_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    let mut twice = 0.0;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() / 2.0
}

/// Sort four points clockwise (on screen) around their centroid and rotate
/// the cycle so it starts at the top-left corner.
///
/// The top edge is the edge with the smallest mean y, ties going to the one
/// further left; its first vertex in clockwise order is the top-left corner.
fn clockwise_from_top_left(points: [Point; 4]) -> [Point; 4] {
    let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;

    let mut cyclic = points;
    // With y pointing down, increasing atan2 is clockwise on screen.
    cyclic.sort_by(|a, b| {
        let ta = (a.y - cy).atan2(a.x - cx);
        let tb = (b.y - cy).atan2(b.x - cx);
        ta.total_cmp(&tb)
    });

    let edge_key = |i: usize| {
        let (a, b) = (cyclic[i], cyclic[(i + 1) % 4]);
        ((a.y + b.y) / 2.0, (a.x + b.x) / 2.0)
    };
    let start = (0..4)
        .min_by(|&i, &j| {
            let (yi, xi) = edge_key(i);
            let (yj, xj) = edge_key(j);
            yi.total_cmp(&yj).then(xi.total_cmp(&xj))
        })
        .unwrap_or(0);

    cyclic.rotate_left(start);
    cyclic
}

/// True when the polygon turns the same way at every vertex and encloses area.
fn is_strictly_convex(polygon: &[Point; 4]) -> bool {
    let scale = polygon
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(1.0, f64::max);
    let eps = 1e-12 * scale * scale;

    let mut sign = 0.0;
    for i in 0..4 {
        let (a, b, c) = (polygon[i], polygon[(i + 1) % 4], polygon[(i + 2) % 4]);
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() <= eps {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    shoelace_area(polygon) > eps
}

// -- Projective transform -----------------------------------------------------

/// A 3x3 projective transform acting on homogeneous image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformMatrix {
    rows: [[f64; 3]; 3],
}

impl TransformMatrix {
    pub fn identity() -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        self.rows
    }

    /// Row-major single precision copy, the layout imageproc expects.
    pub fn to_row_major_f32(&self) -> [f32; 9] {
        let r = &self.rows;
        [
            r[0][0] as f32,
            r[0][1] as f32,
            r[0][2] as f32,
            r[1][0] as f32,
            r[1][1] as f32,
            r[1][2] as f32,
            r[2][0] as f32,
            r[2][1] as f32,
            r[2][2] as f32,
        ]
    }

    fn matrix(&self) -> Matrix3<f64> {
        let r = &self.rows;
        Matrix3::new(
            r[0][0], r[0][1], r[0][2], //
            r[1][0], r[1][1], r[1][2], //
            r[2][0], r[2][1], r[2][2],
        )
    }

    fn from_matrix(m: Matrix3<f64>) -> Option<Self> {
        let s = m[(2, 2)];
        if !s.is_finite() || s.abs() < 1e-12 {
            return None;
        }
        let m = m / s;
        if m.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self::from_rows([
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]))
    }

    /// Solve for the transform mapping `src[i]` onto `dst[i]` for all four pairs.
    ///
    /// Returns `None` when the correspondences are degenerate (three collinear
    /// points on either side) and no invertible transform exists.
    pub fn from_correspondences(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        if has_collinear_triple(src) || has_collinear_triple(dst) {
            return None;
        }
        let (src_n, t_src) = normalize_points(src);
        let (dst_n, t_dst) = normalize_points(dst);

        // Unknowns h11..h32 with h33 = 1:
        //   h11 x + h12 y + h13 - u h31 x - u h32 y = u
        //   h21 x + h22 y + h23 - v h31 x - v h32 y = v
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for k in 0..4 {
            let (x, y) = (src_n[k].x, src_n[k].y);
            let (u, v) = (dst_n[k].x, dst_n[k].y);

            let r0 = 2 * k;
            a[(r0, 0)] = x;
            a[(r0, 1)] = y;
            a[(r0, 2)] = 1.0;
            a[(r0, 6)] = -u * x;
            a[(r0, 7)] = -u * y;
            b[r0] = u;

            let r1 = r0 + 1;
            a[(r1, 3)] = x;
            a[(r1, 4)] = y;
            a[(r1, 5)] = 1.0;
            a[(r1, 6)] = -v * x;
            a[(r1, 7)] = -v * y;
            b[r1] = v;
        }

        let h = a.lu().solve(&b)?;
        let hn = Matrix3::new(
            h[0], h[1], h[2], //
            h[3], h[4], h[5], //
            h[6], h[7], 1.0,
        );

        // Undo the conditioning: H = T_dst^-1 * Hn * T_src
        let full = t_dst.try_inverse()? * hn * t_src;
        if full.determinant().abs() < 1e-12 {
            return None;
        }
        Self::from_matrix(full)
    }

    /// Map a point through the transform. `None` if it lands at infinity.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let v = self.matrix() * Vector3::new(p.x, p.y, 1.0);
        if v[2].abs() < 1e-12 {
            return None;
        }
        let mapped = Point::new(v[0] / v[2], v[1] / v[2]);
        mapped.is_finite().then_some(mapped)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix().try_inverse().and_then(Self::from_matrix)
    }
}

/// True when any three of the points are (nearly) collinear.
fn has_collinear_triple(pts: &[Point; 4]) -> bool {
    let scale = pts
        .iter()
        .flat_map(|a| pts.iter().map(move |b| a.distance(b)))
        .fold(0.0, f64::max);
    if !(scale > 0.0) {
        return true;
    }
    [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)].iter().any(|&(i, j, k)| {
        let (a, b, c) = (pts[i], pts[j], pts[k]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        cross.abs() <= 1e-9 * scale * scale
    })
}

/// Hartley conditioning: move the centroid to the origin and scale so the
/// mean distance from it is sqrt(2).
fn normalize_points(pts: &[Point; 4]) -> ([Point; 4], Matrix3<f64>) {
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / 4.0;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts.map(|p| Point::new(s * (p.x - cx), s * (p.y - cy)));
    (out, t)
}
