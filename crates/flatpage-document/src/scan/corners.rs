// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner selection — pick the page quadrilateral out of the detected lines.
//
// Lines are split into the two dominant orientations found in the image,
// whatever the page rotation. Every pair of lines from one orientation is
// combined with every pair from the other; the four intersections form a
// candidate quadrilateral whose corner roles come from their geometry. The
// candidates that pass the acceptance checks compete on area, and among
// candidates of comparable area the one whose edges deviate least from the
// dominant orientations wins.

use std::cmp::Ordering;

use flatpage_core::config::CornerParams;
use flatpage_core::error::FlatpageError;
use flatpage_core::types::{CornerSet, HoughLine, Point, angle_between_deg};
use thiserror::Error;
use tracing::{debug, instrument};

use super::lines::sort_by_strength;

/// No acceptable page quadrilateral could be formed from the detected lines.
///
/// Callers of the detection engine see this as
/// [`FlatpageError::DocumentNotFound`] carrying the same message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CornersNotFound {
    pub message: String,
}

impl CornersNotFound {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<CornersNotFound> for FlatpageError {
    fn from(err: CornersNotFound) -> Self {
        FlatpageError::DocumentNotFound(err.message)
    }
}

/// Kernel half-width (degrees) used to smooth the orientation histogram.
const PEAK_KERNEL_DEG: f64 = 10.0;
/// Assignment rounds when refining the orientation centres.
const MAX_REFINE_ITERS: usize = 10;

/// Lines split into the two dominant orientations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineClusters {
    /// Normal angle (degrees, `[0, 180)`) at the centre of each group.
    pub centers_deg: [f64; 2],
    /// Group 0 is the one whose lines are closer to horizontal.
    pub groups: [Vec<HoughLine>; 2],
}

/// Split lines into the two dominant orientations.
///
/// The first centre is the highest peak of a vote-weighted histogram of
/// normal angles; the second is the highest peak at least
/// `min_separation_deg` away from it. Lines are then assigned to the nearer
/// centre and the centres re-estimated until the assignment settles. Lines
/// further than `angle_tolerance_deg` from both centres are dropped.
pub fn cluster_lines(
    lines: &[HoughLine],
    angle_tolerance_deg: f64,
    min_separation_deg: f64,
) -> LineClusters {
    let Some(first) = histogram_peak(lines, |_| true) else {
        return LineClusters::default();
    };
    let second = histogram_peak(lines, |phi| angle_between_deg(phi, first) >= min_separation_deg);
    let Some(second) = second else {
        // Only one orientation: everything near it forms a single group.
        let group: Vec<HoughLine> = lines
            .iter()
            .filter(|l| angle_between_deg(l.angle_deg, first) <= angle_tolerance_deg)
            .copied()
            .collect();
        return ordered(
            [first, (first + 90.0).rem_euclid(180.0)],
            [group, Vec::new()],
        );
    };

    let mut centers = [first, second];
    let mut labels: Vec<Option<usize>> = vec![None; lines.len()];
    for _ in 0..MAX_REFINE_ITERS {
        let mut changed = false;
        for (label, line) in labels.iter_mut().zip(lines) {
            let d0 = angle_between_deg(line.angle_deg, centers[0]);
            let d1 = angle_between_deg(line.angle_deg, centers[1]);
            let (nearest, dist) = if d0 <= d1 { (0, d0) } else { (1, d1) };
            let new_label = (dist <= angle_tolerance_deg).then_some(nearest);
            if *label != new_label {
                *label = new_label;
                changed = true;
            }
        }

        for (k, center) in centers.iter_mut().enumerate() {
            let members: Vec<HoughLine> = lines
                .iter()
                .zip(&labels)
                .filter(|(_, label)| **label == Some(k))
                .map(|(line, _)| *line)
                .collect();
            if let Some(mean) = dominant_normal_deg(&members) {
                *center = mean;
            }
        }
        if !changed {
            break;
        }
    }

    let mut groups = [Vec::new(), Vec::new()];
    for (line, label) in lines.iter().zip(&labels) {
        if let Some(k) = label {
            groups[*k].push(*line);
        }
    }
    ordered(centers, groups)
}

/// Put the group whose lines are closer to horizontal (normal near 90°) first.
fn ordered(centers: [f64; 2], groups: [Vec<HoughLine>; 2]) -> LineClusters {
    let [c0, c1] = centers;
    let [g0, g1] = groups;
    let flatness = |c: f64| angle_between_deg(c, 90.0);
    if flatness(c1) < flatness(c0) || (flatness(c1) == flatness(c0) && c1 < c0) {
        LineClusters {
            centers_deg: [c1, c0],
            groups: [g1, g0],
        }
    } else {
        LineClusters {
            centers_deg: [c0, c1],
            groups: [g0, g1],
        }
    }
}

/// Highest point of the smoothed orientation histogram among the angles
/// `allowed` accepts, scanned in whole degrees. Earlier angles win ties.
fn histogram_peak(lines: &[HoughLine], allowed: impl Fn(f64) -> bool) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for step in 0..180 {
        let phi = step as f64;
        if !allowed(phi) {
            continue;
        }
        let weight: f64 = lines
            .iter()
            .map(|l| {
                let d = angle_between_deg(l.angle_deg, phi);
                l.votes.max(1) as f64 * (1.0 - d / PEAK_KERNEL_DEG).max(0.0)
            })
            .sum();
        if weight > 0.0 && best.is_none_or(|(_, w)| weight > w) {
            best = Some((phi, weight));
        }
    }
    best.map(|(phi, _)| phi)
}

/// Vote-weighted mean normal angle of a set of lines, in `[0, 180)` degrees.
///
/// Normals are undirected, so the mean is taken over doubled angles.
pub fn dominant_normal_deg(lines: &[HoughLine]) -> Option<f64> {
    let (mut s, mut c) = (0.0, 0.0);
    for line in lines {
        let doubled = (2.0 * line.angle_deg).to_radians();
        let weight = line.votes.max(1) as f64;
        s += weight * doubled.sin();
        c += weight * doubled.cos();
    }
    if s.abs() < 1e-12 && c.abs() < 1e-12 {
        return None;
    }
    Some((s.atan2(c).to_degrees() / 2.0).rem_euclid(180.0))
}

/// A quadrilateral that passed every acceptance check.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    corners: CornerSet,
    area: f64,
    /// Summed angular deviation (degrees) of the four edges from their
    /// group's dominant orientation.
    residual: f64,
}

/// Choose the four page corners from the detected lines.
///
/// `width` and `height` are the dimensions of the image the lines were
/// detected in; they scale the area threshold and bound where corners may lie.
#[instrument(skip_all, fields(lines = lines.len(), width, height))]
pub fn select_corners(
    lines: &[HoughLine],
    width: u32,
    height: u32,
    params: &CornerParams,
) -> Result<CornerSet, CornersNotFound> {
    if lines.is_empty() {
        return Err(CornersNotFound::new("no straight lines were detected"));
    }

    let clusters = cluster_lines(
        lines,
        params.angle_tolerance_deg as f64,
        params.min_separation_deg as f64,
    );
    let [first, second] = &clusters.groups;
    debug!(
        first = first.len(),
        second = second.len(),
        first_deg = clusters.centers_deg[0],
        second_deg = clusters.centers_deg[1],
        "Lines clustered"
    );
    if first.len() < 2 || second.len() < 2 {
        return Err(CornersNotFound::new(format!(
            "found {} and {} boundary lines in the two dominant orientations, need at least 2 of each",
            first.len(),
            second.len()
        )));
    }

    let (w, h) = (width as f64, height as f64);
    let centre = Point::new(w / 2.0, h / 2.0);
    let [first_deg, second_deg] = clusters.centers_deg;
    let across = strongest_by_position(first, params.max_lines_per_cluster, first_deg, centre);
    let along = strongest_by_position(second, params.max_lines_per_cluster, second_deg, centre);

    let min_area = params.min_area_ratio * w * h;
    let (margin_x, margin_y) = (params.border_margin_ratio * w, params.border_margin_ratio * h);
    let inside = |x: f64, y: f64| {
        (-margin_x..=w + margin_x).contains(&x) && (-margin_y..=h + margin_y).contains(&y)
    };

    let mut candidates = Vec::new();
    let mut considered = 0usize;
    for (i, a) in across.iter().enumerate() {
        for b in &across[i + 1..] {
            for (k, c) in along.iter().enumerate() {
                for d in &along[k + 1..] {
                    considered += 1;

                    let corners = [a.intersect(c), a.intersect(d), b.intersect(c), b.intersect(d)];
                    let Some(points) = all_some(corners) else {
                        continue;
                    };
                    if !points.iter().all(|p| inside(p.x, p.y)) {
                        continue;
                    }
                    let Ok(set) = CornerSet::from_points(points) else {
                        continue;
                    };

                    let area = set.area();
                    if area < min_area {
                        continue;
                    }
                    if side_ratio(&set) > params.max_side_ratio {
                        continue;
                    }

                    candidates.push(Candidate {
                        corners: set,
                        area,
                        residual: edge_residual([a, b], first_deg, [c, d], second_deg),
                    });
                }
            }
        }
    }

    debug!(considered, accepted = candidates.len(), "Quadrilateral candidates evaluated");

    let best = pick_best(&candidates, params.area_tie_ratio).ok_or_else(|| {
        CornersNotFound::new(format!(
            "none of the {considered} candidate quadrilaterals had enough area, \
             convexity and a plausible aspect"
        ))
    })?;

    debug!(
        area = best.area,
        residual = best.residual,
        top_left = ?best.corners.top_left(),
        bottom_right = ?best.corners.bottom_right(),
        "Page corners selected"
    );
    Ok(best.corners)
}

/// Keep the `limit` strongest lines, then order them by their offset from
/// `centre` measured along the group's normal at `center_deg`.
fn strongest_by_position(
    lines: &[HoughLine],
    limit: usize,
    center_deg: f64,
    centre: Point,
) -> Vec<HoughLine> {
    let mut strongest = lines.to_vec();
    sort_by_strength(&mut strongest);

    let (ref_sin, ref_cos) = center_deg.to_radians().sin_cos();
    let mut placed: Vec<(f64, HoughLine)> = strongest
        .into_iter()
        .take(limit)
        .map(|line| {
            let (sin, cos) = line.angle_deg.to_radians().sin_cos();
            // Normals of one group may point opposite ways across the seam.
            let sign = if sin * ref_sin + cos * ref_cos < 0.0 { -1.0 } else { 1.0 };
            (-sign * line.signed_distance(centre), line)
        })
        .collect();
    placed.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.votes.cmp(&a.1.votes)));
    placed.into_iter().map(|(_, line)| line).collect()
}

fn all_some<T: Copy>(items: [Option<T>; 4]) -> Option<[T; 4]> {
    Some([items[0]?, items[1]?, items[2]?, items[3]?])
}

/// Ratio of the longer to the shorter mean side length.
fn side_ratio(set: &CornerSet) -> f64 {
    let width = (set.top_width() + set.bottom_width()) / 2.0;
    let height = (set.left_height() + set.right_height()) / 2.0;
    width.max(height) / width.min(height)
}

/// Summed angular deviation of a candidate's four lines from the dominant
/// orientation of their group.
fn edge_residual(
    first_pair: [&HoughLine; 2],
    first_deg: f64,
    second_pair: [&HoughLine; 2],
    second_deg: f64,
) -> f64 {
    first_pair
        .iter()
        .map(|l| angle_between_deg(l.angle_deg, first_deg))
        .chain(second_pair.iter().map(|l| angle_between_deg(l.angle_deg, second_deg)))
        .sum()
}

/// Largest area wins; candidates within `tie_ratio` of the largest area are
/// ranked by residual first. Earlier candidates win exact ties.
fn pick_best(candidates: &[Candidate], tie_ratio: f64) -> Option<Candidate> {
    let max_area = candidates.iter().map(|c| c.area).fold(f64::NEG_INFINITY, f64::max);
    let floor = max_area * (1.0 - tie_ratio);

    candidates
        .iter()
        .filter(|c| c.area >= floor)
        .copied()
        .reduce(|best, c| {
            let order = c
                .residual
                .total_cmp(&best.residual)
                .then(best.area.total_cmp(&c.area));
            if order == Ordering::Less { c } else { best }
        })
}
