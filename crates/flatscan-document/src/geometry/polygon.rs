// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Closed-contour simplification. Area, arc length and the minimum-area
// rectangle come from `imageproc::geometry`; this module only replaces its
// closed-mode Douglas-Peucker, which anchors the ring at the first traced
// pixel and can pull a page corner several pixels along an edge.

use imageproc::point::Point;

/// Simplify a closed contour with the Douglas-Peucker algorithm.
///
/// The ring is split at two mutually distant vertices (the point farthest from
/// the first vertex, and the point farthest from that one), so the split
/// points are extreme points of the shape rather than an arbitrary start
/// vertex. Each half is then simplified as an open curve.
pub fn approximate_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, 0);
    let b = farthest_from(points, a);
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        return vec![points[start]];
    }

    let forward = &points[start..=end];
    let mut backward: Vec<Point<i32>> = points[end..].to_vec();
    backward.extend_from_slice(&points[..=start]);

    let mut result = simplify_open(forward, epsilon);
    result.pop();
    let mut tail = simplify_open(&backward, epsilon);
    tail.pop();
    result.extend(tail);
    result
}

fn distance(a: &Point<i32>, b: &Point<i32>) -> f64 {
    ((a.x - b.x) as f64).hypot((a.y - b.y) as f64)
}

/// Index of the vertex farthest from `points[from]`; the first one on ties.
fn farthest_from(points: &[Point<i32>], from: usize) -> usize {
    let origin = points[from];
    let mut best = from;
    let mut best_distance = 0.0;
    for (i, p) in points.iter().enumerate() {
        let d = distance(&origin, p);
        if d > best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

/// Douglas-Peucker on an open curve. Both endpoints are always kept.
fn simplify_open(curve: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if curve.len() < 3 {
        return curve.to_vec();
    }

    let mut keep = vec![false; curve.len()];
    keep[0] = true;
    keep[curve.len() - 1] = true;

    let mut stack = vec![(0usize, curve.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut split = first;
        let mut max_distance = -1.0;
        for i in first + 1..last {
            let d = distance_to_segment(&curve[i], &curve[first], &curve[last]);
            if d > max_distance {
                max_distance = d;
                split = i;
            }
        }
        if max_distance > epsilon {
            keep[split] = true;
            stack.push((first, split));
            stack.push((split, last));
        }
    }

    curve
        .iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(*p))
        .collect()
}

/// Distance from `p` to the segment `a`-`b` (to `a` when the segment is a point).
fn distance_to_segment(p: &Point<i32>, a: &Point<i32>, b: &Point<i32>) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / length_sq).clamp(0.0, 1.0);
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}
