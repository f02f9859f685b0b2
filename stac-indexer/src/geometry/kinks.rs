//! Ring self-intersection detection.

use stac_indexer_shared::Position;

/// Count the crossings between non-adjacent segments of a ring.
///
/// The ring is treated as closed whether or not its last vertex repeats the
/// first. Consecutive duplicate vertices are collapsed before segments are
/// built. Touching and collinear overlap count as crossings; segments that are
/// neighbours along the ring (including last/first) are never compared.
pub fn ring_crossings(ring: &[Position]) -> usize {
    let mut vertices: Vec<Position> = Vec::with_capacity(ring.len());
    for &position in ring {
        if vertices.last() != Some(&position) {
            vertices.push(position);
        }
    }
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    let count = vertices.len();
    if count < 4 {
        return 0;
    }

    let segment = |i: usize| (vertices[i], vertices[(i + 1) % count]);

    let mut crossings = 0;
    for i in 0..count {
        // j > i + 1 skips the following neighbour; the last/first pair is
        // skipped explicitly.
        for j in (i + 2)..count {
            if i == 0 && j == count - 1 {
                continue;
            }
            let (a, b) = segment(i);
            let (c, d) = segment(j);
            if segments_intersect(a, b, c, d) {
                crossings += 1;
            }
        }
    }
    crossings
}

fn orientation(p: Position, q: Position, r: Position) -> f64 {
    (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
}

/// Whether `q` lies within the bounding box of segment `p`-`r`.
fn on_segment(p: Position, q: Position, r: Position) -> bool {
    q[0] >= p[0].min(r[0]) && q[0] <= p[0].max(r[0]) && q[1] >= p[1].min(r[1]) && q[1] <= p[1].max(r[1])
}

fn segments_intersect(a: Position, b: Position, c: Position, d: Position) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if ((o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0)) && ((o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0)) {
        return true;
    }

    (o1 == 0.0 && on_segment(a, c, b))
        || (o2 == 0.0 && on_segment(a, d, b))
        || (o3 == 0.0 && on_segment(c, a, d))
        || (o4 == 0.0 && on_segment(c, b, d))
}
