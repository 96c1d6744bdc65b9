use geo::{Coord, LineString, Rect};

/// Flat conversion factor between lon/lat degrees and meters.
///
/// This is the latitude-only approximation; it overestimates longitudinal
/// distances away from the equator, which makes the distance score slightly
/// stricter there. Acceptable for corridor-scale matching.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Minimum bounding-box expansion, in degrees (~110 m).
const MIN_EXPANSION_DEG: f64 = 0.001;

/// Expands a query bounding box for the candidate prefilter.
///
/// Each axis grows by the larger of [`MIN_EXPANSION_DEG`] and 10% of the
/// box extent on that axis, so that short corridors still capture nearby
/// edges and long corridors scale their slack proportionally.
pub(crate) fn expand_rect(rect: Rect<f64>) -> Rect<f64> {
    let dx = MIN_EXPANSION_DEG.max(rect.width() * 0.1);
    let dy = MIN_EXPANSION_DEG.max(rect.height() * 0.1);
    Rect::new(
        Coord {
            x: rect.min().x - dx,
            y: rect.min().y - dy,
        },
        Coord {
            x: rect.max().x + dx,
            y: rect.max().y + dy,
        },
    )
}

/// Whether an edge with the given endpoints is a prefilter candidate.
///
/// An edge qualifies if either endpoint lies inside the expanded box, or if
/// the endpoint pair straddles the box in both latitude and longitude (a
/// long edge crossing the box without a vertex inside it).
pub(crate) fn is_candidate(rect: &Rect<f64>, start: Coord<f64>, end: Coord<f64>) -> bool {
    if contains(rect, start) || contains(rect, end) {
        return true;
    }
    let straddles_lon = (start.x < rect.min().x && end.x > rect.max().x)
        || (end.x < rect.min().x && start.x > rect.max().x);
    let straddles_lat = (start.y < rect.min().y && end.y > rect.max().y)
        || (end.y < rect.min().y && start.y > rect.max().y);
    straddles_lon && straddles_lat
}

fn contains(rect: &Rect<f64>, c: Coord<f64>) -> bool {
    c.x >= rect.min().x && c.x <= rect.max().x && c.y >= rect.min().y && c.y <= rect.max().y
}

/// The absolute cosine of the angle between the start→end headings of two
/// polylines.
///
/// Undirected on purpose: a corridor digitized against the direction of
/// travel still describes the same road. Returns the neutral value `0.5`
/// when either polyline is degenerate (fewer than two points, or zero
/// start→end extent).
pub(crate) fn direction_cosine(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    const NEUTRAL: f64 = 0.5;
    let (Some(va), Some(vb)) = (heading(a), heading(b)) else {
        return NEUTRAL;
    };
    let dot = va.x * vb.x + va.y * vb.y;
    let norms = (va.x * va.x + va.y * va.y).sqrt() * (vb.x * vb.x + vb.y * vb.y).sqrt();
    (dot / norms).abs()
}

fn heading(line: &LineString<f64>) -> Option<Coord<f64>> {
    let first = line.0.first()?;
    let last = line.0.last()?;
    let v = Coord {
        x: last.x - first.x,
        y: last.y - first.y,
    };
    // A loop (or a single repeated point) has no usable heading.
    if (v.x * v.x + v.y * v.y) <= f64::EPSILON {
        return None;
    }
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn expansion_has_a_floor() {
        let rect = Rect::new(Coord { x: 32.0, y: 37.0 }, Coord { x: 32.001, y: 37.001 });
        let expanded = expand_rect(rect);
        // 10% of 0.001 degrees is far below the floor.
        assert!((expanded.min().x - 31.999).abs() < 1e-9);
        assert!((expanded.max().y - 37.002).abs() < 1e-9);
    }

    #[test]
    fn expansion_scales_with_extent() {
        let rect = Rect::new(Coord { x: 32.0, y: 37.0 }, Coord { x: 33.0, y: 37.0 });
        let expanded = expand_rect(rect);
        assert!((expanded.min().x - 31.9).abs() < 1e-9);
        assert!((expanded.max().x - 33.1).abs() < 1e-9);
        // The latitude extent is zero, so the floor applies there.
        assert!((expanded.min().y - 36.999).abs() < 1e-9);
    }

    #[test]
    fn straddling_edge_is_a_candidate() {
        let rect = Rect::new(Coord { x: 32.0, y: 37.0 }, Coord { x: 32.01, y: 37.01 });
        // Neither endpoint inside, but the edge spans the box diagonally.
        assert!(is_candidate(
            &rect,
            Coord { x: 31.9, y: 36.9 },
            Coord { x: 32.1, y: 37.1 },
        ));
        // Spans longitude only: not a candidate.
        assert!(!is_candidate(
            &rect,
            Coord { x: 31.9, y: 37.005 },
            Coord { x: 32.1, y: 37.005 },
        ));
    }

    #[test]
    fn degenerate_polylines_get_the_neutral_direction() {
        let line = line_string![(x: 32.0, y: 37.0), (x: 32.01, y: 37.0)];
        let point = line_string![(x: 32.0, y: 37.0)];
        let class_loop = line_string![(x: 32.0, y: 37.0), (x: 32.01, y: 37.01), (x: 32.0, y: 37.0)];

        assert_eq!(direction_cosine(&line, &point), 0.5);
        assert_eq!(direction_cosine(&class_loop, &line), 0.5);
    }

    #[test]
    fn opposite_headings_match_exactly() {
        let east = line_string![(x: 32.0, y: 37.0), (x: 32.01, y: 37.0)];
        let west = line_string![(x: 32.01, y: 37.0), (x: 32.0, y: 37.0)];
        let north = line_string![(x: 32.0, y: 37.0), (x: 32.0, y: 37.01)];

        assert!((direction_cosine(&east, &west) - 1.0).abs() < 1e-12);
        assert!(direction_cosine(&east, &north).abs() < 1e-12);
    }
}
