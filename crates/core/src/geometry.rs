// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hazard geometry and the intersection test used by spatial queries.
//!
//! Coordinates are planar lon/lat pairs. Only the non-empty-intersection
//! predicate lives here; shaping hazard areas is someone else's job.

use serde::{Deserialize, Serialize};

/// A lon/lat pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Geometry of a hazard area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Point { coordinate: Coordinate },
    /// Outer ring; closing the ring is implicit
    Polygon { ring: Vec<Coordinate> },
    Collection { members: Vec<Geometry> },
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl Bounds {
    fn overlaps(&self, other: &Bounds) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinate: Coordinate::new(lon, lat),
        }
    }

    pub fn polygon(ring: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Geometry::Polygon {
            ring: ring
                .into_iter()
                .map(|(lon, lat)| Coordinate::new(lon, lat))
                .collect(),
        }
    }

    /// True when the geometry covers no points at all
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point { .. } => false,
            Geometry::Polygon { ring } => ring.is_empty(),
            Geometry::Collection { members } => members.iter().all(Geometry::is_empty),
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        let mut coords = self.coordinates().into_iter();
        let first = coords.next()?;
        let init = Bounds {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        Some(coords.fold(init, |b, c| Bounds {
            min_lon: b.min_lon.min(c.lon),
            min_lat: b.min_lat.min(c.lat),
            max_lon: b.max_lon.max(c.lon),
            max_lat: b.max_lat.max(c.lat),
        }))
    }

    fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            Geometry::Point { coordinate } => vec![*coordinate],
            Geometry::Polygon { ring } => ring.clone(),
            Geometry::Collection { members } => {
                members.iter().flat_map(Geometry::coordinates).collect()
            }
        }
    }

    /// Non-empty intersection test (touching counts, containment not required)
    pub fn intersects(&self, other: &Geometry) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) if a.overlaps(&b) => {}
            _ => return false,
        }

        match (self, other) {
            (Geometry::Collection { members }, _) => members.iter().any(|m| m.intersects(other)),
            (_, Geometry::Collection { members }) => members.iter().any(|m| self.intersects(m)),
            (Geometry::Point { coordinate: a }, Geometry::Point { coordinate: b }) => a == b,
            (Geometry::Point { coordinate }, Geometry::Polygon { ring })
            | (Geometry::Polygon { ring }, Geometry::Point { coordinate }) => {
                ring_covers(ring, *coordinate)
            }
            (Geometry::Polygon { ring: a }, Geometry::Polygon { ring: b }) => rings_intersect(a, b),
        }
    }
}

fn edges(ring: &[Coordinate]) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Point inside the ring or on its boundary
fn ring_covers(ring: &[Coordinate], p: Coordinate) -> bool {
    if ring.is_empty() {
        return false;
    }
    if edges(ring).any(|(a, b)| on_segment(a, b, p)) {
        return true;
    }
    // Even-odd ray cast towards +lon
    let mut inside = false;
    for (a, b) in edges(ring) {
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let cross_lon = a.lon + (p.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
            if p.lon < cross_lon {
                inside = !inside;
            }
        }
    }
    inside
}

fn rings_intersect(a: &[Coordinate], b: &[Coordinate]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let crossing =
        edges(a).any(|(p1, p2)| edges(b).any(|(q1, q2)| segments_intersect(p1, p2, q1, q2)));
    // No boundary crossing: one ring is either nested inside the other or disjoint
    crossing || ring_covers(a, b[0]) || ring_covers(b, a[0])
}

fn orientation(a: Coordinate, b: Coordinate, c: Coordinate) -> f64 {
    (b.lon - a.lon) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lon - a.lon)
}

fn on_segment(a: Coordinate, b: Coordinate, p: Coordinate) -> bool {
    orientation(a, b, p) == 0.0
        && p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

fn segments_intersect(p1: Coordinate, p2: Coordinate, q1: Coordinate, q2: Coordinate) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    on_segment(q1, q2, p1)
        || on_segment(q1, q2, p2)
        || on_segment(p1, p2, q1)
        || on_segment(p1, p2, q2)
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
