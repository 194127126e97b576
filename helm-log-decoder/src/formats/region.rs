//! Region and marker side file
//!
//! Line-oriented text describing the search region polygon and points of
//! interest (fires):
//!
//! ```text
//! poly = label=search_area, pts={0,0:400,0:400,300:0,300}
//! fire = name=f01, x=120, y=45
//! fire = x=300, y=210
//! ```
//!
//! Other lines are ignored. When several `poly` lines are present the last
//! one wins.

use crate::streams::path::{keyed_braced_body, parse_point_list};
use crate::types::{parse_real, Point, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Closed polygon ring (the last vertex implicitly connects to the first)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    /// Vertices with the first one repeated at the end
    pub fn closed_ring(&self) -> Vec<Point> {
        let mut ring = self.vertices.clone();
        if let Some(&first) = self.vertices.first() {
            ring.push(first);
        }
        ring
    }
}

/// A named point of interest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// Empty when the file gives no name
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Parsed contents of a region file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionFile {
    pub polygon: Option<Polygon>,
    pub markers: Vec<Marker>,
}

impl RegionFile {
    /// Read and parse a region file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_str(&content))
    }

    /// Parse region file text
    pub fn parse_str(content: &str) -> Self {
        let mut region = Self::default();
        for line in content.lines() {
            region.parse_line(line);
        }
        region
    }

    fn parse_line(&mut self, line: &str) {
        let line = line.trim();

        if let Some(rest) = record_body(line, "poly") {
            if !rest.contains("pts=") {
                return;
            }
            match keyed_braced_body(rest, "pts=").and_then(parse_point_list) {
                Some(vertices) => self.polygon = Some(Polygon { vertices }),
                None => log::warn!("Ignoring region polygon with bad point list: {}", line),
            }
        } else if let Some(rest) = record_body(line, "fire") {
            match parse_marker(rest) {
                Some(marker) => self.markers.push(marker),
                None => log::debug!("Ignoring fire line without x/y: {}", line),
            }
        }
    }
}

/// Read a region file, degrading to `(None, None)` if it cannot be read
///
/// A readable file always yields `Some` markers (possibly empty); the
/// polygon is `None` if no valid `poly` line was found.
pub fn read_region_file(path: &Path) -> (Option<Polygon>, Option<Vec<Marker>>) {
    match RegionFile::load(path) {
        Ok(region) => {
            log::debug!(
                "Region file {:?}: polygon={}, {} markers",
                path,
                region.polygon.is_some(),
                region.markers.len()
            );
            (region.polygon, Some(region.markers))
        }
        Err(e) => {
            log::warn!("Could not read region file {:?}: {}", path, e);
            (None, None)
        }
    }
}

/// Text after `<kind> =`, or `None` if the line is another record kind
fn record_body<'a>(line: &'a str, kind: &str) -> Option<&'a str> {
    line.strip_prefix(kind)?.trim_start().strip_prefix('=')
}

/// Parse `x=<num>, y=<num>[, name=<token>]` in any order
fn parse_marker(body: &str) -> Option<Marker> {
    let mut x = None;
    let mut y = None;
    let mut name = None;

    for field in body.split(',') {
        let Some((key, value)) = field.split_once('=') else {
            continue;
        };
        match key.trim() {
            "x" => x = x.or_else(|| parse_real(value)),
            "y" => y = y.or_else(|| parse_real(value)),
            "name" => name = name.or_else(|| Some(word_token(value))),
            _ => {}
        }
    }

    Some(Marker {
        name: name.unwrap_or_default(),
        x: x?,
        y: y?,
    })
}

/// Leading run of word characters (`[A-Za-z0-9_]`)
fn word_token(value: &str) -> String {
    value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
