//! Closed race track and its derived boundary geometry.
//!
//! The persisted record holds only waypoints, start, stop and box size.
//! Boundary segments and the start/stop boxes are recomputed on every edit.

use std::io::ErrorKind;
use std::path::Path;

use geo::{Coord, coord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::Result;
use super::geometric_utils::{BoundarySegment, is_point_in_polygon, square_around};

/// Persisted track record.
///
/// Coordinates are normalized to `[0, 1]` on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackData {
    /// Closed centerline polygon.
    pub centerpath: Vec<Coord<f64>>,
    /// Center of the start box.
    pub start: Coord<f64>,
    /// Center of the stop box.
    pub stop: Coord<f64>,
    /// Side length of the start and stop boxes.
    #[serde(rename = "boxSize")]
    pub box_size: f64,
}

impl Default for TrackData {
    fn default() -> Self {
        Self {
            centerpath: Vec::new(),
            start: coord! { x: 0.1, y: 0.1 },
            stop: coord! { x: 0.9, y: 0.9 },
            box_size: 0.1,
        }
    }
}

/// A track with its derived geometry kept in sync with its waypoints.
///
/// Edits take `&mut self`, so no racecar can read the segments while they are
/// being rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    data: TrackData,
    segments: Vec<BoundarySegment>,
    start_box: Vec<Coord<f64>>,
    stop_box: Vec<Coord<f64>>,
}

impl Default for Track {
    fn default() -> Self {
        Self::new(TrackData::default())
    }
}

impl Track {
    /// Builds a track and its derived geometry from a record.
    pub fn new(data: TrackData) -> Self {
        let mut track = Self {
            data,
            segments: Vec::new(),
            start_box: Vec::new(),
            stop_box: Vec::new(),
        };
        track.rebuild_segments();
        track.rebuild_boxes();
        track
    }

    /// Loads a track record from a JSON file.
    ///
    /// A missing file yields the default track. Any other read failure, or a
    /// file that does not parse, is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored track, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let data: TrackData = serde_json::from_str(&json)?;
        Ok(Self::new(data))
    }

    /// Saves the track record to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(&self.data)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The persisted record.
    pub fn data(&self) -> &TrackData {
        &self.data
    }

    /// Centerline waypoints.
    pub fn waypoints(&self) -> &[Coord<f64>] {
        &self.data.centerpath
    }

    /// Boundary segments, one per waypoint including the closing edge.
    pub fn segments(&self) -> &[BoundarySegment] {
        &self.segments
    }

    /// Where racecars start.
    pub fn start(&self) -> Coord<f64> {
        self.data.start
    }

    /// Where racecars finish.
    pub fn stop(&self) -> Coord<f64> {
        self.data.stop
    }

    /// Corners of the start box.
    pub fn start_box(&self) -> &[Coord<f64>] {
        &self.start_box
    }

    /// Corners of the stop box.
    pub fn stop_box(&self) -> &[Coord<f64>] {
        &self.stop_box
    }

    /// Whether `p` lies in the start box.
    pub fn in_start_box(&self, p: Coord<f64>) -> bool {
        is_point_in_polygon(&self.start_box, p)
    }

    /// Whether `p` lies in the stop box.
    pub fn in_stop_box(&self, p: Coord<f64>) -> bool {
        is_point_in_polygon(&self.stop_box, p)
    }

    /// Whether `p` lies inside the centerline polygon.
    ///
    /// This treats the raw centerline as the drivable region rather than a
    /// corridor around it.
    pub fn on_track(&self, p: Coord<f64>) -> bool {
        is_point_in_polygon(&self.data.centerpath, p)
    }

    /// Appends a waypoint to the centerline.
    pub fn add_waypoint(&mut self, p: Coord<f64>) {
        self.data.centerpath.push(p);
        self.rebuild_segments();
    }

    /// Replaces the whole centerline.
    pub fn set_waypoints(&mut self, waypoints: Vec<Coord<f64>>) {
        self.data.centerpath = waypoints;
        self.rebuild_segments();
    }

    /// Moves the start box.
    pub fn set_start(&mut self, p: Coord<f64>) {
        self.data.start = p;
        self.rebuild_boxes();
    }

    /// Moves the stop box.
    pub fn set_stop(&mut self, p: Coord<f64>) {
        self.data.stop = p;
        self.rebuild_boxes();
    }

    fn rebuild_segments(&mut self) {
        let path = &self.data.centerpath;
        self.segments = (0..path.len())
            .map(|i| BoundarySegment::new(path[i], path[(i + 1) % path.len()]))
            .collect();
    }

    fn rebuild_boxes(&mut self) {
        let half = self.data.box_size / 2.0;
        self.start_box = square_around(self.data.start, half);
        self.stop_box = square_around(self.data.stop, half);
    }
}
