//! # Marker Tracking
//!
//! Keeps the map's markers in step with the project list while touching only
//! what changed.
//!
//! ## Rules
//!
//! - One tracked marker per project id, ever. A handle is never duplicated.
//! - Unchanged content (same [`ContentHash`]) means no backend call at all.
//! - Changed content updates the existing marker in place. Position moves only
//!   beyond [`POSITION_EPSILON`] and the icon swaps only when the status changed.
//! - A project that drops out of the visible set is detached but keeps its
//!   handle, so toggling filters or a flapping record does not allocate.
//! - Only [`MarkerTracker::clear`] disposes handles.
//!
//! ## Usage
//!
//! ```rust
//! use powermason_dashboard::dashboard::reconcile::marker_tracker::MarkerTracker;
//! use powermason_dashboard::dashboard::render::headless::HeadlessMap;
//! use powermason_dashboard::shared::Project;
//!
//! let mut map = HeadlessMap::new();
//! let mut tracker = MarkerTracker::new();
//! let projects = vec![Project::new(1, "Bridge").with_coordinates("14.5,120.9")];
//!
//! let report = tracker.reconcile(&mut map, &projects);
//! assert_eq!(report.created, 1);
//! assert_eq!(tracker.visible_count(), 1);
//! ```

use crate::dashboard::render::{MapStats, MapSurface, MarkerHandle};
use crate::shared::geo::POSITION_EPSILON;
use crate::shared::{Coordinates, Project, ProjectStatus, RecordId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Digest of the project fields that affect a marker's appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash id, name, status, coordinates, location and progress
    pub fn of(project: &Project) -> Self {
        let mut hasher = blake3::Hasher::new();
        // Field separator so that ("ab", "c") and ("a", "bc") differ
        let mut field = |bytes: &[u8]| {
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };
        field(project.id.to_string().as_bytes());
        field(project.name.as_bytes());
        field(project.status.code().as_bytes());
        field(project.gps_coordinates.as_deref().unwrap_or_default().as_bytes());
        field(project.location.as_bytes());
        field(&project.progress.to_bits().to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Tracker entry for one project
#[derive(Debug)]
struct TrackedMarker {
    handle: MarkerHandle,
    hash: ContentHash,
    position: Coordinates,
    status: ProjectStatus,
    attached: bool,
}

/// Counts of what one reconciliation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerReport {
    pub created: usize,
    pub updated: usize,
    /// Hidden markers put back on the map without changes
    pub reshown: usize,
    pub hidden: usize,
    pub unchanged: usize,
    /// Projects without usable coordinates
    pub skipped: usize,
    /// Projects whose marker the backend failed to create
    pub failed: usize,
    pub stats: MapStats,
}

impl MarkerReport {
    /// Number of marker operations that reached the map surface
    pub fn operations(&self) -> usize {
        self.created + self.updated + self.reshown + self.hidden
    }
}

impl fmt::Display for MarkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} reshown, {} hidden, {} skipped",
            self.created, self.updated, self.reshown, self.hidden, self.skipped
        )
    }
}

/// Project id to marker table
#[derive(Debug, Default)]
pub struct MarkerTracker {
    markers: HashMap<RecordId, TrackedMarker>,
    visible: HashSet<RecordId>,
}

impl MarkerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the map show exactly the `projects` that have valid coordinates
    pub fn reconcile(&mut self, map: &mut dyn MapSurface, projects: &[Project]) -> MarkerReport {
        let mut report = MarkerReport::default();
        let mut next_visible = HashSet::with_capacity(projects.len());

        for project in projects {
            if next_visible.contains(&project.id) {
                tracing::warn!("Project {} listed twice, ignoring repeat", project.id);
                continue;
            }

            let position = match Coordinates::parse_optional(project.gps_coordinates.as_deref()) {
                Ok(position) => position,
                Err(e) => {
                    tracing::debug!("Skipping marker for project {}: {}", project.id, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let hash = ContentHash::of(project);
            match self.markers.get_mut(&project.id) {
                None => match map.create_marker(project, position) {
                    Ok(handle) => {
                        map.attach(&handle);
                        map.bind_click(&handle, project);
                        tracing::debug!("Creating marker for project {}", project.id);
                        self.markers.insert(
                            project.id.clone(),
                            TrackedMarker {
                                handle,
                                hash,
                                position,
                                status: project.status.clone(),
                                attached: true,
                            },
                        );
                        report.created += 1;
                    }
                    Err(e) => {
                        tracing::error!("Failed to create marker for project {}: {}", project.id, e);
                        report.failed += 1;
                        continue;
                    }
                },
                Some(tracked) if tracked.hash != hash => {
                    if !tracked.position.approx_eq(&position, POSITION_EPSILON) {
                        map.move_marker(&tracked.handle, position);
                        tracked.position = position;
                    }
                    if tracked.status != project.status {
                        map.restyle(&tracked.handle, &project.status);
                        tracked.status = project.status.clone();
                    }
                    map.bind_click(&tracked.handle, project);
                    if !tracked.attached {
                        map.attach(&tracked.handle);
                        tracked.attached = true;
                    }
                    tracked.hash = hash;
                    tracing::debug!("Updating marker for project {}", project.id);
                    report.updated += 1;
                }
                Some(tracked) => {
                    if tracked.attached {
                        report.unchanged += 1;
                    } else {
                        map.attach(&tracked.handle);
                        tracked.attached = true;
                        tracing::debug!("Showing existing marker for project {}", project.id);
                        report.reshown += 1;
                    }
                }
            }
            next_visible.insert(project.id.clone());
        }

        for id in self.visible.difference(&next_visible) {
            if let Some(tracked) = self.markers.get_mut(id) {
                if tracked.attached {
                    map.detach(&tracked.handle);
                    tracked.attached = false;
                    tracing::debug!("Hiding marker for project {}", id);
                    report.hidden += 1;
                }
            }
        }
        self.visible = next_visible;

        report.stats = MapStats {
            total_projects: projects.len(),
            mapped_projects: self.visible.len(),
            active_projects: projects.iter().filter(|p| p.status.is_active()).count(),
        };
        map.update_stats(&report.stats);

        if report.operations() > 0 || report.failed > 0 {
            tracing::info!("Marker update complete: {}", report);
        }
        report
    }

    /// Detach and dispose every marker, leaving the tracker empty.
    ///
    /// Returns the number of disposed markers.
    pub fn clear(&mut self, map: &mut dyn MapSurface) -> usize {
        let count = self.markers.len();
        for (_, tracked) in self.markers.drain() {
            if tracked.attached {
                map.detach(&tracked.handle);
            }
            map.dispose(tracked.handle);
        }
        self.visible.clear();
        if count > 0 {
            tracing::info!("Cleared {} tracked markers", count);
        }
        count
    }

    /// Markers currently on the map
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Markers held, attached or not
    pub fn tracked_count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_visible(&self, id: &RecordId) -> bool {
        self.visible.contains(id)
    }

    pub fn is_tracked(&self, id: &RecordId) -> bool {
        self.markers.contains_key(id)
    }

    /// Identity of the handle tracked for `id`
    pub fn handle_id(&self, id: &RecordId) -> Option<Uuid> {
        self.markers.get(id).map(|m| m.handle.id())
    }

    pub fn content_hash(&self, id: &RecordId) -> Option<ContentHash> {
        self.markers.get(id).map(|m| m.hash)
    }
}
