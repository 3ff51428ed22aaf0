use crate::geometry::{Point2D, Polygon};

/// Closed boundary on a qualifying layer, as extracted from the drawing
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Room {
    pub index: usize, // 1-based, document order
    pub layer: String,
    pub polygon: Polygon,
    pub area: f64,
}

/// Flattened block insertion with the points used for containment tests
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlockInstance {
    pub name: String,
    pub layer: String,
    pub test_points: Vec<Point2D>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SiteInfo {
    pub boundary_layer: String,
    pub boundary_polylines: usize,
    pub boundary_area_m2: f64,
    pub exits_layer: String,
    pub exits_count: usize,
    pub enters_layer: String,
    pub enters_count: usize,
}

/// Evaluation result for one room
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoomResult {
    pub room_index: usize,
    pub layer: String,
    pub area_m2: f64, // rounded to 3 decimals
    pub doors_count: usize,
    pub passed: bool,
    pub notes: String,
    pub outline: Polygon,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComplianceReport {
    pub total_rooms: usize,
    pub passed_rooms: usize,
    pub failed_rooms: usize,
    pub min_area_m2: f64,
    pub room_layer_contains: String,
    pub door_keywords: Vec<String>,
    pub door_layer_keywords: Vec<String>,
    pub site_info: SiteInfo,
    pub rooms: Vec<RoomResult>,
}

impl ComplianceReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            rooms: self.total_rooms,
            passed: self.passed_rooms,
            failed: self.failed_rooms,
            min_area: self.min_area_m2,
        }
    }

    pub fn failed_room_results(&self) -> impl Iterator<Item = &RoomResult> {
        self.rooms.iter().filter(|r| !r.passed)
    }

    pub fn is_compliant(&self) -> bool {
        self.failed_rooms == 0
    }
}

/// Headline numbers for listings and dashboards
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReportSummary {
    pub rooms: usize,
    pub passed: usize,
    pub failed: usize,
    pub min_area: f64,
}

/// Non-fatal problem recorded while checking a drawing
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnostic {
    /// An entity was skipped during room or site extraction
    ExtractionWarning {
        entity: usize,
        layer: String,
        cause: String,
    },
    /// A block instance (or part of it) could not be expanded
    ResolutionWarning {
        block: String,
        layer: String,
        depth: usize,
        cause: String,
    },
}

/// Everything one check produces
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CheckOutcome {
    pub report: ComplianceReport,
    pub diagnostics: Vec<Diagnostic>,
}
