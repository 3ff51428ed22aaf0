//! Occupancy compliance checks for CAD floor plans
//!
//! Rooms are closed polylines on layers whose name contains a keyword
//! ("tent" by default). A room passes when it is large enough and at least
//! one door block sits inside it or on its outline.
//!
//! The engine reads drawings only through [`DocumentSource`], so any decoder
//! (or a hand-built [`shared_types::Drawing`]) can feed it.

pub mod blocks;
pub mod config;
pub mod containment;
pub mod error;
pub mod extractors;
pub mod patterns;
pub mod rules;

pub use config::{CheckConfig, ConfigError, MAX_BLOCK_DEPTH};
pub use containment::Tolerance;
pub use error::EngineError;

use shared_types::{BlockInstance, CheckOutcome, ComplianceReport, DocumentSource, RoomResult};
use tracing::info;

/// ComplianceEngine entry point
#[derive(Debug, Clone, Default)]
pub struct ComplianceEngine {
    config: CheckConfig,
}

impl ComplianceEngine {
    /// Engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CheckConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Run all checks on one drawing
    ///
    /// Never fails: entities that cannot be used are reported in
    /// [`CheckOutcome::diagnostics`] and the rest of the drawing is still
    /// evaluated.
    pub fn check<D>(&self, doc: &D) -> CheckOutcome
    where
        D: DocumentSource + ?Sized,
    {
        let config = &self.config;
        let mut diagnostics = Vec::new();

        let (rooms, room_diags) = extractors::rooms::extract_rooms(doc, &config.room_layer_contains);
        diagnostics.extend(room_diags);

        let resolution = blocks::resolve_instances(doc, config.max_block_depth);
        diagnostics.extend(resolution.diagnostics);
        let instances = resolution.instances;

        let doors: Vec<&BlockInstance> = instances
            .iter()
            .filter(|i| rules::is_door(i, config))
            .collect();

        let results: Vec<RoomResult> = rooms
            .iter()
            .map(|room| rules::evaluate_room(room, &doors, config))
            .collect();

        let (site_info, site_diags) = extractors::site::site_info(doc, &instances, config);
        diagnostics.extend(site_diags);

        let passed = results.iter().filter(|r| r.passed).count();
        let report = ComplianceReport {
            total_rooms: results.len(),
            passed_rooms: passed,
            failed_rooms: results.len() - passed,
            min_area_m2: config.min_area_m2,
            room_layer_contains: config.room_layer_contains.clone(),
            door_keywords: config.door_name_keywords.clone(),
            door_layer_keywords: config.door_layer_keywords.clone(),
            site_info,
            rooms: results,
        };

        info!(
            rooms = report.total_rooms,
            passed = report.passed_rooms,
            failed = report.failed_rooms,
            instances = instances.len(),
            doors = doors.len(),
            diagnostics = diagnostics.len(),
            "Compliance check finished"
        );

        CheckOutcome {
            report,
            diagnostics,
        }
    }
}

/// Check `doc` with `config`, validating the config first
pub fn check_drawing<D>(doc: &D, config: CheckConfig) -> Result<CheckOutcome, EngineError>
where
    D: DocumentSource + ?Sized,
{
    Ok(ComplianceEngine::with_config(config)?.check(doc))
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Drawing, EntityKind, Insert, Point2D};

    fn tent(side: f64) -> EntityKind {
        EntityKind::Polyline {
            vertices: vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(side, 0.0),
                Point2D::new(side, side),
                Point2D::new(0.0, side),
            ],
            closed: true,
        }
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = CheckConfig {
            eps: -0.1,
            ..CheckConfig::default()
        };
        assert!(matches!(
            ComplianceEngine::with_config(config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_engine_counts_pass_and_fail() {
        let drawing = Drawing::builder()
            .entity("Room-tent-A", tent(3.0))
            .entity("Room-tent-B", tent(1.0))
            .block(
                "DOOR-90",
                Point2D::default(),
                vec![(
                    "A-DOOR",
                    EntityKind::Line {
                        start: Point2D::new(0.0, 0.0),
                        end: Point2D::new(0.9, 0.0),
                    },
                )],
            )
            .insert(Insert::new("DOOR-90", "A-DOOR", Point2D::new(1.0, 0.0)))
            .build();

        let outcome = ComplianceEngine::new().check(&drawing);
        let report = &outcome.report;
        assert_eq!(report.total_rooms, 2);
        assert_eq!(report.passed_rooms, 1);
        assert_eq!(report.failed_rooms, 1);
        assert!(report.rooms[0].passed);
        assert!(!report.rooms[1].passed);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(2.00049), 2.0);
        assert_eq!(round3(1.23456), 1.235);
    }

    #[test]
    fn test_empty_drawing_is_trivially_compliant() {
        let outcome = check_drawing(&Drawing::default(), CheckConfig::default()).unwrap();
        assert_eq!(outcome.report.total_rooms, 0);
        assert!(outcome.report.is_compliant());
    }
}
