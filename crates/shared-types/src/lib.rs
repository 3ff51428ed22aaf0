//! Shared data model for drawing compliance checks
//!
//! Geometry primitives, the read-only drawing snapshot consumed by the
//! engine, and the report records handed to presentation and export.

pub mod drawing;
pub mod geometry;
pub mod types;

pub use drawing::{
    BlockDefinition, DocumentSource, Drawing, DrawingBuilder, Entity, EntityKind, ExplodeError,
    Insert,
};
pub use geometry::{BoundingBox, Point2D, Polygon, Transform2D};
pub use types::{
    BlockInstance, CheckOutcome, ComplianceReport, Diagnostic, ReportSummary, Room, RoomResult,
    SiteInfo,
};
