//! Closed-boundary extraction from modelspace
//!
//! Both rooms and the site boundary are closed polylines; they differ only in
//! how the layer is matched.

pub mod rooms;
pub mod site;

use shared_types::{Diagnostic, Entity, EntityKind, Polygon};

/// Ring of a closed polyline entity
///
/// `None` for anything that is not a closed polyline. A closed polyline
/// without vertices or with non-finite coordinates yields an
/// [`Diagnostic::ExtractionWarning`] instead of a ring.
pub(crate) fn closed_ring(entity: &Entity) -> Option<Result<Polygon, Diagnostic>> {
    let EntityKind::Polyline {
        vertices,
        closed: true,
    } = &entity.kind
    else {
        return None;
    };

    let warning = |cause: &str| Diagnostic::ExtractionWarning {
        entity: entity.ordinal,
        layer: entity.layer.clone(),
        cause: cause.to_string(),
    };

    if vertices.is_empty() {
        return Some(Err(warning("Closed polyline has no vertices")));
    }
    if vertices.iter().any(|p| !p.is_finite()) {
        return Some(Err(warning("Closed polyline has non-finite coordinates")));
    }
    Some(Ok(Polygon::from_vertices(vertices.iter().copied())))
}
