//! Room outlines: closed polylines whose layer contains the room filter

use shared_types::{Diagnostic, DocumentSource, Room};
use tracing::{debug, warn};

use super::closed_ring;
use crate::patterns::layer_contains;

/// Closed polylines whose layer contains `layer_filter` (case-insensitive)
///
/// Rooms are numbered from 1 in document order. Open polylines and other
/// entity types are ignored; malformed closed polylines are skipped and
/// reported.
pub fn extract_rooms<D>(doc: &D, layer_filter: &str) -> (Vec<Room>, Vec<Diagnostic>)
where
    D: DocumentSource + ?Sized,
{
    let mut rooms = Vec::new();
    let mut diagnostics = Vec::new();

    for entity in doc.entities() {
        if !layer_contains(&entity.layer, layer_filter) {
            continue;
        }
        match closed_ring(entity) {
            Some(Ok(polygon)) => {
                let area = polygon.area();
                rooms.push(Room {
                    index: rooms.len() + 1,
                    layer: entity.layer.clone(),
                    polygon,
                    area,
                });
            }
            Some(Err(diag)) => {
                warn!(entity = entity.ordinal, layer = %entity.layer, "Skipping malformed room outline");
                diagnostics.push(diag);
            }
            None => {}
        }
    }

    debug!(rooms = rooms.len(), filter = layer_filter, "Extracted rooms");
    (rooms, diagnostics)
}
