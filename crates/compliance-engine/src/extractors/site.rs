//! Site statistics: boundary area and exit/enter marker counts by exact layer name

use shared_types::{BlockInstance, Diagnostic, DocumentSource, SiteInfo};
use tracing::warn;

use super::closed_ring;
use crate::config::CheckConfig;

/// Total area and count of closed polylines on exactly `layer`
pub fn sum_boundary_area<D>(doc: &D, layer: &str) -> (f64, usize, Vec<Diagnostic>)
where
    D: DocumentSource + ?Sized,
{
    let mut total = 0.0;
    let mut count = 0;
    let mut diagnostics = Vec::new();

    for entity in doc.entities().iter().filter(|e| e.layer == layer) {
        match closed_ring(entity) {
            Some(Ok(ring)) => {
                total += ring.area();
                count += 1;
            }
            Some(Err(diag)) => {
                warn!(entity = entity.ordinal, "Skipping malformed site boundary");
                diagnostics.push(diag);
            }
            None => {}
        }
    }
    (total, count, diagnostics)
}

/// Instances placed on exactly `layer`
pub fn count_on_layer(instances: &[BlockInstance], layer: &str) -> usize {
    instances.iter().filter(|i| i.layer == layer).count()
}

/// Site boundary area plus exit and entrance marker counts
///
/// The boundary area is rounded to 3 decimals.
pub fn site_info<D>(
    doc: &D,
    instances: &[BlockInstance],
    config: &CheckConfig,
) -> (SiteInfo, Vec<Diagnostic>)
where
    D: DocumentSource + ?Sized,
{
    let (area, polylines, diagnostics) = sum_boundary_area(doc, &config.site_boundary_layer);
    let info = SiteInfo {
        boundary_layer: config.site_boundary_layer.clone(),
        boundary_polylines: polylines,
        boundary_area_m2: crate::round3(area),
        exits_layer: config.exit_layer.clone(),
        exits_count: count_on_layer(instances, &config.exit_layer),
        enters_layer: config.enter_layer.clone(),
        enters_count: count_on_layer(instances, &config.enter_layer),
    };
    (info, diagnostics)
}
