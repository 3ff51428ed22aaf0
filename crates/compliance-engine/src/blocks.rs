//! Block instance resolution
//!
//! Every insert (modelspace and nested, down to `max_depth` levels) becomes a
//! [`BlockInstance`] carrying a handful of test points: its insertion point
//! plus the center and corners of the bounding box of its flattened geometry.
//!
//! Depth is counted from modelspace: a modelspace insert is depth 0, an insert
//! inside its block is depth 1, and so on. Inserts deeper than `max_depth` are
//! neither recorded nor expanded, which keeps self-referencing block graphs
//! finite.
//!
//! Resolution walks an explicit work list. Each insert is exploded exactly
//! once; a parent's bounds are the union of its own primitives and the bounds
//! already computed for its nested inserts.

use std::collections::HashSet;

use shared_types::{
    BlockInstance, BoundingBox, Diagnostic, DocumentSource, EntityKind, Insert, Point2D,
};
use tracing::{debug, warn};

/// Instances found in a drawing plus anything that could not be resolved
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub instances: Vec<BlockInstance>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decimal places kept when deduplicating test points
const DEDUP_DECIMALS: i32 = 5;

/// Upper bound on the number of instances produced for one drawing
///
/// Nested inserts past this count are skipped with a single warning.
pub const MAX_INSTANCES: usize = 20_000;

/// One insert in the expansion tree
struct Node {
    insert: Insert,
    depth: usize,
    parent: Option<usize>,
    /// Bounds of the flattened geometry, filled in after the walk
    bounds: Option<BoundingBox>,
}

impl Node {
    fn new(insert: Insert, depth: usize, parent: Option<usize>) -> Self {
        Self {
            insert,
            depth,
            parent,
            bounds: None,
        }
    }
}

/// Resolve all inserts of `doc` into block instances
///
/// Modelspace inserts are listed first in document order, followed by nested
/// inserts in depth-first order.
pub fn resolve_instances<D>(doc: &D, max_depth: usize) -> Resolution
where
    D: DocumentSource + ?Sized,
{
    let mut nodes: Vec<Node> = doc
        .entities()
        .iter()
        .filter_map(|e| match &e.kind {
            EntityKind::Insert(insert) => Some(Node::new(insert.clone(), 0, None)),
            _ => None,
        })
        .collect();
    let top_level = nodes.len();

    let mut order: Vec<usize> = (0..top_level).collect();
    let mut diagnostics = Vec::new();
    let mut truncated = false;
    let mut pending: Vec<usize> = (0..top_level).rev().collect();

    while let Some(index) = pending.pop() {
        if index >= top_level {
            order.push(index);
        }
        let depth = nodes[index].depth;

        let parts = match doc.explode(&nodes[index].insert) {
            Ok(parts) => parts,
            Err(e) => {
                diagnostics.push(degrade(&nodes[index].insert, depth, e.to_string()));
                Vec::new()
            }
        };

        let mut own = Vec::new();
        let mut children = Vec::new();
        for part in parts {
            match part.kind {
                EntityKind::Insert(nested) => {
                    if depth >= max_depth {
                        continue;
                    }
                    if nodes.len() >= MAX_INSTANCES {
                        if !truncated {
                            truncated = true;
                            let cause = format!(
                                "Instance limit of {} reached, nested inserts skipped",
                                MAX_INSTANCES
                            );
                            diagnostics.push(degrade(&nested, depth + 1, cause));
                        }
                        continue;
                    }
                    nodes.push(Node::new(nested, depth + 1, Some(index)));
                    children.push(nodes.len() - 1);
                }
                kind => match sample_points(&kind) {
                    Ok(points) => own.extend(points),
                    Err(cause) => diagnostics.push(degrade(&nodes[index].insert, depth, cause)),
                },
            }
        }

        nodes[index].bounds = BoundingBox::from_points(&own);
        pending.extend(children.into_iter().rev());
    }

    // Children always sit after their parent, so a reverse sweep folds each
    // subtree into its root before that root is folded upward.
    for index in (0..nodes.len()).rev() {
        if let (Some(parent), Some(bounds)) = (nodes[index].parent, nodes[index].bounds) {
            nodes[parent].bounds = Some(match nodes[parent].bounds {
                Some(existing) => existing.union(&bounds),
                None => bounds,
            });
        }
    }

    let instances = order
        .into_iter()
        .map(|index| {
            let node = &nodes[index];
            if node.bounds.is_none() {
                debug!(
                    block = %node.insert.name,
                    depth = node.depth,
                    "No resolvable geometry, using insertion point only"
                );
            }
            BlockInstance {
                name: node.insert.name.clone(),
                layer: node.insert.layer.clone(),
                test_points: canonical_test_points(
                    node.insert.insertion_point(),
                    node.bounds.as_ref(),
                ),
            }
        })
        .collect();

    Resolution {
        instances,
        diagnostics,
    }
}

fn degrade(insert: &Insert, depth: usize, cause: String) -> Diagnostic {
    warn!(block = %insert.name, depth, %cause, "Block resolution degraded");
    Diagnostic::ResolutionWarning {
        block: insert.name.clone(),
        layer: insert.layer.clone(),
        depth,
        cause,
    }
}

/// Points contributed by one primitive
///
/// Curves are reduced to extrema: circles and arcs give their four cardinal
/// points, ellipses the two ends of the major axis. Inserts and unsupported
/// kinds contribute nothing here.
pub fn sample_points(kind: &EntityKind) -> Result<Vec<Point2D>, String> {
    let points = match kind {
        EntityKind::Polyline { vertices, .. } => vertices.clone(),
        EntityKind::Line { start, end } => vec![*start, *end],
        EntityKind::Ray { start, direction } => vec![
            *start,
            Point2D::new(start.x + direction.x, start.y + direction.y),
        ],
        EntityKind::Circle { center, radius } | EntityKind::Arc { center, radius } => vec![
            Point2D::new(center.x + radius, center.y),
            Point2D::new(center.x - radius, center.y),
            Point2D::new(center.x, center.y + radius),
            Point2D::new(center.x, center.y - radius),
        ],
        EntityKind::Ellipse { center, major_axis } => vec![
            Point2D::new(center.x + major_axis.x, center.y + major_axis.y),
            Point2D::new(center.x - major_axis.x, center.y - major_axis.y),
        ],
        EntityKind::Point { location } => vec![*location],
        EntityKind::Insert(_) | EntityKind::Unsupported { .. } => Vec::new(),
    };

    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(format!(
            "Non-finite {} coordinate ({}, {})",
            kind.type_name(),
            bad.x,
            bad.y
        ));
    }
    Ok(points)
}

/// Insertion point, bbox center and bbox corners, deduplicated
///
/// Falls back to the insertion point alone when there are no bounds.
pub fn canonical_test_points(insertion: Point2D, bounds: Option<&BoundingBox>) -> Vec<Point2D> {
    let mut points = vec![insertion];
    if let Some(bbox) = bounds {
        points.push(bbox.center());
        points.extend(bbox.corners());
    }
    dedup_points(points)
}

/// Drop points that coincide after rounding, keeping first occurrences
pub fn dedup_points(points: Vec<Point2D>) -> Vec<Point2D> {
    let scale = 10f64.powi(DEDUP_DECIMALS);
    let mut seen = HashSet::new();
    points
        .into_iter()
        .filter(|p| seen.insert(((p.x * scale).round() as i64, (p.y * scale).round() as i64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::Drawing;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> EntityKind {
        EntityKind::Line {
            start: Point2D::new(x1, y1),
            end: Point2D::new(x2, y2),
        }
    }

    #[test]
    fn test_sample_points_per_kind() {
        let circle = EntityKind::Circle {
            center: Point2D::new(1.0, 1.0),
            radius: 2.0,
        };
        assert_eq!(
            sample_points(&circle).unwrap(),
            vec![
                Point2D::new(3.0, 1.0),
                Point2D::new(-1.0, 1.0),
                Point2D::new(1.0, 3.0),
                Point2D::new(1.0, -1.0),
            ]
        );

        let ellipse = EntityKind::Ellipse {
            center: Point2D::new(0.0, 0.0),
            major_axis: Point2D::new(2.0, 1.0),
        };
        assert_eq!(
            sample_points(&ellipse).unwrap(),
            vec![Point2D::new(2.0, 1.0), Point2D::new(-2.0, -1.0)]
        );

        let unsupported = EntityKind::Unsupported {
            type_name: "MTEXT".to_string(),
        };
        assert!(sample_points(&unsupported).unwrap().is_empty());
    }

    #[test]
    fn test_sample_points_rejects_nan() {
        let bad = EntityKind::Point {
            location: Point2D::new(f64::NAN, 0.0),
        };
        let err = sample_points(&bad).unwrap_err();
        assert!(err.contains("POINT"));
    }

    #[test]
    fn test_canonical_points_fallback() {
        let p = Point2D::new(4.0, 2.0);
        assert_eq!(canonical_test_points(p, None), vec![p]);
    }

    #[test]
    fn test_canonical_points_bbox() {
        let samples = [Point2D::new(0.0, 0.0), Point2D::new(2.0, 1.0)];
        let bbox = BoundingBox::from_points(&samples);
        let pts = canonical_test_points(Point2D::new(0.0, 0.0), bbox.as_ref());
        // insertion coincides with the (min,min) corner
        assert_eq!(
            pts,
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.5),
                Point2D::new(0.0, 1.0),
                Point2D::new(2.0, 0.0),
                Point2D::new(2.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_dedup_uses_five_decimals() {
        let pts = dedup_points(vec![
            Point2D::new(1.0, 1.0),
            Point2D::new(1.000001, 1.0),
            Point2D::new(1.0001, 1.0),
        ]);
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn test_resolves_top_level_insert() {
        let drawing = Drawing::builder()
            .block("DOOR-A", Point2D::default(), vec![("A-DOOR", line(0.0, 0.0, 1.0, 0.0))])
            .insert(Insert::new("DOOR-A", "A-DOOR", Point2D::new(10.0, 10.0)))
            .build();

        let res = resolve_instances(&drawing, 2);
        assert!(res.diagnostics.is_empty());
        assert_eq!(res.instances.len(), 1);
        let inst = &res.instances[0];
        assert_eq!(inst.name, "DOOR-A");
        assert_eq!(inst.layer, "A-DOOR");
        assert!(inst.test_points.contains(&Point2D::new(10.5, 10.0)));
        assert!(inst.test_points.contains(&Point2D::new(11.0, 10.0)));
    }

    #[test]
    fn test_unknown_block_degrades_to_insertion_point() {
        let drawing = Drawing::builder()
            .insert(Insert::new("GHOST", "0", Point2D::new(3.0, 4.0)))
            .build();

        let res = resolve_instances(&drawing, 2);
        assert_eq!(res.instances[0].test_points, vec![Point2D::new(3.0, 4.0)]);
        assert!(matches!(
            &res.diagnostics[0],
            Diagnostic::ResolutionWarning { block, depth: 0, .. } if block == "GHOST"
        ));
    }

    #[test]
    fn test_bad_sub_entity_does_not_abort_instance() {
        let drawing = Drawing::builder()
            .block(
                "MIXED",
                Point2D::default(),
                vec![
                    ("0", EntityKind::Point { location: Point2D::new(f64::NAN, 0.0) }),
                    ("0", line(0.0, 0.0, 2.0, 0.0)),
                ],
            )
            .insert(Insert::new("MIXED", "0", Point2D::default()))
            .build();

        let res = resolve_instances(&drawing, 2);
        assert_eq!(res.diagnostics.len(), 1);
        assert!(res.instances[0].test_points.contains(&Point2D::new(2.0, 0.0)));
    }

    #[test]
    fn test_nested_inserts_are_recorded() {
        let drawing = Drawing::builder()
            .block("LEAF", Point2D::default(), vec![("0", line(0.0, 0.0, 1.0, 0.0))])
            .block(
                "FRAME",
                Point2D::default(),
                vec![("0", EntityKind::Insert(Insert::new("LEAF", "A-DOOR", Point2D::new(5.0, 0.0))))],
            )
            .insert(Insert::new("FRAME", "0", Point2D::new(100.0, 0.0)))
            .build();

        let res = resolve_instances(&drawing, 2);
        let names: Vec<&str> = res.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["FRAME", "LEAF"]);
        // FRAME flattens LEAF's line
        assert!(res.instances[0].test_points.contains(&Point2D::new(106.0, 0.0)));
        assert!(res.instances[1].test_points.contains(&Point2D::new(105.0, 0.0)));
    }

    #[test]
    fn test_self_referencing_block_terminates() {
        let drawing = Drawing::builder()
            .block(
                "LOOP",
                Point2D::default(),
                vec![
                    ("0", line(0.0, 0.0, 1.0, 1.0)),
                    ("0", EntityKind::Insert(Insert::new("LOOP", "0", Point2D::new(1.0, 0.0)))),
                ],
            )
            .insert(Insert::new("LOOP", "0", Point2D::default()))
            .build();

        let res = resolve_instances(&drawing, 2);
        // depths 0, 1 and 2
        assert_eq!(res.instances.len(), 3);
        assert!(res.diagnostics.is_empty());
    }

    #[test]
    fn test_nested_unknown_block_is_reported_once() {
        let drawing = Drawing::builder()
            .block(
                "MID",
                Point2D::default(),
                vec![("0", EntityKind::Insert(Insert::new("GHOST", "0", Point2D::new(1.0, 0.0))))],
            )
            .block(
                "TOP",
                Point2D::default(),
                vec![("0", EntityKind::Insert(Insert::new("MID", "0", Point2D::new(1.0, 0.0))))],
            )
            .insert(Insert::new("TOP", "0", Point2D::default()))
            .build();

        let res = resolve_instances(&drawing, 2);
        let names: Vec<&str> = res.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["TOP", "MID", "GHOST"]);
        assert_eq!(res.diagnostics.len(), 1);
        assert!(matches!(
            &res.diagnostics[0],
            Diagnostic::ResolutionWarning { block, depth: 2, .. } if block == "GHOST"
        ));
    }

    #[test]
    fn test_deep_bounds_fold_into_every_ancestor() {
        let drawing = Drawing::builder()
            .block("C", Point2D::default(), vec![("0", line(0.0, 0.0, 1.0, 0.0))])
            .block(
                "B",
                Point2D::default(),
                vec![("0", EntityKind::Insert(Insert::new("C", "0", Point2D::new(0.0, 10.0))))],
            )
            .block(
                "A",
                Point2D::default(),
                vec![
                    ("0", line(0.0, 0.0, 0.0, -1.0)),
                    ("0", EntityKind::Insert(Insert::new("B", "0", Point2D::new(0.0, 10.0)))),
                ],
            )
            .insert(Insert::new("A", "0", Point2D::default()))
            .build();

        let res = resolve_instances(&drawing, 2);
        // A spans its own line down to y=-1 and C's line up at y=20
        assert!(res.instances[0].test_points.contains(&Point2D::new(0.0, -1.0)));
        assert!(res.instances[0].test_points.contains(&Point2D::new(1.0, 20.0)));
        assert!(res.instances[1].test_points.contains(&Point2D::new(1.0, 20.0)));
    }

    #[test]
    fn test_unbounded_depth_stops_at_instance_limit() {
        let drawing = Drawing::builder()
            .block(
                "LOOP",
                Point2D::default(),
                vec![
                    ("0", line(0.0, 0.0, 1.0, 0.0)),
                    ("0", EntityKind::Insert(Insert::new("LOOP", "0", Point2D::new(1.0, 0.0)))),
                ],
            )
            .insert(Insert::new("LOOP", "0", Point2D::default()))
            .build();

        let res = resolve_instances(&drawing, 200_000);
        assert_eq!(res.instances.len(), MAX_INSTANCES);
        assert_eq!(res.diagnostics.len(), 1);
        assert!(matches!(
            &res.diagnostics[0],
            Diagnostic::ResolutionWarning { cause, .. } if cause.contains("Instance limit")
        ));
    }

    #[test]
    fn test_zero_depth_ignores_nested() {
        let drawing = Drawing::builder()
            .block("LEAF", Point2D::default(), vec![("0", line(0.0, 0.0, 1.0, 0.0))])
            .block(
                "FRAME",
                Point2D::default(),
                vec![("0", EntityKind::Insert(Insert::new("LEAF", "0", Point2D::new(5.0, 0.0))))],
            )
            .insert(Insert::new("FRAME", "0", Point2D::new(100.0, 0.0)))
            .build();

        let res = resolve_instances(&drawing, 0);
        assert_eq!(res.instances.len(), 1);
        assert_eq!(res.instances[0].test_points, vec![Point2D::new(100.0, 0.0)]);
    }
}
