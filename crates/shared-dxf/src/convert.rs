//! Mapping from `dxf` entities to `shared_types` entity kinds
//!
//! Only modelspace is converted: entities flagged as paper space (layout
//! sheets, title blocks, viewport frames) never reach the engine.

use dxf::entities::{Entity as DxfEntity, EntityType};
use shared_types::{Drawing, EntityKind, Insert, Point2D};
use tracing::debug;

/// Bit 1 of the polyline flags marks a closed outline
const CLOSED_FLAG: i32 = 1;

/// Modelspace entities and every block definition of a parsed DXF drawing
pub fn to_drawing(source: &dxf::Drawing) -> Drawing {
    let mut builder = Drawing::builder();

    for block in source.blocks() {
        let entities = block
            .entities
            .iter()
            .map(|e| (e.common.layer.clone(), convert_entity(e)));
        builder = builder.block(block.name.clone(), point(&block.base_point), entities);
    }

    let mut count = 0usize;
    let mut paper_space = 0usize;
    for entity in source.entities() {
        if entity.common.is_in_paper_space {
            paper_space += 1;
            continue;
        }
        builder = builder.entity(entity.common.layer.clone(), convert_entity(entity));
        count += 1;
    }

    let drawing = builder.build();
    debug!(
        entities = count,
        skipped_paper_space = paper_space,
        blocks = drawing.block_count(),
        "Converted DXF drawing"
    );
    drawing
}

/// Geometry of one DXF entity, 2D only (z is dropped)
pub fn convert_entity(entity: &DxfEntity) -> EntityKind {
    match &entity.specific {
        EntityType::LwPolyline(lw) => EntityKind::Polyline {
            vertices: lw.vertices.iter().map(|v| Point2D::new(v.x, v.y)).collect(),
            closed: lw.flags & CLOSED_FLAG != 0,
        },
        EntityType::Polyline(poly) => EntityKind::Polyline {
            vertices: poly.vertices().map(|v| point(&v.location)).collect(),
            closed: poly.flags & CLOSED_FLAG != 0,
        },
        EntityType::Line(line) => EntityKind::Line {
            start: point(&line.p1),
            end: point(&line.p2),
        },
        EntityType::Ray(ray) => EntityKind::Ray {
            start: point(&ray.start_point),
            direction: Point2D::new(ray.unit_direction_vector.x, ray.unit_direction_vector.y),
        },
        EntityType::XLine(xline) => EntityKind::Ray {
            start: point(&xline.first_point),
            direction: Point2D::new(xline.unit_direction_vector.x, xline.unit_direction_vector.y),
        },
        EntityType::Circle(circle) => EntityKind::Circle {
            center: point(&circle.center),
            radius: circle.radius,
        },
        EntityType::Arc(arc) => EntityKind::Arc {
            center: point(&arc.center),
            radius: arc.radius,
        },
        EntityType::Ellipse(ellipse) => EntityKind::Ellipse {
            center: point(&ellipse.center),
            major_axis: Point2D::new(ellipse.major_axis.x, ellipse.major_axis.y),
        },
        EntityType::ModelPoint(p) => EntityKind::Point {
            location: point(&p.location),
        },
        EntityType::Insert(insert) => EntityKind::Insert(Insert {
            scale_x: insert.x_scale_factor,
            scale_y: insert.y_scale_factor,
            rotation_deg: insert.rotation,
            ..Insert::new(
                insert.name.clone(),
                entity.common.layer.clone(),
                point(&insert.location),
            )
        }),
        other => EntityKind::Unsupported {
            type_name: type_name(other),
        },
    }
}

fn point(p: &dxf::Point) -> Point2D {
    Point2D::new(p.x, p.y)
}

/// Upper-cased variant name, e.g. `MTEXT` for `EntityType::MText`
fn type_name(specific: &EntityType) -> String {
    let debug = format!("{:?}", specific);
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_uppercase()
}
