//! Read-only drawing snapshot
//!
//! A [`Drawing`] is what a CAD decoder hands to the compliance engine:
//! modelspace entities in document order plus the block definitions that
//! inserts refer to. The engine only reads it through [`DocumentSource`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point2D, Transform2D};

/// Geometry of one entity, tagged by type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    /// LWPOLYLINE / POLYLINE
    Polyline { vertices: Vec<Point2D>, closed: bool },
    Line { start: Point2D, end: Point2D },
    /// RAY / XLINE: base point and direction
    Ray { start: Point2D, direction: Point2D },
    Circle { center: Point2D, radius: f64 },
    Arc { center: Point2D, radius: f64 },
    /// `major_axis` is relative to `center`
    Ellipse { center: Point2D, major_axis: Point2D },
    Point { location: Point2D },
    Insert(Insert),
    /// Any type the decoder does not map
    Unsupported { type_name: String },
}

impl EntityKind {
    /// DXF-style type tag, used in diagnostics
    pub fn type_name(&self) -> &str {
        match self {
            EntityKind::Polyline { .. } => "POLYLINE",
            EntityKind::Line { .. } => "LINE",
            EntityKind::Ray { .. } => "RAY",
            EntityKind::Circle { .. } => "CIRCLE",
            EntityKind::Arc { .. } => "ARC",
            EntityKind::Ellipse { .. } => "ELLIPSE",
            EntityKind::Point { .. } => "POINT",
            EntityKind::Insert(_) => "INSERT",
            EntityKind::Unsupported { type_name } => type_name,
        }
    }

    /// Map all geometry through `t`
    pub fn transformed(&self, t: &Transform2D) -> EntityKind {
        match self {
            EntityKind::Polyline { vertices, closed } => EntityKind::Polyline {
                vertices: vertices.iter().map(|p| t.apply(*p)).collect(),
                closed: *closed,
            },
            EntityKind::Line { start, end } => EntityKind::Line {
                start: t.apply(*start),
                end: t.apply(*end),
            },
            EntityKind::Ray { start, direction } => EntityKind::Ray {
                start: t.apply(*start),
                direction: t.apply_vector(*direction),
            },
            EntityKind::Circle { center, radius } => EntityKind::Circle {
                center: t.apply(*center),
                radius: radius * t.radius_scale(),
            },
            EntityKind::Arc { center, radius } => EntityKind::Arc {
                center: t.apply(*center),
                radius: radius * t.radius_scale(),
            },
            EntityKind::Ellipse { center, major_axis } => EntityKind::Ellipse {
                center: t.apply(*center),
                major_axis: t.apply_vector(*major_axis),
            },
            EntityKind::Point { location } => EntityKind::Point {
                location: t.apply(*location),
            },
            EntityKind::Insert(insert) => EntityKind::Insert(Insert {
                parent: insert.parent.then(t),
                ..insert.clone()
            }),
            EntityKind::Unsupported { type_name } => EntityKind::Unsupported {
                type_name: type_name.clone(),
            },
        }
    }
}

/// One entity with its layer and position in the source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Position in the owning entity list (0-based)
    pub ordinal: usize,
    pub layer: String,
    pub kind: EntityKind,
}

/// Placed reference to a block definition
///
/// `location`, scales and rotation are expressed in the coordinate system of
/// whatever contains the insert; `parent` maps that system to world
/// coordinates (identity for modelspace inserts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub name: String,
    pub layer: String,
    pub location: Point2D,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation_deg: f64,
    #[serde(default)]
    pub parent: Transform2D,
}

impl Insert {
    /// Unscaled, unrotated insert of `name` at `location`
    pub fn new(name: impl Into<String>, layer: impl Into<String>, location: Point2D) -> Self {
        Self {
            name: name.into(),
            layer: layer.into(),
            location,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_deg: 0.0,
            parent: Transform2D::identity(),
        }
    }

    /// Insertion point in world coordinates
    pub fn insertion_point(&self) -> Point2D {
        self.parent.apply(self.location)
    }

    /// Transform from block-definition coordinates to world coordinates
    pub fn block_transform(&self, base_point: Point2D) -> Transform2D {
        Transform2D::placement(
            self.location,
            base_point,
            self.scale_x,
            self.scale_y,
            self.rotation_deg,
        )
        .then(&self.parent)
    }
}

/// Named, reusable group of entities
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    pub base_point: Point2D,
    pub entities: Vec<Entity>,
}

/// Why an insert could not be expanded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplodeError {
    #[error("Block definition not found: {0}")]
    UnknownBlock(String),

    #[error("Degenerate placement for block '{0}'")]
    DegenerateTransform(String),
}

/// Read-only access to a parsed drawing
pub trait DocumentSource {
    /// Modelspace entities in document order
    fn entities(&self) -> &[Entity];

    /// Entities of the insert's block, in world coordinates
    ///
    /// Nested inserts come back as [`EntityKind::Insert`] entities whose
    /// `parent` already includes this insert's placement.
    fn explode(&self, insert: &Insert) -> Result<Vec<Entity>, ExplodeError>;
}

/// In-memory drawing snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    entities: Vec<Entity>,
    blocks: HashMap<String, BlockDefinition>,
}

impl Drawing {
    pub fn builder() -> DrawingBuilder {
        DrawingBuilder::default()
    }

    pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.get(name)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl DocumentSource for Drawing {
    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn explode(&self, insert: &Insert) -> Result<Vec<Entity>, ExplodeError> {
        let block = self
            .blocks
            .get(&insert.name)
            .ok_or_else(|| ExplodeError::UnknownBlock(insert.name.clone()))?;

        let transform = insert.block_transform(block.base_point);
        if !transform.is_finite() {
            return Err(ExplodeError::DegenerateTransform(insert.name.clone()));
        }

        Ok(block
            .entities
            .iter()
            .map(|e| Entity {
                ordinal: e.ordinal,
                layer: e.layer.clone(),
                kind: e.kind.transformed(&transform),
            })
            .collect())
    }
}

/// Fluent construction of a [`Drawing`]
#[derive(Debug, Default)]
pub struct DrawingBuilder {
    entities: Vec<Entity>,
    blocks: HashMap<String, BlockDefinition>,
}

impl DrawingBuilder {
    /// Append a modelspace entity
    pub fn entity(mut self, layer: impl Into<String>, kind: EntityKind) -> Self {
        let ordinal = self.entities.len();
        self.entities.push(Entity {
            ordinal,
            layer: layer.into(),
            kind,
        });
        self
    }

    /// Append a modelspace insert, taking the layer from the insert itself
    pub fn insert(self, insert: Insert) -> Self {
        let layer = insert.layer.clone();
        self.entity(layer, EntityKind::Insert(insert))
    }

    /// Register a block definition; entities are `(layer, kind)` pairs
    pub fn block<I, L>(mut self, name: impl Into<String>, base_point: Point2D, entities: I) -> Self
    where
        I: IntoIterator<Item = (L, EntityKind)>,
        L: Into<String>,
    {
        let name = name.into();
        let entities = entities
            .into_iter()
            .enumerate()
            .map(|(ordinal, (layer, kind))| Entity {
                ordinal,
                layer: layer.into(),
                kind,
            })
            .collect();
        self.blocks.insert(
            name.clone(),
            BlockDefinition {
                name,
                base_point,
                entities,
            },
        );
        self
    }

    pub fn build(self) -> Drawing {
        Drawing {
            entities: self.entities,
            blocks: self.blocks,
        }
    }
}
