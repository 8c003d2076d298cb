//! Map features and the editable layer that holds them.

use crate::format::default_name;
use crate::geometry::{Coordinate, Geometry, GeometryKind};
use peniko::Color;
use std::collections::HashMap;
use uuid::Uuid;

/// Process-local feature identity.
pub type FeatureUid = Uuid;

/// Identity assigned by the backend once a feature is stored.
pub type ServerId = i64;

/// Where a feature comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureOrigin {
    /// A real feature held by a layer (drawn or loaded).
    #[default]
    Layer,
    /// A handle generated for an editable node of the selected feature.
    VertexMarker,
}

/// Named render styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureStyle {
    #[default]
    Stored,
    /// Finished measurement segment.
    Measurement,
}

impl FeatureStyle {
    pub fn stroke_color(&self) -> Color {
        match self {
            FeatureStyle::Stored => Color::from_rgba8(0, 0, 255, 255),
            FeatureStyle::Measurement => Color::from_rgba8(255, 0, 0, 255),
        }
    }

    pub fn stroke_width(&self) -> f64 {
        match self {
            FeatureStyle::Stored => 3.0,
            FeatureStyle::Measurement => 4.0,
        }
    }

    pub fn fill_color(&self) -> Option<Color> {
        match self {
            FeatureStyle::Stored => Some(Color::from_rgba8(128, 128, 128, 128)),
            FeatureStyle::Measurement => None,
        }
    }

    /// Stroke and fill as text, e.g. `stroke #0000ffff 3px fill #80808080`.
    pub fn summary(&self) -> String {
        let stroke = format!("stroke {} {}px", hex(self.stroke_color()), self.stroke_width());
        match self.fill_color() {
            Some(fill) => format!("{} fill {}", stroke, hex(fill)),
            None => stroke,
        }
    }
}

fn hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a)
}

/// A geometry with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    uid: FeatureUid,
    /// Server id, `None` until the feature is stored.
    pub id: Option<ServerId>,
    pub name: String,
    /// Derived, human-readable size or purpose.
    pub description: String,
    pub geometry: Geometry,
    pub origin: FeatureOrigin,
    pub style: FeatureStyle,
}

impl Feature {
    /// A new unsaved feature with the default name for its kind.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            uid: Uuid::new_v4(),
            id: None,
            name: default_name(geometry.kind()).to_string(),
            description: String::new(),
            geometry,
            origin: FeatureOrigin::Layer,
            style: FeatureStyle::Stored,
        }
    }

    /// A feature loaded from the backend.
    pub fn stored(id: ServerId, name: String, description: String, geometry: Geometry) -> Self {
        Self {
            id: Some(id),
            name,
            description,
            ..Self::new(geometry)
        }
    }

    /// A vertex handle at `at`.
    pub fn vertex_marker(at: Coordinate) -> Self {
        Self {
            origin: FeatureOrigin::VertexMarker,
            ..Self::new(Geometry::Point(at))
        }
    }

    pub fn uid(&self) -> FeatureUid {
        self.uid
    }

    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_vertex_marker(&self) -> bool {
        self.origin == FeatureOrigin::VertexMarker
    }
}

/// Ordered, mutable set of features eligible for drawing and selection.
#[derive(Debug, Clone, Default)]
pub struct EditableLayer {
    features: HashMap<FeatureUid, Feature>,
    /// Insertion order (bottom to top).
    order: Vec<FeatureUid>,
}

impl EditableLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature on top.
    pub fn add(&mut self, feature: Feature) -> FeatureUid {
        let uid = feature.uid();
        if self.features.insert(uid, feature).is_none() {
            self.order.push(uid);
        }
        uid
    }

    pub fn remove(&mut self, uid: FeatureUid) -> Option<Feature> {
        self.order.retain(|&id| id != uid);
        self.features.remove(&uid)
    }

    pub fn get(&self, uid: FeatureUid) -> Option<&Feature> {
        self.features.get(&uid)
    }

    pub fn get_mut(&mut self, uid: FeatureUid) -> Option<&mut Feature> {
        self.features.get_mut(&uid)
    }

    /// Features bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.order.iter().filter_map(|uid| self.features.get(uid))
    }

    /// Features hit at `point`, topmost first.
    pub fn features_at(&self, point: Coordinate, tolerance: f64) -> Vec<FeatureUid> {
        self.order
            .iter()
            .rev()
            .filter(|uid| {
                self.features
                    .get(uid)
                    .is_some_and(|f| f.geometry.hit_test(point, tolerance))
            })
            .copied()
            .collect()
    }

    /// Find a stored feature by server id. Circles and generic features have
    /// separate id spaces.
    pub fn find_stored(&self, circle: bool, id: ServerId) -> Option<FeatureUid> {
        self.iter()
            .find(|f| f.id == Some(id) && (f.kind() == GeometryKind::Circle) == circle)
            .map(Feature::uid)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_new_feature_defaults() {
        let feature = Feature::new(Geometry::Circle { center: Point::ZERO, radius: 1.0 });
        assert_eq!(feature.name, "Circle");
        assert!(!feature.is_persisted());
        assert!(!feature.is_vertex_marker());
        assert!(Feature::vertex_marker(Point::ZERO).is_vertex_marker());
    }

    #[test]
    fn test_style_summary() {
        assert_eq!(FeatureStyle::Stored.summary(), "stroke #0000ffff 3px fill #80808080");
        assert_eq!(FeatureStyle::Measurement.summary(), "stroke #ff0000ff 4px");
    }

    #[test]
    fn test_layer_order_and_hits() {
        let mut layer = EditableLayer::new();
        let bottom = layer.add(Feature::new(Geometry::Point(Point::new(0.0, 0.0))));
        let top = layer.add(Feature::new(Geometry::Circle { center: Point::ZERO, radius: 5.0 }));

        assert_eq!(layer.features_at(Point::ZERO, 1.0), vec![top, bottom]);
        assert_eq!(layer.features_at(Point::new(3.0, 0.0), 1.0), vec![top]);

        layer.remove(top);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.iter().next().map(Feature::uid), Some(bottom));
    }

    #[test]
    fn test_find_stored_separates_id_spaces() {
        let mut layer = EditableLayer::new();
        let circle = layer.add(Feature::stored(
            7,
            "Circle".into(),
            String::new(),
            Geometry::Circle { center: Point::ZERO, radius: 1.0 },
        ));
        let point = layer.add(Feature::stored(7, "Point".into(), String::new(), Geometry::Point(Point::ZERO)));

        assert_eq!(layer.find_stored(true, 7), Some(circle));
        assert_eq!(layer.find_stored(false, 7), Some(point));
        assert_eq!(layer.find_stored(false, 8), None);
    }
}
