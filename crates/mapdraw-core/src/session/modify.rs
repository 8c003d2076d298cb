//! Modify session: select an existing feature and edit its nodes.

use crate::feature::{EditableLayer, Feature, FeatureUid};
use crate::format::describe;
use crate::geometry::{ChangeSubscription, Coordinate, Geometry, ObservableGeometry, close_ring};
use crate::measure::MeasureMethod;
use crate::tooltip::{Tooltip, TooltipOverlays};
use kurbo::{Line, ParamCurve, ParamCurveNearest};

/// Part of the selected geometry grabbed by the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Point,
    Vertex(usize),
    Center,
    Radius,
}

/// A node-level edit of the selected geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeEdit {
    MoveVertex { index: usize, to: Coordinate },
    /// Insert a vertex before `index`.
    InsertVertex { index: usize, at: Coordinate },
    RemoveVertex(usize),
    MoveCenter(Coordinate),
    SetRadius(f64),
    MovePoint(Coordinate),
}

impl NodeEdit {
    /// The edited geometry, or `None` when the edit does not apply to this
    /// geometry or would degenerate it.
    pub fn apply(&self, geometry: &Geometry) -> Option<Geometry> {
        match (*self, geometry) {
            (NodeEdit::MovePoint(to), Geometry::Point(_)) => Some(Geometry::Point(to)),
            (NodeEdit::MoveCenter(to), Geometry::Circle { radius, .. }) => Some(Geometry::Circle {
                center: to,
                radius: *radius,
            }),
            (NodeEdit::SetRadius(radius), Geometry::Circle { center, .. }) => {
                (radius.is_finite() && radius >= 0.0).then_some(Geometry::Circle { center: *center, radius })
            }
            (_, Geometry::LineString(coords)) => {
                let coords = self.apply_to_vertices(coords.clone(), 2)?;
                Some(Geometry::LineString(coords))
            }
            (_, Geometry::Polygon(rings)) => {
                let exterior = geometry.vertices();
                let mut exterior = self.apply_to_vertices(exterior, 3)?;
                close_ring(&mut exterior);
                let mut rings = rings.clone();
                match rings.first_mut() {
                    Some(first) => *first = exterior,
                    None => rings.push(exterior),
                }
                Some(Geometry::Polygon(rings))
            }
            _ => None,
        }
    }

    fn apply_to_vertices(&self, mut vertices: Vec<Coordinate>, min_len: usize) -> Option<Vec<Coordinate>> {
        match *self {
            NodeEdit::MoveVertex { index, to } => *vertices.get_mut(index)? = to,
            NodeEdit::InsertVertex { index, at } if index <= vertices.len() => vertices.insert(index, at),
            NodeEdit::RemoveVertex(index) if index < vertices.len() && vertices.len() > min_len => {
                vertices.remove(index);
            }
            _ => return None,
        }
        Some(vertices)
    }
}

/// Whether a feature under the pointer may become the selection.
///
/// A vertex marker of the current selection, sitting exactly on the selected
/// geometry, is excluded so that grabbing a node does not select the marker.
pub fn selectable(candidate: &Feature, selection: Option<&Feature>) -> bool {
    let marker = candidate.is_vertex_marker() && candidate.id.is_none();
    match (&candidate.geometry, selection) {
        (Geometry::Point(at), Some(selected)) if marker => selected.geometry.closest_point(*at) != *at,
        _ => true,
    }
}

/// Result of feeding an input event to a modify session.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifyOutcome {
    Ignored,
    Selected(FeatureUid),
    Deselected,
    EditStarted,
    Edited,
    /// The edit would degenerate the geometry.
    Refused,
    /// Editing ended; carries the feature with its recomputed description.
    Finished(Feature),
    Deleted(Feature),
}

#[derive(Debug)]
struct Edit {
    handle: Option<Handle>,
    geometry: ObservableGeometry,
    // Dropped before the tooltip it feeds.
    _subscription: Option<ChangeSubscription>,
    tooltip: Option<Tooltip>,
}

#[derive(Debug)]
pub struct ModifySession {
    method: MeasureMethod,
    selection: Option<FeatureUid>,
    marker: Option<Feature>,
    edit: Option<Edit>,
}

impl ModifySession {
    pub fn new(method: MeasureMethod) -> Self {
        Self {
            method,
            selection: None,
            marker: None,
            edit: None,
        }
    }

    pub fn selection(&self) -> Option<FeatureUid> {
        self.selection
    }

    /// Whether the selection is a stored feature that can be deleted.
    pub fn selection_has_id(&self, layer: &EditableLayer) -> bool {
        self.selection
            .and_then(|uid| layer.get(uid))
            .is_some_and(Feature::is_persisted)
    }

    pub fn vertex_marker(&self) -> Option<&Feature> {
        self.marker.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.edit.as_ref().and_then(|edit| edit.tooltip.as_ref())
    }

    /// Show a vertex marker at the closest point of the selection when the
    /// pointer is within `tolerance` of it.
    pub fn hover(&mut self, at: Coordinate, tolerance: f64, layer: &EditableLayer) {
        self.marker = self
            .selection
            .and_then(|uid| layer.get(uid))
            .map(|feature| feature.geometry.closest_point(at))
            .filter(|closest| closest.distance(at) <= tolerance)
            .map(Feature::vertex_marker);
    }

    /// Select the topmost selectable feature at `at`, or clear the selection.
    pub fn click(&mut self, at: Coordinate, tolerance: f64, layer: &EditableLayer) -> ModifyOutcome {
        if self.edit.is_some() {
            return ModifyOutcome::Ignored;
        }
        let selected = self.selection.and_then(|uid| layer.get(uid));
        let picked = self
            .marker
            .iter()
            .chain(layer.features_at(at, tolerance).into_iter().filter_map(|uid| layer.get(uid)))
            .find(|candidate| selectable(candidate, selected))
            .and_then(|candidate| {
                // A marker stands for a node of the current selection.
                if candidate.is_vertex_marker() {
                    self.selection
                } else {
                    Some(candidate.uid())
                }
            });
        match picked {
            Some(uid) => self.select(uid, layer),
            None => {
                self.selection = None;
                self.marker = None;
                ModifyOutcome::Deselected
            }
        }
    }

    pub fn select(&mut self, uid: FeatureUid, layer: &EditableLayer) -> ModifyOutcome {
        if self.edit.is_some() || layer.get(uid).is_none() {
            return ModifyOutcome::Ignored;
        }
        if self.selection != Some(uid) {
            self.marker = None;
        }
        self.selection = Some(uid);
        log::debug!("Selected feature {}", uid);
        ModifyOutcome::Selected(uid)
    }

    /// Grab a node of the selection under the pointer. Pressing a segment
    /// inserts a vertex there.
    pub fn press(
        &mut self,
        at: Coordinate,
        tolerance: f64,
        layer: &mut EditableLayer,
        overlays: &mut TooltipOverlays,
    ) -> ModifyOutcome {
        if self.edit.is_some() {
            return ModifyOutcome::Ignored;
        }
        let Some(feature) = self.selection.and_then(|uid| layer.get(uid)) else {
            return ModifyOutcome::Ignored;
        };
        let Some((handle, insert)) = find_handle(&feature.geometry, at, tolerance) else {
            return ModifyOutcome::Ignored;
        };
        let outcome = self.begin_edit(layer, overlays);
        self.set_handle(handle);
        if let Some(insert) = insert {
            self.apply(insert, layer);
        }
        outcome
    }

    /// Start an edit of the selection.
    pub fn begin_edit(&mut self, layer: &EditableLayer, overlays: &mut TooltipOverlays) -> ModifyOutcome {
        if self.edit.is_some() {
            return ModifyOutcome::Ignored;
        }
        let Some(feature) = self.selection.and_then(|uid| layer.get(uid)) else {
            return ModifyOutcome::Ignored;
        };
        let geometry = ObservableGeometry::new(feature.geometry.clone());
        let (subscription, tooltip) = match feature.geometry {
            Geometry::Point(_) => (None, None),
            _ => {
                let tooltip = overlays.create();
                let subscription = tooltip.follow(&geometry, self.method);
                geometry.set(feature.geometry.clone());
                (Some(subscription), Some(tooltip))
            }
        };
        self.edit = Some(Edit {
            handle: None,
            geometry,
            _subscription: subscription,
            tooltip,
        });
        ModifyOutcome::EditStarted
    }

    fn set_handle(&mut self, handle: Handle) {
        if let Some(edit) = self.edit.as_mut() {
            edit.handle = Some(handle);
        }
    }

    /// Move the grabbed handle to `at`.
    pub fn drag(&mut self, at: Coordinate, layer: &mut EditableLayer) -> ModifyOutcome {
        let Some(handle) = self.edit.as_ref().and_then(|edit| edit.handle) else {
            return ModifyOutcome::Ignored;
        };
        let edit = match handle {
            Handle::Point => NodeEdit::MovePoint(at),
            Handle::Vertex(index) => NodeEdit::MoveVertex { index, to: at },
            Handle::Center => NodeEdit::MoveCenter(at),
            Handle::Radius => {
                let center = self.edit.as_ref().map(|edit| edit.geometry.get());
                let Some(Geometry::Circle { center, .. }) = center else {
                    return ModifyOutcome::Ignored;
                };
                NodeEdit::SetRadius(center.distance(at))
            }
        };
        self.apply(edit, layer)
    }

    /// Apply a node edit to the selection and write it back into the layer.
    pub fn apply(&mut self, edit: NodeEdit, layer: &mut EditableLayer) -> ModifyOutcome {
        let Some(uid) = self.selection else {
            return ModifyOutcome::Ignored;
        };
        let Some(feature) = layer.get_mut(uid) else {
            return ModifyOutcome::Ignored;
        };
        let Some(geometry) = edit.apply(&feature.geometry) else {
            return ModifyOutcome::Refused;
        };
        feature.geometry = geometry.clone();
        if let Some(edit) = &self.edit {
            edit.geometry.set(geometry);
        }
        self.marker = None;
        ModifyOutcome::Edited
    }

    /// Finish the edit: recompute the description, detach the tooltip.
    pub fn end_edit(&mut self, layer: &mut EditableLayer) -> ModifyOutcome {
        let Some(edit) = self.edit.take() else {
            return ModifyOutcome::Ignored;
        };
        if let Some(tooltip) = &edit.tooltip {
            tooltip.hide();
        }
        drop(edit);
        let Some(uid) = self.selection else {
            return ModifyOutcome::Ignored;
        };
        let Some(feature) = layer.get_mut(uid) else {
            return ModifyOutcome::Ignored;
        };
        feature.description = describe(&feature.geometry, self.method);
        log::debug!("Modified {}: {}", feature.name, feature.description);
        ModifyOutcome::Finished(feature.clone())
    }

    /// Remove the selection from the layer. Only stored features can be
    /// deleted.
    pub fn delete(&mut self, layer: &mut EditableLayer) -> ModifyOutcome {
        if !self.selection_has_id(layer) {
            return ModifyOutcome::Ignored;
        }
        let Some(feature) = self.selection.take().and_then(|uid| layer.remove(uid)) else {
            return ModifyOutcome::Ignored;
        };
        self.edit = None;
        self.marker = None;
        ModifyOutcome::Deleted(feature)
    }
}

/// The handle under `at`, plus the vertex insertion a segment hit implies.
fn find_handle(geometry: &Geometry, at: Coordinate, tolerance: f64) -> Option<(Handle, Option<NodeEdit>)> {
    match geometry {
        Geometry::Point(p) => (p.distance(at) <= tolerance).then_some((Handle::Point, None)),
        Geometry::Circle { center, radius } => {
            let distance = center.distance(at);
            if distance <= tolerance {
                Some((Handle::Center, None))
            } else if (distance - radius).abs() <= tolerance {
                Some((Handle::Radius, None))
            } else {
                None
            }
        }
        Geometry::LineString(_) | Geometry::Polygon(_) => {
            let vertices = geometry.vertices();
            let nearest_vertex = vertices
                .iter()
                .enumerate()
                .map(|(i, v)| (i, v.distance(at)))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((index, distance)) = nearest_vertex {
                if distance <= tolerance {
                    return Some((Handle::Vertex(index), None));
                }
            }

            let mut outline = vertices.clone();
            if matches!(geometry, Geometry::Polygon(_)) {
                close_ring(&mut outline);
            }
            let (index, point, distance) = outline
                .windows(2)
                .enumerate()
                .map(|(i, w)| {
                    let line = Line::new(w[0], w[1]);
                    let point = line.eval(line.nearest(at, 1e-9).t);
                    (i + 1, point, point.distance(at))
                })
                .min_by(|a, b| a.2.total_cmp(&b.2))?;
            (distance <= tolerance).then_some((
                Handle::Vertex(index),
                Some(NodeEdit::InsertVertex { index, at: point }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn square() -> Geometry {
        Geometry::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
    }

    #[test]
    fn test_vertex_marker_on_selection_is_not_selectable() {
        let selected = Feature::new(square());
        let on_vertex = Feature::vertex_marker(Point::new(100.0, 0.0));
        let on_edge = Feature::vertex_marker(Point::new(50.0, 0.0));
        let off = Feature::vertex_marker(Point::new(50.0, 50.0));

        assert!(!selectable(&on_vertex, Some(&selected)));
        assert!(!selectable(&on_edge, Some(&selected)));
        assert!(selectable(&off, Some(&selected)));
        assert!(selectable(&on_vertex, None));
    }

    #[test]
    fn test_layer_points_are_always_selectable() {
        let selected = Feature::new(square());
        let point = Feature::new(Geometry::Point(Point::new(100.0, 0.0)));
        assert!(selectable(&point, Some(&selected)));
    }

    #[test]
    fn test_click_skips_marker_on_selection() {
        let mut layer = EditableLayer::new();
        let square_uid = layer.add(Feature::new(square()));
        let point_uid = layer.add(Feature::stored(
            7,
            "Point".into(),
            "Point".into(),
            Geometry::Point(Point::new(100.0, 0.0)),
        ));
        let mut modify = ModifySession::new(MeasureMethod::Planar);
        modify.select(square_uid, &layer);

        modify.hover(Point::new(100.5, -0.5), 1.0, &layer);
        let marker = modify.vertex_marker().unwrap();
        assert_eq!(marker.geometry, Geometry::Point(Point::new(100.0, 0.0)));
        assert!(!selectable(marker, layer.get(square_uid)));

        assert_eq!(modify.click(Point::new(100.0, 0.0), 1.0, &layer), ModifyOutcome::Selected(point_uid));
        assert_eq!(modify.selection(), Some(point_uid));
    }

    #[test]
    fn test_click_on_marker_keeps_selection() {
        let mut layer = EditableLayer::new();
        let uid = layer.add(Feature::new(square()));
        let mut modify = ModifySession::new(MeasureMethod::Planar);
        modify.select(uid, &layer);

        modify.hover(Point::new(50.0, 0.5), 1.0, &layer);
        assert!(modify.vertex_marker().is_some());
        assert_eq!(modify.click(Point::new(50.0, 0.0), 1.0, &layer), ModifyOutcome::Selected(uid));
        assert_eq!(modify.click(Point::new(500.0, 500.0), 1.0, &layer), ModifyOutcome::Deselected);
    }

    #[test]
    fn test_remove_vertex_refuses_degenerate() {
        let triangle = Geometry::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)]);
        assert_eq!(NodeEdit::RemoveVertex(0).apply(&triangle), None);

        let line = Geometry::LineString(vec![Point::ZERO, Point::new(1.0, 0.0), Point::new(2.0, 0.0)]);
        let shorter = NodeEdit::RemoveVertex(1).apply(&line).unwrap();
        assert_eq!(shorter.vertices().len(), 2);
        assert_eq!(NodeEdit::RemoveVertex(0).apply(&shorter), None);
    }

    #[test]
    fn test_move_vertex_keeps_polygon_closed() {
        let moved = NodeEdit::MoveVertex { index: 0, to: Point::new(-10.0, -10.0) }
            .apply(&square())
            .unwrap();
        let Geometry::Polygon(rings) = moved else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(rings[0][0], Point::new(-10.0, -10.0));
    }

    #[test]
    fn test_press_drag_release_edits_layer() {
        let mut layer = EditableLayer::new();
        let mut overlays = TooltipOverlays::new();
        let uid = layer.add(Feature::new(square()));
        let mut modify = ModifySession::new(MeasureMethod::Planar);

        assert_eq!(modify.click(Point::new(50.0, 50.0), 1.0, &layer), ModifyOutcome::Selected(uid));
        assert_eq!(
            modify.press(Point::new(100.0, 100.0), 1.0, &mut layer, &mut overlays),
            ModifyOutcome::EditStarted
        );
        assert_eq!(modify.tooltip().unwrap().text(), "10000 m²");

        assert_eq!(modify.drag(Point::new(100.0, 300.0), &mut layer), ModifyOutcome::Edited);
        assert_eq!(modify.tooltip().unwrap().text(), "0.02 km²");

        let ModifyOutcome::Finished(feature) = modify.end_edit(&mut layer) else {
            panic!("edit should finish");
        };
        assert_eq!(feature.description, "Area: 0.02 km²");
        assert_eq!(layer.get(uid).unwrap().description, "Area: 0.02 km²");
        assert!(!modify.is_editing());
        assert!(overlays.is_empty());
    }

    #[test]
    fn test_press_on_segment_inserts_vertex() {
        let mut layer = EditableLayer::new();
        let mut overlays = TooltipOverlays::new();
        let uid = layer.add(Feature::new(Geometry::LineString(vec![Point::ZERO, Point::new(10.0, 0.0)])));
        let mut modify = ModifySession::new(MeasureMethod::Planar);
        modify.select(uid, &layer);

        modify.press(Point::new(5.0, 0.5), 1.0, &mut layer, &mut overlays);
        assert_eq!(layer.get(uid).unwrap().geometry.vertices().len(), 3);
        modify.drag(Point::new(5.0, 5.0), &mut layer);
        assert_eq!(layer.get(uid).unwrap().geometry.vertices()[1], Point::new(5.0, 5.0));
    }

    #[test]
    fn test_circle_radius_handle() {
        let mut layer = EditableLayer::new();
        let mut overlays = TooltipOverlays::new();
        let uid = layer.add(Feature::new(Geometry::Circle { center: Point::ZERO, radius: 10.0 }));
        let mut modify = ModifySession::new(MeasureMethod::Planar);
        modify.select(uid, &layer);

        modify.press(Point::new(10.0, 0.0), 1.0, &mut layer, &mut overlays);
        modify.drag(Point::new(0.0, 25.0), &mut layer);
        assert_eq!(
            layer.get(uid).unwrap().geometry,
            Geometry::Circle { center: Point::ZERO, radius: 25.0 }
        );
    }

    #[test]
    fn test_delete_requires_id() {
        let mut layer = EditableLayer::new();
        let unsaved = layer.add(Feature::new(Geometry::Point(Point::ZERO)));
        let mut modify = ModifySession::new(MeasureMethod::Planar);
        modify.select(unsaved, &layer);
        assert!(!modify.selection_has_id(&layer));
        assert_eq!(modify.delete(&mut layer), ModifyOutcome::Ignored);
        assert_eq!(layer.len(), 1);

        let stored = layer.add(Feature::stored(3, "Point".into(), "Point".into(), Geometry::Point(Point::new(9.0, 9.0))));
        modify.select(stored, &layer);
        let ModifyOutcome::Deleted(feature) = modify.delete(&mut layer) else {
            panic!("stored feature should be deleted");
        };
        assert_eq!(feature.id, Some(3));
        assert_eq!(layer.len(), 1);
        assert_eq!(modify.selection(), None);
    }
}
