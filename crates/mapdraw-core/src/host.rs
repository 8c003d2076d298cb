//! Map host: owns the view, the layers, the overlays and the mode controller,
//! and routes pointer and control events to the active session.

use crate::config::MapConfig;
use crate::control::{Control, ControlEvent, ControlPanel};
use crate::feature::{EditableLayer, FeatureUid};
use crate::format::format_xy;
use crate::geometry::{Coordinate, GeometryKind};
use crate::mode::{Mode, ModeController};
use crate::persistence::{PersistenceBridge, PersistenceEvent, Transport};
use crate::projection::{from_lon_lat, point_resolution, resolution_for_zoom, to_lon_lat};
use crate::scale::{ScaleLine, ScaleLineOptions, ScaleReading};
use crate::session::{DrawOutcome, MeasureLayer, ModifyOutcome, NodeEdit};
use crate::tooltip::{TooltipOverlays, TooltipView};
use kurbo::Point;
use thiserror::Error;

/// Pick tolerance around the pointer, in pixels.
const PICK_TOLERANCE_PX: f64 = 6.0;

/// Decimals of the lon/lat mouse position readout.
const MOUSE_POSITION_DIGITS: usize = 7;

/// Host errors.
#[derive(Debug, Error, PartialEq)]
pub enum HostError {
    #[error("Control panel has no {0:?} control")]
    MissingControl(Control),
}

/// Map view in the display projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Coordinate,
    pub zoom: f64,
}

impl View {
    /// A view centered on `[lon, lat]`.
    pub fn from_lon_lat(center: [f64; 2], zoom: f64) -> Self {
        Self {
            center: from_lon_lat(Point::new(center[0], center[1])),
            zoom,
        }
    }

    /// Map units per pixel.
    pub fn resolution(&self) -> f64 {
        resolution_for_zoom(self.zoom)
    }

    /// Ground metres per pixel at the view center.
    pub fn point_resolution(&self) -> f64 {
        point_resolution(self.resolution(), self.center)
    }
}

/// Feature info shown after a click in idle mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub content: String,
    pub position: Coordinate,
}

/// One mounted map.
#[derive(Debug)]
pub struct MapHost<P: ControlPanel, T: Transport> {
    view: View,
    panel: P,
    bridge: PersistenceBridge<T>,
    layer: EditableLayer,
    measure_layer: MeasureLayer,
    overlays: TooltipOverlays,
    controller: ModeController,
    scale_line: ScaleLine,
    popup: Option<Popup>,
    pointer: Option<Coordinate>,
}

impl<P: ControlPanel, T: Transport> MapHost<P, T> {
    /// Mount a map: check the panel, enter the mode selected on it and request
    /// the stored features.
    pub fn mount(config: &MapConfig, panel: P, transport: T) -> Result<Self, HostError> {
        if let Some(missing) = Control::ALL.into_iter().find(|c| !panel.has_control(*c)) {
            return Err(HostError::MissingControl(missing));
        }
        let scale_line = ScaleLine::new(panel.scale_options());
        let mut host = Self {
            view: View::from_lon_lat(config.center, config.zoom),
            panel,
            bridge: PersistenceBridge::new(transport),
            layer: EditableLayer::new(),
            measure_layer: MeasureLayer::new(),
            overlays: TooltipOverlays::new(),
            controller: ModeController::new(config.measure_method),
            scale_line,
            popup: None,
            pointer: None,
        };
        host.controller.sync_controls(&mut host.panel, false);
        if let Some(kind) = host.panel.draw_selection() {
            host.set_mode(Mode::Draw(kind));
        }
        host.bridge.load_all();
        log::info!(
            "Map mounted at {} zoom {}",
            format_xy(to_lon_lat(host.view.center), 4),
            host.view.zoom
        );
        Ok(host)
    }

    /// Tear the map down, returning the control panel.
    pub fn unmount(mut self) -> P {
        self.controller.reset();
        self.controller.sync_controls(&mut self.panel, false);
        self.overlays.clear();
        self.layer.clear();
        log::info!("Map unmounted");
        self.panel
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    /// Switch interaction mode. Returns `false` when the switch is refused.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        let leaving_none = self.mode() == Mode::None && mode != Mode::None;
        let switched = self.controller.set_mode(mode, &mut self.panel, &mut self.overlays);
        if switched && leaving_none {
            self.popup = None;
        }
        switched
    }

    /// React to a change reported by the control panel. Events from disabled
    /// controls are dropped.
    pub fn handle_control(&mut self, event: ControlEvent) {
        if !self.panel.is_enabled(event.control()) {
            log::debug!("Ignoring {:?} from disabled control", event);
            return;
        }
        match event {
            ControlEvent::DrawTypeChanged(Some(kind)) => {
                self.set_mode(Mode::Draw(kind));
            }
            ControlEvent::DrawTypeChanged(None) => {
                if matches!(self.mode(), Mode::Draw(_)) {
                    self.set_mode(Mode::None);
                }
            }
            ControlEvent::MeasureToggled => {
                let next = if self.mode() == Mode::Measure { Mode::None } else { Mode::Measure };
                self.set_mode(next);
            }
            ControlEvent::ModifyToggled => {
                let next = if self.mode() == Mode::Modify { Mode::None } else { Mode::Modify };
                self.set_mode(next);
            }
            ControlEvent::UndoClicked => self.undo(),
            ControlEvent::DeleteClicked => self.delete(),
            ControlEvent::UnitsChanged(units) => {
                let options = self.scale_line.options;
                self.scale_line.reconfigure(ScaleLineOptions { units, ..options });
            }
            ControlEvent::ScaleOptionsChanged(options) => self.scale_line.reconfigure(options),
        }
    }

    /// Pick tolerance in map units.
    pub fn pick_tolerance(&self) -> f64 {
        self.view.resolution() * PICK_TOLERANCE_PX
    }

    pub fn click(&mut self, at: Coordinate) {
        let tolerance = self.pick_tolerance();
        match self.mode() {
            Mode::None => self.show_feature_info(at, tolerance),
            Mode::Draw(_) => {
                if let Some(draw) = self.controller.draw_mut() {
                    let outcome = draw.click(at, tolerance, &mut self.overlays);
                    self.on_draw(outcome);
                }
            }
            Mode::Measure => {
                if let Some(measure) = self.controller.measure_mut() {
                    measure.click(at, &mut self.measure_layer, &mut self.overlays);
                }
            }
            Mode::Modify => {
                if let Some(modify) = self.controller.modify_mut() {
                    modify.click(at, tolerance, &self.layer);
                }
                self.sync_controls();
            }
        }
    }

    /// Finish the sketch. When the clicks of the double click were reported
    /// too, the second one already finished it on the last vertex.
    pub fn double_click(&mut self) {
        if let Some(draw) = self.controller.draw_mut() {
            let outcome = draw.finish(&mut self.overlays);
            self.on_draw(outcome);
        }
    }

    pub fn pointer_move(&mut self, at: Coordinate) {
        self.pointer = Some(at);
        let tolerance = self.pick_tolerance();
        if let Some(draw) = self.controller.draw_mut() {
            draw.pointer_move(at);
        } else if let Some(measure) = self.controller.measure_mut() {
            measure.pointer_move(at);
        } else if let Some(modify) = self.controller.modify_mut() {
            if modify.is_editing() {
                modify.drag(at, &mut self.layer);
            } else {
                modify.hover(at, tolerance, &self.layer);
            }
        }
    }

    pub fn pointer_leave(&mut self) {
        self.pointer = None;
    }

    /// Press in modify mode. Returns whether a node of the selection was
    /// grabbed.
    pub fn pointer_down(&mut self, at: Coordinate) -> bool {
        let tolerance = self.pick_tolerance();
        match self.controller.modify_mut() {
            Some(modify) => {
                modify.press(at, tolerance, &mut self.layer, &mut self.overlays) == ModifyOutcome::EditStarted
            }
            None => false,
        }
    }

    pub fn pointer_up(&mut self) {
        let outcome = match self.controller.modify_mut() {
            Some(modify) => modify.end_edit(&mut self.layer),
            None => return,
        };
        self.on_modify(outcome);
    }

    /// Select a feature in modify mode.
    pub fn select(&mut self, uid: FeatureUid) -> bool {
        let selected = match self.controller.modify_mut() {
            Some(modify) => matches!(modify.select(uid, &self.layer), ModifyOutcome::Selected(_)),
            None => false,
        };
        self.sync_controls();
        selected
    }

    /// Apply a single node edit to the selection as a complete edit.
    pub fn edit_selection(&mut self, edit: NodeEdit) -> bool {
        let Some(modify) = self.controller.modify_mut() else {
            return false;
        };
        if modify.begin_edit(&self.layer, &mut self.overlays) != ModifyOutcome::EditStarted {
            return false;
        }
        let applied = modify.apply(edit, &mut self.layer) == ModifyOutcome::Edited;
        let outcome = modify.end_edit(&mut self.layer);
        if applied {
            self.on_modify(outcome);
        }
        applied
    }

    /// Remove the last sketch vertex in draw or measure mode.
    pub fn undo(&mut self) {
        if let Some(draw) = self.controller.draw_mut() {
            draw.undo_last_point();
        } else if let Some(measure) = self.controller.measure_mut() {
            measure.undo_last_point();
        }
    }

    /// Delete the stored selection in modify mode.
    pub fn delete(&mut self) {
        let outcome = match self.controller.modify_mut() {
            Some(modify) => modify.delete(&mut self.layer),
            None => return,
        };
        if let ModifyOutcome::Deleted(feature) = outcome {
            log::info!("Deleted {} {:?}", feature.name, feature.id);
            if let Err(e) = self.bridge.delete(&feature) {
                log::warn!("Failed to delete {}: {}", feature.name, e);
            }
            self.panel.set_enabled(Control::Delete, false);
            self.set_mode(Mode::None);
        }
    }

    /// Apply completed persistence requests. Returns how many were handled.
    pub fn poll_persistence(&mut self) -> usize {
        let events = self.bridge.poll();
        let count = events.len();
        for event in events {
            match event {
                PersistenceEvent::Created { uid, id } => {
                    if let Some(feature) = self.layer.get_mut(uid) {
                        feature.id = Some(id);
                        log::info!("{} stored with id {}", feature.name, id);
                    }
                }
                PersistenceEvent::Loaded(features) => {
                    let mut added = 0;
                    for feature in features {
                        let known = feature
                            .id
                            .and_then(|id| self.layer.find_stored(feature.kind() == GeometryKind::Circle, id));
                        if known.is_none() {
                            self.layer.add(feature);
                            added += 1;
                        }
                    }
                    log::info!("Loaded {} features", added);
                }
                PersistenceEvent::Completed(request) => log::debug!("{} completed", request),
                PersistenceEvent::Failed { request, error } => {
                    log::warn!("{} failed: {}", request, error);
                }
            }
        }
        if count > 0 {
            self.sync_controls();
        }
        count
    }

    fn on_draw(&mut self, outcome: DrawOutcome) {
        if let DrawOutcome::Finished(feature) = outcome {
            if let Err(e) = self.bridge.create(&feature) {
                log::warn!("Failed to store {}: {}", feature.name, e);
            }
            log::info!("Drew {}: {}", feature.name, feature.description);
            self.layer.add(feature);
        }
    }

    fn on_modify(&mut self, outcome: ModifyOutcome) {
        let ModifyOutcome::Finished(feature) = outcome else {
            return;
        };
        if feature.is_persisted() {
            if let Err(e) = self.bridge.update(&feature) {
                log::warn!("Failed to update {}: {}", feature.name, e);
            }
        } else {
            log::debug!("{} is not stored yet, keeping the edit local", feature.name);
        }
        self.set_mode(Mode::None);
    }

    fn show_feature_info(&mut self, at: Coordinate, tolerance: f64) {
        self.popup = self
            .layer
            .features_at(at, tolerance)
            .first()
            .and_then(|uid| self.layer.get(*uid))
            .map(|feature| Popup {
                content: if feature.description.is_empty() {
                    feature.name.clone()
                } else {
                    feature.description.clone()
                },
                position: at,
            });
    }

    fn sync_controls(&mut self) {
        let has_id = self
            .controller
            .modify()
            .is_some_and(|modify| modify.selection_has_id(&self.layer));
        self.controller.sync_controls(&mut self.panel, has_id);
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn layer(&self) -> &EditableLayer {
        &self.layer
    }

    pub fn measure_layer(&self) -> &MeasureLayer {
        &self.measure_layer
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn tooltips(&self) -> Vec<TooltipView> {
        self.overlays.views()
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Pointer position as `"lon, lat"`, while the pointer is over the map.
    pub fn mouse_position(&self) -> Option<String> {
        self.pointer
            .map(|at| format_xy(to_lon_lat(at), MOUSE_POSITION_DIGITS))
    }

    pub fn scale_reading(&self) -> Option<ScaleReading> {
        self.scale_line.reading(self.view.point_resolution())
    }

    pub fn scale_line(&self) -> &ScaleLine {
        &self.scale_line
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn transport(&self) -> &T {
        self.bridge.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.bridge.transport_mut()
    }
}
