//! MapDraw Core Library
//!
//! Platform-agnostic editing state machine for drawing, measuring and
//! modifying map features, with live measurement tooltips and REST sync.

pub mod config;
pub mod control;
pub mod feature;
pub mod format;
pub mod geometry;
pub mod host;
pub mod measure;
pub mod mode;
pub mod persistence;
pub mod projection;
pub mod scale;
pub mod session;
pub mod tooltip;
pub mod wkt;

pub use config::{ConfigError, MapConfig};
pub use control::{Control, ControlEvent, ControlPanel, MemoryControlPanel};
pub use feature::{EditableLayer, Feature, FeatureOrigin, FeatureStyle, FeatureUid, ServerId};
pub use format::{format_area, format_length};
pub use geometry::{ChangeSubscription, Coordinate, Geometry, GeometryKind, ObservableGeometry};
pub use host::{HostError, MapHost, Popup, View};
pub use measure::MeasureMethod;
pub use mode::{ActiveSession, Mode, ModeController};
pub use persistence::{
    MemoryTransport, PersistenceBridge, PersistenceError, PersistenceEvent, PersistenceOutcome,
    PersistenceRequest, Transport,
};
pub use scale::{ScaleLine, ScaleLineKind, ScaleLineOptions, ScaleReading, ScaleUnits};
pub use session::{DrawSession, MeasureLayer, MeasureSession, ModifySession, NodeEdit};
pub use tooltip::{Tooltip, TooltipClass, TooltipOverlays, TooltipView};

#[cfg(not(target_arch = "wasm32"))]
pub use persistence::HttpTransport;
