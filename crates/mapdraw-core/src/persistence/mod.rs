//! REST persistence of features.
//!
//! Requests are fire-and-forget: the bridge hands them to a [`Transport`] and
//! returns immediately. Outcomes are collected later with
//! [`PersistenceBridge::poll`] and never roll back local state.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod http;

pub use memory::MemoryTransport;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpTransport;

use crate::feature::{Feature, FeatureUid, ServerId};
use crate::geometry::{Geometry, GeometryKind};
use crate::projection::{geometry_from_lon_lat, geometry_to_lon_lat};
use crate::wkt::{self, WktError};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("WKT error: {0}")]
    Wkt(#[from] WktError),
    #[error("Feature has no server id")]
    MissingId,
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Backend resource. Circles have their own endpoint and id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Feature,
    Circle,
}

impl Endpoint {
    pub fn for_kind(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Circle => Endpoint::Circle,
            _ => Endpoint::Feature,
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            Endpoint::Feature => "feature",
            Endpoint::Circle => "circle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn method(&self) -> &'static str {
        match self {
            Operation::List => "GET",
            Operation::Create => "POST",
            Operation::Update => "PUT",
            Operation::Delete => "DELETE",
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            Operation::List => "getAll",
            Operation::Create => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Body of a generic feature. `geometry` is WKT in EPSG:4326.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServerId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub geometry: String,
}

/// Body of a circle. `center` is in the display projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ServerId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub center: [f64; 2],
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeleteRecord {
    pub id: ServerId,
}

/// A request handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceRequest {
    pub operation: Operation,
    pub endpoint: Endpoint,
    /// Local feature the request is about.
    pub uid: Option<FeatureUid>,
    pub body: Option<Value>,
}

impl PersistenceRequest {
    /// Path relative to the API base, e.g. `/circle/add`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.endpoint.segment(), self.operation.segment())
    }

    pub fn method(&self) -> &'static str {
        self.operation.method()
    }
}

impl fmt::Display for PersistenceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// A completed request with the decoded response body.
#[derive(Debug)]
pub struct PersistenceOutcome {
    pub request: PersistenceRequest,
    pub result: PersistenceResult<Value>,
}

/// Carries requests to the backend.
pub trait Transport {
    /// Send a request without waiting for it.
    fn dispatch(&mut self, request: PersistenceRequest);

    /// Outcomes of requests completed since the last poll.
    fn poll(&mut self) -> Vec<PersistenceOutcome>;
}

/// What a completed request means for local state.
#[derive(Debug)]
pub enum PersistenceEvent {
    /// A created feature received its server id.
    Created { uid: FeatureUid, id: ServerId },
    /// Features read by a list request.
    Loaded(Vec<Feature>),
    /// The backend accepted the request.
    Completed(PersistenceRequest),
    Failed {
        request: PersistenceRequest,
        error: PersistenceError,
    },
}

/// Translates feature changes into REST requests.
#[derive(Debug)]
pub struct PersistenceBridge<T: Transport> {
    transport: T,
}

impl<T: Transport> PersistenceBridge<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Request both list endpoints.
    pub fn load_all(&mut self) {
        for endpoint in [Endpoint::Feature, Endpoint::Circle] {
            self.transport.dispatch(PersistenceRequest {
                operation: Operation::List,
                endpoint,
                uid: None,
                body: None,
            });
        }
    }

    pub fn create(&mut self, feature: &Feature) -> PersistenceResult<()> {
        let body = encode_feature(feature, None)?;
        self.send(Operation::Create, feature, body);
        Ok(())
    }

    /// Send an update. Features without a server id cannot be updated.
    pub fn update(&mut self, feature: &Feature) -> PersistenceResult<()> {
        let id = feature.id.ok_or(PersistenceError::MissingId)?;
        let body = encode_feature(feature, Some(id))?;
        self.send(Operation::Update, feature, body);
        Ok(())
    }

    pub fn delete(&mut self, feature: &Feature) -> PersistenceResult<()> {
        let id = feature.id.ok_or(PersistenceError::MissingId)?;
        let body = to_value(&DeleteRecord { id })?;
        self.send(Operation::Delete, feature, body);
        Ok(())
    }

    fn send(&mut self, operation: Operation, feature: &Feature, body: Value) {
        let request = PersistenceRequest {
            operation,
            endpoint: Endpoint::for_kind(feature.kind()),
            uid: Some(feature.uid()),
            body: Some(body),
        };
        log::debug!("Dispatching {}", request);
        self.transport.dispatch(request);
    }

    /// Drain completed requests.
    pub fn poll(&mut self) -> Vec<PersistenceEvent> {
        self.transport
            .poll()
            .into_iter()
            .map(|PersistenceOutcome { request, result }| {
                let value = match result {
                    Ok(value) => value,
                    Err(error) => return PersistenceEvent::Failed { request, error },
                };
                match request.operation {
                    Operation::List => match decode_list(request.endpoint, value) {
                        Ok(features) => PersistenceEvent::Loaded(features),
                        Err(error) => PersistenceEvent::Failed { request, error },
                    },
                    Operation::Create => match (request.uid, created_id(&value)) {
                        (Some(uid), Some(id)) => PersistenceEvent::Created { uid, id },
                        _ => PersistenceEvent::Completed(request),
                    },
                    Operation::Update | Operation::Delete => PersistenceEvent::Completed(request),
                }
            })
            .collect()
    }
}

/// Request body for a feature, with `id` for updates.
pub fn encode_feature(feature: &Feature, id: Option<ServerId>) -> PersistenceResult<Value> {
    match feature.geometry {
        Geometry::Circle { center, radius } => to_value(&CircleRecord {
            id,
            name: feature.name.clone(),
            description: feature.description.clone(),
            center: [center.x, center.y],
            radius,
        }),
        ref geometry => to_value(&FeatureRecord {
            id,
            name: feature.name.clone(),
            description: feature.description.clone(),
            geometry: wkt::encode(&geometry_to_lon_lat(geometry))?,
        }),
    }
}

fn to_value<S: Serialize>(record: &S) -> PersistenceResult<Value> {
    serde_json::to_value(record).map_err(|e| PersistenceError::Decode(e.to_string()))
}

/// Server id from a create response: a bare number or an object with `id`.
fn created_id(value: &Value) -> Option<ServerId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Object(map) => map.get("id").and_then(Value::as_i64),
        _ => None,
    }
}

/// Decode a list response into stored features. Records without an id or
/// with unreadable geometry are skipped.
pub fn decode_list(endpoint: Endpoint, value: Value) -> PersistenceResult<Vec<Feature>> {
    let features = match endpoint {
        Endpoint::Feature => {
            let records: Vec<FeatureRecord> =
                serde_json::from_value(value).map_err(|e| PersistenceError::Decode(e.to_string()))?;
            records
                .into_iter()
                .filter_map(|record| {
                    let id = record.id?;
                    match wkt::decode(&record.geometry) {
                        Ok(geometry) => Some(Feature::stored(
                            id,
                            record.name,
                            record.description,
                            geometry_from_lon_lat(&geometry),
                        )),
                        Err(e) => {
                            log::warn!("Skipping feature {}: {}", id, e);
                            None
                        }
                    }
                })
                .collect()
        }
        Endpoint::Circle => {
            let records: Vec<CircleRecord> =
                serde_json::from_value(value).map_err(|e| PersistenceError::Decode(e.to_string()))?;
            records
                .into_iter()
                .filter_map(|record| {
                    let [x, y] = record.center;
                    Some(Feature::stored(
                        record.id?,
                        record.name,
                        record.description,
                        Geometry::Circle {
                            center: Point::new(x, y),
                            radius: record.radius,
                        },
                    ))
                })
                .collect()
        }
    };
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::from_lon_lat;
    use serde_json::json;

    #[test]
    fn test_create_routes_circle_and_polygon() {
        let mut bridge = PersistenceBridge::new(MemoryTransport::new());
        let mut circle = Feature::new(Geometry::Circle { center: Point::new(10.0, 20.0), radius: 5.0 });
        circle.description = "Area: 78.54 m²".into();
        let polygon = Feature::new(Geometry::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(100_000.0, 0.0),
            Point::new(0.0, 100_000.0),
        ]));
        bridge.create(&circle).unwrap();
        bridge.create(&polygon).unwrap();

        let sent = bridge.transport().sent();
        assert_eq!(sent[0].path(), "/circle/add");
        assert_eq!(sent[0].method(), "POST");
        assert_eq!(
            sent[0].body,
            Some(json!({
                "name": "Circle",
                "description": "Area: 78.54 m²",
                "center": [10.0, 20.0],
                "radius": 5.0,
            }))
        );

        assert_eq!(sent[1].path(), "/feature/add");
        let body = sent[1].body.as_ref().unwrap();
        assert_eq!(body["name"], "Polygon");
        assert!(body.get("id").is_none());
        assert!(body["geometry"].as_str().unwrap().starts_with("POLYGON((0 0,"));
    }

    #[test]
    fn test_update_and_delete_need_id() {
        let mut bridge = PersistenceBridge::new(MemoryTransport::new());
        let unsaved = Feature::new(Geometry::Point(Point::ZERO));
        assert!(matches!(bridge.update(&unsaved), Err(PersistenceError::MissingId)));
        assert!(matches!(bridge.delete(&unsaved), Err(PersistenceError::MissingId)));
        assert!(bridge.transport().sent().is_empty());

        let stored = Feature::stored(4, "Line".into(), String::new(), Geometry::LineString(vec![Point::ZERO, Point::new(1.0, 1.0)]));
        bridge.update(&stored).unwrap();
        bridge.delete(&stored).unwrap();
        let sent = bridge.transport().sent();
        assert_eq!(sent[0].method(), "PUT");
        assert_eq!(sent[0].body.as_ref().unwrap()["id"], 4);
        assert_eq!(sent[1].path(), "/feature/delete");
        assert_eq!(sent[1].body, Some(json!({ "id": 4 })));
    }

    #[test]
    fn test_create_response_assigns_id() {
        let mut bridge = PersistenceBridge::new(MemoryTransport::assigning_ids());
        let feature = Feature::new(Geometry::Point(Point::ZERO));
        bridge.create(&feature).unwrap();

        let events = bridge.poll();
        assert!(matches!(
            events.as_slice(),
            [PersistenceEvent::Created { uid, id: 1 }] if *uid == feature.uid()
        ));
    }

    #[test]
    fn test_list_decodes_and_reprojects() {
        let features = decode_list(
            Endpoint::Feature,
            json!([
                { "id": 1, "name": "Point", "description": "Point", "geometry": "POINT(10 20)" },
                { "id": 2, "name": "Bad", "geometry": "CIRCLE(1)" },
                { "name": "Unsaved", "geometry": "POINT(0 0)" },
            ]),
        )
        .unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, Some(1));
        let Geometry::Point(p) = features[0].geometry else {
            panic!("expected point");
        };
        let expected = from_lon_lat(Point::new(10.0, 20.0));
        assert!((p.x - expected.x).abs() < 1e-6 && (p.y - expected.y).abs() < 1e-6);

        let circles = decode_list(
            Endpoint::Circle,
            json!([{ "id": 9, "name": "Circle", "description": "", "center": [1.0, 2.0], "radius": 3.0 }]),
        )
        .unwrap();
        assert_eq!(circles[0].geometry, Geometry::Circle { center: Point::new(1.0, 2.0), radius: 3.0 });
        assert!(decode_list(Endpoint::Circle, json!({"oops": true})).is_err());
    }

    #[test]
    fn test_failures_are_reported() {
        let transport = MemoryTransport::with_responder(|_| {
            Err(PersistenceError::Http { status: 500, message: "boom".into() })
        });
        let mut bridge = PersistenceBridge::new(transport);
        bridge.load_all();
        let events = bridge.poll();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, PersistenceEvent::Failed { .. })));
    }
}
