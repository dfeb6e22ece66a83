//! Request routing and handlers.
//!
//! | Route        | Methods | Variant | Handler                          |
//! |--------------|---------|---------|----------------------------------|
//! | `/data`      | GET     | all     | refresh sensors, JSON snapshot   |
//! | `/led`       | POST    | all     | form `state` ∈ {`on`, `1`}       |
//! | `/door`      | POST    | full    | form `state` == `open`           |
//! | `/tender`    | POST    | full    | form `state` == `extend`         |
//! | `/`          | GET     | full    | `index.html` from the static dir |
//! | `/style.css` | GET     | full    | static file                      |
//! | `/script.js` | GET     | full    | static file                      |
//!
//! Command forms may be urlencoded or `multipart/form-data`.
//! `OPTIONS` on any path answers 204. Every response carries the CORS
//! headers.

use std::path::PathBuf;

use serde_json::json;
use tracing::{debug, error, warn};

use homestation_core::{Error, FirmwareVariant};
use homestation_device::SharedDeviceStore;

use crate::form::{FormData, multipart_boundary};
use crate::http::{Method, Request, Response, Status};

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Commandable actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actuator {
    Led,
    Door,
    Tender,
}

impl Actuator {
    /// Key of the commanded state in the JSON reply.
    fn state_key(&self) -> &'static str {
        match self {
            Actuator::Led => "led_state",
            Actuator::Door => "door_state",
            Actuator::Tender => "tender_state",
        }
    }

    /// Map the form `state` value to the commanded state.
    fn parse_state(&self, value: &str) -> bool {
        match self {
            Actuator::Led => value == "on" || value == "1",
            Actuator::Door => value == "open",
            Actuator::Tender => value == "extend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Data,
    Command(Actuator),
    Asset {
        file: &'static str,
        content_type: &'static str,
    },
}

impl Route {
    fn allow(&self) -> &'static str {
        match self {
            Route::Data | Route::Asset { .. } => "GET, OPTIONS",
            Route::Command(_) => "POST, OPTIONS",
        }
    }

    fn accepts(&self, method: &Method) -> bool {
        match self {
            Route::Data | Route::Asset { .. } => *method == Method::Get,
            Route::Command(_) => *method == Method::Post,
        }
    }
}

/// Dispatches requests to the device store.
#[derive(Clone)]
pub struct Router {
    store: SharedDeviceStore,
    variant: FirmwareVariant,
    static_dir: Option<PathBuf>,
}

impl Router {
    pub fn new(store: SharedDeviceStore, variant: FirmwareVariant) -> Self {
        Self {
            store,
            variant,
            static_dir: None,
        }
    }

    /// Serve the web UI assets from `dir`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn variant(&self) -> FirmwareVariant {
        self.variant
    }

    /// Produce the response for one request.
    pub async fn handle(&self, request: &Request) -> Response {
        let response = self.dispatch(request).await;
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status.code(),
            "Request handled"
        );
        with_cors(response)
    }

    async fn dispatch(&self, request: &Request) -> Response {
        if request.method == Method::Options {
            return Response::new(Status::NoContent);
        }

        let Some(route) = self.resolve(&request.path) else {
            return Response::text(Status::NotFound, "Not found");
        };
        if !route.accepts(&request.method) {
            return Response::text(Status::MethodNotAllowed, "Method not allowed")
                .with_header("Allow", route.allow());
        }

        match route {
            Route::Data => self.data().await,
            Route::Command(actuator) => self.command(actuator, request).await,
            Route::Asset { file, content_type } => self.asset(file, content_type).await,
        }
    }

    fn resolve(&self, path: &str) -> Option<Route> {
        let route = match path {
            "/data" => Route::Data,
            "/led" => Route::Command(Actuator::Led),
            "/door" if self.variant.has_servos() => Route::Command(Actuator::Door),
            "/tender" if self.variant.has_servos() => Route::Command(Actuator::Tender),
            "/" | "/index.html" if self.variant.serves_static() => Route::Asset {
                file: "index.html",
                content_type: "text/html",
            },
            "/style.css" if self.variant.serves_static() => Route::Asset {
                file: "style.css",
                content_type: "text/css",
            },
            "/script.js" if self.variant.serves_static() => Route::Asset {
                file: "script.js",
                content_type: "application/javascript",
            },
            _ => return None,
        };
        Some(route)
    }

    async fn data(&self) -> Response {
        let snapshot = self.store.lock().await.refresh_sensors();
        json_response(&snapshot)
    }

    async fn command(&self, actuator: Actuator, request: &Request) -> Response {
        let form = match request.content_type().as_deref() {
            None | Some(FORM_CONTENT_TYPE) => FormData::parse(&request.body),
            Some(MULTIPART_CONTENT_TYPE) => request
                .header("content-type")
                .and_then(multipart_boundary)
                .map(|boundary| FormData::parse_multipart(&request.body, boundary))
                .unwrap_or_default(),
            Some(_) => FormData::default(),
        };
        let Some(value) = form.get("state") else {
            return Response::text(Status::BadRequest, "Missing 'state' parameter");
        };
        let requested = actuator.parse_state(value);

        let result = {
            let mut store = self.store.lock().await;
            match actuator {
                Actuator::Led => store.set_led(requested),
                Actuator::Door => store.set_door(requested),
                Actuator::Tender => store.set_tender(requested),
            }
        };

        match result {
            Ok(state) => json_response(&json!({
                "success": true,
                actuator.state_key(): state,
            })),
            Err(e @ Error::ActuatorNotFitted(_)) => {
                warn!(error = %e, "Command for an actuator that is not fitted");
                Response::text(Status::NotFound, "Not found")
            }
            Err(e) => {
                error!(error = %e, ?actuator, "Actuator command failed");
                Response::text(Status::InternalServerError, e.to_string())
            }
        }
    }

    async fn asset(&self, file: &str, content_type: &str) -> Response {
        let Some(dir) = &self.static_dir else {
            return Response::text(Status::NotFound, "Not found");
        };

        match tokio::fs::read(dir.join(file)).await {
            Ok(bytes) => Response::with_body(Status::Ok, content_type, bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Response::text(Status::NotFound, "Not found")
            }
            Err(e) => {
                error!(error = %e, file, "Failed to read static asset");
                Response::text(Status::InternalServerError, "Failed to read asset")
            }
        }
    }
}

fn json_response<T: serde::Serialize>(value: &T) -> Response {
    Response::json(Status::Ok, value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialise response");
        Response::text(Status::InternalServerError, "Serialisation failed")
    })
}

fn with_cors(response: Response) -> Response {
    response
        .with_header("Access-Control-Allow-Origin", ALLOW_ORIGIN)
        .with_header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .with_header("Access-Control-Allow-Headers", ALLOW_HEADERS)
}
