use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use clinidoc_core::config::{resolve_template_dir, strict_from_env_value};
use clinidoc_core::constants::{DEFAULT_CLINIC_NAME, DEFAULT_NOT_RECORDED_TEXT};
use clinidoc_core::{DocumentAssembler, RenderConfig, RenderError, RenderRequest};

/// Application state shared across REST API handlers
///
/// The assembler is immutable once built, so every request renders against the same templates
/// and configuration.
#[derive(Clone)]
struct AppState {
    assembler: Arc<DocumentAssembler>,
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

/// Error body returned when a render is refused.
#[derive(Debug, Serialize, ToSchema)]
struct ErrorRes {
    error: String,
    /// Offending request field, when the error concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ErrorRes {
    fn from_request_error(e: &RenderError) -> Self {
        let field = match e {
            RenderError::MissingRequiredField { field }
            | RenderError::MalformedOptionalTrigger { field, .. }
            | RenderError::InvalidMeasurement { field, .. } => Some(field.to_string()),
            _ => None,
        };
        Self {
            error: e.to_string(),
            field,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, render_medical_record),
    components(schemas(HealthRes, ErrorRes))
)]
struct ApiDoc;

/// Main entry point for the clinidoc REST server
///
/// # Environment Variables
/// - `CLINIDOC_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `CLINIDOC_CLINIC_NAME`: clinic name in the document header
/// - `CLINIDOC_NOT_RECORDED`: text for fields without a value
/// - `CLINIDOC_TEMPLATE_DIR`: directory with template overrides
/// - `CLINIDOC_STRICT`: fail renders with unresolved placeholders (default: true)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinidoc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIDOC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let assembler = Arc::new(DocumentAssembler::from_config(config_from_env()?)?);

    tracing::info!("++ Starting clinidoc REST on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(AppState { assembler })).await?;

    Ok(())
}

fn config_from_env() -> anyhow::Result<RenderConfig> {
    let clinic_name =
        std::env::var("CLINIDOC_CLINIC_NAME").unwrap_or_else(|_| DEFAULT_CLINIC_NAME.into());
    let not_recorded = std::env::var("CLINIDOC_NOT_RECORDED")
        .unwrap_or_else(|_| DEFAULT_NOT_RECORDED_TEXT.into());
    let template_dir = resolve_template_dir(std::env::var("CLINIDOC_TEMPLATE_DIR").ok())?;
    let strict = strict_from_env_value(std::env::var("CLINIDOC_STRICT").ok())?;

    Ok(RenderConfig::new(
        clinic_name,
        not_recorded,
        template_dir,
        strict,
    )?)
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/medical-records/render", post(render_medical_record))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "clinidoc is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/medical-records/render",
    request_body(
        content = String,
        content_type = "application/json",
        description = "Medical record in the front-end's camelCase JSON form"
    ),
    responses(
        (status = 200, description = "Rendered HTML document", content_type = "text/html", body = String),
        (status = 422, description = "Record cannot be rendered", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Render a medical record into a printable HTML document
///
/// The body is parsed leniently (unknown keys are ignored) but wrongly typed section triggers,
/// non-numeric vitals and missing mandatory clinical content are refused with 422 so the caller
/// can block PDF generation.
async fn render_medical_record(
    State(state): State<AppState>,
    body: String,
) -> Result<Html<String>, (StatusCode, Json<ErrorRes>)> {
    RenderRequest::from_json(&body)
        .and_then(|request| state.assembler.render(&request))
        .map(Html)
        .map_err(error_response)
}

/// Maps a render failure to its HTTP status and error body.
///
/// Request errors are the caller's to fix and are reported in full. Anything else is a
/// defect in the templates or the engine and is only logged.
fn error_response(e: RenderError) -> (StatusCode, Json<ErrorRes>) {
    if e.is_request_error() {
        tracing::warn!("Render rejected: {}", e);
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorRes::from_request_error(&e)),
        );
    }

    tracing::error!("Render error: {:?}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes {
            error: "Internal error".into(),
            field: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use clinidoc_core::RenderRequestWire;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let assembler =
            DocumentAssembler::from_config(RenderConfig::default()).expect("assembler");
        app(AppState {
            assembler: Arc::new(assembler),
        })
    }

    async fn post_render(body: String) -> (StatusCode, String) {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/medical-records/render")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
    }

    #[tokio::test]
    async fn health_reports_alive() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn renders_sample_record() {
        let body = serde_json::to_string(&RenderRequestWire::sample()).expect("json");
        let (status, html) = post_render(body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Otitis externa bilateral"));
        assert!(html.contains("38.5 °C"));
    }

    #[tokio::test]
    async fn missing_diagnosis_is_unprocessable() {
        let mut wire = RenderRequestWire::sample();
        wire.diagnosis = Some("  ".into());
        let (status, body) = post_render(serde_json::to_string(&wire).expect("json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: serde_json::Value = serde_json::from_str(&body).expect("json error");
        assert_eq!(error["field"], "diagnosis");
    }

    #[tokio::test]
    async fn malformed_follow_up_flag_is_unprocessable() {
        let mut wire = RenderRequestWire::sample();
        wire.follow_up_required = Some(serde_json::Value::from("si"));
        let (status, body) = post_render(serde_json::to_string(&wire).expect("json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("followUpRequired"));
    }

    #[tokio::test]
    async fn non_numeric_vital_is_unprocessable() {
        let mut wire = RenderRequestWire::sample();
        wire.temperature = Some(serde_json::Value::from("alta"));
        let (status, body) = post_render(serde_json::to_string(&wire).expect("json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: serde_json::Value = serde_json::from_str(&body).expect("json error");
        assert_eq!(error["field"], "temperature");
    }

    #[test]
    fn integrity_errors_are_internal() {
        let errors = [
            RenderError::UnresolvedPlaceholder {
                template: "notes.html".into(),
                tokens: vec!["notes".into()],
            },
            RenderError::DuplicateField("patient_name".into()),
        ];
        for e in errors {
            let (status, Json(body)) = error_response(e);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body.error, "Internal error");
            assert!(body.field.is_none());
        }
    }

    #[tokio::test]
    async fn invalid_json_is_unprocessable() {
        let (status, _) = post_render("{ nope".into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
