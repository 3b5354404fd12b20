use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use waypoint_core::planner::MainPlace;
use waypoint_core::recommend::DEFAULT_LIMIT;
use waypoint_core::session::OptionOutcome;
use waypoint_core::{CoreError, TripService};
use waypoint_db::models::{PlaceKind, Session};
use waypoint_db::queries::places::NewPlace;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoreError::SessionNotFound(_) | CoreError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            CoreError::SessionFinished(_) => StatusCode::CONFLICT,
            CoreError::NoCandidates => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::MalformedGenerationOutput(_) | CoreError::Generation(_) => {
                StatusCode::BAD_GATEWAY
            }
            CoreError::Prompt(_) | CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub destination: String,
}

/// Body of every single-field session turn.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PurposeResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct OptionResponse {
    pub finished: bool,
    pub session: Session,
}

impl From<OptionOutcome> for OptionResponse {
    fn from(outcome: OptionOutcome) -> Self {
        let finished = matches!(outcome, OptionOutcome::Finished(_));
        Self {
            finished,
            session: outcome.into_session(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceQuery {
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewPlaceRequest {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
}

const DEFAULT_LIST_LIMIT: i64 = 50;

fn list_limit(raw: Option<i64>) -> Result<i64, AppError> {
    match raw {
        Some(limit) if limit < 0 => Err(AppError::bad_request("limit must not be negative")),
        Some(limit) => Ok(limit),
        None => Ok(DEFAULT_LIST_LIMIT),
    }
}

fn parse_kind(raw: &str) -> Result<PlaceKind, AppError> {
    raw.trim()
        .parse::<PlaceKind>()
        .map_err(|e| AppError::bad_request(e.to_string()))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: TripService) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/purpose", put(set_purpose))
        .route("/api/sessions/{id}/people", put(set_people))
        .route("/api/sessions/{id}/day", put(set_day))
        .route("/api/sessions/{id}/options", post(add_option))
        .route("/api/sessions/{id}/recommendations", get(recommend))
        .route("/api/sessions/{id}/plan", post(create_plan).get(get_plan))
        .route("/api/places", post(add_place).get(list_places))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: TripService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("waypoint serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("waypoint serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_session(
    State(service): State<TripService>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<axum::response::Response, AppError> {
    let session = service.create_session(&body.destination).await?;
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

async fn list_sessions(
    State(service): State<TripService>,
    Query(query): Query<LimitQuery>,
) -> Result<axum::response::Response, AppError> {
    let sessions = service.list_sessions(list_limit(query.limit)?).await?;
    Ok(Json(sessions).into_response())
}

async fn get_session(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let session = service.get_session(id).await?;
    Ok(Json(session).into_response())
}

async fn set_purpose(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextRequest>,
) -> Result<axum::response::Response, AppError> {
    let reply = service.set_purpose(id, &body.text).await?;
    Ok(Json(PurposeResponse { reply }).into_response())
}

async fn set_people(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextRequest>,
) -> Result<axum::response::Response, AppError> {
    let session = service.set_people(id, &body.text).await?;
    Ok(Json(session).into_response())
}

async fn set_day(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextRequest>,
) -> Result<axum::response::Response, AppError> {
    let session = service.set_day(id, &body.text).await?;
    Ok(Json(session).into_response())
}

async fn add_option(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
    Json(body): Json<TextRequest>,
) -> Result<axum::response::Response, AppError> {
    let outcome = service.add_option(id, &body.text).await?;
    Ok(Json(OptionResponse::from(outcome)).into_response())
}

async fn recommend(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecommendQuery>,
) -> Result<axum::response::Response, AppError> {
    let recommendations = service
        .recommend(id, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(recommendations).into_response())
}

async fn create_plan(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
    Json(main_place): Json<MainPlace>,
) -> Result<axum::response::Response, AppError> {
    let planner = service.create_plan(id, &main_place).await?;
    Ok((StatusCode::CREATED, Json(planner)).into_response())
}

async fn get_plan(
    State(service): State<TripService>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let planner = service.get_plan(id).await?;
    Ok(Json(planner).into_response())
}

async fn add_place(
    State(service): State<TripService>,
    Json(body): Json<NewPlaceRequest>,
) -> Result<axum::response::Response, AppError> {
    let kind = match body.kind.as_deref() {
        Some(raw) => parse_kind(raw)?,
        None => PlaceKind::Attraction,
    };
    let place = service
        .add_place(&NewPlace {
            name: body.name,
            kind,
            address: body.address,
            description: body.description,
            latitude: body.latitude,
            longitude: body.longitude,
            region: body.region,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(place)).into_response())
}

async fn list_places(
    State(service): State<TripService>,
    Query(query): Query<PlaceQuery>,
) -> Result<axum::response::Response, AppError> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;
    let places = service.list_places(kind, list_limit(query.limit)?).await?;
    Ok(Json(places).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use waypoint_core::store::{MemoryStore, Store};
    use waypoint_core::{Adapters, TripService};
    use waypoint_test_utils::ScriptedGenerator;
    use waypoint_test_utils::fixtures::{
        attraction, features_json, recommendations_json, travel_plan_json,
    };

    struct TestApp {
        service: TripService,
        store: Arc<MemoryStore>,
        extraction: Arc<ScriptedGenerator>,
        planner: Arc<ScriptedGenerator>,
    }

    fn test_app() -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let extraction = Arc::new(ScriptedGenerator::new("extraction"));
        let planner = Arc::new(ScriptedGenerator::new("planner"));
        let adapters = Adapters::new(extraction.clone(), planner.clone()).unwrap();
        let service = TripService::new(store.clone() as Arc<dyn Store>, adapters);
        TestApp {
            service,
            store,
            extraction,
            planner,
        }
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        app: &TestApp,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let router = super::build_router(app.service.clone());
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        router.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_session(app: &TestApp, destination: &str) -> String {
        app.extraction.push_json(features_json());
        let resp = send(
            app,
            Method::POST,
            "/api/sessions",
            Some(json!({ "destination": destination })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_str().unwrap().to_string()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_and_get_session() {
        let app = test_app();
        let id = create_session(&app, " 부산 ").await;

        let resp = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["categories"]["place"], "부산");
        assert_eq!(json["finished"], false);
        assert_eq!(json["options"], json!([]));
    }

    #[tokio::test]
    async fn test_blank_destination_is_bad_request() {
        let app = test_app();
        let resp = send(
            &app,
            Method::POST,
            "/api/sessions",
            Some(json!({ "destination": "   " })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("invalid input"));
        assert_eq!(app.extraction.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = test_app();
        let id = uuid::Uuid::new_v4();
        let resp = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, Method::GET, &format!("/api/sessions/{id}/plan"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let app = test_app();
        let first = create_session(&app, "부산").await;
        let second = create_session(&app, "제주").await;

        let resp = send(&app, Method::GET, "/api/sessions?limit=1", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["id"], second.as_str());
        assert_ne!(arr[0]["id"], first.as_str());
    }

    #[tokio::test]
    async fn test_negative_list_limit_is_bad_request() {
        let app = test_app();
        create_session(&app, "부산").await;

        for uri in ["/api/sessions?limit=-1", "/api/places?limit=-5"] {
            let resp = send(&app, Method::GET, uri, None).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let json = body_json(resp).await;
            assert!(json["error"].as_str().unwrap().contains("negative"));
        }
    }

    #[tokio::test]
    async fn test_option_after_finish_is_conflict() {
        let app = test_app();
        let id = create_session(&app, "부산").await;
        let uri = format!("/api/sessions/{id}/options");

        let resp = send(&app, Method::POST, &uri, Some(json!({ "text": "카페 투어" }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["finished"], false);

        let resp = send(&app, Method::POST, &uri, Some(json!({ "text": "없어" }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["finished"], true);
        assert_eq!(json["session"]["options"], json!(["카페 투어"]));

        let resp = send(&app, Method::POST, &uri, Some(json!({ "text": "야경" }))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_recommend_without_catalog_is_unprocessable() {
        let app = test_app();
        let id = create_session(&app, "부산").await;

        let resp = send(
            &app,
            Method::GET,
            &format!("/api/sessions/{id}/recommendations"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_zero_limit_is_bad_request() {
        let app = test_app();
        let id = create_session(&app, "부산").await;

        let resp = send(
            &app,
            Method::GET,
            &format!("/api/sessions/{id}/recommendations?limit=0"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generation_failures_are_bad_gateway() {
        let app = test_app();

        app.extraction.push_json(json!({ "place": "부산" }));
        let resp = send(
            &app,
            Method::POST,
            "/api/sessions",
            Some(json!({ "destination": "부산" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        app.extraction.push_error(503, "overloaded");
        let resp = send(
            &app,
            Method::POST,
            "/api/sessions",
            Some(json!({ "destination": "부산" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(app.store.list_sessions(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_places_add_and_filter() {
        let app = test_app();

        let resp = send(
            &app,
            Method::POST,
            "/api/places",
            Some(json!({
                "name": "해운대 해수욕장",
                "address": "부산 해운대구 우동",
                "latitude": 35.1587,
                "longitude": 129.1604,
                "region": "부산"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(resp).await["kind"], "attraction");

        let resp = send(
            &app,
            Method::POST,
            "/api/places",
            Some(json!({ "name": "불국사", "kind": "유적지", "address": "경북 경주시" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&app, Method::GET, "/api/places?kind=heritage", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["name"], "불국사");

        let resp = send(&app, Method::GET, "/api/places?kind=museum", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(&app, Method::POST, "/api/places", Some(json!({ "name": " " }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_full_conversation() {
        let app = test_app();
        for place in [
            attraction("해운대 해수욕장", "부산", "부산 해운대구 우동", 35.1587, 129.1604),
            attraction("감천문화마을", "부산", "부산 사하구 감천동", 35.0975, 129.0106),
        ] {
            app.store.insert_place(&place).await.unwrap();
        }
        let id = create_session(&app, "부산").await;

        app.extraction.push_text("바다를 즐기기 좋은 여행이네요.");
        let resp = send(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/purpose"),
            Some(json!({ "text": "휴식" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["reply"], "바다를 즐기기 좋은 여행이네요.");

        let resp = send(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/people"),
            Some(json!({ "text": "친구 2명" })),
        )
        .await;
        assert_eq!(body_json(resp).await["people"], "친구 2명");

        let resp = send(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/day"),
            Some(json!({ "text": "1박2일" })),
        )
        .await;
        assert_eq!(body_json(resp).await["day"], "1박2일");

        app.extraction
            .push_json(recommendations_json(&["감천문화마을", "해운대 해수욕장"]));
        let resp = send(
            &app,
            Method::GET,
            &format!("/api/sessions/{id}/recommendations?limit=1"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let recs = body_json(resp).await;
        assert_eq!(recs.as_array().unwrap().len(), 1);
        assert_eq!(recs[0]["latitude"], 35.0975);

        app.planner.push_json(travel_plan_json(2));
        let resp = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/plan"),
            Some(json!({
                "name": recs[0]["name"],
                "address": recs[0]["address"],
                "latitude": recs[0]["latitude"],
                "longitude": recs[0]["longitude"]
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        assert_eq!(created["total_days"], 2);

        let resp = send(&app, Method::GET, &format!("/api/sessions/{id}/plan"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched = body_json(resp).await;
        assert_eq!(fetched["id"], created["id"]);
        assert_eq!(fetched["daily_plans"].as_array().unwrap().len(), 2);
    }
}
