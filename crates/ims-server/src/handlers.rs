use std::sync::atomic::Ordering;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ims_cache::{Irs, RegistrationChange};
use ims_types::{AuthVector, ChargingAddresses, RegistrationState};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvQuery {
    pub impu: String,
    pub scheme: String,
    /// SIP-Authorization-Item for AKA re-synchronization; accepted for wire
    /// compatibility but not yet interpreted (MultimediaAuthRequest's
    /// `authorization` field is always left unset by this handler).
    pub autn: Option<String>,
}

pub async fn get_auth_vector(
    State(state): State<AppState>,
    Path(impi): Path<String>,
    Query(query): Query<AvQuery>,
) -> Result<Json<AuthVector>, ApiError> {
    if query.autn.is_some() {
        tracing::debug!(impi = %impi, impu = %query.impu, "autn present on AV request, AKA resync not implemented");
    }
    let av = state
        .coordinator
        .get_auth_vector(&impi, &query.impu, &query.scheme)
        .await?;
    Ok(Json(av))
}

#[derive(Debug, Serialize)]
pub struct RegDataResponse {
    pub ims_sub_xml: String,
    pub registration_state: RegistrationState,
    pub charging_addresses: ChargingAddresses,
    pub associated_impus: Vec<String>,
    pub associated_impis: Vec<String>,
    pub ttl_seconds: i64,
}

impl From<&Irs> for RegDataResponse {
    fn from(irs: &Irs) -> Self {
        Self {
            ims_sub_xml: irs.ims_sub_xml.clone(),
            registration_state: irs.registration_state,
            charging_addresses: irs.charging_addresses.clone(),
            associated_impus: irs.associated_impus.current(),
            associated_impis: irs.associated_impis.current(),
            ttl_seconds: irs.ttl_seconds,
        }
    }
}

pub async fn get_reg_data(
    State(state): State<AppState>,
    Path(impu): Path<String>,
) -> Result<Json<RegDataResponse>, ApiError> {
    let irs = state.coordinator.get_registration(&impu, None).await?;
    Ok(Json(RegDataResponse::from(&irs)))
}

/// `{type: reg|call-reg|dereg-timeout|dereg-user|dereg-admin}` on
/// `PUT /impu/{impu}/reg-data`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ChangeType {
    Reg,
    CallReg,
    DeregTimeout,
    DeregUser,
    DeregAdmin,
}

#[derive(Debug, Deserialize)]
pub struct RegDataChangeRequest {
    #[serde(rename = "type")]
    change_type: ChangeType,
    impi: Option<String>,
}

pub async fn put_reg_data(
    State(state): State<AppState>,
    Path(impu): Path<String>,
    Json(request): Json<RegDataChangeRequest>,
) -> Result<Response, ApiError> {
    let change = match request.change_type {
        ChangeType::Reg => RegistrationChange::Register {
            impi: request
                .impi
                .ok_or_else(|| ApiError::BadRequest("\"reg\" requires an impi".into()))?,
        },
        ChangeType::CallReg => RegistrationChange::ReRegister {
            impi: request
                .impi
                .ok_or_else(|| ApiError::BadRequest("\"call-reg\" requires an impi".into()))?,
        },
        ChangeType::DeregTimeout | ChangeType::DeregUser | ChangeType::DeregAdmin => {
            RegistrationChange::Deregister { impi: request.impi }
        }
    };

    let irs = state
        .coordinator
        .apply_registration_change(&impu, change)
        .await?;

    Ok((StatusCode::OK, Json(RegDataResponse::from(&irs))).into_response())
}

pub async fn delete_binding(
    State(state): State<AppState>,
    Path((impi, impu)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.coordinator.deregister(&impu, Some(&impi)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if state.ready.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(HealthResponse { status: "ready" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "not_ready" }),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use ims_cache::{CxIdentity, Orchestrator};
    use ims_hss::MockHssClient;
    use ims_notify::RecordingNotificationClient;
    use ims_store::memory::InMemoryStore;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::build_router;

    fn test_state() -> AppState {
        let local = Arc::new(InMemoryStore::new());
        let orchestrator = Orchestrator::new(local, vec![], 3);
        let hss = Arc::new(MockHssClient::new());
        let notifier = Arc::new(RecordingNotificationClient::new());
        let identity = CxIdentity {
            dest_realm: "example.com".into(),
            dest_host: "hss.example.com".into(),
            server_name: "scscf.example.com".into(),
        };
        let coordinator = Arc::new(ims_cache::Coordinator::new(orchestrator, hss, notifier, identity));
        AppState::new(coordinator)
    }

    #[tokio::test]
    async fn health_always_reports_ok() {
        let app = Router::new().route("/health", get(health));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_reports_ok_once_wired() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn registering_then_reading_reg_data_round_trips() {
        let app = build_router(test_state());

        let put_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/impu/sip:a@x/reg-data")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"reg","impi":"_u@x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(put_response.status(), StatusCode::OK);

        let get_response = app
            .oneshot(
                Request::builder()
                    .uri("/impu/sip:a@x/reg-data")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(get_response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn reg_without_impi_is_a_bad_request() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/impu/sip:a@x/reg-data")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"reg"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_an_unknown_binding_still_succeeds() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/impi/_u@x/sip:missing@x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // deregister() always succeeds against the mock HSS even for an
        // unknown IRS (it fetches-or-creates, then deletes), so this is a
        // 204 rather than a 404.
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn auth_vector_lookup_returns_a_vector() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/impi/_u@x/av?impu=sip:a@x&scheme=digest")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
