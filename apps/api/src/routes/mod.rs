pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::charter::handlers as charter;
use crate::projects::handlers as projects;
use crate::scoring::handlers as scoring;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Backlog
        .route("/api/v1/projects", get(projects::handle_list_projects))
        .route(
            "/api/v1/projects/filters",
            get(projects::handle_filter_options),
        )
        .route("/api/v1/projects/:id", get(projects::handle_get_project))
        .route(
            "/api/v1/projects/:id/charter",
            post(charter::handle_charter_for_project),
        )
        // AI
        .route("/api/v1/ai/status", get(scoring::handle_scoring_status))
        .route(
            "/api/v1/ai/score_project",
            post(scoring::handle_score_project),
        )
        .route(
            "/api/v1/ai/score_project_by_id",
            post(scoring::handle_score_project_by_id),
        )
        .route(
            "/api/v1/ai/project_charter",
            post(charter::handle_project_charter),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::{client_with, StubProvider};
    use crate::llm_client::{LlmError, RawModelResponse};
    use crate::projects::fixtures::backlog_file;
    use crate::projects::ProjectRepository;

    fn state_with(llm: Result<Arc<StubProvider>, String>) -> AppState {
        let file = backlog_file();
        AppState {
            repo: Arc::new(ProjectRepository::load(file.path()).unwrap()),
            llm: llm.map(client_with),
            config: Config::from_lookup(|_| None).unwrap(),
        }
    }

    fn replying(body: &str) -> AppState {
        state_with(Ok(Arc::new(StubProvider::replying(RawModelResponse::Text(
            body.to_string(),
        )))))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    const PERFECT: &str = r#"{"bi":5,"risk":5,"align":5,"urgency":5,"complexity":1,"cost":1,
        "rationale":"Closes audit gap","lenses":["Audit & Compliance"],"recommended_priority":1}"#;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(build_router(replying("{}")), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_projects_with_filters() {
        let app = build_router(replying("{}"));

        let (status, body) = send(app.clone(), "GET", "/api/v1/projects", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 4);
        assert_eq!(body["filtered_count"], 4);
        assert_eq!(body["projects"][0]["id"], 3);

        let (_, body) = send(
            app,
            "GET",
            "/api/v1/projects?type=All&flow=Billing&audit=Yes",
            None,
        )
        .await;
        assert_eq!(body["filtered_count"], 1);
        assert_eq!(body["total_count"], 4);
        assert_eq!(body["projects"][0]["name"], "Billing Cleanup");
        assert_eq!(body["projects"][0]["type"], "Data");
    }

    #[tokio::test]
    async fn test_filter_options_and_project_detail() {
        let app = build_router(replying("{}"));

        let (_, options) = send(app.clone(), "GET", "/api/v1/projects/filters", None).await;
        assert_eq!(options["audit"], json!(["Yes", "No"]));

        let (status, project) = send(app.clone(), "GET", "/api/v1/projects/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(project["priority_score"], 22);

        let (status, body) = send(app, "GET", "/api/v1/projects/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_score_project_returns_computed_priority() {
        let (status, body) = send(
            build_router(replying(PERFECT)),
            "POST",
            "/api/v1/ai/score_project",
            Some(json!({"description": "Manual reclasses", "systems": "NetSuite"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["priority_score"], 30);
        assert_eq!(body["recommended_priority"], 1);
        assert_eq!(body["lenses"], json!(["Audit & Compliance"]));
    }

    #[tokio::test]
    async fn test_score_by_id_uses_stored_fields_unless_overridden() {
        let provider = Arc::new(StubProvider::replying(RawModelResponse::Text(
            PERFECT.to_string(),
        )));
        let app = build_router(state_with(Ok(provider.clone())));

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/v1/ai/score_project_by_id",
            Some(json!({"project_id": 1, "description_override": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            app,
            "POST",
            "/api/v1/ai/score_project_by_id",
            Some(json!({"project_id": 1, "systems_override": "Workday"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let requests = provider.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("Manual reclasses every close"));
        assert!(requests[0].prompt.contains("SFDC, NetSuite"));
        assert!(requests[1].prompt.contains("Workday"));
        assert!(!requests[1].prompt.contains("SFDC, NetSuite"));
    }

    #[tokio::test]
    async fn test_score_by_unknown_id_is_not_found() {
        let (status, _) = send(
            build_router(replying(PERFECT)),
            "POST",
            "/api/v1/ai/score_project_by_id",
            Some(json!({"project_id": 77})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_bad_gateway() {
        let (status, body) = send(
            build_router(replying("Sure! This project is high priority.")),
            "POST",
            "/api/v1/ai/score_project",
            Some(json!({"description": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "MALFORMED_RESPONSE");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_gateway_timeout() {
        let provider = Arc::new(StubProvider::failing(|| LlmError::ProviderUnreachable {
            endpoint: "http://localhost:11434/api/chat".to_string(),
            cause: "timed out after 60s".to_string(),
        }));
        let (status, body) = send(
            build_router(state_with(Ok(provider))),
            "POST",
            "/api/v1/ai/score_project",
            Some(json!({"description": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "PROVIDER_UNREACHABLE");
    }

    #[tokio::test]
    async fn test_missing_credentials_disable_ai_endpoints_only() {
        let app = build_router(state_with(Err("Set OPENAI_API_KEY".to_string())));

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/v1/ai/score_project",
            Some(json!({"description": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SCORING_DISABLED");

        let (_, status_body) = send(app.clone(), "GET", "/api/v1/ai/status", None).await;
        assert_eq!(status_body["scoring_enabled"], false);
        assert_eq!(status_body["notice"], "Set OPENAI_API_KEY");

        let (status, _) = send(app, "GET", "/api/v1/projects", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_charter_for_project_is_tagged_with_id() {
        let (status, body) = send(
            build_router(replying("# Project Charter – Rev Rec Automation")),
            "POST",
            "/api/v1/projects/3/charter",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project_id"], 3);
        assert_eq!(body["charter_markdown"], "# Project Charter – Rev Rec Automation");
    }

    #[tokio::test]
    async fn test_adhoc_charter_and_empty_content() {
        let fields = json!({
            "name": "Billing Cleanup",
            "project_type": "Data",
            "pain_points": "",
            "systems_touched": "",
            "revenue_flow_impacted": "Billing",
            "audit_critical": "No"
        });

        let (status, body) = send(
            build_router(replying("# Charter")),
            "POST",
            "/api/v1/ai/project_charter",
            Some(fields.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["project_id"].is_null());

        let (status, body) = send(
            build_router(replying("   ")),
            "POST",
            "/api/v1/ai/project_charter",
            Some(fields),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "NO_CONTENT");
    }
}
