pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::dashboard::handlers as dashboard;
use crate::decisions::handlers as decisions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Dashboard
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        .route("/api/v1/dashboard/export", get(dashboard::handle_export))
        // Decisions
        .route(
            "/api/v1/decisions",
            get(decisions::handle_list).post(decisions::handle_create),
        )
        .route("/api/v1/decisions/search", get(decisions::handle_search))
        .route(
            "/api/v1/decisions/:id",
            get(decisions::handle_get)
                .patch(decisions::handle_edit)
                .delete(decisions::handle_remove),
        )
        .route(
            "/api/v1/decisions/:id/status",
            patch(decisions::handle_update_status),
        )
        .route("/api/v1/forms/:mode", get(decisions::handle_form_config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{
        async_trait,
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{AuthError, SessionProvider};
    use crate::dashboard::filter::tests::{date, record};
    use crate::models::decision::{Celebration, DecisionRecord, DecisionType};
    use crate::models::user::{Identity, Session};
    use crate::store::{MemoryStore, RecordStore};

    const TOKEN: &str = "valid-token";

    struct StubSessions {
        tokens: HashMap<String, Identity>,
    }

    impl StubSessions {
        fn new() -> Self {
            let mut tokens = HashMap::new();
            tokens.insert(
                TOKEN.to_string(),
                Identity {
                    id: Uuid::from_u128(7),
                    email: Some("equipe@igreja.org".to_string()),
                },
            );
            Self { tokens }
        }
    }

    #[async_trait]
    impl SessionProvider for StubSessions {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            Err(AuthError::Rejected {
                status: 400,
                message: format!("Invalid login credentials for {email}"),
            })
        }

        async fn identity(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
            Ok(self.tokens.get(access_token).cloned())
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn app_with(rows: Vec<DecisionRecord>) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_records(rows));
        let state = AppState {
            store: store.clone(),
            sessions: Arc::new(StubSessions::new()),
        };
        (build_router(state), store)
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = app_with(vec![]);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(send(&app, req).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unauthenticated_request_points_to_login() {
        let (app, _) = app_with(vec![]);
        let req = Request::builder()
            .uri("/api/v1/decisions")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(body["error"]["login_url"], "/api/v1/auth/login");
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let (app, _) = app_with(vec![]);
        let req = Request::builder()
            .uri("/api/v1/dashboard")
            .header(header::AUTHORIZATION, "Bearer expired")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let (app, _) = app_with(vec![]);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": "a@b.org", "password": "x" }).to_string(),
            ))
            .unwrap();
        let response = send(&app, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_me_returns_identity() {
        let (app, _) = app_with(vec![]);
        let response = send(&app, request(Method::GET, "/api/v1/auth/me", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "equipe@igreja.org");
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (app, _) = app_with(vec![]);
        let form = json!({
            "nome": "Maria Souza",
            "decisao": "Batismo",
            "data_decisao": "2024-03-10",
            "estado_civil": "Casado",
            "nascimento": "1990-05-01",
            "celebracao": "Dominical",
            "nome_cadastrante": "Pr. João"
        });
        let response = send(&app, request(Method::POST, "/api/v1/decisions", Some(form))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["status"], "Aguardando contato");
        assert_eq!(created["cadastrado_por"], Uuid::from_u128(7).to_string());

        let response = send(&app, request(Method::GET, "/api/v1/decisions", None)).await;
        let list = json_body(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["nome"], "Maria Souza");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required_field() {
        let (app, store) = app_with(vec![]);
        let form = json!({ "nome": "Sem Data", "decisao": "Batismo" });
        let response = send(&app, request(Method::POST, "/api/v1/decisions", Some(form))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.list_all(Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation() {
        let (app, store) = app_with(vec![record(1, "Ana", date(2024, 1, 5))]);

        let response = send(&app, request(Method::DELETE, "/api/v1/decisions/1", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "CONFIRMATION_REQUIRED");
        assert!(store.get_by_id(1).await.unwrap().is_some());

        let declined = json!({ "confirm": false });
        let response = send(
            &app,
            request(Method::DELETE, "/api/v1/decisions/1", Some(declined)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.get_by_id(1).await.unwrap().is_some());

        let confirmed = json!({ "confirm": true });
        let response = send(
            &app,
            request(Method::DELETE, "/api/v1/decisions/1", Some(confirmed)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.get_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_missing_record_is_not_found() {
        let (app, _) = app_with(vec![]);
        let confirmed = json!({ "confirm": true });
        let response = send(
            &app,
            request(Method::DELETE, "/api/v1/decisions/99", Some(confirmed)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_without_matches_carries_message() {
        let (app, _) = app_with(vec![record(1, "Ana", date(2024, 1, 5))]);
        let response = send(
            &app,
            request(Method::GET, "/api/v1/decisions/search?nome=zzz", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["records"].as_array().unwrap().is_empty());
        assert_eq!(body["message"], "Nenhuma decisão encontrada com este nome");

        let response = send(
            &app,
            request(Method::GET, "/api/v1/decisions/search?nome=an", None),
        )
        .await;
        let body = json_body(response).await;
        assert_eq!(body["records"].as_array().unwrap().len(), 1);
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_edit_keeps_untouched_celebration_detail() {
        let mut existing = record(1, "Ana", date(2024, 1, 5));
        existing.celebracao = Some(Celebration::Other);
        existing.celebracao_extra = Some("Retiro de jovens".to_string());
        let (app, store) = app_with(vec![existing]);

        let edit = json!({ "nome": "Ana Paula" });
        let response = send(&app, request(Method::PATCH, "/api/v1/decisions/1", Some(edit))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let stored = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.nome, "Ana Paula");
        assert_eq!(stored.celebracao, Some(Celebration::Other));
        assert_eq!(stored.celebracao_extra.as_deref(), Some("Retiro de jovens"));
    }

    #[tokio::test]
    async fn test_status_update_rejects_identity_fields() {
        let (app, store) = app_with(vec![record(1, "Ana", date(2024, 1, 5))]);

        let update = json!({
            "status": "Encaminhado para GDC",
            "deseja_gdc": true,
            "gdc_encaminhado": "GDC Centro"
        });
        let response = send(
            &app,
            request(Method::PATCH, "/api/v1/decisions/1/status", Some(update)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let stored = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Encaminhado para GDC");
        assert_eq!(stored.gdc_encaminhado.as_deref(), Some("GDC Centro"));

        let rename = json!({ "status": "Contato realizado", "nome": "Outra" });
        let response = send(
            &app,
            request(Method::PATCH, "/api/v1/decisions/1/status", Some(rename)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.get_by_id(1).await.unwrap().unwrap().nome, "Ana");
    }

    #[tokio::test]
    async fn test_dashboard_applies_range() {
        let (app, _) = app_with(vec![
            record(1, "Ana", date(2024, 1, 5)),
            record(2, "Bia", date(2024, 1, 6)),
            record(3, "Caio", date(2024, 3, 1)),
        ]);
        let response = send(
            &app,
            request(
                Method::GET,
                "/api/v1/dashboard?start=2024-01-01&end=2024-01-10",
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total_records"], 3);
        assert_eq!(body["filtered_count"], 2);
        assert_eq!(body["average_per_day"], 0.2);
        assert_eq!(body["timeline"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_export_starts_with_bom_and_header() {
        let (app, _) = app_with(vec![record(1, "Ana", date(2024, 1, 5))]);
        let response = send(
            &app,
            request(
                Method::GET,
                "/api/v1/dashboard/export?start=2024-01-01&end=2024-01-31",
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("decisoes_"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("Data,Nome,"));
        assert!(text.contains("Ana"));
    }

    #[tokio::test]
    async fn test_form_config_for_status_mode() {
        let (app, _) = app_with(vec![]);
        let response = send(&app, request(Method::GET, "/api/v1/forms/status", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["mode"], "status");
    }

    #[tokio::test]
    async fn test_dependent_fields_follow_their_controller() {
        // Dominical, deseja_gdc = false
        let (app, store) = app_with(vec![record(1, "Ana", date(2024, 1, 5))]);

        let update = json!({ "status": "Contato realizado", "gdc_encaminhado": "GDC Norte" });
        let response = send(
            &app,
            request(Method::PATCH, "/api/v1/decisions/1/status", Some(update)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let edit = json!({ "celebracao_extra": "Retiro" });
        let response = send(&app, request(Method::PATCH, "/api/v1/decisions/1", Some(edit))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let stored = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Contato realizado");
        assert!(!stored.deseja_gdc);
        assert_eq!(stored.gdc_encaminhado, None);
        assert_eq!(stored.celebracao, Some(Celebration::Sunday));
        assert_eq!(stored.celebracao_extra, None);

        let edit = json!({ "celebracao": "Outros", "celebracao_extra": "Retiro" });
        let response = send(&app, request(Method::PATCH, "/api/v1/decisions/1", Some(edit))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let stored = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.celebracao_extra.as_deref(), Some("Retiro"));
    }

    #[tokio::test]
    async fn test_filtered_listing() {
        let mut baptism = record(2, "Bia", date(2024, 1, 6));
        baptism.decisao = DecisionType::Baptism;
        let (app, _) = app_with(vec![
            record(1, "Ana", date(2024, 1, 5)),
            baptism,
            record(3, "Caio", date(2024, 3, 1)),
        ]);

        let response = send(
            &app,
            request(
                Method::GET,
                "/api/v1/decisions?start=2024-01-01&end=2024-01-31&status=Aguardando%20contato&cidade=",
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let ids: Vec<i64> = json_body(response)
            .await
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 1]);

        let response = send(
            &app,
            request(
                Method::GET,
                "/api/v1/decisions?start=2024-01-01&end=2024-12-31&decisao=Batismo",
                None,
            ),
        )
        .await;
        let list = json_body(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["nome"], "Bia");
    }

    #[tokio::test]
    async fn test_filtered_listing_rejects_unknown_label() {
        let (app, _) = app_with(vec![record(1, "Ana", date(2024, 1, 5))]);
        for uri in [
            "/api/v1/decisions?decisao=Jejum",
            "/api/v1/decisions?status=Arquivado",
        ] {
            let response = send(&app, request(Method::GET, uri, None)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_name_only_filter_uses_default_window() {
        let today = chrono::Local::now().date_naive();
        let (app, _) = app_with(vec![
            record(1, "Ana Clara", today),
            record(2, "Bia", today),
            record(3, "Ana Antiga", date(2000, 1, 1)),
        ]);
        let response = send(
            &app,
            request(Method::GET, "/api/v1/decisions?nome=ana&decisao=&status=", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let list = json_body(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_list_order_parameter() {
        let (app, _) = app_with(vec![
            record(1, "Ana", date(2024, 1, 5)),
            record(2, "Bia", date(2024, 1, 9)),
            record(3, "Caio", date(2024, 1, 7)),
        ]);
        let ids = |list: Value| -> Vec<i64> {
            list.as_array()
                .unwrap()
                .iter()
                .map(|r| r["id"].as_i64().unwrap())
                .collect()
        };

        let response = send(&app, request(Method::GET, "/api/v1/decisions?order=asc", None)).await;
        assert_eq!(ids(json_body(response).await), vec![1, 3, 2]);

        let response = send(&app, request(Method::GET, "/api/v1/decisions", None)).await;
        assert_eq!(ids(json_body(response).await), vec![2, 3, 1]);

        let response = send(
            &app,
            request(
                Method::GET,
                "/api/v1/decisions?order=asc&start=2024-01-06&end=2024-01-31",
                None,
            ),
        )
        .await;
        assert_eq!(ids(json_body(response).await), vec![3, 2]);

        let response = send(&app, request(Method::GET, "/api/v1/decisions?order=up", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
