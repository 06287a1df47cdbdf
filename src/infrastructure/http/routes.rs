//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /                          GET   服务信息（无需认证）
//! - /auth/signup               POST  注册
//! - /auth/login                POST  登录，返回 Bearer 令牌
//! - /voices                    GET   音色目录（无需认证）
//! - /projects                  POST  提交旁白项目（multipart）
//! - /projects                  GET   当前用户的项目列表
//! - /projects/:project_id      GET   项目详情
//! - /projects/:project_id/audio GET  下载合成音频

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .merge(auth_routes())
        .merge(voice_routes())
        .merge(project_routes())
}

/// Auth 路由
fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new().route("/voices", get(handlers::list_voices))
}

/// Project 路由
fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/projects",
            post(handlers::create_project).get(handlers::list_projects),
        )
        .route("/projects/:project_id", get(handlers::get_project))
        .route("/projects/:project_id/audio", get(handlers::download_audio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ProjectRepositoryPort;
    use crate::infrastructure::adapters::SineWaveNarrator;
    use crate::infrastructure::auth::TokenService;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteProjectRepository,
        SqliteUserRepository, SqliteVoiceRepository,
    };
    use crate::infrastructure::worker::{
        narration_channel, NarrationWorker, NarrationWorkerConfig,
    };
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use chrono::Duration;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    const BOUNDARY: &str = "overdub-test-boundary";

    struct TestApp {
        router: Router,
        projects: Arc<SqliteProjectRepository>,
        _queue_rx: Option<mpsc::Receiver<Uuid>>,
        _storage: tempfile::TempDir,
    }

    impl TestApp {
        async fn request(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }
    }

    async fn spawn_app(allow_registration: bool, run_worker: bool) -> TestApp {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let voices = Arc::new(SqliteVoiceRepository::new(pool.clone()));
        let projects = Arc::new(SqliteProjectRepository::new(pool));
        let storage = tempfile::tempdir().unwrap();

        let (queue, rx) = narration_channel(16);
        let mut queue_rx = Some(rx);
        if run_worker {
            let worker = NarrationWorker::new(
                NarrationWorkerConfig {
                    max_concurrent: 2,
                    storage_dir: storage.path().to_path_buf(),
                },
                queue_rx.take().unwrap(),
                projects.clone(),
                Arc::new(SineWaveNarrator::with_defaults()),
            );
            tokio::spawn(worker.run());
        }

        let state = AppState::new(
            users,
            voices,
            projects.clone(),
            TokenService::new("test-secret", Duration::minutes(60)),
            queue,
            "Overdub".to_string(),
            allow_registration,
        );

        TestApp {
            router: create_routes().with_state(Arc::new(state)),
            projects,
            _queue_rx: queue_rx,
            _storage: storage,
        }
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn project_request(
        token: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/projects")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn signup_and_login(app: &TestApp, email: &str) -> String {
        let response = app
            .request(json_request(
                Method::POST,
                "/auth/signup",
                serde_json::json!({"email": email, "password": "secret123"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .request(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"email": email, "password": "secret123"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn poll_until_terminal(app: &TestApp, token: &str, id: &str) -> serde_json::Value {
        for _ in 0..200 {
            let response = app
                .request(get_request(&format!("/projects/{}", id), token))
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            let detail = body_json(response).await;
            let status = detail["status"].as_str().unwrap();
            if status == "completed" || status == "failed" {
                return detail;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("project never reached a terminal status");
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = spawn_app(true, false).await;
        let response = app
            .request(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Overdub API");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let app = spawn_app(true, false).await;

        let response = app
            .request(json_request(
                Method::POST,
                "/auth/signup",
                serde_json::json!({"email": "a@x.com", "password": "secret123"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let user = body_json(response).await;
        assert_eq!(user["email"], "a@x.com");
        assert!(user["id"].is_string());
        assert!(user["created_at"].is_string());
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());

        let response = app
            .request(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"email": "a@x.com", "password": "secret123"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await;
        assert_eq!(token["token_type"], "bearer");
        assert!(!token["access_token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_share_one_shape() {
        let app = spawn_app(true, false).await;
        signup_and_login(&app, "a@x.com").await;

        let wrong_password = app
            .request(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"email": "a@x.com", "password": "wrong-pass"}),
            ))
            .await;
        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        let wrong_password = body_json(wrong_password).await;

        let unknown_email = app
            .request(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"email": "nobody@x.com", "password": "secret123"}),
            ))
            .await;
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        let unknown_email = body_json(unknown_email).await;

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password["error"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let app = spawn_app(true, false).await;

        let short_password = app
            .request(json_request(
                Method::POST,
                "/auth/signup",
                serde_json::json!({"email": "a@x.com", "password": "short"}),
            ))
            .await;
        assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);

        let bad_email = app
            .request(json_request(
                Method::POST,
                "/auth/signup",
                serde_json::json!({"email": "not-an-email", "password": "secret123"}),
            ))
            .await;
        assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email() {
        let app = spawn_app(true, false).await;
        signup_and_login(&app, "a@x.com").await;

        let response = app
            .request(json_request(
                Method::POST,
                "/auth/signup",
                serde_json::json!({"email": "a@x.com", "password": "different9"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Email already registered");
    }

    #[tokio::test]
    async fn test_signup_disabled() {
        let app = spawn_app(false, false).await;

        let response = app
            .request(json_request(
                Method::POST,
                "/auth/signup",
                serde_json::json!({"email": "a@x.com", "password": "secret123"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "Registration is disabled");
    }

    #[tokio::test]
    async fn test_voices_listed_without_auth() {
        let app = spawn_app(true, false).await;

        let response = app
            .request(Request::builder().uri("/voices").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let voices = body_json(response).await;
        assert_eq!(voices.as_array().unwrap().len(), 4);
        assert_eq!(voices[0]["name"], "Ava");
        assert_eq!(voices[0]["language"], "en");

        // 再次请求不会重复种子
        let response = app
            .request(Request::builder().uri("/voices").body(Body::empty()).unwrap())
            .await;
        let voices = body_json(response).await;
        assert_eq!(voices.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_project_endpoints_require_auth() {
        let app = spawn_app(true, false).await;
        let id = Uuid::new_v4();

        let uris = [
            "/projects".to_string(),
            format!("/projects/{}", id),
            format!("/projects/{}/audio", id),
        ];
        for uri in &uris {
            let response = app
                .request(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {}", uri);
        }

        let response = app
            .request(project_request("bogus-token", &[("title", "X")], None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_project_with_inline_text() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let response = app
            .request(project_request(
                &token,
                &[("title", "First narration"), ("text", "  Hello world  ")],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let detail = body_json(response).await;
        assert_eq!(detail["title"], "First narration");
        assert_eq!(detail["status"], "pending");
        assert_eq!(detail["source_text"], "Hello world");
        assert!(detail["audio_url"].is_null());
        assert!(detail["voice_id"].is_null());
        assert!(detail["error_message"].is_null());
        assert!(detail["source_filename"].is_null());

        let response = app.request(get_request("/projects", &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], detail["id"]);
    }

    #[tokio::test]
    async fn test_create_project_requires_text() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let missing = app
            .request(project_request(&token, &[("title", "No text")], None))
            .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(missing).await["error"],
            "No text provided for narration"
        );

        let blank = app
            .request(project_request(
                &token,
                &[("title", "Blank"), ("text", "   \n\t  ")],
                None,
            ))
            .await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_project_requires_title() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let response = app
            .request(project_request(&token, &[("text", "Hello world")], None))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Title is required");
    }

    #[tokio::test]
    async fn test_create_project_voice_id_parsing() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let empty = app
            .request(project_request(
                &token,
                &[("title", "T"), ("text", "Hello"), ("voice_id", "")],
                None,
            ))
            .await;
        assert_eq!(empty.status(), StatusCode::CREATED);
        assert!(body_json(empty).await["voice_id"].is_null());

        let invalid = app
            .request(project_request(
                &token,
                &[("title", "T"), ("text", "Hello"), ("voice_id", "42")],
                None,
            ))
            .await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let voice_id = Uuid::new_v4().to_string();
        let valid = app
            .request(project_request(
                &token,
                &[("title", "T"), ("text", "Hello"), ("voice_id", &voice_id)],
                None,
            ))
            .await;
        assert_eq!(valid.status(), StatusCode::CREATED);
        assert_eq!(body_json(valid).await["voice_id"], voice_id.as_str());
    }

    #[tokio::test]
    async fn test_uploaded_file_takes_precedence_over_text() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let response = app
            .request(project_request(
                &token,
                &[("title", "From file"), ("text", "inline text")],
                Some(("notes.txt", b"Narration from the uploaded file.")),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let detail = body_json(response).await;
        assert_eq!(detail["source_text"], "Narration from the uploaded file.");
        assert_eq!(detail["source_filename"], "notes.txt");
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let empty_file = app
            .request(project_request(
                &token,
                &[("title", "Empty")],
                Some(("notes.txt", b"")),
            ))
            .await;
        assert_eq!(empty_file.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(empty_file).await["error"], "Uploaded file is empty");

        let unsupported = app
            .request(project_request(
                &token,
                &[("title", "Sheet")],
                Some(("report.xlsx", b"not really a spreadsheet")),
            ))
            .await;
        assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            body_json(unsupported).await["error"],
            "Unsupported file format: .xlsx"
        );
    }

    #[tokio::test]
    async fn test_projects_isolated_between_users() {
        let app = spawn_app(true, false).await;
        let owner_token = signup_and_login(&app, "owner@x.com").await;
        let other_token = signup_and_login(&app, "other@x.com").await;

        let response = app
            .request(project_request(
                &owner_token,
                &[("title", "Private"), ("text", "Hello world")],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let project_id = body_json(response).await["id"].as_str().unwrap().to_string();

        let listed = app.request(get_request("/projects", &other_token)).await;
        assert!(body_json(listed).await.as_array().unwrap().is_empty());

        let detail = app
            .request(get_request(&format!("/projects/{}", project_id), &other_token))
            .await;
        assert_eq!(detail.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(detail).await["error"], "Project not found");

        let audio = app
            .request(get_request(
                &format!("/projects/{}/audio", project_id),
                &other_token,
            ))
            .await;
        assert_eq!(audio.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_audio_unavailable_then_gone() {
        let app = spawn_app(true, false).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let response = app
            .request(project_request(
                &token,
                &[("title", "Stalled"), ("text", "Hello world")],
                None,
            ))
            .await;
        let project_id = body_json(response).await["id"].as_str().unwrap().to_string();
        let uri = format!("/projects/{}/audio", project_id);

        // Worker 未运行，项目停留在 pending
        let not_ready = app.request(get_request(&uri, &token)).await;
        assert_eq!(not_ready.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(not_ready).await["error"], "Audio not available yet");

        // 记录了产物路径但文件不在磁盘上
        let id = Uuid::parse_str(&project_id).unwrap();
        assert!(app.projects.mark_processing(id).await.unwrap());
        assert!(app
            .projects
            .mark_completed(id, std::path::Path::new("missing/artifact.wav"))
            .await
            .unwrap());

        let gone = app.request(get_request(&uri, &token)).await;
        assert_eq!(gone.status(), StatusCode::GONE);
        assert_eq!(body_json(gone).await["error"], "Audio file missing");
    }

    #[tokio::test]
    async fn test_end_to_end_narration() {
        let app = spawn_app(true, true).await;
        let token = signup_and_login(&app, "a@x.com").await;

        let response = app
            .request(project_request(
                &token,
                &[("title", "Greeting"), ("text", "Hello world")],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "pending");
        let project_id = created["id"].as_str().unwrap().to_string();

        let detail = poll_until_terminal(&app, &token, &project_id).await;
        assert_eq!(detail["status"], "completed");
        assert_eq!(
            detail["audio_url"],
            format!("/projects/{}/audio", project_id)
        );
        assert!(detail["error_message"].is_null());

        let response = app
            .request(get_request(
                &format!("/projects/{}/audio", project_id),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "audio/wav"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap(),
            format!("attachment; filename=\"project_{}.wav\"", project_id)
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..4], b"RIFF");
    }
}
