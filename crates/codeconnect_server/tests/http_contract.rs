use std::sync::Arc;

use codeconnect_core::{InMemoryResourceStore, SqliteResourceStore};
use codeconnect_server::identity::{PRINCIPAL_ID_HEADER, PRINCIPAL_NAME_HEADER};
use codeconnect_server::{router, AppState, DynStore, TrustedHeaderGate};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(store: DynStore) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        let app = router(AppState::new(store, Arc::new(TrustedHeaderGate)));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    async fn memory() -> Self {
        Self::start(Box::new(InMemoryResourceStore::new())).await
    }

    fn request(&self, method: Method, path: &str, user: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(user) = user {
            builder = builder
                .header(PRINCIPAL_ID_HEADER, user)
                .header(PRINCIPAL_NAME_HEADER, "Ada");
        }
        builder
    }

    async fn get(&self, path: &str, user: Option<&str>) -> (StatusCode, Value) {
        read(self.request(Method::GET, path, user)).await
    }

    async fn post(&self, path: &str, user: Option<&str>, body: Value) -> (StatusCode, Value) {
        read(self.request(Method::POST, path, user).json(&body)).await
    }

    async fn put(&self, path: &str, user: Option<&str>, body: Value) -> (StatusCode, Value) {
        read(self.request(Method::PUT, path, user).json(&body)).await
    }

    async fn post_raw(&self, path: &str, user: Option<&str>, body: &'static str) -> StatusCode {
        let (status, _) = read(
            self.request(Method::POST, path, user)
                .header("content-type", "application/json")
                .body(body),
        )
        .await;
        status
    }
}

async fn read(builder: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let response = builder.send().await.expect("send request");
    let status = response.status();
    let text = response.text().await.expect("read body");
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).expect("json body")
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_ok_without_principal() {
    let server = TestServer::memory().await;
    let (status, body) = server.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn organization_contract_end_to_end() {
    let server = TestServer::memory().await;

    let (status, body) = server.get("/organizations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, body) = server.get("/organizations", Some("user-1")).await;
    assert_eq!(status, StatusCode::OK);
    let organizations = body["organizations"].as_array().unwrap();
    assert_eq!(organizations.len(), 1);
    assert_eq!(organizations[0]["id"], "personal-org-user-1");
    assert_eq!(organizations[0]["name"], "Ada's Org");
    assert_eq!(organizations[0]["role"], "owner");
    assert_eq!(organizations[0]["ownerId"], "user-1");

    let (status, body) = server
        .post("/organizations", Some("user-1"), json!({ "name": "My Team" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let slug = body["organization"]["slug"].as_str().unwrap();
    let token = slug.strip_prefix("my-team-").unwrap();
    assert!(!token.is_empty() && token.chars().all(|c| c.is_ascii_digit()));
    assert!(body["organization"]["createdAt"].is_i64());

    let (status, body) = server
        .post("/organizations", Some("user-1"), json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Organization name is required" }));

    let (_, body) = server.get("/organizations", Some("user-1")).await;
    assert_eq!(body["organizations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unauthenticated_writes_are_rejected_before_the_body() {
    let server = TestServer::memory().await;

    let (status, body) = server
        .post("/organizations", None, json!({ "name": "Team" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let status = server.post_raw("/organizations", None, "{not json").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = server.get("/organizations", Some("user-1")).await;
    assert_eq!(body["organizations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_or_missing_names_are_bad_requests() {
    let server = TestServer::memory().await;

    let status = server
        .post_raw("/organizations", Some("user-1"), "{not json")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post("/organizations", Some("user-1"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Organization name is required");

    let (status, body) = server
        .post("/organizations", Some("user-1"), json!({ "name": null }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Organization name is required" }));

    let (status, body) = server
        .post("/organizations", Some("user-1"), json!({ "name": 7 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn null_names_report_the_validation_message() {
    let server = TestServer::memory().await;
    let projects_path = "/organizations/personal-org-user-1/projects";

    let (status, body) = server
        .post(projects_path, Some("user-1"), json!({ "name": null }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Project name is required" }));

    let (_, body) = server
        .post(projects_path, Some("user-1"), json!({ "name": "Demo" }))
        .await;
    let project_id = body["project"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post(
            &format!("{projects_path}/{project_id}/files"),
            Some("user-1"),
            json!({ "name": null }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "File name is required" }));

    let (_, body) = server.get(projects_path, Some("user-1")).await;
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn projects_and_files_follow_the_same_policy() {
    let server = TestServer::memory().await;
    let org = "personal-org-user-1";
    let projects_path = format!("/organizations/{org}/projects");

    let (status, _) = server.get(&projects_path, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server.get(&projects_path, Some("user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "projects": [] }));

    let (status, body) = server
        .post(&projects_path, Some("user-1"), json!({ "name": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Project name is required");

    let (status, body) = server
        .post(
            &projects_path,
            Some("user-1"),
            json!({ "name": "Web App", "description": "frontend" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let project = &body["project"];
    assert_eq!(project["organizationId"], org);
    assert!(project["slug"].as_str().unwrap().starts_with("web-app-"));
    let project_id = project["id"].as_str().unwrap().to_string();

    let files_path = format!("{projects_path}/{project_id}/files");
    let (status, body) = server.get(&files_path, Some("user-1")).await;
    assert_eq!(status, StatusCode::OK);
    let seeds = body["files"].as_array().unwrap().clone();
    assert_eq!(seeds[0]["name"], "index.js");
    assert_eq!(seeds[0]["type"], "file");
    assert_eq!(seeds[0]["language"], "javascript");
    assert_eq!(seeds[1]["path"], "/README.md");

    let (status, body) = server
        .post(&files_path, Some("user-1"), json!({ "name": "app.tsx" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file"]["language"], "typescript");
    assert!(body["file"]["content"]
        .as_str()
        .unwrap()
        .starts_with("// New TypeScript file"));

    let (status, body) = server
        .post(&files_path, Some("user-1"), json!({ "name": " " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File name is required");

    let (_, body) = server.get(&files_path, Some("user-1")).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), seeds.len() + 1);
    assert_eq!(&files[..seeds.len()], seeds.as_slice());
}

#[tokio::test]
async fn unknown_or_foreign_parents_are_not_found() {
    let server = TestServer::memory().await;

    let (_, body) = server
        .post("/organizations", Some("user-1"), json!({ "name": "Private" }))
        .await;
    let org_id = body["organization"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .get(&format!("/organizations/{org_id}/projects"), Some("user-2"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Organization not found");

    let (status, body) = server
        .get(
            &format!("/organizations/{org_id}/projects/missing/files"),
            Some("user-1"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");
}

#[tokio::test]
async fn saving_content_round_trips_through_listing() {
    let server =
        TestServer::start(Box::new(SqliteResourceStore::open_in_memory().unwrap())).await;
    let projects_path = "/organizations/personal-org-user-1/projects";

    let (_, body) = server
        .post(projects_path, Some("user-1"), json!({ "name": "Demo" }))
        .await;
    let project_id = body["project"]["id"].as_str().unwrap().to_string();
    let files_path = format!("{projects_path}/{project_id}/files");
    let (_, body) = server.get(&files_path, Some("user-1")).await;
    let readme_id = body["files"][1]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .put(
            &format!("{files_path}/{readme_id}"),
            Some("user-1"),
            json!({ "content": "# Demo\n\nUpdated." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file"]["content"], "# Demo\n\nUpdated.");

    let (_, body) = server.get(&files_path, Some("user-1")).await;
    assert_eq!(body["files"][1]["content"], "# Demo\n\nUpdated.");
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    let (status, body) = server
        .put(
            &format!("{files_path}/no-such-file"),
            Some("user-1"),
            json!({ "content": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found");
}
