//! Route assembly

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use td_models::{Event, Note, Project, Reminder, Task};

use crate::extractors::AppState;
use crate::handlers::{employees, files, parents};

/// Build the full REST router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/projects", parents::router::<Project>())
        .nest("/tasks", parents::router::<Task>())
        .nest("/notes", parents::router::<Note>())
        .nest("/events", parents::router::<Event>())
        .nest("/reminders", parents::router::<Reminder>())
        .nest("/employees", employees::router())
        .nest("/files", files::router())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to Project Management API" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use td_attachments::{AttachmentCoordinator, MemoryBlobStore};
    use td_store::MemoryRecordStore;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let coordinator = Arc::new(AttachmentCoordinator::new(records.clone(), blobs));
        router(AppState::new(records, coordinator))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const BOUNDARY: &str = "test-boundary";

    fn multipart_request(uri: &str, method: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(filename) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                }
                None => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn project_draft() -> Value {
        json!({ "title": "Launch", "status": "not_started", "priority": "high" })
    }

    #[tokio::test]
    async fn test_root() {
        let app = test_app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Welcome to Project Management API");
    }

    #[tokio::test]
    async fn test_create_and_fetch_project() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/projects", project_draft()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert!(body["parent"]["attachment"].is_null());
        let id = body["parent"]["id"].as_str().unwrap().to_owned();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/projects/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["title"], "Launch");
    }

    #[tokio::test]
    async fn test_missing_project_is_404() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/projects/{}", td_core::RecordId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_empty_title_is_422() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/projects",
                json!({ "title": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_multipart_create_with_file() {
        let app = test_app();

        let draft = project_draft().to_string();
        let response = app
            .clone()
            .oneshot(multipart_request(
                "/projects",
                "POST",
                &[
                    ("payload", None, draft.as_bytes()),
                    ("file", Some("plan.pdf"), b"pdf bytes"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        let locator = body["parent"]["attachment"].as_str().unwrap().to_owned();
        assert_eq!(body["metadata"]["locator"], locator);
        assert_eq!(body["metadata"]["name"], "plan.pdf");
        assert!(body.get("attachment_failure").is_none());

        // Metadata row is listed under /files.
        let response = app
            .oneshot(Request::builder().uri("/files").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let files = body_json(response).await;
        assert_eq!(files.as_array().unwrap().len(), 1);
        assert_eq!(files[0]["locator"], locator);
    }

    #[tokio::test]
    async fn test_replace_attachment_on_missing_parent_is_404() {
        let app = test_app();
        let uri = format!("/projects/{}/attachment", td_core::RecordId::new());
        let response = app
            .oneshot(multipart_request(
                &uri,
                "PUT",
                &[("file", Some("v2.pdf"), b"new bytes")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_route_only_where_it_exists() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/projects", project_draft()))
            .await
            .unwrap();
        let id = body_json(response).await["parent"]["id"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/projects/{id}/status"),
                json!({ "status": "completed" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "completed");

        // Notes carry no status; the route does not exist for them.
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/notes/{id}/status"),
                json!({ "status": "completed" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_project_removes_it() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/projects", project_draft()))
            .await
            .unwrap();
        let id = body_json(response).await["parent"]["id"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/projects/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/projects/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unattached_file_upload_and_delete() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(multipart_request(
                "/files",
                "POST",
                &[("file", Some("notes.txt"), b"standalone")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["name"], "notes.txt");
        assert!(body.get("parent_kind").is_none());
        let id = body["id"].as_str().unwrap().to_owned();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/files/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "File deleted successfully");
    }

    #[tokio::test]
    async fn test_file_upload_onto_parent() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/projects", project_draft()))
            .await
            .unwrap();
        let id = body_json(response).await["parent"]["id"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = app
            .clone()
            .oneshot(multipart_request(
                "/files",
                "POST",
                &[
                    ("file", Some("brief.pdf"), b"brief"),
                    ("parent_kind", None, b"project"),
                    ("parent_id", None, id.as_bytes()),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["parent"]["id"], id.as_str());
        assert_eq!(
            body["parent"]["attachment"],
            body["metadata"]["locator"]
        );

        // project_id filter resolves through the parent fields.
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/files?project_id={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let files = body_json(response).await;
        assert_eq!(files.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_employee_crud() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/employees",
                json!({ "name": "Dana", "role": "engineer" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_owned();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/employees/{id}"),
                json!({ "name": "Dana", "role": "staff engineer" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["role"], "staff engineer");

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/employees/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_task_list_filters_by_project() {
        let app = test_app();

        let project_id = td_core::RecordId::new().to_string();
        for title in ["a", "b"] {
            let draft = json!({
                "title": title,
                "status": "not_started",
                "priority": "medium",
                "due_date": "2026-09-15",
                "project_id": project_id,
            });
            let response = app
                .clone()
                .oneshot(json_request("POST", "/tasks", draft))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let other = json!({
            "title": "c",
            "status": "not_started",
            "priority": "medium",
            "due_date": "2026-09-15",
            "project_id": td_core::RecordId::new().to_string(),
        });
        app.clone()
            .oneshot(json_request("POST", "/tasks", other))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/tasks?project_id={project_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
