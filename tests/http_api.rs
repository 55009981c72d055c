//! HTTP surface tests for the generation and export endpoints, driven through
//! the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::util::ServiceExt;
use vendor_eval::evaluations::{
    evaluation_router, EvaluationService, InMemoryEvaluationStore, Membership, Project,
    ProjectCode, ProjectRole, Requirement, RequirementId, Username, Vendor, VendorId,
};

fn seeded_store() -> InMemoryEvaluationStore {
    let store = InMemoryEvaluationStore::new();
    store.add_project(Project {
        code: ProjectCode("ProjA".to_string()),
        name: "Project A platform evaluation".to_string(),
        notes: None,
        is_active: true,
    });
    store.add_project(Project {
        code: ProjectCode("Frozen".to_string()),
        name: "Paused evaluation".to_string(),
        notes: None,
        is_active: false,
    });
    store.add_vendor(Vendor {
        id: VendorId(0),
        project: ProjectCode("ProjA".to_string()),
        name: "Acme".to_string(),
        notes: None,
        is_active: true,
    });
    store.add_requirement(Requirement {
        id: RequirementId(0),
        project: ProjectCode("ProjA".to_string()),
        description: "Supports SSO".to_string(),
        applies_to: Default::default(),
        priorities: Default::default(),
        categories: Default::default(),
        order: None,
        notes: None,
        is_active: true,
    });
    store.enroll(Membership {
        username: Username("sam".to_string()),
        project: ProjectCode("ProjA".to_string()),
        role: ProjectRole::Member,
    });
    store
}

fn router_over(store: InMemoryEvaluationStore) -> Router {
    evaluation_router(Arc::new(EvaluationService::new(Arc::new(store))))
}

async fn get(router: Router, uri: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds")
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn generate_returns_report_text_on_success() {
    let response = get(router_over(seeded_store()), "/api/generate/proja").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("created evaluation [sam], Acme, Supports SSO"));
    assert!(body.ends_with("done!\n"));
}

#[tokio::test]
async fn generate_maps_unknown_project_to_not_found() {
    let response = get(router_over(seeded_store()), "/api/generate/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("project was not found for project code [nope]"));
}

#[tokio::test]
async fn generate_maps_inactive_project_to_conflict() {
    let response = get(router_over(seeded_store()), "/api/generate/frozen").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn generate_maps_missing_roster_to_unprocessable() {
    let store = seeded_store();
    store.add_project(Project {
        code: ProjectCode("NoRoster".to_string()),
        name: "Roster never provisioned".to_string(),
        notes: None,
        is_active: true,
    });
    store.add_vendor(Vendor {
        id: VendorId(0),
        project: ProjectCode("NoRoster".to_string()),
        name: "Acme".to_string(),
        notes: None,
        is_active: true,
    });

    let response = get(router_over(store), "/api/generate/noroster").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_serves_csv_as_attachment() {
    let router = router_over(seeded_store());

    let generate = get(router.clone(), "/api/generate/ProjA").await;
    assert_eq!(generate.status(), StatusCode::OK);

    let response = get(router, "/api/export").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("content type"),
        "text/csv"
    );
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .expect("disposition"),
        "attachment; filename=\"evaluations.csv\""
    );

    let body = body_text(response).await;
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("id,username,vendor,requirement,score,confirmed,priorities,notes")
    );
    assert_eq!(lines.next(), Some("1,sam,Acme,Supports SSO,,false,,"));
}

#[tokio::test]
async fn export_of_an_empty_store_is_just_the_header() {
    let response = get(router_over(InMemoryEvaluationStore::new()), "/api/export").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert_eq!(
        body,
        "id,username,vendor,requirement,score,confirmed,priorities,notes\n"
    );
}
