//! Tests to verify the service layer under tracing and its error mapping

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;
use tracing_test::traced_test;

use api_ingress::{ApiIngress, ApiIngressConfig, RestfulModule};
use users_info::config::UsersInfoConfig;
use users_info::contract::error::UsersInfoError;
use users_info::contract::model::{NewUser, User};
use users_info::domain::error::DomainError;
use users_info::domain::repo::UsersRepository;
use users_info::domain::service::Service;
use users_info::UsersInfo;

// Mock repository holding a single fixed user
struct MockUsersRepository {
    users: Vec<User>,
}

impl MockUsersRepository {
    fn new() -> Self {
        Self {
            users: vec![User::new(1, "Test User", "test@example.com")],
        }
    }
}

#[async_trait::async_trait]
impl UsersRepository for MockUsersRepository {
    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn append(&self, new_user: NewUser) -> Result<User> {
        Ok(User::new(
            self.users.len() as i64 + 1,
            new_user.name,
            new_user.email,
        ))
    }
}

// Repository whose every call fails
struct FailingRepository;

#[async_trait::async_trait]
impl UsersRepository for FailingRepository {
    async fn list(&self) -> Result<Vec<User>> {
        anyhow::bail!("store unavailable")
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<User>> {
        anyhow::bail!("store unavailable")
    }

    async fn append(&self, _new_user: NewUser) -> Result<User> {
        anyhow::bail!("store unavailable")
    }
}

#[traced_test]
#[tokio::test]
async fn get_user_emits_spans() {
    let service = Service::new(Arc::new(MockUsersRepository::new()));

    let user = service.get_user(1).await.unwrap();
    assert_eq!(user.name, "Test User");

    let missing = service.find_user(42).await.unwrap();
    assert!(missing.is_none());
}

#[traced_test]
#[tokio::test]
async fn create_user_emits_spans() {
    let service = Service::new(Arc::new(MockUsersRepository::new()));

    let created = service
        .create_user(NewUser {
            name: "New User".to_string(),
            email: "new@example.com".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.id, 2);
}

#[tokio::test]
async fn get_user_reports_not_found() {
    let service = Service::new(Arc::new(MockUsersRepository::new()));

    match service.get_user(999).await {
        Err(DomainError::UserNotFound { id }) => assert_eq!(id, 999),
        other => panic!("expected UserNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn storage_failures_become_domain_errors() {
    let service = Service::new(Arc::new(FailingRepository));

    let err = service.list_users().await.unwrap_err();
    assert!(matches!(err, DomainError::Storage { .. }));
    assert!(err.to_string().contains("store unavailable"));

    assert_eq!(UsersInfoError::from(err), UsersInfoError::Internal);
    assert_eq!(
        UsersInfoError::from(DomainError::user_not_found(5)),
        UsersInfoError::NotFound { id: 5 }
    );
}

#[traced_test]
#[tokio::test]
async fn storage_failure_maps_to_500_over_rest() {
    let module = UsersInfo::with_repository(Arc::new(FailingRepository), UsersInfoConfig::default());
    let modules: Vec<Arc<dyn RestfulModule>> = vec![Arc::new(module)];
    let router = ApiIngress::new(ApiIngressConfig::default())
        .build_router(&modules)
        .unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "internal_error");
    // Storage details stay in the logs
    assert_eq!(json["message"], "internal error");
}
