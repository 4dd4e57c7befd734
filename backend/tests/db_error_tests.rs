//! How repository failures surface: which variant a storage error becomes and
//! which HTTP status that variant is answered with.

use bin_tally::db::repositories::LocalRepository;
use bin_tally::db::repository::{CatalogRepository, FormRepository, RepositoryError};
use bin_tally::models::{BinTypeInput, FormBinSpec, NewForm};

fn new_form(code: &str) -> NewForm {
    NewForm {
        title: "Depot".into(),
        description: None,
        location: "Yard".into(),
        area: Some("North".into()),
        unique_code: code.into(),
        company_id: None,
        created_by: None,
    }
}

#[tokio::test]
async fn test_taken_form_code_is_a_conflict() {
    let repo = LocalRepository::new();
    repo.create_form(&new_form("ABCDEF"), &[]).await.unwrap();

    let err = repo.create_form(&new_form("ABCDEF"), &[]).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));
    assert!(!err.is_retryable());
    assert!(err.to_string().starts_with("Conflict: Form code already in use"));
    assert_eq!(err.context().details.as_deref(), Some("ABCDEF"));
}

#[tokio::test]
async fn test_repeated_bin_type_is_a_validation_error() {
    let repo = LocalRepository::new();
    let glass = repo
        .create_bin_type(&BinTypeInput {
            name: "Glass".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let row = FormBinSpec {
        id: None,
        bin_type_id: glass.id,
        quantity: 2,
    };

    let err = repo
        .create_form(&new_form("ABCDEF"), &[row.clone(), row])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
    assert_eq!(err.context().entity.as_deref(), Some("bin_type"));
    assert_eq!(
        err.context().entity_id.as_deref(),
        Some(glass.id.to_string().as_str())
    );
}

#[tokio::test]
async fn test_unhealthy_store_fails_with_connection_error() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);

    let err = repo.list_forms(None).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    assert!(!err.is_not_found());
    let err = err.with_operation("list_forms");
    assert_eq!(err.context().operation.as_deref(), Some("list_forms"));
}

#[cfg(feature = "postgres-repo")]
mod diesel_errors {
    use bin_tally::db::repository::RepositoryError;
    use diesel::result::{DatabaseErrorKind, Error};

    fn database_error(kind: DatabaseErrorKind, message: &str) -> RepositoryError {
        Error::DatabaseError(kind, Box::new(message.to_string())).into()
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint",
        );
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
        assert!(!err.is_retryable());
        assert_eq!(
            err.context().details.as_deref(),
            Some("db_error_kind=UniqueViolation")
        );
        assert!(err
            .to_string()
            .starts_with("Conflict: duplicate key value violates unique constraint"));
    }

    #[test]
    fn test_foreign_key_violation_becomes_conflict() {
        let err = database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "update or delete on table \"bin_types\" violates foreign key constraint",
        );
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
        assert_eq!(
            err.context().details.as_deref(),
            Some("db_error_kind=ForeignKeyViolation")
        );
    }

    #[test]
    fn test_serialization_failure_is_a_retryable_query_error() {
        let err = database_error(
            DatabaseErrorKind::SerializationFailure,
            "could not serialize access",
        );
        assert!(matches!(err, RepositoryError::QueryError { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_database_errors_are_plain_query_errors() {
        let err = database_error(
            DatabaseErrorKind::ReadOnlyTransaction,
            "cannot execute INSERT in a read-only transaction",
        );
        assert!(matches!(err, RepositoryError::QueryError { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_row_is_not_found() {
        let err: RepositoryError = Error::NotFound.into();
        assert!(err.is_not_found());
    }
}

#[cfg(feature = "http-server")]
mod http_status {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::Value;

    use bin_tally::db::repository::RepositoryError;
    use bin_tally::db::services::ServiceError;
    use bin_tally::http::error::AppError;

    async fn respond(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_repository_variants_map_to_statuses() {
        let cases = [
            (
                RepositoryError::not_found("form"),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                RepositoryError::validation("Bin type listed more than once"),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                RepositoryError::conflict("Form code already in use"),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                RepositoryError::connection("pool exhausted"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY_ERROR",
            ),
            (
                RepositoryError::timeout("statement timeout"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            let (got, body) = respond(AppError::from(err)).await;
            assert_eq!(got, status);
            assert_eq!(body["code"], code);
        }
    }

    #[tokio::test]
    async fn test_storage_failure_hides_message_behind_details() {
        let err = RepositoryError::query("relation \"forms\" does not exist");
        let (status, body) = respond(AppError::from(ServiceError::from(err))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "A storage error occurred");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("relation \"forms\" does not exist"));
    }

    #[tokio::test]
    async fn test_conflict_keeps_its_status_through_the_service_layer() {
        let err = RepositoryError::conflict("Bin type name and size already exist");
        let (status, body) = respond(AppError::from(ServiceError::from(err))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.get("details").is_none());
    }
}
