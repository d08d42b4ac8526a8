use crate::api::models::documents::{
    DocumentResponse, DocumentUpdate, DocumentUploadForm, ListDocumentsQuery,
};
use crate::api::models::pagination::PaginatedResponse;
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::{documents::DocumentFilter, Documents, Repository};
use crate::db::models::documents::{DocumentCreateDBRequest, DocumentUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{DocumentId, MachineId};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use bytes::{Bytes, BytesMut};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/documents",
    tag = "documents",
    summary = "List documents",
    responses(
        (status = 200, description = "List of documents", body = PaginatedResponse<DocumentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(ListDocumentsQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
    _: RequiresPermission<resource::Documents, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<DocumentResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let mut filter = DocumentFilter::new(skip, limit);
    if let Some(machine_id) = query.machine_id {
        filter = filter.with_machine(machine_id);
    }
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut repo = Documents::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let documents = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = documents.into_iter().map(DocumentResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Collected multipart fields for a document upload.
struct UploadedDocument {
    machine_id: MachineId,
    title: Option<String>,
    file_name: String,
    content_type: Option<String>,
    content: Bytes,
}

/// Drain the multipart stream, enforcing the configured size limit while
/// the file field is still arriving.
async fn read_upload(mut multipart: Multipart, max_size: u64) -> Result<UploadedDocument> {
    let mut machine_id: Option<MachineId> = None;
    let mut title: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut content: Option<Bytes> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    })? {
        match field.name() {
            Some("machine_id") => {
                let text = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read machine_id field: {e}"),
                })?;
                machine_id = Some(text.parse().map_err(|_| Error::BadRequest {
                    message: "machine_id must be a valid UUID".to_string(),
                })?);
            }
            Some("title") => {
                let text = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read title field: {e}"),
                })?;
                if !text.is_empty() {
                    title = Some(text);
                }
            }
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());

                let mut buf = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read file content: {e}"),
                })? {
                    if (buf.len() + chunk.len()) as u64 > max_size {
                        return Err(Error::PayloadTooLarge {
                            message: format!("Document exceeds the maximum size of {max_size} bytes"),
                        });
                    }
                    buf.extend_from_slice(&chunk);
                }
                content = Some(buf.freeze());
            }
            _ => continue,
        }
    }

    let machine_id = machine_id.ok_or_else(|| Error::BadRequest {
        message: "Missing required field: machine_id".to_string(),
    })?;
    let content = content.ok_or_else(|| Error::BadRequest {
        message: "Missing required field: file".to_string(),
    })?;
    let file_name = file_name.ok_or_else(|| Error::BadRequest {
        message: "Uploaded file must have a filename".to_string(),
    })?;

    if content.is_empty() {
        return Err(Error::BadRequest {
            message: "Uploaded file is empty".to_string(),
        });
    }

    Ok(UploadedDocument {
        machine_id,
        title,
        file_name,
        content_type,
        content,
    })
}

#[utoipa::path(
    post,
    path = "/documents",
    tag = "documents",
    summary = "Upload document",
    description = "Multipart upload with fields `machine_id`, `file`, and optional `title` (defaults to the filename).",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document uploaded successfully", body = DocumentResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine not found"),
        (status = 413, description = "Document exceeds the configured size limit"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_document(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Documents, operation::CreateOwn>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    let upload = read_upload(multipart, state.config.storage.max_document_size).await?;

    let content_type = upload.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&upload.file_name)
            .first_or_octet_stream()
            .to_string()
    });

    let size_bytes = upload.content.len() as i64;
    let storage_key = state.document_storage.store(upload.content).await?;

    let request = DocumentCreateDBRequest {
        machine_id: upload.machine_id,
        title: upload.title.unwrap_or_else(|| upload.file_name.clone()),
        file_name: upload.file_name,
        content_type,
        size_bytes,
        storage_key,
        uploaded_by: Some(current_user.id),
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut pool_conn);

    let document = match repo.create(&request).await {
        Ok(document) => document,
        Err(e) => {
            // The row never landed, so drop the orphaned blob
            if let Err(cleanup_err) = state.document_storage.delete(storage_key).await {
                tracing::warn!("Failed to clean up stored content after rejected upload: {cleanup_err}");
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

#[utoipa::path(
    get,
    path = "/documents/{document_id}",
    tag = "documents",
    summary = "Get document metadata",
    responses(
        (status = 200, description = "Document metadata", body = DocumentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("document_id" = uuid::Uuid, Path, description = "Document ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
    _: RequiresPermission<resource::Documents, operation::ReadAll>,
) -> Result<Json<DocumentResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut pool_conn);

    match repo.get_by_id(document_id).await? {
        Some(document) => Ok(Json(DocumentResponse::from(document))),
        None => Err(Error::NotFound {
            resource: "Document".to_string(),
            id: document_id.to_string(),
        }),
    }
}

#[utoipa::path(
    get,
    path = "/documents/{document_id}/content",
    tag = "documents",
    summary = "Download document content",
    responses(
        (status = 200, description = "Document content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("document_id" = uuid::Uuid, Path, description = "Document ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn download_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
    _: RequiresPermission<resource::Documents, operation::ReadAll>,
) -> Result<(HeaderMap, Bytes)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut pool_conn);

    let document = repo.get_by_id(document_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Document".to_string(),
        id: document_id.to_string(),
    })?;

    let content = state.document_storage.retrieve(document.storage_key).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&document.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = format!("attachment; filename=\"{}\"", document.file_name.replace('"', ""));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    Ok((headers, content))
}

#[utoipa::path(
    patch,
    path = "/documents/{document_id}",
    tag = "documents",
    summary = "Update document metadata",
    request_body = DocumentUpdate,
    responses(
        (status = 200, description = "Document updated successfully", body = DocumentResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Document or target machine not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("document_id" = uuid::Uuid, Path, description = "Document ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
    _: RequiresPermission<resource::Documents, operation::UpdateAll>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<DocumentResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut pool_conn);
    let request = DocumentUpdateDBRequest::from(update);

    let document = repo.update(document_id, &request).await?;
    Ok(Json(DocumentResponse::from(document)))
}

#[utoipa::path(
    delete,
    path = "/documents/{document_id}",
    tag = "documents",
    summary = "Delete document",
    responses(
        (status = 204, description = "Document deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("document_id" = uuid::Uuid, Path, description = "Document ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
    _: RequiresPermission<resource::Documents, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut pool_conn);

    let document = repo.get_by_id(document_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Document".to_string(),
        id: document_id.to_string(),
    })?;

    if !repo.delete(document_id).await? {
        return Err(Error::NotFound {
            resource: "Document".to_string(),
            id: document_id.to_string(),
        });
    }

    // Stored content is dropped after the row; a leftover blob is logged,
    // not surfaced
    if let Err(e) = state.document_storage.delete(document.storage_key).await {
        tracing::warn!("Failed to delete stored content for document {document_id}: {e}");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{
        bearer_token_for, create_test_app, create_test_machine, create_test_user,
    };
    use axum_test::multipart::{MultipartForm, Part};
    use sqlx::PgPool;

    fn upload_form(machine_id: MachineId, title: Option<&str>, bytes: &[u8]) -> MultipartForm {
        let mut form = MultipartForm::new()
            .add_text("machine_id", machine_id.to_string())
            .add_part(
                "file",
                Part::bytes(bytes.to_vec())
                    .file_name("manual.pdf")
                    .mime_type("application/pdf"),
            );
        if let Some(title) = title {
            form = form.add_text("title", title.to_string());
        }
        form
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_and_download_document(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);
        let machine = create_test_machine(&pool).await;

        let response = server
            .post("/api/v1/documents")
            .authorization_bearer(&token)
            .multipart(upload_form(machine.id, Some("Operator manual"), b"%PDF-1.4 test"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let document: DocumentResponse = response.json();
        assert_eq!(document.title, "Operator manual");
        assert_eq!(document.file_name, "manual.pdf");
        assert_eq!(document.content_type, "application/pdf");
        assert_eq!(document.size_bytes, 13);
        assert_eq!(document.uploaded_by, Some(user.id));

        let response = server
            .get(&format!("/api/v1/documents/{}/content", document.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.4 test");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/pdf")
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_title_defaults_to_filename(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);
        let machine = create_test_machine(&pool).await;

        let response = server
            .post("/api/v1/documents")
            .authorization_bearer(&token)
            .multipart(upload_form(machine.id, None, b"content"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let document: DocumentResponse = response.json();
        assert_eq!(document.title, "manual.pdf");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_for_missing_machine_is_not_found(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);

        let response = server
            .post("/api/v1/documents")
            .authorization_bearer(&token)
            .multipart(upload_form(uuid::Uuid::new_v4(), None, b"content"))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_oversized_upload_is_rejected(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);
        let machine = create_test_machine(&pool).await;

        // Test config caps documents at 1 MiB
        let oversized = vec![0u8; 1024 * 1024 + 1];
        let response = server
            .post("/api/v1/documents")
            .authorization_bearer(&token)
            .multipart(upload_form(machine.id, None, &oversized))
            .await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_requires_admin(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let machine = create_test_machine(&pool).await;

        let response = server
            .post("/api/v1/documents")
            .authorization_bearer(&bearer_token_for(&user))
            .multipart(upload_form(machine.id, None, b"content"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let document: DocumentResponse = response.json();

        server
            .delete(&format!("/api/v1/documents/{}", document.id))
            .authorization_bearer(&bearer_token_for(&user))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format!("/api/v1/documents/{}", document.id))
            .authorization_bearer(&bearer_token_for(&admin))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/documents/{}", document.id))
            .authorization_bearer(&bearer_token_for(&admin))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
