use crate::application::{BlogService, Outcome};
use crate::domain::comment::CommentForm;
use crate::domain::pagination::PageRequest;
use crate::domain::post::PostForm;
use crate::domain::user::ProfileForm;
use crate::domain::{DomainError, Viewer};
use crate::infrastructure::AppConfig;
use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;

// Query string of the listing routes
#[derive(serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> Result<PageRequest, DomainError> {
        PageRequest::parse(self.page.as_deref())
    }
}

// DomainError into HttpResponse
fn error_to_response(err: DomainError) -> HttpResponse {
    match err {
        DomainError::Validation(errors) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "errors": errors }))
        }
        err => {
            let message = err.to_string();
            match err.to_status_code() {
                // only JwtService raises Unauthorized; the Viewer extractor absorbs it
                401 => HttpResponse::Unauthorized().json(serde_json::json!({ "error": message })),
                404 => HttpResponse::NotFound().json(serde_json::json!({ "error": message })),
                _ => {
                    tracing::error!("Request failed: {}", message);
                    HttpResponse::InternalServerError()
                        .json(serde_json::json!({ "error": "Internal server error" }))
                }
            }
        }
    }
}

// Outcome into HttpResponse: pages as JSON, redirects as 302
fn respond(result: Result<Outcome, DomainError>, req: &HttpRequest, config: &AppConfig) -> HttpResponse {
    match result {
        Ok(Outcome::Render(page)) => HttpResponse::Ok().json(page),
        Ok(Outcome::Redirect(redirect)) => {
            let requested = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| req.path());
            let location = redirect.location(&config.login_url, requested);
            tracing::debug!("Redirecting {} to {}", requested, location);
            HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .finish()
        }
        Err(err) => error_to_response(err),
    }
}

// ============== Listings ==============

pub async fn index(
    req: HttpRequest,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let result = match query.page() {
        Ok(page) => blog_service.index(page).await,
        Err(err) => Err(err),
    };
    respond(result, &req, &config)
}

pub async fn category_posts(
    req: HttpRequest,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let slug = path.into_inner();

    tracing::info!("Listing category {}", slug);

    let result = match query.page() {
        Ok(page) => blog_service.category_posts(&slug, page).await,
        Err(err) => Err(err),
    };
    respond(result, &req, &config)
}

pub async fn profile(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let username = path.into_inner();

    tracing::info!("Listing profile {}", username);

    let result = match query.page() {
        Ok(page) => blog_service.profile(&viewer, &username, page).await,
        Err(err) => Err(err),
    };
    respond(result, &req, &config)
}

// ============== Profile ==============

pub async fn profile_form(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    respond(Ok(blog_service.profile_form(&viewer)), &req, &config)
}

pub async fn update_profile(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    form: web::Json<ProfileForm>,
) -> impl Responder {
    let result = blog_service
        .update_profile(&viewer, form.into_inner())
        .await;
    respond(result, &req, &config)
}

// ============== Posts ==============

pub async fn post_detail(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Getting post with id={}", post_id);

    let result = blog_service.post_detail(&viewer, post_id).await;
    respond(result, &req, &config)
}

pub async fn new_post_form(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    respond(Ok(blog_service.new_post_form(&viewer)), &req, &config)
}

pub async fn create_post(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    form: web::Json<PostForm>,
) -> impl Responder {
    tracing::info!("Creating post for user_id={:?}", viewer.user_id());

    let result = blog_service.create_post(&viewer, form.into_inner()).await;
    respond(result, &req, &config)
}

pub async fn edit_post_form(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
) -> impl Responder {
    let result = blog_service.edit_post_form(&viewer, path.into_inner()).await;
    respond(result, &req, &config)
}

pub async fn update_post(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
    form: web::Json<PostForm>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Updating post id={} for user_id={:?}", post_id, viewer.user_id());

    let result = blog_service
        .update_post(&viewer, post_id, form.into_inner())
        .await;
    respond(result, &req, &config)
}

pub async fn delete_post_confirm(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
) -> impl Responder {
    let result = blog_service
        .delete_post_confirm(&viewer, path.into_inner())
        .await;
    respond(result, &req, &config)
}

pub async fn delete_post(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={} for user_id={:?}", post_id, viewer.user_id());

    let result = blog_service.delete_post(&viewer, post_id).await;
    respond(result, &req, &config)
}

// ============== Comments ==============
// Comment routes carry the post id in the URL, but the comment id alone
// identifies the comment.

pub async fn add_comment(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
    form: web::Json<CommentForm>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Commenting on post id={} for user_id={:?}", post_id, viewer.user_id());

    let result = blog_service
        .add_comment(&viewer, post_id, form.into_inner())
        .await;
    respond(result, &req, &config)
}

pub async fn edit_comment_form(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (_post_id, comment_id) = path.into_inner();
    let result = blog_service.edit_comment_form(&viewer, comment_id).await;
    respond(result, &req, &config)
}

pub async fn update_comment(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<(i64, i64)>,
    form: web::Json<CommentForm>,
) -> impl Responder {
    let (_post_id, comment_id) = path.into_inner();

    tracing::info!("Updating comment id={} for user_id={:?}", comment_id, viewer.user_id());

    let result = blog_service
        .update_comment(&viewer, comment_id, form.into_inner())
        .await;
    respond(result, &req, &config)
}

pub async fn delete_comment_confirm(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (_post_id, comment_id) = path.into_inner();
    let result = blog_service.delete_comment_confirm(&viewer, comment_id).await;
    respond(result, &req, &config)
}

pub async fn delete_comment(
    req: HttpRequest,
    viewer: Viewer,
    blog_service: web::Data<Arc<BlogService>>,
    config: web::Data<AppConfig>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (_post_id, comment_id) = path.into_inner();

    tracing::info!("Deleting comment id={} for user_id={:?}", comment_id, viewer.user_id());

    let result = blog_service.delete_comment(&viewer, comment_id).await;
    respond(result, &req, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use serde_json::Value;

    async fn body_json(resp: HttpResponse) -> Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_rt::test]
    async fn errors_map_to_status_and_body() {
        let resp = error_to_response(DomainError::invalid("title", "This field is required."));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "errors": { "title": ["This field is required."] } })
        );

        let resp = error_to_response(DomainError::PostNotFound);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "Post not found");

        let resp = error_to_response(DomainError::Unauthorized("Invalid token".to_string()));
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = error_to_response(DomainError::DatabaseError("connection reset".to_string()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "Internal server error");
    }

    #[actix_rt::test]
    async fn verifier_rejection_maps_to_401() {
        let jwt = crate::infrastructure::JwtService::new("a-test-secret-that-is-long-enough!!").unwrap();
        let err = jwt.verify_token("not.a.jwt").unwrap_err();
        assert_eq!(error_to_response(err).status(), StatusCode::UNAUTHORIZED);
    }
}
