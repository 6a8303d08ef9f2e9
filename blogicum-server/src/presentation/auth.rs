use crate::application::BlogService;
use crate::domain::Viewer;
use crate::infrastructure::JwtService;
use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{web, Error, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Resolves the optional bearer token into a viewer. A missing, malformed
/// or expired token, or one for a deleted account, yields
/// [`Viewer::Anonymous`]; routes decide for themselves whether that is
/// enough.
impl FromRequest for Viewer {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = Authorization::<Bearer>::parse(req)
            .ok()
            .map(|auth| auth.into_scheme().token().to_string());
        let jwt_service = req.app_data::<web::Data<Arc<JwtService>>>().cloned();
        let blog_service = req.app_data::<web::Data<Arc<BlogService>>>().cloned();

        Box::pin(async move {
            let Some(token) = token else {
                return Ok(Viewer::Anonymous);
            };

            let (Some(jwt_service), Some(blog_service)) = (jwt_service, blog_service) else {
                return Err(actix_web::error::ErrorInternalServerError(
                    "JWT service not configured",
                ));
            };

            let user_id = match jwt_service.verify_token(&token) {
                Ok(user_id) => user_id,
                Err(_) => return Ok(Viewer::Anonymous),
            };

            blog_service.resolve_viewer(user_id).await.map_err(|e| {
                tracing::error!("Failed to resolve viewer {}: {}", user_id, e);
                actix_web::error::ErrorInternalServerError("Internal server error")
            })
        })
    }
}
