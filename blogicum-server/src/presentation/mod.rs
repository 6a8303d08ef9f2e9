pub mod auth;
pub mod http_handlers;

use actix_web::web;
use http_handlers as h;

/// Registers every blog route. Fixed paths are registered before the
/// parameterised ones they would otherwise collide with.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(h::index))
        .route("/category/{slug}/", web::get().to(h::category_posts))
        .service(
            web::resource("/profile/edit/")
                .route(web::get().to(h::profile_form))
                .route(web::post().to(h::update_profile)),
        )
        .route("/profile/{username}/", web::get().to(h::profile))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("/create/")
                        .route(web::get().to(h::new_post_form))
                        .route(web::post().to(h::create_post)),
                )
                .route("/{post_id}/", web::get().to(h::post_detail))
                .service(
                    web::resource("/{post_id}/edit/")
                        .route(web::get().to(h::edit_post_form))
                        .route(web::post().to(h::update_post)),
                )
                .service(
                    web::resource("/{post_id}/delete/")
                        .route(web::get().to(h::delete_post_confirm))
                        .route(web::post().to(h::delete_post)),
                )
                .route("/{post_id}/comment/", web::post().to(h::add_comment))
                .service(
                    web::resource("/{post_id}/edit_comment/{comment_id}/")
                        .route(web::get().to(h::edit_comment_form))
                        .route(web::post().to(h::update_comment)),
                )
                .service(
                    web::resource("/{post_id}/delete_comment/{comment_id}/")
                        .route(web::get().to(h::delete_comment_confirm))
                        .route(web::post().to(h::delete_comment)),
                ),
        );
}
