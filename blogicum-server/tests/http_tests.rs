mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use blogicum_server::infrastructure::{AppConfig, JwtService};
use blogicum_server::presentation;
use chrono::{Duration, Utc};
use common::Blog;
use serde_json::{json, Value};
use std::sync::Arc;

const SECRET: &str = "integration-test-secret-with-32-chars";

fn config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        database_max_connections: 1,
        cors_allowed_origins: String::new(),
        login_url: "/auth/login/".to_string(),
    }
}

macro_rules! init_app {
    ($blog:expr, $jwt:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .app_data(web::Data::new($blog.service.clone()))
                .app_data(web::Data::new($jwt.clone()))
                .configure(presentation::configure),
        )
        .await
    };
}

fn jwt() -> Arc<JwtService> {
    Arc::new(JwtService::new(SECRET).unwrap())
}

fn bearer(jwt: &JwtService, viewer: &blogicum_server::domain::Viewer) -> (header::HeaderName, String) {
    let token = jwt.generate_token(viewer.user_id().unwrap()).unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[actix_rt::test]
async fn index_renders_public_posts_as_json() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let post = blog.public_post(&alice).await;
    blog.seed_post(&alice, blog.category.id, Utc::now() + Duration::days(1), true)
        .await;
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["page"], "index");
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["id"], post.id);
    assert_eq!(body["posts"][0]["author"], "alice");
    assert_eq!(body["posts"][0]["category"]["slug"], "travel");
    assert_eq!(body["posts"][0]["comment_count"], 0);
    assert_eq!(body["pagination"]["number"], 1);
}

#[actix_rt::test]
async fn bad_page_numbers_are_not_found() {
    let blog = Blog::new();
    let jwt = jwt();
    let app = init_app!(blog, jwt);

    for uri in ["/?page=abc", "/?page=2", "/?page=0"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn draft_detail_is_not_found_for_everyone_but_the_author() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let bob = blog.viewer("bob");
    let draft = blog
        .seed_post(&alice, blog.category.id, Utc::now() + Duration::days(3), false)
        .await;
    let app = init_app!(blog, jwt);
    let uri = format!("/posts/{}/", draft.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&jwt, &bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&jwt, &alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"], "post_detail");
    assert_eq!(body["post"]["id"], draft.id);
    assert_eq!(body["comments"], json!([]));
}

#[actix_rt::test]
async fn anonymous_mutation_redirects_to_login_with_next() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let post = blog.public_post(&alice).await;
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=%2Fposts%2F{}%2Fdelete%2F", post.id)
    );
}

#[actix_rt::test]
async fn invalid_token_counts_as_anonymous() {
    let blog = Blog::new();
    let jwt = jwt();
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::get()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
}

#[actix_rt::test]
async fn create_post_redirects_to_own_profile() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(bearer(&jwt, &alice))
        .set_json(json!({
            "title": "Hello",
            "text": "First post",
            "category_id": blog.category.id,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/alice/");

    let req = test::TestRequest::get().uri("/profile/alice/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"], "profile");
    assert_eq!(body["profile"]["username"], "alice");
    assert_eq!(body["posts"][0]["title"], "Hello");
}

#[actix_rt::test]
async fn invalid_form_returns_field_errors() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(bearer(&jwt, &alice))
        .set_json(json!({ "title": "", "text": "body" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["category"].is_array());
    assert!(body["errors"].get("text").is_none());
}

#[actix_rt::test]
async fn foreign_delete_is_deflected_to_the_index() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let bob = blog.viewer("bob");
    let post = blog.public_post(&alice).await;
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header(bearer(&jwt, &bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn comment_routes_redirect_to_the_parent_post() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let bob = blog.viewer("bob");
    let post = blog.public_post(&alice).await;
    let app = init_app!(blog, jwt);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(bearer(&jwt, &alice))
        .set_json(json!({ "text": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let req = test::TestRequest::get().uri(&detail).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let comment_id = body["comments"][0]["id"].as_i64().unwrap();
    assert_eq!(body["comments"][0]["author"], "alice");

    let edit_uri = format!("/posts/{}/edit_comment/{}/", post.id, comment_id);

    let req = test::TestRequest::get()
        .uri(&edit_uri)
        .insert_header(bearer(&jwt, &bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let req = test::TestRequest::get()
        .uri(&edit_uri)
        .insert_header(bearer(&jwt, &alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"], "comment_form");
    assert_eq!(body["form"]["text"], "hello");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_comment/{}/", post.id, comment_id))
        .insert_header(bearer(&jwt, &alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);
}

#[actix_rt::test]
async fn profile_edit_is_always_the_viewers_own() {
    let blog = Blog::new();
    let jwt = jwt();
    let alice = blog.viewer("alice");
    let app = init_app!(blog, jwt);

    let req = test::TestRequest::get()
        .uri("/profile/edit/")
        .insert_header(bearer(&jwt, &alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"], "profile_form");
    assert_eq!(body["form"]["username"], "alice");

    let req = test::TestRequest::post()
        .uri("/profile/edit/")
        .insert_header(bearer(&jwt, &alice))
        .set_json(json!({ "username": "alice2", "email": "a@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/alice2/");
}

#[actix_rt::test]
async fn unknown_category_and_profile_are_not_found() {
    let blog = Blog::new();
    let jwt = jwt();
    let app = init_app!(blog, jwt);

    for uri in ["/category/nowhere/", "/profile/nobody/", "/posts/12345/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
