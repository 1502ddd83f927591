mod admin;
mod health;
mod login;
mod products;
mod reviews;
mod umkm;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};

use crate::{AppState, middleware::session_guard};

pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/auth/session", get(login::current_session))
        .route("/admin/dashboard", get(admin::dashboard))
        .route(
            "/admin/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/admin/products/{id}",
            get(admin::get_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        .route(
            "/admin/products/{id}/images/{image_id}",
            delete(admin::delete_product_image),
        )
        .route(
            "/admin/products/{id}/images/{image_id}/featured",
            put(admin::set_featured_image),
        )
        .route("/admin/products/{id}/qr", get(admin::qr_code_info))
        .route("/admin/products/{id}/qr/download", get(admin::download_qr_code))
        .route("/admin/umkm", get(umkm::list_umkm).post(umkm::create_umkm))
        .route("/admin/umkm/{id}", get(umkm::get_umkm).put(umkm::update_umkm))
        .route("/admin/umkm/{id}/logo", put(umkm::upload_logo))
        .route("/admin/reviews", get(reviews::list_reviews))
        .route(
            "/admin/reviews/{id}",
            patch(reviews::update_review_status).delete(reviews::delete_review),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session_guard));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/login", post(login::login))
        .route("/auth/logout", post(login::logout))
        .route("/product/{code}", get(products::product_page))
        .route("/product/{code}/story", get(products::product_story))
        .route("/product/{code}/gallery", get(products::product_gallery))
        .route("/product/{code}/maker", get(products::product_maker))
        .route(
            "/product/{code}/reviews",
            get(products::product_reviews).post(reviews::submit_review),
        )
        .merge(admin_routes)
        .with_state(state)
}
