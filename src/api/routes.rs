// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                .route("/cards", web::get().to(handlers::list_cards))
                .route("/rarity-counts", web::get().to(handlers::rarity_counts))
                .route("/rarity-by-account", web::get().to(handlers::rarity_by_account))
                .route(
                    "/cards-by-account-rarity",
                    web::get().to(handlers::cards_by_account_rarity),
                )
                .route("/expansions", web::get().to(handlers::expansions))
                .route("/my-collection", web::get().to(handlers::my_collection))
                .route("/stats", web::get().to(handlers::stats)),
        );
}
