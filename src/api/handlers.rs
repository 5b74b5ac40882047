// HTTP request handlers for API endpoints

use std::time::Instant;

use actix_web::{web, HttpResponse, Result};

use crate::api::models::*;
use crate::database_ops::CardCatalog;
use crate::query::{AccountPivotParams, CardListParams, CollectionParams};

/// Process start, for the uptime figure in `/health`.
#[derive(Debug, Clone, Copy)]
pub struct StartedAt(pub Instant);

pub async fn health_check(
    catalog: web::Data<CardCatalog>,
    started: web::Data<StartedAt>,
) -> Result<HttpResponse> {
    let database = match catalog.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            "disconnected"
        }
    };

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        reference_entries: catalog.index().len(),
        uptime_seconds: started.0.elapsed().as_secs(),
    });

    Ok(HttpResponse::Ok().json(response))
}

pub async fn list_cards(
    catalog: web::Data<CardCatalog>,
    params: web::Query<CardListParams>,
) -> Result<HttpResponse> {
    let page = catalog.list_cards(&params).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn rarity_counts(catalog: web::Data<CardCatalog>) -> Result<HttpResponse> {
    let counts = catalog.rarity_counts().await?;
    Ok(HttpResponse::Ok().json(counts))
}

pub async fn rarity_by_account(
    catalog: web::Data<CardCatalog>,
    params: web::Query<AccountPivotParams>,
) -> Result<HttpResponse> {
    let page = catalog.rarity_by_account(&params).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn cards_by_account_rarity(
    catalog: web::Data<CardCatalog>,
    params: web::Query<AccountCardsQuery>,
) -> Result<HttpResponse> {
    let cards = catalog
        .cards_by_account_and_rarity(&params.account, &params.rarity)
        .await?;
    Ok(HttpResponse::Ok().json(cards))
}

pub async fn expansions(catalog: web::Data<CardCatalog>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog.expansions()))
}

pub async fn my_collection(
    catalog: web::Data<CardCatalog>,
    params: web::Query<CollectionParams>,
) -> Result<HttpResponse> {
    let entries = catalog.my_collection(&params).await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn stats(catalog: web::Data<CardCatalog>) -> Result<HttpResponse> {
    let stats = catalog.collection_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
