use actix_web::{get, post, web, HttpResponse, Responder, ResponseError};

use crate::database::MongoDB;
use crate::models::{AddExpenseRequest, CreateTripRequest};
use crate::services::auth_service::Claims;
use crate::services::trip_service;

/// GET /api/trips - every trip owned by the caller
#[get("")]
pub async fn list_trips(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    let user_id = &user.sub;
    log::info!("📋 GET /trips - user: {}", user_id);

    match trip_service::list_trips(&db, user_id).await {
        Ok(trips) => HttpResponse::Ok().json(trips),
        Err(e) => {
            log::error!("❌ Failed to list trips for {}: {}", user_id, e);
            e.error_response()
        }
    }
}

/// POST /api/trips - create a trip owned by the caller
#[post("")]
pub async fn create_trip(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateTripRequest>,
) -> impl Responder {
    let user_id = &user.sub;
    log::info!("📝 POST /trips - user: {}", user_id);

    match trip_service::create_trip(&db, user_id, request.into_inner()).await {
        Ok(trip) => HttpResponse::Ok().json(trip),
        Err(e) => {
            log::error!("❌ Failed to create trip for {}: {}", user_id, e);
            e.error_response()
        }
    }
}

/// POST /api/trips/{id}/expenses - append an expense to an owned trip
#[post("/{id}/expenses")]
pub async fn add_expense(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    db: web::Data<MongoDB>,
    request: web::Json<AddExpenseRequest>,
) -> impl Responder {
    let user_id = &user.sub;
    let trip_id = path.into_inner();
    log::info!("💸 POST /trips/{}/expenses - user: {}", trip_id, user_id);

    match trip_service::add_expense(&db, user_id, &trip_id, request.into_inner()).await {
        Ok(trip) => HttpResponse::Ok().json(trip),
        Err(e) => {
            log::warn!("❌ Failed to add expense to {}: {}", trip_id, e);
            e.error_response()
        }
    }
}
