use crate::database::MongoDB;
use crate::models::{AddExpenseRequest, CreateTripRequest, Expense, Trip, TripResponse};
use crate::utils::error::AppError;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson};

const COLLECTION: &str = "trips";

/// All trips owned by `user_id`. Other users' trips are invisible here;
/// the filter is the access control.
pub async fn list_trips(db: &MongoDB, user_id: &str) -> Result<Vec<TripResponse>, AppError> {
    let collection = db.collection::<Trip>(COLLECTION);

    let mut cursor = collection
        .find(doc! { "user": user_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let mut trips = Vec::new();
    while let Some(result) = cursor.next().await {
        let trip = result.map_err(|e| AppError::Database(e.to_string()))?;
        trips.push(TripResponse::from(trip));
    }

    Ok(trips)
}

pub async fn create_trip(
    db: &MongoDB,
    user_id: &str,
    request: CreateTripRequest,
) -> Result<TripResponse, AppError> {
    let trip = Trip::new(user_id, request);

    let collection = db.collection::<Trip>(COLLECTION);
    collection
        .insert_one(&trip)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    log::info!("✅ Trip created: {} ({})", trip.destination, trip.id.to_hex());

    Ok(trip.into())
}

/// Appends an expense to a trip the caller owns and returns the updated
/// trip. Missing trip is 404; a trip owned by someone else is 401.
pub async fn add_expense(
    db: &MongoDB,
    user_id: &str,
    trip_id: &str,
    request: AddExpenseRequest,
) -> Result<TripResponse, AppError> {
    let object_id = ObjectId::parse_str(trip_id)
        .map_err(|_| AppError::Validation("Invalid trip id".to_string()))?;

    let collection = db.collection::<Trip>(COLLECTION);

    let mut trip = collection
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    ensure_owner(&trip, user_id)?;

    trip.expenses.push(Expense::from(request));

    // Whole-array write-back: concurrent appends to the same trip are
    // last-write-wins
    let expenses =
        to_bson(&trip.expenses).map_err(|e| AppError::Internal(e.to_string()))?;

    collection
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "expenses": expenses } },
        )
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    log::info!(
        "💸 Expense added to trip {}: {} entries",
        trip.id.to_hex(),
        trip.expenses.len()
    );

    Ok(trip.into())
}

fn ensure_owner(trip: &Trip, user_id: &str) -> Result<(), AppError> {
    if trip.user != user_id {
        return Err(AppError::NotOwner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseCategory;

    fn trip_owned_by(user_id: &str) -> Trip {
        Trip {
            id: ObjectId::new(),
            user: user_id.to_string(),
            destination: "Lisbon".to_string(),
            budget: 900.0,
            start_date: None,
            expenses: Vec::new(),
        }
    }

    #[test]
    fn owner_check_passes_for_the_owner() {
        let trip = trip_owned_by("u1");
        assert!(ensure_owner(&trip, "u1").is_ok());
    }

    #[test]
    fn owner_check_rejects_everyone_else() {
        let trip = trip_owned_by("u1");
        assert!(matches!(ensure_owner(&trip, "u2"), Err(AppError::NotOwner)));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn expense_flow_against_live_store() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/tripbudget_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let owner = ObjectId::new().to_hex();

        let created = create_trip(
            &db,
            &owner,
            serde_json::from_str(r#"{"destination": "Porto", "budget": 500.0}"#).unwrap(),
        )
        .await
        .unwrap();

        // Same payload twice appends two entries, no dedup
        for _ in 0..2 {
            let request: AddExpenseRequest =
                serde_json::from_str(r#"{"description": "tram", "amount": 3.0, "category": "Transportation"}"#)
                    .unwrap();
            add_expense(&db, &owner, &created.id, request).await.unwrap();
        }

        let trips = list_trips(&db, &owner).await.unwrap();
        let trip = trips.iter().find(|t| t.id == created.id).unwrap();
        assert_eq!(trip.expenses.len(), 2);
        assert_eq!(trip.expenses[0].category, ExpenseCategory::Transportation);

        // Someone else's token cannot touch it
        let intruder = ObjectId::new().to_hex();
        let request: AddExpenseRequest =
            serde_json::from_str(r#"{"description": "tram", "amount": 3.0}"#).unwrap();
        assert!(matches!(
            add_expense(&db, &intruder, &created.id, request).await,
            Err(AppError::NotOwner)
        ));

        // Nor does their listing ever contain it
        let intruder_trips = list_trips(&db, &intruder).await.unwrap();
        assert!(intruder_trips.iter().all(|t| t.id != created.id));

        // Unknown but well-formed id is a 404
        let request: AddExpenseRequest =
            serde_json::from_str(r#"{"description": "tram", "amount": 3.0}"#).unwrap();
        assert!(matches!(
            add_expense(&db, &owner, &ObjectId::new().to_hex(), request).await,
            Err(AppError::NotFound(_))
        ));
    }
}
