use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Closed set of expense categories. Anything else is rejected when the
/// request body is deserialized.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseCategory {
    Lodging,
    Transportation,
    Food,
    Entertainment,
    Insurance,
    Other,
}

impl Default for ExpenseCategory {
    fn default() -> Self {
        ExpenseCategory::Other
    }
}

/// Expense embedded in a trip document. Expenses have no identity of their
/// own; their position in the array is insertion order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Expense {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: ExpenseCategory,
    /// Unix seconds; defaults to the moment the expense was recorded.
    #[serde(default = "now_ts")]
    pub date: i64,
}

/// Trip document as stored in the `trips` collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Hex id of the owning user; every read and write checks it.
    pub user: String,
    pub destination: String,
    pub budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub destination: String,
    pub budget: f64,
    pub start_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddExpenseRequest {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default = "now_ts")]
    pub date: i64,
}

/// Trip as returned to clients; same shape as the document with the id
/// rendered as a hex string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub id: String,
    pub user: String,
    pub destination: String,
    pub budget: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    pub expenses: Vec<Expense>,
}

impl Trip {
    pub fn new(user_id: &str, request: CreateTripRequest) -> Self {
        Trip {
            id: ObjectId::new(),
            user: user_id.to_string(),
            destination: request.destination,
            budget: request.budget,
            start_date: request.start_date,
            expenses: Vec::new(),
        }
    }
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        TripResponse {
            id: trip.id.to_hex(),
            user: trip.user,
            destination: trip.destination,
            budget: trip.budget,
            start_date: trip.start_date,
            expenses: trip.expenses,
        }
    }
}

impl From<AddExpenseRequest> for Expense {
    fn from(request: AddExpenseRequest) -> Self {
        Expense {
            description: request.description,
            amount: request.amount,
            category: request.category,
            date: request.date,
        }
    }
}
