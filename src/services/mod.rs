pub mod auth_service;
pub mod trip_service;
pub mod upload_service;
