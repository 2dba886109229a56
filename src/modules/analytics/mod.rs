pub mod controller;
pub mod crud;
pub mod model;
pub mod routes;
pub mod schema;
pub mod worker;

pub use routes::analytics_routes;
pub use worker::register_workers;
