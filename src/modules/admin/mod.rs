pub mod controller;
pub mod crud;
pub mod period;
pub mod routes;
pub mod schema;

pub use routes::admin_routes;
