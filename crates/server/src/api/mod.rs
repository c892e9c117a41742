pub mod acquisition;
pub mod autopilot;
pub mod handlers;
pub mod library;
pub mod middleware;
pub mod routes;
pub mod topics;

pub use routes::create_router;
