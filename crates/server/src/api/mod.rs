pub mod credentials;
pub mod features;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
