//! HTTP layer: middleware, routes, and server lifecycle

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{handle_unhandled_errors, panic_response, ApiError, UnhandledError};
pub use middleware::{cors_layer, AllowedHosts, PROCESS_TIME_HEADER};
pub use server::{assemble, build_router, run_server, shutdown, startup, ServerConfig, ServerError};
