pub mod app;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
