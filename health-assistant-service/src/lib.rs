pub mod clients;
pub mod config;
pub mod models;
pub mod service;
pub mod tasks;
pub mod workflow;

pub use config::ServiceConfig;
pub use service::{AppState, build_app, create_app};
pub use workflow::{build_query_workflow, create_flow_runner, create_query_session};
