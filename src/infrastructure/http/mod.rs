//! HTTP Infrastructure - 任务分发入口
//!
//! 分发运行时通过 HTTP 投递任务：每个请求恰好一次
//! `JobHandler::handle` 调用，响应永远是结构化信封

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
