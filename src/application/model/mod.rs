//! Model Lifecycle - 模型生命周期管理
//!
//! 职责:
//! - 生命周期状态数据模型（ModelState）
//! - 一次性惰性初始化（ModelLoader::ensure_loaded）

mod loader;
mod state;

pub use loader::{InitError, LoadedModel, ModelLoader};
pub use state::{ModelState, ModelStatus};
