//! Genie - 生成模型推理 Worker
//!
//! 单进程服务：接收离散任务，惰性加载一次生成模型，
//! 每个任务执行一次推理并返回规范化信封

use std::sync::Arc;

use genie::application::jobs::{InferenceExecutor, JobHandler, ResultEncoder};
use genie::application::model::ModelLoader;
use genie::application::ports::LoadOptions;
use genie::config::{load_config, print_config};
use genie::infrastructure::adapters::{HttpModelClient, HttpModelClientConfig};
use genie::infrastructure::http::{AppState, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},genie={}", config.log.level, config.log.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Genie - Generative Inference Worker");
    print_config(&config);

    // 创建 HTTP 模型后端客户端
    let backend_config = HttpModelClientConfig {
        base_url: config.backend.url.clone(),
        timeout_secs: config.backend.timeout_secs,
    };
    let backend = Arc::new(HttpModelClient::new(backend_config)?);

    // 模型加载器（惰性初始化，首个任务触发加载）
    let load_options = LoadOptions {
        model_id: config.model.id.clone(),
        cache_dir: config.model.cache_dir.clone(),
        device: config.model.device,
        precision: config.model.precision,
    };
    let loader = ModelLoader::new(backend.clone(), load_options).arc();

    // 任务处理器
    let mode = config.generation.mode;
    let job_handler = Arc::new(JobHandler::new(
        loader.clone(),
        InferenceExecutor::new(backend.clone(), mode),
        ResultEncoder::new(config.model.id.clone(), mode),
        config.generation.defaults(),
    ));

    // HTTP 服务器（任务分发入口）
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(job_handler, loader, backend);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
