//! quaestor-server binary: configuration, wiring, and the axum server.

use anyhow::Context;
use quaestor::{
    AppState,
    cli::{Cli, output::Output},
    llm::{LLMClientFactory, Provider, client::RetryPolicy},
    research::{Pipeline, Planner, ResearchCoordinator, Synthesizer},
    storage::{FileCache, SimilarityIndex},
    tools::builtin_registry,
    utils::config::Config,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    if let Some(env_file) = &cli.env_file {
        dotenvy::from_path(env_file)
            .with_context(|| format!("failed to load env file {}", env_file.display()))?;
    }

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::from_env().context("configuration error")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = Arc::new(config);

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };
    output.banner();

    // LLM client shared by the planner, summarizer, and synthesizer.
    let factory = LLMClientFactory::new(
        Provider::OpenAICompatible {
            api_key: config.llm.api_key.clone(),
            api_base: config.llm.api_base.clone(),
            model: config.llm.model.clone(),
        },
        RetryPolicy {
            max_retries: config.llm.max_retries,
            base_delay_ms: config.llm.retry_delay_ms,
        },
    );
    let llm: Arc<dyn quaestor::llm::LLMClient> = Arc::from(factory.create_default());

    // Cross-run storage.
    let cache = Arc::new(FileCache::new(
        &config.storage.cache_dir,
        config.storage.cache_ttl_hours,
    ));
    let similarity = Arc::new(
        SimilarityIndex::open(config.storage.vector_path.clone())
            .await
            .context("failed to open similarity index")?,
    );

    // Tools and the research workflow.
    let registry = Arc::new(builtin_registry(llm.clone(), cache, &config.tools));
    let coordinator = Arc::new(ResearchCoordinator::new(
        Planner::new(llm.clone(), &config.pipeline),
        Pipeline::new(registry, config.pipeline.clone()),
        Synthesizer::new(llm, config.llm.max_response_tokens),
        similarity,
        config.storage.similarity_threshold,
        config.storage.cache_dir.join("reports"),
    ));

    let state = AppState {
        config: config.clone(),
        coordinator,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = quaestor::api::create_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    output.listening(&addr, &config.llm.model);
    tracing::info!(%addr, model = %config.llm.model, "quaestor-server started");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
