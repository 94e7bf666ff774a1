//! juris command-line entry point.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use juris::cli::init::{self, InitConfig, InitResult};
use juris::cli::output::Output;
use juris::cli::{Cli, Commands};
use juris::research::{
    DecisionService, HeuristicDecisionService, LlmDecisionService, Orchestrator, ResearchResult, SearchProvider,
};
use juris::tools::search::{DaedraFetcher, DaedraSearch, SerperSearch};
use juris::utils::toml_config::{JurisConfig, LogFormat, LoggingConfig, ProviderConfig, SearchBackend};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color { Output::no_color() } else { Output::new() };

    match cli.command {
        Commands::Init {
            path,
            force,
            provider,
            search,
        } => {
            let config = InitConfig {
                path,
                force,
                provider,
                search,
            };
            Ok(match init::run(config, &output) {
                InitResult::Success | InitResult::AlreadyExists => ExitCode::SUCCESS,
                InitResult::Error(_) => ExitCode::FAILURE,
            })
        }

        Commands::Config { full, validate } => {
            let config = load_config(&cli.config, validate)?;
            init_tracing(&config.logging, cli.verbose, cli.json_logs);
            show_config(&cli.config, &config, full, validate, &output)
        }

        Commands::Research {
            question,
            max_rounds,
            max_searches,
            timeout_ms,
            offline,
            json,
        } => {
            let config = load_config(&cli.config, false)?;
            init_tracing(&config.logging, cli.verbose, cli.json_logs);
            config
                .validate_env(!offline)
                .context("missing credentials for the configured backends")?;

            let search = build_search(&config)?;
            let orchestrator_config = config.orchestrator_config();

            let decision: Arc<dyn DecisionService> = if offline {
                Arc::new(HeuristicDecisionService::new(
                    orchestrator_config.domains.clone(),
                    orchestrator_config.floors.clone(),
                ))
            } else {
                let provider = config.llm_provider()?;
                info!(provider = provider.name(), model = provider.model(), "connecting to LLM");
                let client = provider.create_client().await?;
                Arc::new(LlmDecisionService::new(
                    Arc::from(client),
                    orchestrator_config.domains.clone(),
                    config.llm_policy_settings(),
                ))
            };

            let mut options = config.research_options();
            if let Some(n) = max_rounds {
                options.max_rounds = n;
            }
            if let Some(n) = max_searches {
                options.max_searches_per_round = n;
            }
            if let Some(ms) = timeout_ms {
                options.per_search_timeout = std::time::Duration::from_millis(ms);
            }
            debug!(?options, "research options");

            let orchestrator = Orchestrator::new(search, decision, orchestrator_config)
                .with_enricher(Arc::new(DaedraFetcher::new(config.search.max_content_chars)));

            if !json {
                output.banner();
                output.header("Researching");
                output.kv("Question", &question);
                output.kv("Policy", if offline { "heuristic" } else { "llm" });
                output.kv("Max rounds", &options.max_rounds.to_string());
            }

            let result = orchestrator.run_research(&question, &options).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                render_result(&result, &output);
            }

            Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

/// `--validate` requires the file to exist; otherwise defaults fill in.
fn load_config(path: &Path, strict: bool) -> Result<JurisConfig> {
    let config = if strict {
        JurisConfig::load(path)
    } else {
        JurisConfig::load_or_default(path)
    };
    config.with_context(|| format!("failed to load {}", path.display()))
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(logging: &LoggingConfig, verbose: bool, json_logs: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_logs || logging.format == LogFormat::Json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_search(config: &JurisConfig) -> Result<Arc<dyn SearchProvider>> {
    Ok(match config.search.backend {
        SearchBackend::DuckDuckGo => Arc::new(DaedraSearch::new()),
        SearchBackend::Serper => Arc::new(SerperSearch::new(
            config.search_api_key()?,
            config.search.region.clone(),
            config.search.language.clone(),
            config.per_search_timeout(),
        )?),
    })
}

fn show_config(path: &Path, config: &JurisConfig, full: bool, validate: bool, output: &Output) -> Result<ExitCode> {
    output.header("Configuration");
    output.kv("File", &path.display().to_string());
    output.kv("Exists", if path.exists() { "yes" } else { "no (using defaults)" });

    output.subheader("LLM");
    match &config.llm.provider {
        ProviderConfig::Ollama { base_url, model } => {
            output.kv("Provider", "ollama");
            output.kv("Endpoint", base_url);
            output.kv("Model", model);
        }
        ProviderConfig::OpenAI {
            api_key_env,
            api_base,
            model,
        } => {
            output.kv("Provider", "openai");
            output.kv("Endpoint", api_base);
            output.kv("Model", model);
            output.kv("Key variable", api_key_env);
        }
    }

    output.subheader("Research");
    output.kv("Search backend", &format!("{:?}", config.search.backend).to_lowercase());
    output.kv("Max rounds", &config.research.max_rounds.to_string());
    output.kv("Searches per round", &config.research.max_searches_per_round.to_string());
    output.kv("Max sources", &config.research.max_sources.to_string());
    output.kv("Official domains", &config.domains.official.len().to_string());
    output.kv("Mandatory domains", &config.domains.mandatory.join(", "));

    if full {
        output.subheader("Effective juris.toml");
        println!("{}", config.to_toml()?);
    }

    if !validate {
        return Ok(ExitCode::SUCCESS);
    }

    output.subheader("Validation");
    let mut ok = true;
    match config.validate_with_warnings() {
        Ok(warnings) if warnings.is_empty() => output.success("Configuration is valid"),
        Ok(warnings) => {
            output.success("Configuration is valid, with warnings:");
            for warning in &warnings {
                output.warning(&warning.message);
            }
        }
        Err(e) => {
            output.error(&e.to_string());
            ok = false;
        }
    }
    if let Err(e) = config.validate_env(true) {
        output.warning(&format!("{} (needed unless running with --offline)", e));
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn render_result(result: &ResearchResult, output: &Output) {
    output.header("Rounds");
    for round in &result.rounds {
        output.round(round);
    }

    output.header("Sources");
    if result.all_sources.is_empty() {
        output.info("No sources collected");
    }
    for (i, source) in result.all_sources.iter().enumerate() {
        output.source(i + 1, source);
    }

    output.header("Answer");
    output.newline();
    println!("{}", result.final_context);

    let meta = &result.metadata;
    output.header("Summary");
    output.kv("Session", &result.session_id.to_string());
    output.kv("Rounds", &meta.total_rounds.to_string());
    output.kv(
        "Sources",
        &format!(
            "{} ({} official, {} high quality)",
            meta.total_sources, meta.official_sources, meta.high_quality_sources
        ),
    );
    output.kv("Average quality", &format!("{:.1}", meta.average_quality));
    output.kv("Final sufficiency", &format!("{:.1}", meta.final_sufficiency));
    output.kv("Elapsed", &format!("{:.1}s", meta.elapsed_ms as f64 / 1000.0));

    if meta.fallbacks.total() > 0 {
        output.warning(&format!("{} decision fallbacks used:", meta.fallbacks.total()));
        for reason in &meta.fallbacks.reasons {
            output.list_item(reason);
        }
    }
    if let Some(error) = &result.error {
        output.error(error);
    }
    output.stop_reason(result.stop_reason, result.success);
}
