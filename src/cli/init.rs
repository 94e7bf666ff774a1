//! Init command implementation
//!
//! Writes a commented `juris.toml` plus `.env.example` and `.gitignore`.

use super::output::Output;
use std::fs;
use std::path::Path;

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// juris.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: std::path::PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure (ollama or openai)
    pub provider: String,
    /// Search backend to configure (duckduckgo or serper)
    pub search: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing juris");

    let base_path = &config.path;
    if !base_path.exists()
        && let Err(e) = fs::create_dir_all(base_path)
    {
        output.error(&format!("Failed to create {}: {}", base_path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let config_path = base_path.join("juris.toml");
    if config_path.exists() && !config.force {
        output.warning("juris.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating configuration files");

    let toml_content = generate_juris_toml(&config);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create juris.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "juris.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("juris initialized successfully!");

    output.header("Next Steps");
    output.newline();
    let mut step = 1;
    if config.provider == "openai" || config.search == "serper" {
        output.info(&format!("{}. Set up API keys:", step));
        output.command("cp .env.example .env");
        output.command("# Edit .env and set the keys for your providers");
        output.newline();
        step += 1;
    }
    if config.provider != "openai" {
        output.info(&format!("{}. Start Ollama (if not running):", step));
        output.command("ollama serve");
        output.command("ollama pull qwen2.5:7b  # or your preferred model");
        output.newline();
        step += 1;
    }
    output.info(&format!("{}. Run a research session:", step));
    output.command("juris research \"requisitos para la usucapión extraordinaria\"");
    output.newline();

    output.hint("Use --offline to research without a language model");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_juris_toml(config: &InitConfig) -> String {
    let provider_section = if config.provider == "openai" {
        r#"# OpenAI-compatible API (set OPENAI_API_KEY in .env)
[llm.provider]
type = "openai"
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
model = "gpt-4o-mini"
"#
    } else {
        r#"# Ollama - local inference (no API key required)
[llm.provider]
type = "ollama"
base_url = "http://localhost:11434"
model = "qwen2.5:7b"
"#
    };

    let backend = if config.search == "serper" { "serper" } else { "duckduckgo" };

    format!(
        r#"# juris configuration
# ===================
# Every key is optional; the values below are the defaults.

[logging]
# tracing filter directive, overridden by RUST_LOG
level = "info"
# "pretty" or "json"
format = "pretty"

[llm]
# Temperature of the final synthesis (structured calls always use 0.1)
temperature = 0.3
max_tokens = 3000
# Ask the model to grade authority and currency of each round's sources
verify_sources = false

{provider_section}
[search]
# "duckduckgo" (no key) or "serper" (set SERPER_API_KEY in .env)
backend = "{backend}"
api_key_env = "SERPER_API_KEY"
region = "co"
language = "es"
max_results_per_query = 8
# Results per round whose full page text is fetched (0 disables)
enrich_top_n = 3
enrich_timeout_ms = 10000
max_content_chars = 8000

[research]
max_rounds = 5
max_searches_per_round = 6
per_search_timeout_ms = 15000
max_sources = 20
min_source_quality = 0.0

[stopping]
sufficient_confidence = 0.9
sufficient_overall = 8.0
dead_end_rounds = 3
dead_end_overall = 5.0
max_elapsed_ms = 300000
high_quality_sources = 8
high_quality_overall = 7.0

[stopping.minimum_rounds]
simple = 1
moderate = 2
complex = 3
very_complex = 4

[floors]
min_official = 2
min_statute = 1
min_jurisprudence = 1
min_doctrine = 1
penalty = 1.5

# [domains] holds the jurisdiction policy: official, academic and news
# domain lists, mandatory domains, subject rules and follow-up templates.
# The built-in defaults target Colombian law.
"#
    )
}

fn generate_env_example() -> String {
    r#"# juris Environment Variables
# ===========================
# Copy this file to .env and fill in the values.

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,juris=debug

# Required with [llm.provider] type = "openai"
# OPENAI_API_KEY=sk-...

# Required with [search] backend = "serper"
# SERPER_API_KEY=your-key
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# Environment
.env
.env.local

# Research output
*.research.json

# Rust
/target/
"#
    .to_string()
}
