use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use teller_agents::SupportAgent;
use teller_core::{ChatTurn, ResponseCatalog};
use teller_llm::{EnhancerConfig, ResponseEnhancer, DEFAULT_BASE_URL, DEFAULT_MODEL};
use teller_observability::{init_tracing, AppMetrics};

const MAX_HISTORY_TURNS: usize = 40;

#[derive(Debug, Parser)]
#[command(name = "teller")]
#[command(about = "Banking intent assistant CLI")]
struct Cli {
    #[arg(long, env = "TELLER_RESPONSES_PATH", default_value = "assets/response.json")]
    responses: PathBuf,

    #[arg(long, env = "TELLER_VECTORIZER_PATH", default_value = "assets/tfidf_vectorizer.json")]
    vectorizer: PathBuf,

    #[arg(long, env = "TELLER_MODEL_PATH", default_value = "assets/intent_model.json")]
    model: PathBuf,

    #[command(flatten)]
    llm: LlmArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct LlmArgs {
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "TELLER_LLM_MODEL", default_value = DEFAULT_MODEL)]
    llm_model: String,

    #[arg(long, env = "TELLER_LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    llm_base_url: String,

    #[arg(long, env = "TELLER_LLM_MAX_TOKENS", default_value_t = 300)]
    max_tokens: u32,

    #[arg(long, env = "TELLER_LLM_TIMEOUT_SECONDS", default_value_t = 20)]
    timeout_seconds: u64,
}

impl LlmArgs {
    fn enhancer_config(&self) -> EnhancerConfig {
        let timeout = Duration::from_secs(self.timeout_seconds.max(1));
        EnhancerConfig {
            api_key: self.api_key.clone(),
            model: self.llm_model.clone(),
            base_url: self.llm_base_url.clone(),
            max_output_tokens: self.max_tokens,
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(6)),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the intent label for TEXT.
    Classify { text: String },
    /// Run the full pipeline and print the prediction as JSON.
    Predict {
        text: String,
        #[arg(long)]
        no_llm: bool,
    },
    /// List the intents that have a template.
    Intents,
    /// Multi-turn conversation with the language model.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("teller_cli");
    let cli = Cli::parse();

    match &cli.command {
        Command::Classify { text } => {
            let classifier = teller_ml::load_classifier(&cli.vectorizer, &cli.model)
                .context("failed to load intent classifier artifacts")?;
            let query = teller_core::validate_query(text)?;
            println!("{}", classifier.classify(query)?);
        }
        Command::Predict { text, no_llm } => {
            let agent = build_agent(&cli)?;
            let result = agent.predict(text, !no_llm).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Intents => {
            let catalog = ResponseCatalog::load(&cli.responses)
                .context("failed to load response catalog")?;
            for intent in catalog.intents() {
                println!("{intent}");
            }
        }
        Command::Chat => {
            let enhancer = ResponseEnhancer::new(&cli.llm.enhancer_config())
                .context("chat mode needs a language model credential")?;
            run_chat(&enhancer).await?;
        }
    }

    Ok(())
}

async fn run_chat(enhancer: &ResponseEnhancer) -> Result<()> {
    let mut history: Vec<ChatTurn> = Vec::new();

    println!("Teller chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let outcome = enhancer
            .enhance_with_history(message, &history, enhancer.max_output_tokens())
            .await;
        let answered = outcome.is_enhanced();
        let reply = outcome.into_text();
        println!("\n{reply}\n");

        // failed turns are not replayed to the provider
        if answered {
            history.push(ChatTurn::user(message));
            history.push(ChatTurn::assistant(reply));
        }
        if history.len() > MAX_HISTORY_TURNS {
            let keep_from = history.len() - MAX_HISTORY_TURNS;
            history = history.split_off(keep_from);
        }
    }

    Ok(())
}

fn build_agent(cli: &Cli) -> Result<SupportAgent> {
    let catalog =
        ResponseCatalog::load(&cli.responses).context("failed to load response catalog")?;
    let classifier = teller_ml::load_classifier(&cli.vectorizer, &cli.model)
        .context("failed to load intent classifier artifacts")?;
    let enhancer = ResponseEnhancer::new(&cli.llm.enhancer_config())
        .ok()
        .map(Arc::new);

    Ok(SupportAgent::new(
        Arc::new(catalog),
        classifier,
        enhancer,
        AppMetrics::shared(),
    ))
}
