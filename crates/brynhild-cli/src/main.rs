mod cli;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use brynhild_config::Settings;
use brynhild_context::Profile;
use brynhild_core::{Session, SessionOptions};
use brynhild_dcm::DcmValue;
use brynhild_providers::{Provider, ProviderInstanceConfig, ProviderTypeRegistry};
use clap::Parser;

use cli::{ApiAction, Cli, Commands, ConfigAction, SessionAction};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Chat {
            prompt,
            provider,
            model,
            profile,
            dry_run,
            dangerously_skip_permissions,
            dangerously_skip_sandbox,
            no_log,
            log_file,
            json,
        } => {
            run_chat(ChatArgs {
                prompt,
                provider,
                model,
                profile,
                dry_run,
                dangerously_skip_permissions,
                dangerously_skip_sandbox,
                no_log,
                log_file,
                json,
            })
            .await
        }
        Commands::Config { action } => run_config(action),
        Commands::Session { action } => run_session(action),
        Commands::Api { action } => run_api(action),
    }
}

/// Resolved `chat` arguments, decoupled from the clap variant shape so
/// `run_chat` reads the same whether the fields came from the CLI or a
/// future programmatic caller.
struct ChatArgs {
    prompt: Option<String>,
    provider: Option<String>,
    model: Option<String>,
    profile: Option<String>,
    dry_run: bool,
    dangerously_skip_permissions: bool,
    dangerously_skip_sandbox: bool,
    no_log: bool,
    log_file: Option<PathBuf>,
    json: bool,
}

fn build_provider(settings: &Settings, requested: Option<&str>) -> anyhow::Result<Box<dyn Provider>> {
    let provider_type = requested.map(str::to_string).unwrap_or_else(|| settings.provider());
    let registry = ProviderTypeRegistry::with_builtins();
    let config = ProviderInstanceConfig {
        api_key: settings.get_api_key(&provider_type).ok(),
        base_url: None,
    };
    Ok(registry.build(&provider_type, &config)?)
}

async fn run_chat(args: ChatArgs) -> anyhow::Result<()> {
    let prompt = match args.prompt {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if prompt.trim().is_empty() {
        anyhow::bail!("no prompt given (pass one as an argument or pipe one in via stdin)");
    }

    let settings = Settings::load(DcmValue::Mapping(Default::default()), true)?;
    let provider = build_provider(&settings, args.provider.as_deref())?;
    let model = args.model.clone().unwrap_or_else(|| settings.model());
    let max_tokens = Some(settings.max_tokens() as u32);

    let options = SessionOptions {
        dry_run: args.dry_run,
        skip_permissions: args.dangerously_skip_permissions,
        skip_sandbox: args.dangerously_skip_sandbox,
        no_log: args.no_log,
        log_file: args.log_file.clone(),
        profile: args.profile.as_deref().map(Profile::new),
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    let mut session = Session::build(&settings, provider.provider_type(), session_id, options)?;

    let base_system_prompt = "You are a terminal-resident coding assistant.";
    let on_text_delta = if args.json {
        None
    } else {
        Some(Arc::new(|delta: &str| print!("{delta}")) as brynhild_core::TextDeltaCallback)
    };

    let (outcome, context) = session
        .run_turn(
            provider.as_ref(),
            base_system_prompt,
            Vec::new(),
            &prompt,
            &model,
            max_tokens,
            None,
            on_text_delta,
        )
        .await?;
    session.close();

    if args.json {
        let payload = serde_json::json!({
            "final_text": outcome.final_text,
            "rounds_used": outcome.rounds_used,
            "stop_reason": outcome.stop_reason,
            "cancelled": outcome.cancelled,
            "usage": {
                "input_tokens": outcome.usage.input_tokens,
                "output_tokens": outcome.usage.output_tokens,
            },
            "injections": context.injections.len(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !args.dry_run {
        println!();
    }

    Ok(())
}

fn run_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load(DcmValue::Mapping(Default::default()), true)?;
            println!("{}", serde_json::to_string_pretty(&settings.to_dict())?);
            Ok(())
        }
    }
}

fn not_implemented() -> anyhow::Result<()> {
    eprintln!("not implemented in this build");
    std::process::exit(1);
}

fn run_session(_action: SessionAction) -> anyhow::Result<()> {
    not_implemented()
}

fn run_api(_action: ApiAction) -> anyhow::Result<()> {
    not_implemented()
}
