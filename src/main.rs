use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::Request;
use clap::Parser;
use dotenvy::dotenv;
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fitcoach::coach::Coach;
use fitcoach::config::{Config, EnvSecrets};
use fitcoach::langflow::{ExtractedAnswer, FlowInvoker, HttpFlowTransport};
use fitcoach::prompts::{MacroForm, PlanForm, ValidationError};
use fitcoach::render::render;
use fitcoach::server;

#[derive(Parser)]
#[command(name = "fitcoach", about = "Workout and diet recommendations from hosted Langflow flows")]
enum Cli {
    /// Start the HTTP server (default when no subcommand is given)
    #[command(alias = "run")]
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Daily macro recommendation from a profile and diet goals
    Macros {
        /// Name, age, weight, height
        #[arg(long)]
        profile: String,
        /// Muscle gain, weight loss, ...
        #[arg(long)]
        goals: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Personalized workout and diet plan from a detailed profile
    Plan {
        /// Nutritional habits, biometric stats, ...
        #[arg(long)]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    dotenv().ok();

    // Parse CLI args, defaulting to Serve when no subcommand is given,
    // but still allow --help and --version to work.
    let args: Vec<String> = std::env::args().collect();
    let cli = if args.len() <= 1 {
        Cli::Serve { port: None }
    } else {
        Cli::parse()
    };

    let config = Config::from_env();
    init_tracing();
    let _guard = sentry::init((
        config.sentry_dsn.clone().unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            traces_sample_rate: 0.2,
            enable_logs: true,
            ..Default::default()
        },
    ));

    let coach = build_coach(&config)?;

    match cli {
        Cli::Serve { port } => {
            run_server(coach, port.unwrap_or(config.port)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Cli::Macros {
            profile,
            goals,
            notes,
        } => {
            let form = MacroForm {
                profile,
                goals,
                notes,
            };
            Ok(print_answer(coach.recommend_macros(&form).await))
        }
        Cli::Plan { profile } => {
            let form = PlanForm {
                detailed_profile: profile,
            };
            Ok(print_answer(coach.personalized_plan(&form).await))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fitcoach=info,tower_http=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true).with_bracketed_fields(false))
        .with(sentry::integrations::tracing::layer().event_filter(
            |metadata| match *metadata.level() {
                tracing::Level::ERROR => sentry::integrations::tracing::EventFilter::Event,
                tracing::Level::WARN | tracing::Level::INFO => {
                    sentry::integrations::tracing::EventFilter::Breadcrumb
                }
                _ => sentry::integrations::tracing::EventFilter::Ignore,
            },
        ))
        .init();
}

fn build_coach(config: &Config) -> Result<Coach> {
    let mut builder = reqwest::Client::builder();
    match config.flow_timeout {
        Some(timeout) => builder = builder.timeout(timeout),
        None => tracing::warn!("FLOW_TIMEOUT_SECS not set; workflow calls wait without a deadline"),
    }
    let http_client = Arc::new(builder.build().context("failed to build HTTP client")?);

    let macro_flow = config
        .macro_flow(&EnvSecrets)
        .context("macro recommendation flow is not configured")?;
    let plan_flow = config
        .plan_flow(&EnvSecrets)
        .context("personalized plan flow is not configured")?;

    let invoker = FlowInvoker::new(Arc::new(HttpFlowTransport::new(http_client)));
    Ok(Coach::new(invoker, macro_flow, plan_flow))
}

async fn run_server(coach: Coach, port: u16) -> Result<()> {
    let app_state = server::AppState {
        coach: Arc::new(coach),
    };

    let app = server::create_app(app_state)
        .layer(SentryHttpLayer::new().enable_transaction())
        .layer(NewSentryLayer::<Request<Body>>::new_from_top());

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Validation errors exit 2, extraction errors exit 1.
fn print_answer(result: Result<ExtractedAnswer, ValidationError>) -> ExitCode {
    match result {
        Ok(answer) => {
            println!("{}", render(&answer));
            if answer.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
