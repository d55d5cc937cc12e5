//! arena-survey - collect and report on Arena Mais Verde visitor surveys

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questionnaire::{catalog, Questionnaire};
use survey_cli::prompt::{render_notification, render_question, render_tally, Reply};
use survey_cli::{Args, Command};
use survey_service::{
    Advance, CounterConfig, CounterSimulation, Dashboard, Notification, SubmissionCoordinator,
    SurveySession,
};
use survey_store::{MemoryStore, PostgrestStore, SurveyStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| Args::default_log_filter(&log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let store = open_store(&args)?;
    info!(store = store.id(), "Store ready");

    match &args.command {
        Command::Take => take(&args, store).await,
        Command::Counter {
            initial,
            seconds,
            interval_ms,
        } => counter(*initial, *seconds, *interval_ms).await,
        Command::Dashboard { json, .. } => dashboard(&args, store, *json).await,
    }
}

fn open_store(args: &Args) -> anyhow::Result<Arc<dyn SurveyStore>> {
    if args.memory {
        warn!("Using in-memory store; nothing will be persisted");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = PostgrestStore::new(args.store_config()).context("Failed to build tables API client")?;
    info!(url = %args.supabase_url, "Using tables API");
    Ok(Arc::new(store))
}

fn load_questionnaire(args: &Args) -> anyhow::Result<Questionnaire> {
    let Some(path) = &args.catalog else {
        return Ok(catalog::arena_brb());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalogue {}", path.display()))?;
    let questions = Questionnaire::from_yaml(&yaml)
        .with_context(|| format!("Invalid catalogue {}", path.display()))?;
    info!(path = %path.display(), questions = questions.len(), "Loaded catalogue");
    Ok(questions)
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<String> {
    lines
        .next_line()
        .await?
        .context("Input closed before the questionnaire was finished")
}

async fn take(args: &Args, store: Arc<dyn SurveyStore>) -> anyhow::Result<()> {
    let questions = load_questionnaire(args)?;
    let total = questions.len();
    let coordinator = Arc::new(SubmissionCoordinator::new(store));
    let mut session = SurveySession::new(questions, coordinator);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Pesquisa Arena BRB - digite o número da opção, '<' para voltar.\n");

    let mut handle = loop {
        let Some(question) = session.flow().current().cloned() else {
            anyhow::bail!("Questionnaire finished without a submission");
        };
        let position = question.id;
        print!("{}", render_question(&question, position, total));

        match Reply::parse(&question, &read_line(&mut lines).await?) {
            Reply::Back => {
                session.back();
                continue;
            }
            Reply::Next => {}
            Reply::Answer(answer) => session.record_answer(answer)?,
        }

        match session.advance() {
            Advance::Moved { .. } => println!(),
            Advance::NeedsAnswer => println!("Escolha uma opção para continuar.\n"),
            Advance::Submitting(handle) => break handle,
            Advance::InFlight | Advance::Completed => {
                anyhow::bail!("Survey already submitted")
            }
        }
    };

    loop {
        println!("Enviando...");
        let outcome = handle.outcome().await;
        if let Some(notification) = Notification::for_status(&session.status()) {
            println!("{}\n", render_notification(&notification));
        }

        match outcome {
            Ok(receipt) => {
                info!(respondent_id = %receipt.respondent_id, event_id = %receipt.event_id, "Done");
                return Ok(());
            }
            Err(e) => {
                println!("Tentar novamente? (s/n)");
                if !read_line(&mut lines).await?.trim().eq_ignore_ascii_case("s") {
                    return Err(e.into());
                }
                handle = session.retry()?;
            }
        }
    }
}

async fn counter(initial: u64, seconds: u64, interval_ms: u64) -> anyhow::Result<()> {
    let handle = CounterSimulation::start(CounterConfig {
        initial,
        interval: Duration::from_millis(interval_ms),
        ..Default::default()
    });
    let mut rx = handle.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    println!("Rumo à Próxima Árvore!");
    println!("{}", render_tally(&handle.current()));
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render_tally(&rx.borrow_and_update()));
            }
        }
    }

    let last = handle.stop().await;
    info!(responses = last.responses, trees = last.trees_planted, "Counter finished");
    Ok(())
}

async fn dashboard(args: &Args, store: Arc<dyn SurveyStore>, json: bool) -> anyhow::Result<()> {
    let filters = args
        .command
        .dashboard_filters()
        .context("Dashboard filters requested outside the dashboard command")?;
    let data = Dashboard::new(store).load(&filters).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let percent = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.1}", v));
    println!("Dashboard CX ({} a {})", filters.from, filters.to);
    println!("  Respondentes:     {}", data.kpis.respondents);
    println!("  Respostas:        {}", data.kpis.responses);
    println!("  NPS:              {}", percent(data.kpis.nps_score));
    println!("  Promotores (%):   {}", percent(data.kpis.promoter_share));
    if let Some(top) = data.trophies.first() {
        println!("  Destaque:         {} ({})", top.value, top.count);
    }
    if let Some(top) = data.frustrations.first() {
        println!("  Maior frustração: {} ({})", top.value, top.count);
    }
    if let Some(top) = data.top_artists.first() {
        println!("  Artista pedido:   {} ({})", top.value, top.count);
    }
    println!(
        "  Saúde dos dados:  {} incompletos, {} sem respostas, {} NPS inválidos",
        data.health.incomplete_respondents,
        data.health.respondents_without_responses,
        data.health.unparsable_nps
    );
    Ok(())
}
