use chrono::Local;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use till::application::card_flow::{CardPaymentFlow, CardStep};
use till::application::checkout::Checkout;
use till::application::history::{HistoryView, TransactionHistory};
use till::application::qr_session::{QrPaymentSession, qr_size_for_width};
use till::config::TerminalConfig;
use till::domain::amount::{AmountEntry, Key};
use till::domain::navigation::{Navigation, Navigator, Screen};
use till::domain::payment::{PaymentMethod, PaymentOutcome};
use till::domain::ports::SharedGateway;
use till::domain::simulation::SimulationMode;
use till::infrastructure::http::HttpGateway;
use till::infrastructure::in_memory::InMemoryGateway;
use till::interfaces::csv::transaction_writer::TransactionWriter;
use till::interfaces::terminal::history_view::render_history;
use till::interfaces::terminal::payment_view::{render_card_step, render_mode, render_qr};
use till::interfaces::terminal::result_view::render_result;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the payment API
    #[arg(long, env = "TILL_API_URL", global = true)]
    api_url: Option<String>,

    /// Terminal identifier known to the payment API
    #[arg(long, env = "TILL_MACHINE_ID", global = true)]
    machine_id: Option<String>,

    /// Outcome the backend should simulate (success or fail)
    #[arg(long, global = true, default_value = "success")]
    mode: SimulationMode,

    /// Use the built-in in-memory gateway instead of the HTTP API
    #[arg(long, global = true)]
    offline: bool,

    /// Override the QR code validity window
    #[arg(long, global = true)]
    qr_timeout_secs: Option<u64>,

    /// Display width in pixels; sizes the QR image to fit
    #[arg(long, global = true)]
    screen_width: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Charge a card for AMOUNT (typed as keypad keys, e.g. 12.5)
    Card { amount: String },
    /// Take AMOUNT by QR code; Enter simulates the customer paying, q goes back
    Qr {
        amount: String,
        /// Simulate the customer paying after this many seconds instead of waiting for Enter
        #[arg(long)]
        auto_simulate: Option<u64>,
    },
    /// List this terminal's sales
    Sales {
        /// Write the list as CSV
        #[arg(long)]
        csv: bool,
    },
    /// Replay keypad KEYS (digits, '.', '⌫') and print the resulting amount
    Keys { keys: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli)?);

    let gateway: SharedGateway = if cli.offline {
        Arc::new(InMemoryGateway::new())
    } else {
        Arc::new(HttpGateway::new(&config).into_diagnostic()?)
    };

    match cli.command {
        Command::Card { ref amount } => {
            run_checkout(&cli, gateway, config, amount, PaymentMethod::Card, None).await
        }
        Command::Qr {
            ref amount,
            auto_simulate,
        } => {
            run_checkout(
                &cli,
                gateway,
                config,
                amount,
                PaymentMethod::Qr,
                auto_simulate.map(Duration::from_secs),
            )
            .await
        }
        Command::Sales { csv } => run_sales(gateway, &config, csv).await,
        Command::Keys { ref keys } => {
            let entry = AmountEntry::from_keys(keys).into_diagnostic()?;
            println!("{}", entry.value());
            println!("{entry}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<TerminalConfig> {
    let mut config = match &cli.config {
        Some(path) => TerminalConfig::from_json_file(path).into_diagnostic()?,
        None => TerminalConfig::default(),
    };
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(machine_id) = &cli.machine_id {
        config.machine_id = machine_id.clone();
    }
    if let Some(secs) = cli.qr_timeout_secs {
        config.qr_session_timeout_ms = secs.saturating_mul(1000);
    }
    if let Some(width) = cli.screen_width {
        config.qr_image_size = qr_size_for_width(width);
    }
    config.validate().into_diagnostic()
}

async fn run_checkout(
    cli: &Cli,
    gateway: SharedGateway,
    config: Arc<TerminalConfig>,
    amount: &str,
    method: PaymentMethod,
    auto_simulate: Option<Duration>,
) -> Result<ExitCode> {
    let (navigator, mut events) = Navigator::channel();
    let mut checkout = Checkout::new(navigator.clone()).with_mode(cli.mode);
    for c in amount.chars() {
        checkout.press(Key::try_from(c).into_diagnostic()?);
    }

    println!("{}", render_mode(checkout.mode()));
    println!("Amount {}", checkout.entry());
    let Some(request) = checkout.checkout(method) else {
        return Err(miette!("Enter an amount before checking out"));
    };

    let outcome = match method {
        PaymentMethod::Card => {
            let mut flow = CardPaymentFlow::new(gateway, config, request, navigator);
            let mut progress = flow.subscribe();
            println!("{}", render_card_step(CardStep::Ready));
            let printer = async {
                while let Some(step) = progress.recv().await {
                    println!("{}", render_card_step(step));
                }
            };
            let (outcome, ()) = tokio::join!(flow.run(), printer);
            Some(outcome.into_diagnostic()?)
        }
        PaymentMethod::Qr => {
            let session = QrPaymentSession::new(gateway, config, request, navigator);
            run_qr(session, &mut events, auto_simulate).await?
        }
    };

    let Some(outcome) = outcome else {
        println!("Sale cancelled");
        return Ok(ExitCode::SUCCESS);
    };
    println!("{}", render_result(&outcome, &Local::now()));
    Ok(if outcome.is_approved() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Drives the QR screen until it reaches a result (`Some`) or the operator backs out (`None`).
async fn run_qr(
    mut session: QrPaymentSession,
    events: &mut UnboundedReceiver<Navigation>,
    auto_simulate: Option<Duration>,
) -> Result<Option<PaymentOutcome>> {
    if let Some(outcome) = session.start().await.into_diagnostic()? {
        return Ok(Some(outcome));
    }
    for line in render_qr(&session) {
        println!("{line}");
    }

    let mut stdin_open = auto_simulate.is_none();
    let mut auto_armed = auto_simulate.is_some();
    let mut lines = if stdin_open {
        println!("Press Enter to simulate the customer paying, or type q to go back.");
        spawn_stdin_reader()
    } else {
        mpsc::unbounded_channel().1
    };
    let auto = tokio::time::sleep(auto_simulate.unwrap_or_default());
    tokio::pin!(auto);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Navigation::Replace(Screen::Result(outcome))) => {
                    session.teardown();
                    return Ok(Some(outcome));
                }
                Some(_) => continue,
                None => return Ok(None),
            },
            line = lines.recv(), if stdin_open => match line {
                Some(line) if line.trim().eq_ignore_ascii_case("q") => {
                    session.back().into_diagnostic()?;
                    return Ok(None);
                }
                Some(_) => {
                    if let Some(outcome) = session.simulate().await.into_diagnostic()? {
                        return Ok(Some(outcome));
                    }
                }
                // Operator walked away; let the code expire.
                None => stdin_open = false,
            },
            () = &mut auto, if auto_armed => {
                auto_armed = false;
                if let Some(outcome) = session.simulate().await.into_diagnostic()? {
                    return Ok(Some(outcome));
                }
            }
        }
    }
}

/// Reads stdin on a plain thread; a blocking read parked on the runtime's pool
/// would hold up shutdown until the operator pressed Enter.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_sales(gateway: SharedGateway, config: &TerminalConfig, csv: bool) -> Result<ExitCode> {
    let mut history = TransactionHistory::new(gateway, config.machine_id.clone());
    let view = history.refresh().await;

    match (view, csv) {
        (HistoryView::Loaded(rows), true) => {
            let stdout = io::stdout();
            let mut writer = TransactionWriter::new(stdout.lock());
            writer.write_transactions(rows).into_diagnostic()?;
        }
        (view, _) => {
            for line in render_history(view, &Local::now()) {
                println!("{line}");
            }
        }
    }

    Ok(if matches!(history.view(), HistoryView::Failed(_)) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
