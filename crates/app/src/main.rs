use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use caixa_client::{ApiClient, LedgerApi, Session, SessionStore};
use caixa_core::{EntryDraft, EntryFilter, EntryType, Money, PaymentMethod, TypeFilter};
use caixa_engine::{QueryEngine, QueryOptions, ReceiptWorkflow, ScanRequest};
use caixa_report::{export_csv, export_file_name, render_table};

#[derive(Parser)]
#[command(name = "caixa", about = "Cliente de linha de comando do livro-caixa", version)]
struct Cli {
    /// Base URL of the cash-ledger service.
    #[arg(long, env = "CAIXA_API_URL", default_value = "http://localhost:3333")]
    api_url: String,

    /// Bearer token for authenticated commands (printed by `caixa login`).
    #[arg(long, env = "CAIXA_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and print the access token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the entries and the summary for one day.
    Entries {
        #[arg(long)]
        date: NaiveDate,
        /// in, out or all
        #[arg(long, value_parser = parse_type_filter, default_value = "all")]
        r#type: TypeFilter,
    },
    /// File a report over a date range, optionally exporting it as CSV.
    Report {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// in, out or all
        #[arg(long, value_parser = parse_type_filter, default_value = "all")]
        r#type: TypeFilter,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        min_amount: Option<Money>,
        #[arg(long)]
        max_amount: Option<Money>,
        /// Write the ;-delimited document to this directory instead of
        /// printing the table.
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Record a new entry.
    Add {
        /// in or out
        #[arg(long, value_parser = parse_entry_type)]
        r#type: EntryType,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<String>,
        /// cash, pix or card
        #[arg(long, value_parser = parse_payment_method)]
        payment: Option<PaymentMethod>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete an entry by id.
    Delete { id: i64 },
    /// Digitize a receipt photo into a draft entry.
    Scan {
        image: PathBuf,
        /// Pre-filled description; survives the merge when the recognizer
        /// finds none.
        #[arg(long)]
        description: Option<String>,
        /// Submit the merged draft as a new entry.
        #[arg(long)]
        save: bool,
    },
}

fn parse_type_filter(s: &str) -> Result<TypeFilter, String> {
    match s.to_ascii_lowercase().as_str() {
        "all" => Ok(TypeFilter::All),
        "in" => Ok(TypeFilter::In),
        "out" => Ok(TypeFilter::Out),
        other => Err(format!("unknown type filter: {other}")),
    }
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    match s.to_ascii_lowercase().as_str() {
        "in" => Ok(EntryType::In),
        "out" => Ok(EntryType::Out),
        other => Err(format!("unknown entry type: {other}")),
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod, String> {
    match s.to_ascii_lowercase().as_str() {
        "cash" => Ok(PaymentMethod::Cash),
        "pix" => Ok(PaymentMethod::Pix),
        "card" => Ok(PaymentMethod::Card),
        other => Err(format!("unknown payment method: {other}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let session = SessionStore::new();
    if let Some(token) = &cli.token {
        session.set(Session::from_token(token.clone()));
    }
    let client = ApiClient::new(cli.api_url.clone(), session.clone());

    let result = run(&cli.command, &client).await;

    // Any 401 along the way clears the store; tell the user where to go,
    // the way the browser client redirects to the login page.
    if !session.is_authenticated() && cli.token.is_some() {
        eprintln!("sessão expirada, use `caixa login` novamente");
    }
    result
}

async fn run(command: &Command, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let login = client.login(email, password).await?;
            println!("{}", login.access_token);
            eprintln!("autenticado como {}", login.user.name);
        }
        Command::Register { name, email, password } => {
            let registered = client.register(name, email, password).await?;
            println!("{}", registered.message);
        }
        Command::Entries { date, r#type } => {
            let filter = EntryFilter { entry_type: *r#type, ..EntryFilter::for_day(*date) };
            let engine =
                QueryEngine::spawn(Arc::new(client.clone()), filter, QueryOptions::dashboard());
            let state = engine.settled().await;
            if let Some(error) = state.error {
                bail!(error);
            }
            print!("{}", render_table(&state.entries));
            if let Some(summary) = state.summary {
                println!(
                    "\nResumo do dia: {} entradas, {} saídas, saldo {}",
                    summary.count_in, summary.count_out, summary.balance
                );
            }
        }
        Command::Report {
            from,
            to,
            r#type,
            category,
            description,
            min_amount,
            max_amount,
            export_dir,
        } => {
            let filter = EntryFilter {
                entry_type: *r#type,
                date_from: *from,
                date_to: *to,
                category: category.clone(),
                description: description.clone(),
                min_amount: *min_amount,
                max_amount: *max_amount,
                ..EntryFilter::default()
            };
            let engine =
                QueryEngine::spawn(Arc::new(client.clone()), filter, QueryOptions::report());
            let state = engine.settled().await;
            if let Some(error) = state.error {
                bail!(error);
            }
            match export_dir {
                Some(dir) => {
                    let path = dir.join(export_file_name(Utc::now().date_naive()));
                    let document = export_csv(&state.entries)?;
                    tokio::fs::write(&path, document)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("{}", path.display());
                }
                None => print!("{}", render_table(&state.entries)),
            }
        }
        Command::Add { r#type, amount, description, category, payment, date } => {
            let draft = EntryDraft {
                entry_type: *r#type,
                amount: *amount,
                description: description.clone(),
                category: category.clone(),
                payment_method: *payment,
                entry_date: *date,
            };
            draft.validate()?;
            let entry = client.create_entry(&draft).await?;
            println!("lançamento {} criado", entry.id);
        }
        Command::Delete { id } => {
            client.delete_entry(*id).await?;
            println!("lançamento {id} removido");
        }
        Command::Scan { image, description, save } => {
            let bytes = tokio::fs::read(image)
                .await
                .with_context(|| format!("reading {}", image.display()))?;
            let request = ScanRequest {
                file_name: image
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content_type: None,
                bytes,
            };
            let draft = EntryDraft {
                description: description.clone().unwrap_or_default(),
                ..EntryDraft::default()
            };

            let workflow = ReceiptWorkflow::new(Arc::new(client.clone()));
            let outcome = workflow.digitize(request, draft).await?;

            println!("confiança: {}%", outcome.confidence_pct);
            println!("{}", serde_json::to_string_pretty(&outcome.draft)?);
            if *save {
                outcome.draft.validate()?;
                let entry = client.create_entry(&outcome.draft).await?;
                println!("lançamento {} criado", entry.id);
                if let Some(entry_date) = outcome.entry_date {
                    // Mirror the browser client: retarget the day view so the
                    // new entry is visible.
                    let filter = EntryFilter::for_day(entry_date);
                    let entries = client.list_entries(&filter).await?;
                    print!("{}", render_table(&entries));
                }
            }
        }
    }
    Ok(())
}
