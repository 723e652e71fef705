//! Genius CLI - partner portal analytics from the terminal
//!
//! Usage:
//!   genius [--config <toml>] [--tickets <csv>] [--sales <csv>] [--chat]
//!
//! Example:
//!   genius --sales vendas.csv --tickets suporte.csv
//!   GEMINI_API_KEY=... genius --model auto --chat

use anyhow::{Context, Result};
use colored::Colorize;
use genius::data::{load_sales, load_tickets};
use genius::provider::GeminiProvider;
use genius::session::ChatSession;
use genius::{Bridge, LlmProvider, PortalConfig, PortalEngine};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const API_KEY_ENV: &str = "GEMINI_API_KEY";

fn print_usage() {
    eprintln!(
        r#"
{} - Ticket triage, sales aggregation and CRM pushes over a hosted LLM

{}
    genius [OPTIONS]

{}
    -c, --config <FILE>     TOML config file (default: genius.toml if present)
        --tickets <FILE>    Support-ticket CSV (default: data/suporte.csv)
        --sales <FILE>      Sales CSV (default: data/vendas.csv)
    -m, --model <MODEL>     Gemini model; "auto" picks the first flash model
    -k, --api-key <KEY>     API key (or set {} env var)
        --chat              Interactive chat over the sales data
    -v, --verbose           Debug-level logging
    -h, --help              Print this help message

{}
    genius
    genius --sales vendas_2026.csv --model gemini-1.5-pro
    genius --chat

{}
    Without an API key everything still runs; AI-generated fields show the
    offline placeholder instead.
"#,
        "Genius CLI".bold(),
        "USAGE:".bold(),
        "OPTIONS:".bold(),
        API_KEY_ENV,
        "EXAMPLES:".bold(),
        "OFFLINE MODE:".bold(),
    );
}

struct CliArgs {
    config_path: Option<String>,
    tickets_path: Option<String>,
    sales_path: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    chat: bool,
    verbose: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(0);
    }

    let mut parsed = CliArgs {
        config_path: None,
        tickets_path: None,
        sales_path: None,
        model: None,
        api_key: None,
        chat: false,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    parsed.config_path = Some(args[i].clone());
                }
            }
            "--tickets" => {
                i += 1;
                if i < args.len() {
                    parsed.tickets_path = Some(args[i].clone());
                }
            }
            "--sales" => {
                i += 1;
                if i < args.len() {
                    parsed.sales_path = Some(args[i].clone());
                }
            }
            "--model" | "-m" => {
                i += 1;
                if i < args.len() {
                    parsed.model = Some(args[i].clone());
                }
            }
            "--api-key" | "-k" => {
                i += 1;
                if i < args.len() {
                    parsed.api_key = Some(args[i].clone());
                }
            }
            "--chat" => {
                parsed.chat = true;
            }
            "--verbose" | "-v" => {
                parsed.verbose = true;
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn load_config(args: &CliArgs) -> Result<PortalConfig> {
    let mut config = match &args.config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {path}"))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {path}"))?
        }
        None if std::path::Path::new("genius.toml").exists() => {
            let contents = std::fs::read_to_string("genius.toml")
                .context("Failed to read genius.toml")?;
            toml::from_str(&contents).context("Failed to parse genius.toml")?
        }
        None => PortalConfig::default(),
    };

    if let Some(path) = &args.tickets_path {
        config.tickets_path = path.clone();
    }
    if let Some(path) = &args.sales_path {
        config.sales_path = path.clone();
    }
    if let Some(model) = &args.model {
        config.provider.model = model.clone();
    }
    if let Some(key) = &args.api_key {
        config.provider.api_key = Some(key.clone());
    } else if config.provider.api_key.is_none() {
        config.provider.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
    }

    Ok(config)
}

async fn build_bridge(config: &PortalConfig) -> Bridge {
    let Some(api_key) = config.provider.api_key.clone().filter(|k| !k.is_empty()) else {
        warn!("No API key configured, running offline (set {API_KEY_ENV})");
        return Bridge::offline();
    };

    let timeout = Duration::from_secs(config.provider.timeout_secs);
    let model = if config.provider.model == "auto" {
        GeminiProvider::resolve_flash_model(&config.provider.base_url, &api_key, timeout).await
    } else {
        config.provider.model.clone()
    };

    let provider = GeminiProvider::new(&config.provider.base_url, &api_key, &model, timeout);
    info!(provider = provider.name(), "Bridge online");
    Bridge::new(Arc::new(provider))
}

fn print_banner(title: &str) {
    println!();
    println!("{}", "═".repeat(60).blue());
    println!("{}", title.bold());
    println!("{}", "═".repeat(60).blue());
}

async fn run_support(engine: &PortalEngine, config: &PortalConfig) {
    print_banner("MÓDULO 1: CENTRAL DE SUPORTE");

    let tickets = match load_tickets(&config.tickets_path) {
        Ok(tickets) => tickets,
        Err(e) => {
            println!("{} {e}", "⚠".yellow());
            return;
        }
    };

    println!("Tickets pendentes: {}", tickets.len().to_string().bold());
    if tickets.is_empty() {
        println!("{}", "Fila vazia.".dimmed());
        return;
    }

    let report = engine.support_report(&tickets).await;
    for triage in &report.triages {
        println!();
        println!(
            "📩 Ticket #{}: {}",
            triage.ticket_id.bold(),
            truncate(&triage.customer_message, 60).italic()
        );
        println!(
            "   [{}] {}",
            severity_tag(&triage.reply),
            triage.reply.action()
        );
        println!("   💬 {}", triage.reply.customer_reply().dimmed());
    }
}

fn severity_tag(reply: &genius::triage::TriageReply) -> colored::ColoredString {
    use genius::triage::Severity;
    let label = reply.label().to_string();
    match reply.severity() {
        Severity::Urgente => label.red().bold(),
        Severity::Media => label.yellow(),
        Severity::Baixa => label.green(),
    }
}

async fn run_sales(engine: &PortalEngine, config: &PortalConfig) -> Result<()> {
    print_banner("MÓDULO 2: ENGENHARIA DE VENDAS");

    let sales = match load_sales(&config.sales_path) {
        Ok(sales) => sales,
        Err(e) => {
            println!("{} {e}", "⚠".yellow());
            return Ok(());
        }
    };

    if sales.is_empty() {
        println!("{}", "Sem vendas registradas.".dimmed());
        return Ok(());
    }

    // A bad total is the one hard failure: wrong money must not be printed.
    let report = engine
        .sales_report(&sales)
        .await
        .context("Sales aggregation failed")?;

    println!("Pedidos:     {}", report.summary.record_count.to_string().bold());
    println!(
        "Faturamento: {}",
        format!("R$ {:.2}", report.summary.total_value).bold()
    );
    println!(
        "Campeão:     {}",
        report.summary.top_item_label().bold().red()
    );

    if let Some(combos) = &report.combo_ideas {
        println!();
        println!("{}", "🔥 Combos promocionais sugeridos:".bold());
        for line in combos.lines() {
            println!("   {line}");
        }
    }

    Ok(())
}

async fn run_crm(engine: &PortalEngine, config: &PortalConfig) {
    print_banner("MÓDULO 3: CRM PREDITIVO (SNIPER)");

    let sales = match load_sales(&config.sales_path) {
        Ok(sales) => sales,
        Err(e) => {
            println!("{} {e}", "⚠".yellow());
            return;
        }
    };

    if sales.is_empty() {
        println!("{}", "Sem clientes na base.".dimmed());
        return;
    }

    let offers = engine.crm_report(&sales).await;
    println!("Disparando para {} perfis...", offers.len().to_string().bold());
    for offer in &offers {
        println!();
        println!(
            "📱 {} (favorito: {})",
            offer.customer.bold(),
            offer.favorite.red()
        );
        println!("   {}", offer.message);
    }
}

async fn run_chat(engine: &PortalEngine, config: &PortalConfig) -> Result<()> {
    print_banner("GENIUS ASSISTANT");

    let sales = load_sales(&config.sales_path).unwrap_or_default();
    let mut session = ChatSession::new(config.chat_context_rows);

    println!(
        "{}",
        "Pergunte sobre seus dados de vendas (vazio ou Ctrl-D para sair).".dimmed()
    );

    use std::io::Write;

    let stdin = std::io::stdin();
    loop {
        print!("{} ", ">".bold());
        std::io::stdout().flush().ok();

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).context("stdin read failed")?;
        let question = line.trim();
        if read == 0 || question.is_empty() {
            break;
        }

        if let Some(answer) = session.submit(question, engine.bridge(), &sales).await {
            println!("{}", answer.red());
        }
    }

    println!("{}", "Até logo!".dimmed());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args)?;
    let bridge = build_bridge(&config).await;

    if !bridge.is_online() {
        println!(
            "{}",
            format!("⚠ IA offline: defina {API_KEY_ENV} para respostas geradas.").yellow()
        );
    }

    let chat = args.chat;
    let engine = PortalEngine::new(config.clone(), bridge);

    if chat {
        return run_chat(&engine, &config).await;
    }

    run_support(&engine, &config).await;
    run_sales(&engine, &config).await?;
    run_crm(&engine, &config).await;

    println!();
    println!("{}", "✅ Finalizado.".green().bold());
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
