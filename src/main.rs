use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipsift::config::AppConfig;
use ipsift::filter::FilterCategory;
use ipsift::lookup::HttpLookup;
use ipsift::session::controller::MSG_COPIED;
use ipsift::session::{
    clipboard, Command, Feedback, JsonFileStore, NoClipboard, SessionController,
    SessionPersistence,
};
use std::io::Read;
use std::path::PathBuf;

/// ipsift: batch IP geolocation with carrier and region filters
///
/// Each run restores the previous session, performs one action and saves the result.
///
/// Examples:
///   ipsift query 1.1.1.1 8.8.8.8 114.114.114.114
///   ipsift input --stdin < ips.txt && ipsift dedupe && ipsift query
///   ipsift filter mobile
///   ipsift copy
#[derive(Parser)]
#[command(name = "ipsift", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Config file (TOML).
    #[arg(long, global = true, env = "IPSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Session store file. Overrides `store_path` from the config.
    #[arg(long, global = true, env = "IPSIFT_STORE")]
    store: Option<PathBuf>,

    /// Provider profile to query. Overrides `provider` from the config.
    #[arg(long, global = true, env = "IPSIFT_PROVIDER")]
    provider: Option<String>,

    /// Per-request timeout in seconds. Overrides `timeout_secs` from the config.
    #[arg(long, short = 't', global = true, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// More log output (-v info, -vv debug).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Cmd {
    /// Replace the input list.
    Input {
        /// IP addresses, one per argument.
        ips: Vec<String>,
        /// Read the list from stdin instead, one IP per line.
        #[arg(long, conflicts_with = "ips")]
        stdin: bool,
    },
    /// Remove duplicate lines from the input.
    Dedupe,
    /// Look up every IP in the input, optionally replacing the input first.
    Query {
        ips: Vec<String>,
    },
    /// Toggle a filter: all, foreign, mobile, telecom, unicom, hmt, other.
    Filter {
        #[arg(value_parser = parse_category)]
        category: FilterCategory,
    },
    /// Print the visible results and copy them to the clipboard.
    Copy {
        /// Only print, leave the clipboard alone.
        #[arg(long)]
        no_clipboard: bool,
    },
    /// Forget the saved session.
    Clear,
    /// Show the saved session.
    Show,
    /// List provider profiles.
    Providers,
}

fn parse_category(s: &str) -> Result<FilterCategory, String> {
    s.parse()
}

fn main() {
    // Detached helper spawned by `ipsift copy` to keep the selection alive.
    if let Some(result) = clipboard::hold_selection_if_requested() {
        std::process::exit(if result.is_ok() { 0 } else { 1 });
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;
    if let Some(provider) = cli.provider.clone() {
        config.provider = provider;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    if let Cmd::Providers = cli.command {
        for p in config.profiles() {
            let marker = if p.name == config.provider { "*" } else { " " };
            println!("{} {:<10} {}", marker, p.name, p.url_template);
        }
        return Ok(());
    }

    let profile = config.active_profile()?;
    let store_path = cli
        .store
        .clone()
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(JsonFileStore::default_path);
    let persistence = SessionPersistence::new(Box::new(JsonFileStore::load_from(store_path)));
    let lookup = HttpLookup::new(profile.clone(), config.timeout());
    let mut controller = SessionController::restore(persistence, Box::new(lookup), profile);

    let command = match cli.command {
        Cmd::Input { ips, stdin } => {
            let text = if stdin {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                buf
            } else {
                ips.join("\n")
            };
            Command::InputChanged(text)
        }
        Cmd::Dedupe => Command::Dedupe,
        Cmd::Query { ips } => {
            if !ips.is_empty() {
                controller.dispatch(Command::InputChanged(ips.join("\n")));
            }
            eprintln!("  正在查询中...");
            Command::Query
        }
        Cmd::Filter { category } => Command::ToggleFilter(category),
        Cmd::Copy { no_clipboard } => {
            if no_clipboard {
                controller = controller.with_clipboard(Box::new(NoClipboard));
            }
            Command::Copy
        }
        Cmd::Clear => Command::Clear,
        Cmd::Show => {
            print_session(&controller);
            return Ok(());
        }
        Cmd::Providers => unreachable!("handled above"),
    };

    let show_view = matches!(command, Command::Query | Command::ToggleFilter(_));
    match controller.dispatch(command) {
        Feedback::View => {
            if show_view {
                print_view(&controller);
            }
        }
        Feedback::Status(msg) => eprintln!("  {}", msg),
        Feedback::Copied(text) => {
            println!("{}", text);
            eprintln!("  {}", MSG_COPIED);
        }
        Feedback::Output(text) => println!("{}", text),
        Feedback::Error(e) => return Err(e.into()),
    }
    Ok(())
}

fn print_view(controller: &SessionController) {
    let state = controller.state();
    println!("{}", state.rendered_view);
    if state.has_results() {
        let filters: Vec<String> = FilterCategory::ALL
            .iter()
            .map(|c| {
                if *c == state.active_filter {
                    format!("[{}]", c)
                } else {
                    c.to_string()
                }
            })
            .collect();
        eprintln!("  filters: {}", filters.join(" "));
    }
}

fn print_session(controller: &SessionController) {
    let state = controller.state();
    eprintln!("  provider: {}", controller.profile().name);
    match state.saved_at {
        Some(t) => eprintln!("  saved:    {}", t.format("%Y-%m-%d %H:%M:%S UTC")),
        None => eprintln!("  saved:    never"),
    }
    eprintln!("  filter:   {} ({})", state.active_filter, state.active_filter.label());
    eprintln!("  input:");
    for line in state.input_text.lines() {
        eprintln!("    {}", line);
    }
    if !state.rendered_view.is_empty() {
        print_view(controller);
    }
}
