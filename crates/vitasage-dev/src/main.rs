//! VitaSage dev tool.
//!
//! `vitasage-dev` (or `vitasage-dev up`) starts the backend API and the
//! frontend dev server for local development. The other subcommands drive
//! the API client against a running backend.

mod launcher;
mod tools;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vitasage_core::models::HospitalCreate;

use launcher::{LaunchPlan, DEFAULT_BACKEND_CMD, DEFAULT_HOST, DEFAULT_NPM, DEFAULT_PORT};
use tools::StoreKind;

#[derive(Parser, Debug)]
#[command(name = "vitasage-dev", version, about = "Local development launcher and session tools for VitaSage")]
struct Cli {
    /// Keep credentials in the OS keychain instead of the cache directory
    #[arg(long, global = true)]
    keyring: bool,

    /// Use the deployed backend when VITE_API_URL is unset
    #[arg(long, global = true)]
    fallback_url: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the backend and frontend servers (default)
    Up(UpArgs),
    #[command(flatten)]
    Session(SessionCommands),
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        username: String,
        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },
    /// Show the logged in user
    Whoami,
    /// Forget the stored session
    Logout,
    /// List users of the current hospital
    Users {
        #[arg(long)]
        json: bool,
    },
    /// Create a user in the current hospital
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password_stdin: bool,
    },
    /// Enable or disable a user
    ToggleUser { id: i64 },
    /// Register a hospital and its admin account
    RegisterHospital(RegisterArgs),
}

#[derive(Args, Debug)]
struct UpArgs {
    /// Directory containing ./backend and ./frontend
    #[arg(long, default_value = ".")]
    root: PathBuf,
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Server command run inside ./backend
    #[arg(long, default_value = DEFAULT_BACKEND_CMD)]
    backend_cmd: String,
    /// Package manager run inside ./frontend
    #[arg(long, default_value = DEFAULT_NPM)]
    npm: String,
    /// Terminal emulator prefix for each server, e.g. "x-terminal-emulator -e"
    #[arg(long, env = "VITASAGE_TERMINAL")]
    terminal: Option<String>,
    /// Print the commands without starting anything
    #[arg(long)]
    dry_run: bool,
}

impl Default for UpArgs {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backend_cmd: DEFAULT_BACKEND_CMD.to_string(),
            npm: DEFAULT_NPM.to_string(),
            terminal: std::env::var("VITASAGE_TERMINAL").ok(),
            dry_run: false,
        }
    }
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    hospital: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    admin_username: String,
    #[arg(long)]
    admin_full_name: Option<String>,
    #[arg(long, env = "VITASAGE_REGISTER_SECRET")]
    register_secret: String,
    #[arg(long)]
    password_stdin: bool,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run_up(args: UpArgs) {
    let plan = LaunchPlan::new(&args.root, &args.host, args.port, &args.backend_cmd, &args.npm)
        .with_terminal(args.terminal.as_deref());

    if args.dry_run {
        for spec in plan.specs() {
            println!("{}", spec.describe());
        }
        return;
    }

    println!("Starting VitaSage development servers...");
    launcher::launch(&plan);
    println!("API: http://{}:{}", args.host, args.port);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(|| Commands::Up(UpArgs::default()));

    match command {
        Commands::Up(args) => {
            run_up(args);
            Ok(())
        }
        Commands::Session(command) => run_session(command, cli.keyring, cli.fallback_url).await,
    }
}

async fn run_session(command: SessionCommands, keyring: bool, fallback_url: bool) -> Result<()> {
    let store = if keyring { StoreKind::Keyring } else { StoreKind::File };
    let client = tools::build_client(store, fallback_url)?;
    info!(base_url = ?client.base_url(), "Client ready");
    let mut events = client.subscribe();

    let result = match command {
        SessionCommands::Login {
            hospital,
            username,
            password_stdin,
        } => {
            let password = tools::read_password(password_stdin, "Password: ")?;
            tools::login(&client, &hospital, &username, &password).await
        }
        SessionCommands::Whoami => tools::whoami(&client).await,
        SessionCommands::Logout => tools::logout(&client),
        SessionCommands::Users { json } => tools::list_users(&client, json).await,
        SessionCommands::CreateUser {
            username,
            role,
            full_name,
            email,
            password_stdin,
        } => {
            let password = tools::read_password(password_stdin, "New user's password: ")?;
            tools::create_user(&client, &username, &role, full_name, email, password).await
        }
        SessionCommands::ToggleUser { id } => tools::toggle_user(&client, id).await,
        SessionCommands::RegisterHospital(args) => {
            let admin_password = tools::read_password(args.password_stdin, "Admin password: ")?;
            let payload = HospitalCreate {
                hospital_id: args.hospital,
                name: args.name,
                email: args.email,
                address: args.address,
                admin_username: args.admin_username,
                admin_password,
                admin_full_name: args.admin_full_name,
                register_secret: args.register_secret,
            };
            tools::register_hospital(&client, payload).await
        }
    };

    tools::report_auth_events(&mut events);
    result
}
