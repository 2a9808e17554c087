//! cardauth CLI (`cardauth`)
//!
//! 카드 키로 서버에 로그인하고 토큰을 관리합니다.

use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::session::LoginArgs;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "cardauth")]
#[command(author, version, about = "cardauth CLI - card-bound bearer tokens", long_about = None)]
struct Cli {
    /// Server URL (overrides saved config)
    #[arg(long, global = true, env = "CARDAUTH_SERVER_URL")]
    server: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────
    /// Generate a new key pair
    Keygen,

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────
    /// Run the card handshake and store tokens
    Login {
        /// Card id registered in the directory
        #[arg(long)]
        card: String,

        /// Card private key (hex, base64url or base64)
        #[arg(long, env = "CARDAUTH_CARD_KEY", hide_env_values = true)]
        key: String,

        /// Server public key (hex, base64url or base64)
        #[arg(long, env = "CARDAUTH_SERVER_PUBLIC_KEY")]
        server_key: String,

        /// Requested scope (defaults to "*")
        #[arg(long)]
        scope: Option<String>,
    },

    /// Get a new access token with the stored refresh token
    Refresh,

    /// Verify an access token (stored token by default)
    Verify {
        #[arg(long)]
        token: Option<String>,
    },

    /// Forget stored tokens
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let json = cli.format == OutputFormat::Json;

    // 설정 로드
    let mut config = CliConfig::load()?;

    // 명령 실행
    match cli.command {
        Commands::Keygen => commands::keys::keygen(json),

        Commands::Login {
            card,
            key,
            server_key,
            scope,
        } => {
            let server_url = config.server_url(cli.server.as_deref())?;
            let args = LoginArgs {
                server_url: &server_url,
                card_id: &card,
                card_key: &key,
                server_key: &server_key,
                scope: scope.as_deref(),
            };
            commands::session::login(&mut config, args).await
        }

        Commands::Refresh => {
            let server_url = config.server_url(cli.server.as_deref())?;
            commands::session::refresh(&mut config, &server_url).await
        }

        Commands::Verify { token } => {
            let server_url = config.server_url(cli.server.as_deref())?;
            commands::session::verify(&config, &server_url, token, json).await
        }

        Commands::Logout => commands::session::logout(&mut config),
    }
}
