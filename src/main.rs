use anyhow::Result;
use clap::{Parser, Subcommand};

use botdash::cli;
use botdash::settings::BotSettings;

#[derive(Debug, Parser)]
#[command(name = "botdash")]
#[command(about = "Terminal dashboard and management server for a chat bot")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the bot if it is stopped, stop it if it is running
    Toggle,
    /// Show command usage
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Submit bot credentials to the server
    SaveConfig {
        #[arg(long)]
        telegram_token: String,
        #[arg(long)]
        twilio_account_sid: String,
        #[arg(long)]
        twilio_auth_token: String,
        #[arg(long)]
        twilio_phone_number: String,
    },
    /// Show the bot credentials saved on the server
    ShowSettings {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Follow the live bot log (last 100 lines)
    Logs,
    /// Bot status, command chart and live log on one screen
    Dashboard,
    /// Run the bot-management server
    Serve {
        /// Listen address (overrides `server.addr`)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.botdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one key, e.g. `dashboard.url http://bots:5000`
    Set { key: String, value: String },
    /// Reset ~/.botdash/config.toml to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Toggle => cli::run_toggle(),
        Commands::Stats { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(fmt)
        }
        Commands::SaveConfig {
            telegram_token,
            twilio_account_sid,
            twilio_auth_token,
            twilio_phone_number,
        } => cli::run_save_config(&BotSettings {
            telegram_token,
            twilio_account_sid,
            twilio_auth_token,
            twilio_phone_number,
        }),
        Commands::ShowSettings { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_show_settings(fmt)
        }
        Commands::Logs => cli::run_logs(),
        Commands::Dashboard => cli::run_dashboard(),
        Commands::Serve { addr } => cli::run_serve(addr),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
