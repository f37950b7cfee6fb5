use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring grind CLI.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(
        "Daily Grind API URL (e.g., http://localhost:5000)",
        &mut cfg.api_base_url,
        false,
    )?;
    apply_prompt("API user", &mut cfg.api_user, false)?;
    apply_prompt("API token", &mut cfg.api_token, true)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("API URL: {}", display_value(&cfg.api_base_url));
    println!("API user: {}", display_value(&cfg.api_user));
    println!("API token: {}", mask_secret(&cfg.api_token));

    Ok(())
}

/// Asks for one field on stdin. Enter keeps the value, `-` clears it.
fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    let shown = match target.as_deref() {
        Some(_) if secret => "****",
        Some(value) => value,
        None => "",
    };
    let mut stdout = io::stdout();
    write!(stdout, "{field} [{shown}]: ")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    apply_input(&input, target);
    Ok(())
}

fn apply_input(input: &str, target: &mut Option<String>) {
    match input.trim() {
        "" => {}
        "-" => *target = None,
        value => *target = Some(value.to_string()),
    }
}

fn display_value(value: &Option<String>) -> &str {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or("<not set>")
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
