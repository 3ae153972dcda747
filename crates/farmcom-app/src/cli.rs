use std::path::PathBuf;

use clap::Parser;

/// FarmCom chat: ask an agricultural assistant questions from the terminal.
#[derive(Parser, Debug)]
#[command(name = "farmcom-chat", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter directive override (e.g. `debug`, `farmcom_ai=trace`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Model id override.
    #[arg(short = 'm', long)]
    pub model: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
