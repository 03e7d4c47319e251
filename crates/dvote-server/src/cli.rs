use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dvote-server", about = "Poll and vote tally server", version)]
pub struct Args {
    /// Path to the TOML config file. A missing file means built-in defaults.
    #[arg(short, long, default_value = "dvote.toml")]
    pub config: String,

    /// Override `server.bind_address`, e.g. 0.0.0.0:8080
    #[arg(long)]
    pub bind: Option<String>,

    /// Apply database migrations and exit
    #[arg(long)]
    pub migrate_only: bool,
}
