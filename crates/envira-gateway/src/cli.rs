use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "envira-gateway",
    version,
    about = "Envira sensor gateway",
    long_about = "Envira sensor gateway: device ingestion API, dashboard data and the health assistant chat"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Seed demo readings before serving")]
        seed: bool,
    },
    #[command(about = "Insert a week of demo sensor readings")]
    Seed,
    #[command(about = "Mint a bearer token for a user")]
    Token {
        #[arg(long, help = "User ID to put in the token subject")]
        user_id: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { seed: false })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["envira-gateway"]);
        assert!(matches!(cli.command(), Commands::Serve { seed: false }));
    }

    #[test]
    fn parses_serve_with_seed() {
        let cli = Cli::parse_from(["envira-gateway", "serve", "--seed"]);
        assert!(matches!(cli.command(), Commands::Serve { seed: true }));
    }

    #[test]
    fn parses_token_command() {
        let cli = Cli::parse_from(["envira-gateway", "token", "--user-id", "user_1"]);
        match cli.command() {
            Commands::Token { user_id } => assert_eq!(user_id, "user_1"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
