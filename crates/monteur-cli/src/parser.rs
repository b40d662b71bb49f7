//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the Monteur backend supervisor.
#[derive(Parser)]
#[command(name = "monteur")]
#[command(about = "Run and configure the Monteur backend")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ConfigCommand;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from(["monteur", "--verbose", "run", "--packaged", "--timeout-ms", "500"]);
        assert!(cli.verbose);
        let Commands::Run {
            packaged,
            development,
            timeout_ms,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert!(packaged);
        assert!(!development);
        assert_eq!(timeout_ms, 500);
    }

    #[test]
    fn test_run_defaults_to_forty_seconds() {
        let cli = Cli::parse_from(["monteur", "run"]);
        assert!(matches!(cli.command, Commands::Run { timeout_ms: 40_000, .. }));
    }

    #[test]
    fn test_deployment_flags_conflict() {
        let result = Cli::try_parse_from(["monteur", "run", "--packaged", "--development"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_set_parses_assignments() {
        let cli = Cli::parse_from([
            "monteur",
            "config",
            "set",
            "MONTEUR_ENV=prod",
            "WHISPER_API_URL=https://example.test/v1?a=b",
        ]);
        let Commands::Config {
            command: ConfigCommand::Set { assignments },
        } = cli.command
        else {
            panic!("expected config set");
        };
        assert_eq!(
            assignments,
            vec![
                ("MONTEUR_ENV".to_string(), "prod".to_string()),
                (
                    "WHISPER_API_URL".to_string(),
                    "https://example.test/v1?a=b".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_config_set_rejects_missing_equals() {
        let result = Cli::try_parse_from(["monteur", "config", "set", "MONTEUR_ENV"]);
        assert!(result.is_err());
    }
}
