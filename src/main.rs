use clap::{Parser, Subcommand};
use serde::Serialize;

use sipswp::api::{
    GoalParams, SequenceParams, SimulateParams, SurvivalParams, run_goal, run_http_server,
    run_sequence, run_simulate, run_survival,
};
use sipswp::core::{ConfigError, PlannerDefaults};
use sipswp::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "sipswp",
    about = "Deterministic contribution/withdrawal projections: yearly ledgers, required step-up, sequence risk and survival grids"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (RUST_LOG overrides)"
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Year-by-year ledger for a contribution phase followed by a withdrawal phase.
    Simulate(SimulateParams),
    /// Smallest annual contribution step-up that reaches a target balance.
    Goal(GoalParams),
    /// Bear/flat/bull comparison of the first two withdrawal years.
    Sequence(SequenceParams),
    /// Survival across withdrawal rates and durations.
    Survival(SurvivalParams),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let defaults = PlannerDefaults::default();
    let outcome = match cli.command {
        Command::Serve { port } => run_http_server(port, defaults)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Simulate(params) => print_json(run_simulate(&params, &defaults)),
        Command::Goal(params) => print_json(run_goal(&params, &defaults)),
        Command::Sequence(params) => print_json(run_sequence(&params, &defaults)),
        Command::Survival(params) => print_json(run_survival(&params, &defaults)),
    };

    if let Err(e) = outcome {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn print_json<T: Serialize>(result: Result<T, ConfigError>) -> Result<(), String> {
    let body = result.map_err(|e| format!("Invalid input: {e}"))?;
    let json =
        serde_json::to_string_pretty(&body).map_err(|e| format!("Failed to encode result: {e}"))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_takes_port_flag_with_default() {
        let cli = Cli::try_parse_from(["sipswp", "serve"]).expect("serve parses");
        assert!(matches!(cli.command, Command::Serve { port: 8080 }));

        let cli =
            Cli::try_parse_from(["sipswp", "serve", "--port", "9000"]).expect("port flag parses");
        assert!(matches!(cli.command, Command::Serve { port: 9000 }));

        assert!(Cli::try_parse_from(["sipswp", "serve", "9000"]).is_err());
    }

    #[test]
    fn survival_lists_parse_from_comma_separated_flags() {
        let cli = Cli::try_parse_from([
            "sipswp",
            "survival",
            "--rates",
            "3,4.5",
            "--durations",
            "10,20",
        ])
        .expect("survival flags parse");
        let Command::Survival(params) = cli.command else {
            panic!("expected survival command");
        };
        assert_eq!(params.rates, Some(vec![3.0, 4.5]));
        assert_eq!(params.durations, Some(vec![10, 20]));
    }
}
