mod adapters;
mod commands;
mod terminal;

use bmcfleet_common::config::Config;
use commands::{CommandLine, Commands, discover, power, refresh};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);

    let cfg = Config {
        no_banner: commands.no_banner || commands.json,
        quiet: commands.quiet,
        json: commands.json,
        ..Config::default()
    };
    print::banner(cfg.no_banner, cfg.quiet);

    match commands.command {
        Commands::Discover(args) => {
            print::header("getting ready for discovery", cfg.quiet);
            discover::discover(args, &cfg).await
        }
        Commands::Refresh(args) => {
            print::header("starting refresh", cfg.quiet);
            refresh::refresh(args, &cfg).await
        }
        Commands::Power(args) => {
            print::header("sending power actions", cfg.quiet);
            power::power(args, &cfg).await
        }
    }
}
