mod app;
mod commands;
mod config;
mod effects;
mod logging;
mod render;

use std::process::ExitCode;

use portal_logging::{default_level, portal_info};

use crate::cli::{Cli, Command};
use app::Session;
use config::PortalConfig;
use logging::LogDestination;

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::initialize(
        LogDestination::from_flags(cli.log_file, cli.log_both),
        default_level(cli.verbose),
    );
    let config = PortalConfig::load(cli.config.as_deref())?.with_email(cli.email);
    portal_info!("portal {} starting", env!("CARGO_PKG_VERSION"));

    if let Command::Activity { recent } = cli.command {
        return commands::activity(&config, recent);
    }

    let mut session = Session::start(&config)?;
    match cli.command {
        Command::List { search } => commands::list(&mut session, search),
        Command::Check { input } => commands::check(&mut session, &input),
        Command::Sort(args) => commands::sort(&mut session, args),
        Command::Status => commands::status(&mut session),
        Command::Watch => commands::watch(&mut session),
        Command::Vcf(args) => commands::vcf(&mut session, &config, args),
        Command::Activity { recent } => commands::activity(&config, recent),
    }
}
