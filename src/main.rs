//! Lectern: browse and upload course lecture videos from the command line.

use clap::{CommandFactory, FromArgMatches};
use std::env;

use crate::{
    args::{Args, Command},
    config::Config,
    prelude::*,
};

mod args;
mod auth;
mod catalog;
mod cmd;
mod config;
mod logger;
mod model;
mod prelude;
mod source;
mod upload;
mod util;
mod version;


#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Log error in case stdout is not connected and it is logged into a file.
        error!("{:?}", e);

        // Show a somewhat nice representation of the error
        eprintln!();
        bunt::eprintln!("{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
        eprintln!();
        if e.chain().len() > 1 {
            bunt::eprintln!("{$red+italic}Caused by:{/$}");
        }

        for (i, cause) in e.chain().skip(1).enumerate() {
            eprint!(" {: >1$}", "", i * 2);
            eprintln!("‣ {cause}");
        }

        std::process::exit(1);
    }
}

/// Main entry point.
async fn run() -> Result<()> {
    // If `RUST_BACKTRACE` wasn't already set, we default to `1`. Backtraces are
    // almost always useful for debugging.
    if env::var("RUST_BACKTRACE") == Err(env::VarError::NotPresent) {
        env::set_var("RUST_BACKTRACE", "1");
    }

    // This is a bit roundabout because we want to override the version
    // using some runtime code.
    let args = Args::from_arg_matches(
        &Args::command()
            .version(version::full())
            .get_matches(),
    )?;

    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());

    match &args.cmd {
        Command::Browse { args: browse_args, shared } => {
            let config = load_config_and_init_logger(shared, &args, "browse")?;
            cmd::browse::run(browse_args, &config).await?;
        }
        Command::Upload { args: upload_args, shared } => {
            let config = load_config_and_init_logger(shared, &args, "upload")?;
            cmd::upload::run(upload_args, &config).await?;
        }
        Command::Login { email, shared } => {
            let config = load_config_and_init_logger(shared, &args, "login")?;
            cmd::login::run(email, &config).await?;
        }
        Command::Signup { email, name, shared } => {
            let config = load_config_and_init_logger(shared, &args, "signup")?;
            cmd::login::signup(email, name, &config).await?;
        }
        Command::Logout { shared } => {
            let config = load_config_and_init_logger(shared, &args, "logout")?;
            cmd::login::logout(&config).await?;
        }
        Command::Check { shared } => cmd::check::run(shared, &args).await?,
        Command::Courses { level, search } => {
            cmd::courses::run(level.as_deref(), search.as_deref())?
        }
        Command::WriteConfig { target } => config::write_template(target.as_ref())?,
    }

    Ok(())
}

fn load_config_and_init_logger(shared: &args::Shared, args: &Args, cmd: &str) -> Result<Config> {
    let (config, path) = match &shared.config {
        Some(path) => {
            let config = Config::load_from(path)
                .context(format!("failed to load config from '{}'", path.display()))?;
            (config, path.clone())
        }
        None => Config::from_env_or_default_locations()?,
    };

    // Initialize logger. Unfortunately, we can only do this here
    // after reading the config.
    logger::init(&config.log, args.stdout_color(), cmd)?;
    debug!("Loaded config from '{}'", path.display());
    trace!("Configuration: {:#?}", config);

    Ok(config)
}
