//! A subcommand making sure the configuration is valid and the lecture
//! service is reachable.

use crate::{
    args::{self, Args},
    auth::{IdentityProvider, SessionProvider},
    config::Config,
    load_config_and_init_logger,
    prelude::*,
    source::{LectureSource, RestSource},
};


pub(crate) async fn run(shared: &args::Shared, args: &Args) -> Result<()> {
    let config = load_config_and_init_logger(shared, args, "check")
        .context("failed to load config: cannot proceed with `check` command")?;

    info!("Starting to verify various things...");
    let source = check_source(&config).await;
    let auth = check_auth(&config).await;
    info!("Done verifying various things");

    let mut any_errors = false;
    println!();
    bunt::println!("{$bold+blue+intense}Summary{/$}");
    println!();
    print_outcome(&mut any_errors, "Load configuration", &Ok(()));
    print_outcome(&mut any_errors, "Fetching lectures from lecture service", &source);
    print_outcome(&mut any_errors, "Configured access token", &auth);

    println!();
    if any_errors {
        bunt::println!("{$red+intense}➡  Errors have occured!{/$}");
        std::process::exit(1);
    } else {
        bunt::println!("{$green+intense}⮕  Everything OK{/$}");
        Ok(())
    }
}

fn print_outcome<T>(any_errors: &mut bool, label: &str, result: &Result<T>) {
    match result {
        Ok(_) => {
            bunt::println!(" ▸ {[bold+intense]}  {$green+bold}✔ ok{/$}", label);
        }
        Err(e) => {
            *any_errors = true;
            bunt::println!(" ▸ {[bold+intense]}  {$red+bold}✘ error{/$}", label);
            bunt::println!("      {$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
            if e.chain().len() > 1 {
                println!();
                bunt::println!("      {$red+italic}Caused by:{/$}");
            }

            for (i, cause) in e.chain().skip(1).enumerate() {
                print!("       {: >1$}", "", i * 2);
                println!("‣ {cause}");
            }
            println!();
        }
    }
}

async fn check_source(config: &Config) -> Result<()> {
    let source = RestSource::new(&config.source, None)?;
    let records = source.fetch_page(1, 1).await?;
    debug!("Lecture service returned {} record(s) for a test page", records.len());
    Ok(())
}

async fn check_auth(config: &Config) -> Result<()> {
    if config.auth.access_token.is_none() {
        info!("No access token configured: uploading lectures will not work");
        return Ok(());
    }

    let provider = SessionProvider::new(&config.source, &config.auth)?;
    match provider.current_user().await? {
        Some(user) => {
            info!("Access token belongs to '{}'", user.display_name());
            Ok(())
        }
        None => bail!("access token was rejected (expired?), run `lectern login` again"),
    }
}
