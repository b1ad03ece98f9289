use secrecy::{ExposeSecret, SecretString};

use crate::{
    auth::{SessionProvider, SignUp, User},
    config::Config,
    prelude::*,
};


const PASSWORD_ENV: &str = "LECTERN_PASSWORD";

pub(crate) async fn run(email: &str, config: &Config) -> Result<()> {
    let password = password_from_env()?;
    let provider = SessionProvider::new(&config.source, &config.auth)?;
    let session = provider.sign_in(email, &password).await?;

    bunt::println!("{$green+bold}✔ Signed in{/$} as {[bold+intense]}", session.user.display_name());
    print_user(&session.user);
    let expires_at = session.expires_in
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .and_then(|d| chrono::Local::now().checked_add_signed(d));
    if let Some(expires_at) = expires_at {
        bunt::println!("   {$dimmed}Token expires:{/$} {}", expires_at.format("%Y-%m-%d %H:%M"));
    }
    print_token(&session.access_token);

    Ok(())
}

pub(crate) async fn signup(email: &str, full_name: &str, config: &Config) -> Result<()> {
    if full_name.trim().is_empty() {
        bail!("full name must not be empty");
    }

    let password = password_from_env()?;
    let provider = SessionProvider::new(&config.source, &config.auth)?;
    match provider.sign_up(email, &password, full_name).await? {
        SignUp::SignedIn(session) => {
            bunt::println!("{$green+bold}✔ Signed up{/$} as {[bold+intense]}", session.user.display_name());
            print_user(&session.user);
            print_token(&session.access_token);
        }
        SignUp::ConfirmationPending(user) => {
            bunt::println!("{$green+bold}✔ Signed up{/$} as {[bold+intense]}", user.display_name());
            print_user(&user);
            println!();
            bunt::println!("{$yellow}Confirm your email address, then run `lectern login`.{/$}");
        }
    }

    Ok(())
}

pub(crate) async fn logout(config: &Config) -> Result<()> {
    let provider = SessionProvider::new(&config.source, &config.auth)?;
    provider.sign_out().await?;

    bunt::println!("{$green+bold}✔ Signed out{/$}");
    bunt::println!("{$dimmed}You can remove `access_token` from your configuration now.{/$}");
    Ok(())
}

fn password_from_env() -> Result<SecretString> {
    std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .with_context(|| format!("password has to be given via the environment variable {PASSWORD_ENV}"))
}

fn print_user(user: &User) {
    bunt::println!("   {$dimmed}ID:{/$}     {}", user.id);
    if let Some(email) = &user.email {
        bunt::println!("   {$dimmed}Email:{/$}  {}", email);
    }
    if let Some(role) = &user.role {
        bunt::println!("   {$dimmed}Role:{/$}   {}", role);
    }
    if let Some(avatar) = &user.avatar_url {
        bunt::println!("   {$dimmed}Avatar:{/$} {}", avatar);
    }
}

fn print_token(token: &SecretString) {
    println!();
    bunt::println!("{$dimmed}Put this into the `[auth]` section of your configuration \
        or into LECTERN_ACCESS_TOKEN:{/$}");
    println!("access_token = \"{}\"", token.expose_secret());
}
