use secrecy::{ExposeSecret, SecretString};

use crate::{
    args::UploadArgs,
    auth::SessionProvider,
    catalog::{Catalog, FetchOutcome},
    config::Config,
    prelude::*,
    source::RestSource,
    upload::{self, LectureDraft},
};


pub(crate) async fn run(args: &UploadArgs, config: &Config) -> Result<()> {
    let identity = SessionProvider::new(&config.source, &config.auth)?;
    let access_token = config.auth.access_token.as_ref()
        .map(|t| SecretString::from(t.expose_secret().to_owned()));
    let catalog = Catalog::new(RestSource::new(&config.source, access_token)?, &config.catalog);

    let draft = LectureDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        video_url: args.video_url.clone(),
        thumbnail_url: args.thumbnail_url.clone(),
        week_number: args.week,
        course_id: args.course.clone(),
    };

    let outcome = upload::submit(&catalog, &identity, draft).await?
        .context("failed to upload lecture")?;
    bunt::println!("{$green+bold}✔ Uploaded{/$} {[bold+intense]}", args.title.trim());

    match outcome {
        FetchOutcome::Ingested { added, .. } => {
            debug!("Catalog reloaded from page 1 ({added} lectures)");
            if let Some(pos) = catalog.visible_records().iter().position(|r| r.video_url == args.video_url.trim()) {
                bunt::println!("{$dimmed}Now at position {} of the catalog.{/$}", pos + 1);
            }
        }
        FetchOutcome::Failed(e) => {
            warn!("Lecture was created, but reloading the catalog failed: {e}");
        }
        other => trace!("Reload after upload: {other:?}"),
    }

    Ok(())
}
