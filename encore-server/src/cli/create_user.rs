use encore_core::{config::Configuration, error::EncoreResult};
use encore_models::{NewUser, PgStore, Store};

use crate::cli::CreateUserCli;

pub async fn create_user(config: Configuration, cli: CreateUserCli) -> EncoreResult<()> {
    let store = PgStore::new(config.db_conn().await?);
    store.migrate().await?;
    let user = store
        .create_user(NewUser::new(cli.username, &cli.password, cli.staff)?)
        .await?;
    info!(
        "Created user {} with id {}{}",
        user.displayname(),
        user.id,
        if user.is_staff { " (staff)" } else { "" }
    );
    Ok(())
}
