#[macro_use]
extern crate tracing;

use clap::Parser;
use encore_core::{error::EncoreResult, package_full};

use crate::cli::{AppCli, Command};

mod assets;
mod cli;
mod init;
mod pages;

#[cfg(test)]
mod tests;

fn main() -> EncoreResult<()> {
    crate::init::logging();
    use tokio::runtime::Builder;
    let runtime = Builder::new_multi_thread()
        .thread_name_fn(|| {
            use std::sync::atomic::{AtomicUsize, Ordering};
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
            format!("encore-{}", id)
        })
        .enable_all()
        .build()?;

    let cli = AppCli::parse();
    let config = cli.config;
    match cli.command {
        Command::Server(server) => {
            info!("Starting {}", package_full());
            runtime.block_on(async move {
                tokio::spawn(async move { crate::cli::server::server_start(config, server).await })
                    .await
            })??;
            runtime.shutdown_timeout(std::time::Duration::from_secs(10));
            Ok(())
        }
        Command::CreateUser(create) => {
            runtime.block_on(crate::cli::create_user::create_user(config, create))
        }
        Command::AddAlbum(album) => runtime.block_on(crate::cli::add_album::add_album(config, album)),
        Command::Toggle(toggle) => runtime.block_on(crate::cli::toggle::toggle(config, toggle)),
    }
}
