use clap::{Args, Parser, Subcommand};
use encore_models::ArtistKind;

pub mod add_album;
pub mod create_user;
pub mod server;
pub mod toggle;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Album favorites, served", long_about = None)]
pub struct AppCli {
    #[clap(subcommand)]
    pub command: Command,
    #[clap(flatten)]
    pub config: encore_core::config::Configuration,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the album pages and the favorite endpoint
    Server(ServerCli),
    /// Create a user that can sign in
    CreateUser(CreateUserCli),
    /// Add an album, creating its artist and genres as needed
    AddAlbum(AddAlbumCli),
    /// Sign in to a running server and click the heart on one album page
    Toggle(ToggleCli),
}

#[derive(Args, Debug)]
pub struct ServerCli {
    #[clap(long)]
    /// Keep everything in memory even if a database is configured
    pub in_memory: bool,
    #[clap(long)]
    /// Seed a demo user and a few albums at startup
    pub demo: bool,
}

#[derive(Args, securefmt::Debug)]
pub struct CreateUserCli {
    pub username: String,
    #[sensitive]
    pub password: String,
    #[clap(long)]
    pub staff: bool,
}

#[derive(Args, Debug)]
pub struct AddAlbumCli {
    pub title: String,
    #[clap(long)]
    pub artist: Option<String>,
    #[clap(long, default_value = "ind")]
    pub artist_kind: ArtistKind,
    #[clap(long, value_name = "YYYY-MM-DD")]
    pub release_date: Option<chrono::NaiveDate>,
    #[clap(long = "genre")]
    pub genres: Vec<String>,
}

#[derive(Args, securefmt::Debug)]
pub struct ToggleCli {
    /// Where the server lives, for example http://127.0.0.1:8000
    pub base_url: encore_dependencies::url::Url,
    pub album_id: i64,
    #[clap(long)]
    pub username: String,
    #[clap(long, env = "ENCORE_PASSWORD", hide_env_values = true)]
    #[sensitive]
    pub password: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        AppCli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_album() {
        let cli = AppCli::try_parse_from([
            "encore",
            "add-album",
            "Blue",
            "--artist",
            "Joni Mitchell",
            "--release-date",
            "1971-06-22",
            "--genre",
            "Folk",
            "--genre",
            "Singer Songwriter",
        ])
        .unwrap();
        match cli.command {
            Command::AddAlbum(a) => {
                assert_eq!("Blue", a.title);
                assert_eq!(ArtistKind::Individual, a.artist_kind);
                assert_eq!(vec!["Folk", "Singer Songwriter"], a.genres);
                assert_eq!(chrono::NaiveDate::from_ymd_opt(1971, 6, 22), a.release_date);
            }
            c => panic!("unexpected command {:?}", c),
        }
    }
}
