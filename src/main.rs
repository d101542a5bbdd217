use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shutter::{Config, DeleteDecision, DeleteOutcome, GridSlot, PhotoView, SocialClient};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), env!("SHUTTER_VERSION_SUFFIX"));

#[derive(Parser)]
#[command(name = "shutter")]
#[command(author, version = VERSION, about = "Shutter - photo-sharing social client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login { email: String, password: String },

    /// Create an account and log in
    Register {
        email: String,
        password: String,
        first_name: String,
        last_name: String,
    },

    /// Clear the persisted session
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Show the main feed
    Feed,

    /// Show a gallery as a 3-column grid (defaults to your own)
    Gallery {
        /// User id of the gallery owner
        user: Option<String>,
    },

    /// Toggle your like on a photo
    Like {
        /// Photo URI
        uri: String,
    },

    /// Comment on a photo
    Comment {
        /// Photo URI
        uri: String,
        text: String,
    },

    /// Delete one of your photos
    Delete {
        /// Photo URI
        uri: String,

        /// Confirm the deletion (required; destructive)
        #[arg(long)]
        yes: bool,
    },

    /// Follow a user
    Follow {
        /// User id
        user: String,
    },

    /// Unfollow a user
    Unfollow {
        /// User id
        user: String,
    },

    /// Search users by name or email
    Search { query: String },

    /// Show follow counters (defaults to your own)
    Counters {
        /// User id
        user: Option<String>,
    },

    /// Upload a photo to your gallery
    Upload { path: PathBuf },

    /// Set your profile picture
    SetAvatar { path: PathBuf },

    /// Remove your profile picture
    RemoveAvatar,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "shutter=debug"
    } else {
        "shutter=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    let client = SocialClient::new(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            println!("Logged in as {} <{}>", user.display_name(), user.email);
        }
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let user = client
                .register(&email, &password, &first_name, &last_name)
                .await?;
            println!("Registered {} <{}>", user.display_name(), user.email);
        }
        Commands::Logout => {
            client.logout();
            println!("Logged out");
        }
        Commands::Whoami => match client.current_user() {
            Some(user) => {
                println!("{} <{}> (id {})", user.display_name(), user.email, user.id);
                println!("Following {} users", user.following.len());
            }
            None => println!("Not logged in"),
        },
        Commands::Feed => {
            let feed = client.load_feed().await?;
            if feed.is_empty() {
                println!("The feed is empty");
            }
            for photo in &feed {
                print_photo(photo);
            }
        }
        Commands::Gallery { user } => {
            let owner_id = match user {
                Some(id) => id,
                None => require_login(&client)?,
            };
            client.load_gallery(&owner_id).await?;
            print_grid(&client.gallery_grid(&owner_id));
        }
        Commands::Like { uri } => {
            load_photo_context(&client, &uri).await?;
            let liked = client.toggle_like(&uri).await?;
            let count = client.photo(&uri).map(|photo| photo.like_count).unwrap_or(0);
            println!(
                "{} {} ({} likes)",
                if liked { "Liked" } else { "Unliked" },
                uri,
                count
            );
        }
        Commands::Comment { uri, text } => {
            load_photo_context(&client, &uri).await?;
            let comment = client.add_comment(&uri, &text).await?;
            println!("{}: {}", comment.author.display_name(), comment.text);
        }
        Commands::Delete { uri, yes } => {
            load_photo_context(&client, &uri).await?;
            let decision = if yes {
                DeleteDecision::Confirmed
            } else {
                DeleteDecision::Cancelled
            };
            match client.delete_photo(&uri, decision).await? {
                DeleteOutcome::Deleted => println!("Deleted {}", uri),
                DeleteOutcome::Cancelled => {
                    println!("Not deleted; pass --yes to confirm")
                }
            }
        }
        Commands::Follow { user } => {
            let profile = client.load_profile(&user).await?;
            if profile.is_following {
                println!("Already following {}", profile.user.display_name());
            } else {
                client.toggle_follow(&user).await?;
                let view = client.load_profile(&user).await?;
                println!(
                    "Now following {} ({} followers)",
                    view.user.display_name(),
                    view.counters.followers
                );
            }
        }
        Commands::Unfollow { user } => {
            let profile = client.load_profile(&user).await?;
            if !profile.is_following {
                println!("Not following {}", profile.user.display_name());
            } else {
                client.toggle_follow(&user).await?;
                let view = client.load_profile(&user).await?;
                println!(
                    "Unfollowed {} ({} followers)",
                    view.user.display_name(),
                    view.counters.followers
                );
            }
        }
        Commands::Search { query } => {
            let results = client.search_users(&query).await?;
            if results.is_empty() {
                println!("No users found for '{}'", query);
            }
            for user in results {
                println!("{}  {}", user.id, user.display_name());
            }
        }
        Commands::Counters { user } => {
            let counters = match user {
                Some(id) => client.load_profile(&id).await?.counters,
                None => client.own_counters().await?,
            };
            println!(
                "Following {}  Followers {}",
                counters.following, counters.followers
            );
        }
        Commands::Upload { path } => {
            let (bytes, file_name) = read_image(&path)?;
            let photo = client.upload_photo(bytes, &file_name).await?;
            println!("Uploaded {}", photo.uri);
        }
        Commands::SetAvatar { path } => {
            let (bytes, file_name) = read_image(&path)?;
            let uri = client.set_profile_picture(bytes, &file_name).await?;
            println!("Profile picture set to {}", uri);
        }
        Commands::RemoveAvatar => {
            client.remove_profile_picture().await?;
            println!("Profile picture removed");
        }
    }

    Ok(())
}

fn require_login(client: &SocialClient) -> Result<String> {
    client
        .current_user()
        .map(|user| user.id)
        .context("Not logged in; run `shutter login` first")
}

/// Interactions need a loaded projection: refresh the feed, falling back to
/// the caller's own gallery for photos that are not in it.
async fn load_photo_context(client: &SocialClient, uri: &str) -> Result<()> {
    client.load_feed().await?;
    if client.photo(uri).is_none() {
        let own_id = require_login(client)?;
        client.load_gallery(&own_id).await?;
    }
    if client.photo(uri).is_none() {
        anyhow::bail!("Photo {} is not in your feed or gallery", uri);
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Path has no usable file name")?
        .to_string();
    Ok((bytes, file_name))
}

fn print_photo(photo: &PhotoView) {
    println!(
        "{}  by {}  {} {} likes",
        photo.uri,
        photo.owner.display_name(),
        if photo.liked_by_me { "[liked]" } else { "" },
        photo.like_count,
    );
    for comment in &photo.comments {
        println!("    {}: {}", comment.author.display_name(), comment.text);
    }
}

fn print_grid(grid: &[GridSlot<PhotoView>]) {
    for row in grid.chunks(3) {
        let cells: Vec<String> = row
            .iter()
            .map(|slot| match slot.photo() {
                Some(photo) => photo.uri.clone(),
                None => "·".to_string(),
            })
            .collect();
        println!("{}", cells.join("  "));
    }
}
