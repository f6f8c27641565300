use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use shuffleswap::config::DEFAULT_PLAYLIST_NAME;
use shuffleswap::mixer::{FetchPolicy, WriteStrategy};
use shuffleswap::{
    Config, MixOptions, MixSelection, Playlist, PlaylistMixer, SpotifyApi, SpotifyClient,
    TokenManager, TokenState,
};

#[derive(Parser)]
#[command(name = "shuffleswap")]
#[command(about = "Mix two Spotify playlists into one alternating playlist")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make sure a valid access token is stored, authorizing if needed
    Auth,

    /// Show the stored token state without contacting Spotify
    Status,

    /// Forget stored tokens
    Logout,

    /// List your Spotify playlists
    Playlists,

    /// Mix two playlists into one
    Mix {
        /// First playlist (id or exact name)
        first: String,

        /// Second playlist (id or exact name)
        second: String,

        /// Name of the destination playlist
        #[arg(long, default_value = DEFAULT_PLAYLIST_NAME)]
        name: String,

        /// Overwrite an existing destination with a single replace call
        #[arg(long)]
        replace: bool,

        /// Fail if a source playlist cannot be fetched
        #[arg(long)]
        strict: bool,

        /// Start playback of the mix when done
        #[arg(long)]
        play: bool,
    },

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Auth => auth().await?,
        Commands::Status => status()?,
        Commands::Logout => logout()?,
        Commands::Playlists => list_playlists().await?,
        Commands::Mix {
            first,
            second,
            name,
            replace,
            strict,
            play,
        } => {
            let options = MixOptions {
                fetch_policy: if strict {
                    FetchPolicy::Strict
                } else {
                    FetchPolicy::BestEffort
                },
                write_strategy: if replace {
                    WriteStrategy::Replace
                } else {
                    WriteStrategy::ClearThenAdd
                },
            };
            mix(&first, &second, &name, options, play).await?;
        }
        Commands::Setup => show_setup_guide(),
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Please copy .env.example to .env and fill in your credentials.".yellow()
        );
        std::process::exit(1);
    }

    Ok(config)
}

async fn access_token(config: &Config) -> Result<String> {
    TokenManager::from_config(config)
        .access_token()
        .await
        .context("Failed to authenticate with Spotify")
}

async fn auth() -> Result<()> {
    let config = load_config()?;
    access_token(&config).await?;
    println!("{}", "Authenticated with Spotify".green());
    Ok(())
}

fn status() -> Result<()> {
    let config = load_config()?;
    let status = TokenManager::from_config(&config)
        .status()
        .context("Failed to read stored tokens")?;

    let label = match status.state {
        TokenState::Valid(_) => "valid".green(),
        TokenState::NeedsRefresh(_) => "needs refresh".yellow(),
        TokenState::Missing => "not authenticated".red(),
    };
    println!("Token: {}", label);
    if let Some(expires_at) = status.expires_at {
        println!("Expires: {}", expires_at.with_timezone(&chrono::Local));
    }
    Ok(())
}

fn logout() -> Result<()> {
    let config = load_config()?;
    TokenManager::from_config(&config)
        .logout()
        .context("Failed to clear stored tokens")?;
    println!("{}", "Stored tokens cleared".green());
    Ok(())
}

async fn list_playlists() -> Result<()> {
    println!("{}", "Your Spotify Playlists".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = load_config()?;
    let token = access_token(&config).await?;
    let client = SpotifyClient::new(&config, token);

    let playlists = client
        .current_user_playlists()
        .await
        .context("Failed to fetch playlists")?;

    if playlists.is_empty() {
        println!("{}", "No playlists found".yellow());
        return Ok(());
    }

    for (i, playlist) in playlists.iter().enumerate() {
        println!(
            "{:2}. {} ({} tracks, by {})",
            i + 1,
            playlist.name.green(),
            playlist.total_tracks(),
            playlist.owner_name()
        );
        println!("     {}", playlist.id.dimmed());
    }

    println!("\n{}", format!("Total: {} playlists", playlists.len()).cyan());

    Ok(())
}

fn find_playlist<'a>(playlists: &'a [Playlist], key: &str) -> Option<&'a Playlist> {
    playlists
        .iter()
        .find(|p| p.id == key)
        .or_else(|| playlists.iter().find(|p| p.name == key))
}

async fn mix(
    first: &str,
    second: &str,
    name: &str,
    options: MixOptions,
    play: bool,
) -> Result<()> {
    println!("{}", "ShuffleSwap".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = load_config()?;
    let token = access_token(&config).await?;
    let client = Arc::new(SpotifyClient::new(&config, token));

    let playlists = client
        .current_user_playlists()
        .await
        .context("Failed to fetch playlists")?;

    let mut selection = MixSelection::new();
    for key in [first, second] {
        let Some(playlist) = find_playlist(&playlists, key) else {
            bail!("Playlist not found: {}", key);
        };
        if !selection.toggle(playlist.clone()) {
            bail!("Playlist selected twice: {}", key);
        }
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Mixing into {}", name));
    pb.enable_steady_tick(Duration::from_millis(100));

    let mixer = PlaylistMixer::with_options(client, options);
    let result = mixer.mix(&selection, name).await;
    pb.finish_and_clear();

    let outcome = result.context("Error creating playlist")?;

    let verb = if outcome.created { "Created" } else { "Updated" };
    println!(
        "\n{} {} with {} tracks:",
        verb,
        outcome.playlist_name.green().bold(),
        outcome.tracks.len()
    );
    for (i, track) in outcome.tracks.iter().enumerate() {
        println!("{:2}. {} - {}", i + 1, track.name, track.artist_names().cyan());
    }

    if play {
        if let Err(e) = mixer.play(&outcome.playlist_id).await {
            warn!("Could not start playback: {}", e);
        }
    }

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "ShuffleSwap Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID (no secret is needed, PKCE is used)");
    println!("   - Add 'shuffleswap://callback' as a redirect URI");

    println!("\n{}", "2. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_REDIRECT_URI=shuffleswap://callback");

    println!("\n{}", "3. Usage".yellow());
    println!("   - shuffleswap auth                       (authorize once)");
    println!("   - shuffleswap playlists                  (to see your playlists)");
    println!("   - shuffleswap mix \"Morning\" \"Evening\"    (mix two playlists)");
    println!("   - shuffleswap mix A B --name Party --play");

    println!("\n{}", "Ready to shuffle!".green());
}
