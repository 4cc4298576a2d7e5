use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;

use spotify_session::config::CliArgs;
use spotify_session::model::{Album, Artist, Listing};
use spotify_session::{
    logging, BridgedEngine, EngineBridge, EngineEvent, PlayerState, SessionConfig, SessionController, SessionView,
    Track, ViewEffect,
};

const HELP: &str = "\
commands:
  search <text>        set the query and search from the first page
  next | prev          page through the current query
  like <id>            like a track from the current results
  add <id>             add a track from the current results to the playlist
  liked | playlist     show a collection
  play <uri>           play a track on the registered device
  retry                retry credential acquisition
engine bridge:
  loaded               the playback engine finished loading
  ready <device id>    the engine registered a device
  lost <device id>     the device went offline
  playing <id>         the engine started a track from the current results
  stopped              the engine reports no active track
  token                print the token the engine would receive
  help | quit";

enum Command {
    Search(String),
    Next,
    Prev,
    Like(String),
    Add(String),
    ShowLiked,
    ShowPlaylist,
    Play(String),
    Retry,
    Loaded,
    Ready(String),
    Lost(String),
    Playing(String),
    Stopped,
    Token,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let arg = rest.trim().to_string();
        let needs_arg = |cmd: fn(String) -> Command| (!arg.is_empty()).then(|| cmd(arg.clone()));

        match word {
            "search" => Some(Command::Search(arg.clone())),
            "next" => Some(Command::Next),
            "prev" => Some(Command::Prev),
            "like" => needs_arg(Command::Like),
            "add" => needs_arg(Command::Add),
            "liked" => Some(Command::ShowLiked),
            "playlist" => Some(Command::ShowPlaylist),
            "play" => needs_arg(Command::Play),
            "retry" => Some(Command::Retry),
            "loaded" => Some(Command::Loaded),
            "ready" => needs_arg(Command::Ready),
            "lost" => needs_arg(Command::Lost),
            "playing" => needs_arg(Command::Playing),
            "stopped" => Some(Command::Stopped),
            "token" => Some(Command::Token),
            "help" => Some(Command::Help),
            "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_guard = match logging::init_logging(&args.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("=== spotify-session starting ===");

    let config = SessionConfig::from(args);
    let (engine, bridge) = BridgedEngine::new();
    let controller = SessionController::new(config, Arc::new(engine))?;
    let mut effects = controller.subscribe_effects();

    controller.initialize().await;
    render(&controller.view().await);
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = Command::parse(&line) else {
            println!("unknown command, type `help`");
            continue;
        };
        if matches!(command, Command::Quit) {
            break;
        }
        if let Err(e) = run_command(&controller, &bridge, command).await {
            println!("error: {}", e);
        }

        loop {
            match effects.try_recv() {
                Ok(ViewEffect::ScrollToTop) => println!("--------"),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        render(&controller.view().await);
    }

    tracing::info!("spotify-session shutting down");
    Ok(())
}

async fn run_command(controller: &SessionController, bridge: &EngineBridge, command: Command) -> Result<()> {
    match command {
        Command::Search(query) => {
            controller.set_query(query).await;
            controller.on_enter_key().await;
        }
        Command::Next => controller.next_page().await,
        Command::Prev => controller.previous_page().await,
        Command::Like(id) => controller.like(&id).await,
        Command::Add(id) => controller.add_to_playlist(&id).await,
        Command::ShowLiked => controller.view_liked().await,
        Command::ShowPlaylist => controller.view_playlist().await,
        Command::Play(uri) => controller.play(&uri).await,
        Command::Retry => controller.retry_credential().await,
        Command::Loaded => bridge.script_loaded(),
        Command::Ready(device_id) => bridge.emit(EngineEvent::Ready { device_id }).await?,
        Command::Lost(device_id) => bridge.emit(EngineEvent::NotReady { device_id }).await?,
        Command::Playing(id) => {
            let view = controller.view().await;
            let track = view
                .tracks
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.as_ref().clone())
                .unwrap_or_else(|| placeholder_track(&id));
            bridge
                .emit(EngineEvent::StateChanged(Some(PlayerState {
                    paused: false,
                    current_track: Some(track),
                })))
                .await?;
        }
        Command::Stopped => {
            bridge
                .emit(EngineEvent::StateChanged(Some(PlayerState {
                    paused: true,
                    current_track: None,
                })))
                .await?
        }
        Command::Token => match bridge.oauth_token().await {
            Some(token) => println!("token: {}", token),
            None => println!("no token available to the engine"),
        },
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn placeholder_track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        uri: format!("spotify:track:{}", id),
        name: id.to_string(),
        artists: vec![Artist {
            name: "Unknown artist".to_string(),
        }],
        album: Album::default(),
    }
}

fn render(view: &SessionView) {
    let heading = match view.listing {
        Listing::Search if view.query.is_empty() => "Results".to_string(),
        Listing::Search => format!("Results for \"{}\" (offset {})", view.query, view.result_offset),
        Listing::Liked => "Liked songs".to_string(),
        Listing::Playlist => "Playlist".to_string(),
    };

    println!();
    if view.is_loading {
        println!("Loading...");
    }
    if let Some(message) = view.display_message().filter(|m| !m.is_empty()) {
        println!("{}", message);
    }
    if !view.tracks.is_empty() {
        println!("{}", heading);
        for track in &view.tracks {
            println!("  [{}] {} - {}", track.id, track.name, track.artist_names());
        }
    }
    println!("device: {}", view.device_state);
    if let Some(track) = &view.current_track {
        let state = if view.paused { "Paused" } else { "Now Playing" };
        println!("{}: {} by {}", state, track.name, track.artist_names());
    }
}
