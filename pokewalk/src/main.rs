use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::prelude::*;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventOutcome, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};
use tui_map::core::MapSize;

use pokewalk::action::Action;
use pokewalk::cache::{self, FileCache, SessionCache};
use pokewalk::config::GameConfig;
use pokewalk::effect::Effect;
use pokewalk::map::WorldMap;
use pokewalk::reducer::reducer;
use pokewalk::remote::{HttpRemote, MemoryRemote, PlayerId, RemoteInventory};
use pokewalk::reveal::{RevealedAreas, ViewMode};
use pokewalk::rng::SeededRng;
use pokewalk::session::{self, Account, LOGIN_TIMEOUT};
use pokewalk::state::AppState;
use pokewalk::sync::sync;
use pokewalk::ui;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "pokewalk")]
#[command(about = "Walk the island, catch creatures, sync your pokedex")]
struct Args {
    #[command(flatten)]
    debug: DebugCliArgs,
    /// RON game config; defaults to the bundled assets/config.ron
    #[arg(long)]
    config: Option<PathBuf>,
    /// Remote player id to bind the session to
    #[arg(long)]
    account: Option<PlayerId>,
    /// Remote store base URL, overrides the config
    #[arg(long)]
    api_url: Option<String>,
    /// Where the inventory cache, checkpoints and logs live
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Play against an in-process store seeded from the fallback roster
    #[arg(long)]
    offline: bool,
    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value = "full")]
    view: ViewMode,
}

#[derive(Clone)]
struct Services {
    remote: Arc<dyn RemoteInventory>,
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let data_dir = args.data_dir.clone().unwrap_or_else(cache::default_data_dir);
    init_logging(&data_dir.join("logs"))?;

    let debug = DebugSession::new(args.debug);
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let config = load_config(args.config.as_deref())?;
    let account = args.account.map_or(Account::Guest, |id| Account::Player {
        id,
        name: String::new(),
    });
    let services = Services {
        remote: remote_for(args.offline, args.api_url.clone(), &config, &account, &data_dir),
        data_dir: data_dir.clone(),
    };

    let state = debug
        .load_state_or_else_async(|| {
            let config = config.clone();
            let account = account.clone();
            let data_dir = data_dir.clone();
            let rng = args.seed.map_or_else(SeededRng::from_time, SeededRng::new);
            let view = args.view;
            async move {
                Ok::<AppState, io::Error>(
                    initial_state(config, account, &data_dir, rng, view).await,
                )
            }
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let sync_every = Duration::from_secs(state.config.sync_interval_secs.max(1));
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let key_release = use_alt_screen && supports_keyboard_enhancement().unwrap_or(false);
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    if key_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(
        &mut terminal,
        &debug,
        store,
        replay_actions,
        services,
        sync_every,
    )
    .await;

    if key_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

fn init_logging(log_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, "pokewalk.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    // Terminal belongs to the TUI, so logs only go to the file.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();
    std::mem::forget(guard);

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Ok(())
}

fn load_config(path: Option<&Path>) -> io::Result<GameConfig> {
    let path = path.map(Path::to_path_buf).or_else(GameConfig::locate_default);
    let Some(path) = path else {
        tracing::warn!("no config file found, using defaults");
        return Ok(GameConfig::default());
    };
    let config = GameConfig::load(&path).map_err(io::Error::other)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

fn remote_for(
    offline: bool,
    api_url: Option<String>,
    config: &GameConfig,
    account: &Account,
    data_dir: &Path,
) -> Arc<dyn RemoteInventory> {
    if offline {
        let remote = MemoryRemote::with_catalog(config.fallback_roster.clone());
        if let Some(id) = account.player_id() {
            remote.add_player(
                id,
                "offline",
                config.starting_pokeballs,
                config.starting_berries,
            );
        }
        tracing::info!("offline mode, using in-process store");
        return Arc::new(remote);
    }
    let base_url = api_url.unwrap_or_else(|| config.api_base_url.clone());
    tracing::info!(%base_url, "using remote store");
    Arc::new(HttpRemote::from_env(base_url, data_dir.to_path_buf()))
}

async fn initial_state(
    config: GameConfig,
    account: Account,
    data_dir: &Path,
    rng: SeededRng,
    view: ViewMode,
) -> AppState {
    let world = match WorldMap::load(
        &config.map.dir,
        config.map.columns,
        config.map.rows,
        config.viewport,
    ) {
        Ok(world) => world,
        Err(error) => {
            tracing::warn!(%error, "map unavailable, walking an open field");
            let size = MapSize::new(config.map.columns, config.map.rows);
            WorldMap::open("open field", size, config.viewport)
        }
    };

    let position = cache::load_position(data_dir).await.unwrap_or_else(|error| {
        tracing::warn!(%error, "ignoring unreadable position checkpoint");
        None
    });
    let keys = cache::load_revealed(data_dir).await.unwrap_or_else(|error| {
        tracing::warn!(%error, "ignoring unreadable revealed areas");
        Vec::new()
    });
    let revealed = RevealedAreas::from_keys(config.reveal_grid, &keys);

    let cache = SessionCache::Files(FileCache::new(data_dir));
    AppState::new(config, world, cache, account, position, rng).with_view(view, revealed)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    services: Services,
    sync_every: Duration,
) -> io::Result<DebugRunOutput<AppState>> {
    let started = Instant::now();
    debug
        .run_effect_app(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("frame", FRAME_INTERVAL, move || Action::Frame {
                        now_ms: started.elapsed().as_millis() as u64,
                    });
                runtime
                    .subscriptions()
                    .interval("sync", sync_every, || Action::SyncTick);
            },
            |frame, area, state, render_ctx: RenderContext| {
                ui::render(frame, area, state, render_ctx);
            },
            |event, state| -> EventOutcome<Action> { ui::handle_event(event, state) },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, services.clone()),
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, services: Services) {
    match effect {
        Effect::LoadCatalog => {
            let remote = services.remote;
            ctx.tasks().spawn(TaskKey::new("catalog"), async move {
                match remote.list_creatures().await {
                    Ok(species) => Action::CatalogDidLoad(species),
                    Err(error) => Action::CatalogDidError(error.to_string()),
                }
            });
        }
        Effect::FetchRandomCreature => {
            let remote = services.remote;
            ctx.tasks().spawn(TaskKey::new("random_creature"), async move {
                match remote.random_creature().await {
                    Ok(species) => Action::RandomCreatureDidLoad(species),
                    Err(error) => Action::RandomCreatureDidError(error.to_string()),
                }
            });
        }
        Effect::Login { player_id } => {
            let remote = services.remote;
            ctx.tasks().spawn(TaskKey::new("login"), async move {
                let outcome = session::login(remote.as_ref(), player_id, LOGIN_TIMEOUT).await;
                Action::LoginDidFinish(outcome)
            });
        }
        Effect::Sync {
            player_id,
            inventory,
        } => {
            let remote = services.remote;
            ctx.tasks().spawn(TaskKey::new("sync"), async move {
                match sync(remote.as_ref(), player_id, &inventory).await {
                    Ok(report) => Action::SyncDidFinish(report),
                    Err(error) => Action::SyncDidError {
                        stale: error.is_stale_account(),
                        message: error.to_string(),
                    },
                }
            });
        }
        Effect::SavePosition { position } => {
            let root = services.data_dir;
            ctx.tasks().spawn(TaskKey::new("save_position"), async move {
                match cache::save_position(&root, position).await {
                    Ok(()) => Action::CheckpointDidSave,
                    Err(error) => Action::CheckpointDidError(error.to_string()),
                }
            });
        }
        Effect::SaveRevealed { keys } => {
            let root = services.data_dir;
            ctx.tasks().spawn(TaskKey::new("save_revealed"), async move {
                match cache::save_revealed(&root, &keys).await {
                    Ok(()) => Action::CheckpointDidSave,
                    Err(error) => Action::CheckpointDidError(error.to_string()),
                }
            });
        }
    }
}
