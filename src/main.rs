// Hide console window on Windows for release builds (GUI app).
// In debug builds, keep the console so panics/backtraces are visible.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use bevy::prelude::*;
use bevy::winit::WinitWindows;
use clap::Parser;
use colored::Colorize;

use dicetray::dice3d::{
    describe_rolls, format_entry, reactive_winit_settings, roll_total, AppSettings,
    ColorSetting, DiceTrayPlugin, DiceTrayScenePlugin, NotationHistory, PreferenceStore,
    RollOptions, RollOrigin, RollSession, RollSet, RollSpec, SettingsState, ThrowDiceRequest,
    DEFAULT_NOTATION,
};
use dicetray::realtime::{
    broadcast_rest, channel_name, BroadcastRelay, ChannelConfig, LoopbackHub,
    RealtimeRelayPlugin, SupabaseChannel, ThrowEvent,
};

/// Dice Tray - shared 3D physics dice roller
#[derive(Parser)]
#[command(name = "dicetray")]
#[command(
    author,
    version,
    about = "Dice Tray - 3D physics dice roller that shares throws with your group"
)]
struct Cli {
    /// Dice to roll (e.g. "2d6", "d20", "3d8 1d12")
    rolls: Vec<String>,

    /// Roll once in the terminal instead of opening the tray
    #[arg(long)]
    cli: bool,

    /// Display name shown to your group
    #[arg(long)]
    name: Option<String>,

    /// Group whose channel throws are shared on
    #[arg(long)]
    group: Option<String>,

    /// Dice color (CSS color, e.g. "#3366ff" or "teal")
    #[arg(long)]
    color: Option<String>,

    /// Number color on the dice
    #[arg(long)]
    text_color: Option<String>,

    /// Keep rolls private
    #[arg(long)]
    no_share: bool,

    /// Do not connect to the realtime service
    #[arg(long)]
    offline: bool,

    /// Realtime project URL (overrides DICETRAY_REALTIME_URL)
    #[arg(long)]
    realtime_url: Option<String>,

    /// Realtime API key (overrides DICETRAY_REALTIME_KEY)
    #[arg(long)]
    realtime_key: Option<String>,
}

impl Cli {
    fn notation(&self) -> Option<String> {
        if self.rolls.is_empty() {
            None
        } else {
            Some(self.rolls.join(" "))
        }
    }
}

/// Preferences from the store, then environment, then command line.
fn load_settings(cli: &Cli, store: Option<&PreferenceStore>) -> (AppSettings, bool) {
    let (mut settings, mut needs_save) = match store {
        Some(store) => AppSettings::load_from(store),
        None => (AppSettings::default(), false),
    };

    settings.realtime.apply_env();
    settings
        .realtime
        .apply_overrides(cli.realtime_url.clone(), cli.realtime_key.clone());

    if let Some(name) = cli.name.as_ref().filter(|n| !n.trim().is_empty()) {
        settings.name = name.trim().to_string();
        needs_save = true;
    }
    if let Some(group) = &cli.group {
        settings.group = group.trim().to_string();
        needs_save = true;
    }

    let mut apply_color = |input: &Option<String>, target: &mut ColorSetting, what: &str| {
        if let Some(input) = input {
            match ColorSetting::parse(input) {
                Some(color) => {
                    *target = color;
                    needs_save = true;
                }
                None => eprintln!("{} ignoring {} color {:?}", "Warning:".yellow(), what, input),
            }
        }
    };
    apply_color(&cli.color, &mut settings.dice_color, "dice");
    apply_color(&cli.text_color, &mut settings.text_color, "text");

    if cli.no_share {
        settings.share_rolls = false;
    }

    (settings, needs_save)
}

fn open_store() -> Option<PreferenceStore> {
    match PreferenceStore::open() {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!(
                "{} preferences unavailable, using defaults: {}",
                "Warning:".yellow(),
                e
            );
            None
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.cli {
        #[cfg(windows)]
        attach_parent_console();

        std::process::exit(run_cli_mode(&cli));
    }

    run_3d_mode(cli);
}

/// Attach to the parent process's console on Windows.
/// This is needed because we use windows_subsystem = "windows" to hide the console,
/// but CLI mode needs to output to the terminal.
#[cfg(windows)]
fn attach_parent_console() {
    use std::io::{self, Write};

    #[link(name = "kernel32")]
    extern "system" {
        fn AttachConsole(dwProcessId: u32) -> i32;
        fn AllocConsole() -> i32;
    }

    const ATTACH_PARENT_PROCESS: u32 = 0xFFFFFFFF;

    unsafe {
        if AttachConsole(ATTACH_PARENT_PROCESS) == 0 {
            AllocConsole();
        }
    }

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

// ============================================================================
// 3D Mode
// ============================================================================

/// Notation passed on the command line, thrown once the tray is up.
#[derive(Resource, Default)]
struct StartupRoll(Option<String>);

fn throw_startup_roll(
    mut startup: ResMut<StartupRoll>,
    settings: Res<SettingsState>,
    mut requests: MessageWriter<ThrowDiceRequest>,
) {
    if let Some(notation) = startup.0.take() {
        let options = RollOptions {
            broadcast_before_roll: settings.settings.share_rolls,
            ..Default::default()
        };
        requests.write(ThrowDiceRequest::local(RollSpec::Notation(notation), options));
    }
}

fn set_window_icon(
    windows: Option<NonSend<WinitWindows>>,
    primary_query: Query<Entity, With<bevy::window::PrimaryWindow>>,
    mut done: Local<bool>,
) {
    if *done {
        return;
    }
    let Some(windows) = windows else {
        return;
    };
    let Ok(primary_entity) = primary_query.single() else {
        return;
    };
    let Some(primary) = windows.get_window(primary_entity) else {
        return;
    };
    *done = true;

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    let mut icon_paths = vec![
        std::path::PathBuf::from("assets/icon.ico"),
        std::path::PathBuf::from("../assets/icon.ico"),
        std::path::PathBuf::from("icon.ico"),
    ];
    if let Some(ref exe_dir) = exe_dir {
        icon_paths.push(exe_dir.join("assets/icon.ico"));
        icon_paths.push(exe_dir.join("icon.ico"));
    }

    for path in icon_paths.iter().filter(|p| p.exists()) {
        let Ok(icon_data) = std::fs::read(path) else {
            continue;
        };
        let Ok(img) = image::load_from_memory(&icon_data) else {
            continue;
        };
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if let Ok(icon) = winit::window::Icon::from_rgba(rgba.into_raw(), width, height) {
            primary.set_window_icon(Some(icon));
            return;
        }
    }
}

fn make_relay(settings: &AppSettings, offline: bool) -> BroadcastRelay {
    let config = ChannelConfig::default();

    if !offline && settings.realtime.is_configured() {
        match SupabaseChannel::new(settings.realtime.clone(), config) {
            Ok(channel) => return BroadcastRelay::new(channel),
            Err(e) => eprintln!("{} realtime unavailable: {}", "Warning:".yellow(), e),
        }
    } else if !offline {
        println!("Realtime is not configured; rolls stay on this machine.");
    }

    BroadcastRelay::new(LoopbackHub::new().channel(config))
}

fn run_3d_mode(cli: Cli) {
    let store = open_store();
    let (settings, needs_save) = load_settings(&cli, store.as_ref());

    let history = store
        .as_ref()
        .and_then(|store| match store.load_notation_history() {
            Ok(history) => Some(history),
            Err(e) => {
                eprintln!("{} {}", "Warning:".yellow(), e);
                None
            }
        })
        .unwrap_or_default();

    let relay = make_relay(&settings, cli.offline);

    let mut settings_state = SettingsState::new(settings);
    settings_state.modified = needs_save;

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Dice Tray".to_string(),
                    resolution: (1280u32, 720u32).into(),
                    ..default()
                }),
                ..default()
            })
            .set(bevy::log::LogPlugin {
                level: bevy::log::Level::INFO,
                filter: "info,wgpu=error,naga=warn,surrealdb=warn".to_string(),
                ..default()
            }),
    )
    .insert_resource(reactive_winit_settings())
    .insert_resource(ClearColor(Color::srgb(0.05, 0.06, 0.08)))
    .insert_resource(settings_state)
    .insert_resource(NotationHistory::new(history))
    .insert_resource(relay)
    .insert_resource(StartupRoll(cli.notation()))
    .add_plugins((DiceTrayPlugin, DiceTrayScenePlugin, RealtimeRelayPlugin))
    .add_systems(Update, set_window_icon)
    .add_systems(Update, throw_startup_roll.in_set(RollSet::Intake));

    if let Some(store) = store {
        app.insert_resource(store);
    }

    app.run();
}

// ============================================================================
// CLI Mode
// ============================================================================

fn run_cli_mode(cli: &Cli) -> i32 {
    let store = open_store();
    let (settings, needs_save) = load_settings(cli, store.as_ref());

    if let (true, Some(store)) = (needs_save, store.as_ref()) {
        if let Err(e) = settings.save_to_db(store) {
            eprintln!("{} {}", "Warning:".yellow(), e);
        }
    }

    let notation = cli
        .notation()
        .unwrap_or_else(|| DEFAULT_NOTATION.to_string());

    let options = RollOptions {
        broadcast_before_roll: settings.share_rolls,
        ..Default::default()
    };

    let mut session = RollSession::default();
    let plan = match session.throw_dice(
        &RollSpec::Notation(notation.clone()),
        &options,
        RollOrigin::Local,
        &mut rand::thread_rng(),
    ) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{} {} ({})", "Error:".red().bold(), e, notation);
            return 1;
        }
    };

    println!();
    println!(
        "{} {}",
        "Rolling".cyan().bold(),
        describe_rolls(&plan.rolls).white().bold()
    );
    println!("{}", "─".repeat(40));

    for roll in &plan.rolls {
        let value = roll.value.to_string();
        let value = if roll.value == roll.dice {
            value.green().bold()
        } else if roll.value == 1 {
            value.red().bold()
        } else {
            value.white()
        };
        println!("  d{:<3} {}", roll.dice, value);
    }

    println!("{}", "─".repeat(40));
    println!(
        "{} {}",
        "Total:".white().bold(),
        roll_total(&plan.rolls).to_string().yellow().bold()
    );
    println!("{}", format_entry(&settings.name, &plan.rolls).dimmed());

    if plan.broadcast && !cli.offline && settings.realtime.is_configured() {
        let channel = channel_name(&settings.group);
        let event = ThrowEvent {
            roll: plan.rolls.clone(),
            name: settings.name.clone(),
            dice_color: Some(settings.dice_color_pair()),
        };
        match broadcast_rest(&settings.realtime, &channel, &event) {
            Ok(()) => println!("{} {}", "Shared on".dimmed(), channel.dimmed()),
            Err(e) => eprintln!("{} could not share roll: {}", "Warning:".yellow(), e),
        }
    }

    session.finish(plan.ticket);
    println!();
    0
}
