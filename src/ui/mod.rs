//! Terminal manager for the template tree, plus the quick search and cascade
//! menu popups the global hotkeys open.

pub mod app;
pub mod common;
pub mod grab;
pub mod render;

pub use app::App;
pub use grab::TerminalGrab;

use crate::cascade::InputGrab;
use crate::clipboard::ClipboardSink;
use crate::config::{load_config, Paths};
use crate::error::Result;
use crate::hotkey::listener::report_degraded;
use crate::hotkey::{
    spawn_listener, ComboMatcher, HotkeyBridge, TRIGGER_CASCADE, TRIGGER_LISTENER_DOWN,
    TRIGGER_SEARCH,
};
use crate::selection::SelectionSink;
use crate::storage::{Library, LoadOrigin};
use crossterm::{
    event::{self, DisableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{info, warn};

type ManagerApp = App<TerminalGrab, ClipboardSink>;

/// How long to wait for terminal input before checking for hotkey triggers.
const TICK: Duration = Duration::from_millis(33);

/// Register the UI-side handler for every trigger the listener can send.
pub fn build_bridge<G, S>() -> HotkeyBridge<App<G, S>>
where
    G: InputGrab + 'static,
    S: SelectionSink + 'static,
{
    let mut bridge = HotkeyBridge::new();
    bridge.register(TRIGGER_SEARCH, |app: &mut App<G, S>| app.trigger_search());
    bridge.register(TRIGGER_CASCADE, |app: &mut App<G, S>| app.trigger_cascade());
    bridge.register(TRIGGER_LISTENER_DOWN, |app: &mut App<G, S>| {
        app.on_listener_down()
    });
    bridge
}

/// Open the template manager and run it until the user quits.
pub fn run(paths: &Paths) -> Result<()> {
    let library = Library::open(paths.db_file());
    match library.origin() {
        LoadOrigin::Loaded => {}
        origin => info!(?origin, path = %library.path().display(), "Started from sample templates"),
    }
    let config = load_config(&paths.config_file());
    let sink = ClipboardSink::new(config.features.auto_paste);

    let mut bridge: HotkeyBridge<ManagerApp> = build_bridge();
    let matcher = ComboMatcher::from_descriptors(&config.hotkeys);
    let sender = bridge.sender();
    if let Err(e) = spawn_listener(matcher, sender.clone()) {
        report_degraded(&sender, &e.to_string());
    }

    let mut app: ManagerApp = App::new(
        library,
        config,
        paths.config_file(),
        sink,
        TerminalGrab::default(),
    );

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let result = match Terminal::new(backend) {
        Ok(mut terminal) => run_loop(&mut terminal, &mut app, &mut bridge),
        Err(e) => Err(e.into()),
    };

    // Clean up terminal
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "Failed to leave raw mode");
    }
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ManagerApp,
    bridge: &mut HotkeyBridge<ManagerApp>,
) -> Result<()> {
    while !app.should_quit() {
        terminal.draw(|f| render::draw(f, app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        // Hotkey handlers run here, on the UI thread, in arrival order.
        bridge.dispatch_pending(app);
    }
    info!("Template manager closed");
    Ok(())
}
