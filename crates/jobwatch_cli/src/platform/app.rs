use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use jobwatch_core::{update, AppState, Msg};
use jobwatch_engine::EngineHandle;
use jobwatch_logging::{watch_error, watch_info};

use super::args::Args;
use super::config::{load_config_file, resolve, Config};
use super::effects::EffectRunner;
use super::input::{parse_command, Command, HELP};
use super::{logging, render};

const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run_app(args: Args) -> anyhow::Result<()> {
    let file = load_config_file(args.config.as_deref())?;
    let config = resolve(&args, file)?;
    logging::initialize(config.log, config.log_level);
    watch_info!("Starting jobwatch against {}", config.sync.base_url);

    let engine = EngineHandle::new(config.sync.clone()).context("failed to start sync engine")?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    let subscription = {
        let msg_tx = msg_tx.clone();
        engine.store().subscribe(move |current, previous| {
            let _ = msg_tx.send(Msg::FeedUpdated {
                current: current.clone(),
                previous: previous.clone(),
                at: Instant::now(),
            });
        })
    };
    let effects = EffectRunner::new(engine.clone(), msg_tx.clone());

    // Background tick drives deferred display updates and drains stdin commands.
    spawn_ticker(msg_tx.clone());
    spawn_stdin_reader(cmd_tx);
    drop(msg_tx);

    let mut app = App {
        state: AppState::with_settings(config.min_display_time, config.sync.archive_page_size),
        effects,
        commands: cmd_rx,
    };
    let result = app.run(&config, &msg_rx);

    subscription.unsubscribe();
    engine.shutdown();
    result
}

struct App {
    state: AppState,
    effects: EffectRunner,
    commands: mpsc::Receiver<Command>,
}

impl App {
    fn run(&mut self, config: &Config, msg_rx: &mpsc::Receiver<Msg>) -> anyhow::Result<()> {
        self.dispatch_msg(Msg::TabActivated(config.initial_tab));
        self.draw()?;

        while let Ok(msg) = msg_rx.recv() {
            self.dispatch_msg(msg);
            self.process_pending_commands();
            if !self.state.is_mounted() {
                watch_info!("Dashboard closed");
                return Ok(());
            }
            if self.state.consume_dirty() {
                self.draw()?;
            }
        }
        Ok(())
    }

    fn process_pending_commands(&mut self) {
        let mut inbox = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            inbox.push(command);
        }
        for command in inbox {
            if command == Command::Help {
                println!("{HELP}");
                continue;
            }
            if let Some(msg) = command.into_msg(self.state.active_tab()) {
                self.dispatch_msg(msg);
            }
        }
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.effects.enqueue(effects);
    }

    fn draw(&self) -> anyhow::Result<()> {
        let frame = render::render(&self.state.view());
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "\n{frame}").context("failed to write to stdout")?;
        stdout.flush().context("failed to flush stdout")
    }
}

fn spawn_ticker(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while msg_tx.send(Msg::Tick(Instant::now())).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
}

/// End of input counts as `quit`.
fn spawn_stdin_reader(cmd_tx: mpsc::Sender<Command>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    watch_error!("Failed to read stdin: {err}");
                    break;
                }
            };
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if cmd_tx.send(command).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            }
        }
        let _ = cmd_tx.send(Command::Quit);
    });
}
