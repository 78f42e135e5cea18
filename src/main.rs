use anyhow::Context as _;
use clap::{Parser, Subcommand};
use crossbeam_channel as channel;
use std::{
    io::{BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use mixer_remote::{
    connection::{self, Current, Notification, UserConfig, FACTORY},
    m7cl::MeterPoint,
    midi, ChannelControl, Event, State,
};

const CLIENT_NAME: &str = "mixer-remote";

#[derive(Parser)]
#[command(name = "mixer-remote", version, about)]
struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available MIDI devices
    List,
    /// Connect to the mixer & accept commands on stdin
    Connect(ConnectArgs),
}

#[derive(clap::Args)]
struct ConnectArgs {
    /// TOML configuration file
    #[arg(short, long, env = "MIXER_REMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Connection mode
    #[arg(long, default_value = "m7cl")]
    mode: String,

    /// Output device id
    #[arg(long)]
    host: Option<String>,

    /// Input device id for live metering
    #[arg(long)]
    input_host: Option<String>,

    /// Enable live metering
    #[arg(long)]
    meters: bool,

    /// Metering point, e.g. PRE_FADER or POST_EQ
    #[arg(long)]
    meter_point: Option<MeterPoint>,

    /// Close when the output device goes away
    #[arg(long)]
    close_on_disconnect: bool,

    /// Use the first candidate device without asking
    #[arg(short, long)]
    yes: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.cmd {
        Command::List => list(),
        Command::Connect(args) => connect(args),
    }
}

fn list() -> anyhow::Result<()> {
    let endpoints = midi::io::list_endpoints(CLIENT_NAME).context("Listing MIDI devices")?;
    if endpoints.is_empty() {
        println!("No MIDI devices");
    }

    for endpoint in endpoints {
        println!("{endpoint}");
    }

    Ok(())
}

fn user_config(args: &ConnectArgs) -> anyhow::Result<UserConfig> {
    let mut user = match args.config {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            UserConfig::from_toml(&text).with_context(|| format!("Parsing {}", path.display()))?
        }
        None => UserConfig::default(),
    };

    if args.host.is_some() {
        user.host = args.host.clone();
    }
    if args.input_host.is_some() {
        user.input_host = args.input_host.clone();
    }
    if args.meters {
        user.live_meters_enabled = Some(true);
    }
    if args.meter_point.is_some() {
        user.live_meter_point = args.meter_point;
    }
    if args.close_on_disconnect {
        user.close_on_disconnect = Some(true);
    }

    Ok(user)
}

fn spawn_stdin_reader() -> channel::Receiver<String> {
    let (line_tx, line_rx) = channel::unbounded();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::error!("stdin: {err}");
                    break;
                }
            }
        }
    });

    line_rx
}

fn confirm(auto: bool, line_rx: channel::Receiver<String>) -> connection::Confirm {
    if auto {
        return Box::new(|endpoint: &midi::Endpoint| {
            println!("Using {endpoint}");
            true
        });
    }

    Box::new(move |endpoint: &midi::Endpoint| {
        print!("Use {endpoint}? [y/N] ");
        let _ = std::io::stdout().flush();

        line_rx
            .recv()
            .map(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
            .unwrap_or(false)
    })
}

fn connect(args: ConnectArgs) -> anyhow::Result<()> {
    let user = user_config(&args)?;
    let line_rx = spawn_stdin_reader();
    let (evt_tx, evt_rx) = channel::unbounded();

    let ctx = connection::Context {
        backend: Arc::new(midi::MidirBackend::new(CLIENT_NAME)),
        confirm: confirm(args.yes, line_rx.clone()),
        evt_tx,
    };

    let mut current = Current::default();
    current.switch(&FACTORY, &args.mode, &user, ctx)?;
    if let Some(address) = current.address(&FACTORY, &args.mode, &user) {
        if !address.is_empty() {
            println!("Connecting to {address}");
        }
    }

    // stdin is dedicated to device confirmations while connecting.
    let never = channel::never();
    let mut state = State::Connecting;

    loop {
        let cmd_rx = if state == State::Connecting {
            &never
        } else {
            &line_rx
        };

        channel::select! {
            recv(evt_rx) -> event => {
                match event {
                    Ok(Event::Status(status)) => {
                        println!("Status: {status}");
                        if status.state() == State::Disconnected {
                            break;
                        }
                        state = status.state();
                    }
                    Ok(Event::Levels(levels)) => println!("Levels: {}", meter_bar(&levels)),
                    Ok(Event::Notification(notif)) => print_notification(&notif),
                    Err(_) => break,
                }
            }
            recv(cmd_rx) -> line => {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };

                let conn = match current.get() {
                    Some(conn) => conn,
                    None => break,
                };

                match line.split_whitespace().collect::<Vec<_>>().as_slice() {
                    [cmd @ ("on" | "off"), channel] => match channel.parse::<u16>() {
                        Ok(channel) => {
                            let ctrl = ChannelControl::new(channel, *cmd == "on");
                            if let Err(err) = conn.fire_channel(&ctrl) {
                                println!("Error: {err}");
                            }
                        }
                        Err(_) => println!("Invalid channel {channel}"),
                    },
                    ["status"] => println!("Status: {}", conn.status()),
                    ["quit" | "q"] => break,
                    [] => (),
                    _ => println!("Commands: on <ch>, off <ch>, status, quit"),
                }
            }
        }
    }

    current.close(false);

    Ok(())
}

fn print_notification(notif: &Notification) {
    use connection::Level::*;

    match notif.level {
        Warn => println!("Warning: {notif}"),
        Error => println!("Error: {notif}"),
    }
}

fn meter_bar(levels: &[f32]) -> String {
    const STEPS: &[char] = &[' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    levels
        .iter()
        .map(|lvl| {
            let idx = (lvl.clamp(0.0, 1.0) * (STEPS.len() - 1) as f32).round() as usize;
            STEPS[idx]
        })
        .collect()
}
