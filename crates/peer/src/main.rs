mod headless;
mod keymap;
mod terminal;
mod view;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use duet::net::{DEFAULT_BIND_HOST, DEFAULT_PEER_HOST};
use duet::session::DEFAULT_FRAME_RATE;
use duet::{Encoding, ExitReason, ReceiveMode, Role, Session, SessionConfig, SyncLoop};

use headless::{IdleInput, LogRenderer};
use terminal::{TerminalGuard, TerminalInput, TerminalRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    /// Listen and accept the peer
    #[value(alias = "authority")]
    Server,
    /// Connect to the server
    #[value(alias = "initiator")]
    Client,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Server => Role::Authority,
            RoleArg::Client => Role::Initiator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EncodingArg {
    /// Send the whole key table on every key change
    KeyState,
    /// Send our own position every tick
    Position,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::KeyState => Encoding::KeyState,
            EncodingArg::Position => Encoding::Position,
        }
    }
}

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Two-player synchronized link")]
struct Args {
    #[arg(short, long, value_enum)]
    role: RoleArg,

    #[arg(short, long, value_enum, default_value_t = EncodingArg::KeyState)]
    encoding: EncodingArg,

    #[arg(long, help = "Read peer records on a background thread (position encoding only)")]
    background_receive: bool,

    #[arg(short, long, default_value = DEFAULT_BIND_HOST, help = "Address the server listens on")]
    bind: String,

    #[arg(long, default_value = DEFAULT_PEER_HOST, help = "Server address the client connects to")]
    host: String,

    #[arg(short, long, default_value_t = duet::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = 17, help = "Longest wait for a peer record per tick")]
    receive_timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_FRAME_RATE, help = "Ticks per second, 0 for unpaced")]
    frame_rate: u32,

    #[arg(long, help = "Run without a terminal UI, logging to stderr")]
    headless: bool,

    #[arg(long, help = "Write logs to this file")]
    log_file: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = 500,
        help = "Release a key after this long without a repeat, on terminals that do not report releases"
    )]
    release_after_ms: u64,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(self.role.into());
        config.encoding = self.encoding.into();
        config.receive_mode = if self.background_receive {
            ReceiveMode::Background
        } else {
            ReceiveMode::Inline
        };
        config.frame_interval = if self.frame_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / self.frame_rate as f64)
        };
        config.link.bind_host = self.bind.clone();
        config.link.peer_host = self.host.clone();
        config.link.port = self.port;
        config.link.receive_timeout = Duration::from_millis(self.receive_timeout_ms);
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.session_config();
    config.validate()?;

    if !args.headless {
        match config.role {
            Role::Authority => eprintln!("Waiting for a peer on {}", config.link.listen_addr()),
            Role::Initiator => eprintln!("Connecting to {}", config.link.connect_addr()),
        }
    }

    let session = Session::establish(&config).context("failed to establish link")?;

    let reason = if args.headless {
        run_headless(session)?
    } else {
        run_terminal(session, Duration::from_millis(args.release_after_ms))?
    };

    match reason {
        ExitReason::Closed => Ok(()),
        ExitReason::LinkLost(e) => Err(anyhow::Error::new(e).context("link to peer lost")),
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if !args.headless {
        // stderr belongs to the terminal UI.
        return Ok(());
    }

    builder.init();
    Ok(())
}

fn run_headless(session: Session) -> Result<ExitReason> {
    log::info!("Running headless as {}", session.role().label());
    let input = IdleInput::watch_ctrl_c().context("failed to watch for Ctrl-C")?;
    let mut sync = SyncLoop::new(session, input, LogRenderer::default());
    Ok(sync.run()?)
}

fn run_terminal(session: Session, release_after: Duration) -> Result<ExitReason> {
    let guard = TerminalGuard::enter().context("failed to set up terminal")?;

    let release_after = if guard.reports_key_release() {
        None
    } else {
        log::warn!(
            "Terminal does not report key releases, releasing after {:?} without repeat",
            release_after
        );
        Some(release_after)
    };

    let input = TerminalInput::new(release_after);
    let renderer = TerminalRenderer::new()?;

    let mut sync = SyncLoop::new(session, input, renderer);
    let reason = sync.run()?;
    drop(sync);

    drop(guard);
    Ok(reason)
}
