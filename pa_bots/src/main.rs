//! Command-line runner for the sample poker agents.

mod agents;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Error, bail};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use poker_agent::{
    Agent, JsonlMessageLog, Session, WsTransport,
    config::{AgentConfig, ConfigOverrides},
};

use agents::{AgentKind, CallerAgent, Interruptible, RandomAgent};

const HELP: &str = "\
Connect a sample agent to a poker server

USAGE:
  pa_bots [OPTIONS]

OPTIONS:
  --agent      NAME        Agent to run: caller or random  [default: caller]
  --url        URL         Server WebSocket URL            [default: env AGENT_SERVER_URL or ws://127.0.0.1:8765]
  --name       NAME        Name to join under              [default: env AGENT_NAME or pa_bot]
  --game       ID          Game to join                    [default: env AGENT_GAME_ID]
  --token      TOKEN       Auth token                      [default: env AGENT_AUTH_TOKEN]
  --timeout    SECS        Socket read/write timeout       [default: env AGENT_TIMEOUT_SECS or 30]
  --seed       N           Seed for the random agent       [default: env AGENT_SEED]
  --hands      N           Stop after N hands              [default: env AGENT_HAND_LIMIT]
  --log        PATH        Append wire traffic as JSONL    [default: env AGENT_MESSAGE_LOG]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter (e.g., debug)        [default: info]
  (Variables may also be set in a .env file)
";

struct Args {
    agent: AgentKind,
    overrides: ConfigOverrides,
}

fn parse_args() -> Result<Args, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        agent: pargs.opt_value_from_str("--agent")?.unwrap_or_default(),
        overrides: ConfigOverrides {
            server_url: pargs.opt_value_from_str("--url")?,
            auth_token: pargs.opt_value_from_str("--token")?,
            name: pargs.opt_value_from_str("--name")?,
            game_id: pargs.opt_value_from_str("--game")?,
            timeout_secs: pargs.opt_value_from_str("--timeout")?,
            seed: pargs.opt_value_from_str("--seed")?,
            hand_limit: pargs.opt_value_from_str("--hands")?,
            message_log: pargs.opt_value_from_str("--log")?,
        },
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }
    Ok(args)
}

fn play<A: Agent>(agent: A, config: &AgentConfig, stop: Arc<AtomicBool>) -> Result<(), Error> {
    let transport = WsTransport::connect(&config.server_url, config.timeout())
        .with_context(|| format!("couldn't reach {}", config.server_url))?;

    let mut session = Session::new(transport).with_hand_limit(config.hand_limit);
    if let Some(path) = &config.message_log {
        let log = JsonlMessageLog::open(path)
            .with_context(|| format!("couldn't open message log {}", path.display()))?;
        session = session.with_message_sink(Box::new(log));
    }

    let mut agent = Interruptible::new(agent, stop);
    let report = session.run(&config.connect_request(), &mut agent)?;
    info!("{} after {} hands", report.outcome, report.hands_played);
    Ok(())
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let args = parse_args()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let config = AgentConfig::from_env(args.overrides)?;
    config.validate()?;

    // Catching signals for a clean stop at the next callback.
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    set_handler(move || {
        if flag.swap(true, Ordering::Relaxed) {
            std::process::exit(130);
        }
        warn!("stop requested, finishing at the next server message");
    })?;

    info!("Starting {} agent as {} against {}", args.agent, config.name, config.server_url);
    match args.agent {
        AgentKind::Caller => play(CallerAgent, &config, stop),
        AgentKind::Random => play(RandomAgent::new(config.seed), &config, stop),
    }
}
