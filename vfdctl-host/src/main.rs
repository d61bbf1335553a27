//! Simulated gateway control loop
//!
//! Loads the configuration from a media directory (first argument,
//! default `media`), then drives the connection manager against the
//! in-process broker the way the firmware loop drives it against a
//! real one: one connect attempt per tick, telemetry published while
//! the session is up, inbound commands validated against the register
//! catalog. A scripted handshake refusal and two injected commands
//! exercise the retry and dispatch paths.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use vfdctl_core::config::{ConfigLoader, Configuration};
use vfdctl_core::uplink::{ConnectionManager, UplinkError};
use vfdctl_host::sim::{SimBroker, SimNetwork};
use vfdctl_host::storage::FileStorage;

/// Commands handed over by the transport callback, drained once per
/// tick by the loop
static INBOX: Mutex<VecDeque<(String, Vec<u8>)>> = Mutex::new(VecDeque::new());

fn enqueue_command(topic: &str, payload: &[u8]) {
    if let Ok(mut inbox) = INBOX.lock() {
        inbox.push_back((topic.to_string(), payload.to_vec()));
    }
}

fn drain_commands() -> Vec<(String, Vec<u8>)> {
    match INBOX.lock() {
        Ok(mut inbox) => inbox.drain(..).collect(),
        Err(_) => Vec::new(),
    }
}

/// Failures the rig cannot run past; connect and load failures are
/// warned and retried instead
#[derive(Debug, Error)]
enum RigError {
    #[error("uplink initialization failed: {0}")]
    Init(UplinkError),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), RigError> {
    let media_root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("media"));
    let config = load_configuration(&media_root);
    log_config_summary(&config);

    let broker = SimBroker::new();
    let script = broker.clone();
    script.refuse_connects(1, -7);

    let mut manager = ConnectionManager::new(SimNetwork::new(), broker);
    manager.register_message_callback(Some(enqueue_command));
    manager
        .init(&config.broker, &config.device)
        .map_err(RigError::Init)?;

    // The configured interval is in seconds; the rig sleeps the same
    // number of milliseconds so a full run stays under a second.
    let retry = Duration::from_millis(u64::from(config.broker.retry_interval_secs));

    for tick in 0u32..8 {
        if tick == 3 {
            script.inject("cmd/vfdctl/freq", b"300");
        }
        if tick == 5 {
            script.inject("cmd/vfdctl/freq", b"900");
        }

        if let Err(err) = manager.connect() {
            warn!(tick, "connect attempt failed: {}", err);
            std::thread::sleep(retry);
            continue;
        }
        publish_telemetry(&mut manager, &config);
        dispatch_commands(&config);
    }

    info!(published = script.published().len(), "rig finished");
    Ok(())
}

fn load_configuration(media_root: &str) -> Configuration {
    let mut loader = ConfigLoader::new(FileStorage::new(media_root));
    match loader.load("conf.txt") {
        Ok(config) => config,
        Err(err) => {
            warn!("running on defaults: {}", err);
            Configuration::default()
        }
    }
}

fn log_config_summary(config: &Configuration) {
    info!(
        device = config.device.name.as_str(),
        mac = %config.device.mac,
        broker = config.broker.url.as_str(),
        port = config.broker.port,
        formed = config.formed,
        "configuration"
    );
    debug!(
        telemetry = config.registers.telemetry.len(),
        configuration = config.registers.configuration.len(),
        "register catalog"
    );
}

fn publish_telemetry(
    manager: &mut ConnectionManager<SimNetwork, SimBroker>,
    config: &Configuration,
) {
    for register in config.registers.telemetry.iter() {
        let payload = register.value.to_string();
        match manager.publish(register.topic.as_str(), payload.as_bytes()) {
            Ok(()) => debug!(
                topic = register.topic.as_str(),
                value = register.value,
                "published"
            ),
            Err(err) => warn!(topic = register.topic.as_str(), "publish failed: {}", err),
        }
    }
}

fn dispatch_commands(config: &Configuration) {
    for (topic, payload) in drain_commands() {
        let register = match config.registers.find_config_register(&topic) {
            Some(register) => register,
            None => {
                warn!(%topic, "command for unknown register");
                continue;
            }
        };
        let text = std::str::from_utf8(&payload).unwrap_or("");
        let value = match text.trim().parse::<i32>() {
            Ok(value) => value,
            Err(_) => {
                warn!(%topic, "command payload is not a number");
                continue;
            }
        };
        if register.accepts(value) {
            info!(register = register.name.as_str(), value, "command accepted");
        } else {
            warn!(
                register = register.name.as_str(),
                value,
                rule = register.comparison.as_text(),
                lower = register.lower_limit,
                upper = register.upper_limit,
                "command outside configured limits"
            );
        }
    }
}
