//! Command handlers for the sensorlink CLI

use crate::cli::{Commands, ListenArgs};
use anyhow::{Context, Result, bail};
use sensorlink_protocol::{DecodedMessage, FieldValue, MessageBuilder, decode_message};
use sensorlink_session::{ConnectionSession, DeviceDescriptor, SessionError, SubscriptionKey};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

pub async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Ports => list_ports(),
        Commands::Listen(args) => listen(args).await,
        Commands::Decode { line } => decode(line),
        Commands::Encode { fields } => {
            println!("{}", encode(&fields)?);
            Ok(())
        }
    }
}

fn list_ports() -> Result<()> {
    let ports = sensorlink_hardware::available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}\t{}", port.name, port.kind);
    }
    Ok(())
}

fn decode(line: Option<String>) -> Result<()> {
    match line {
        Some(line) => print_json(&decode_message(&line)?),
        None => {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match decode_message(&line) {
                    Ok(message) => print_json(&message)?,
                    Err(e) => warn!(line, error = %e, "Could not decode line"),
                }
            }
            Ok(())
        }
    }
}

fn encode(fields: &[String]) -> Result<String> {
    let mut builder = MessageBuilder::new();
    for field in fields {
        let Some((name, raw)) = field.split_once('=') else {
            bail!("expected NAME=VALUE, got '{field}'");
        };
        let value = serde_json::from_str::<FieldValue>(raw)
            .unwrap_or_else(|_| FieldValue::Str(raw.to_string()));
        builder = builder.field(name, value)?;
    }
    Ok(builder.build())
}

fn print_json(message: &DecodedMessage) -> Result<()> {
    println!("{}", serde_json::to_string(message)?);
    Ok(())
}

fn format_values(values: &[FieldValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn listen(args: ListenArgs) -> Result<()> {
    let config = args.device_config()?;
    let (errors_tx, mut errors) = mpsc::unbounded_channel::<String>();

    let session = Arc::new(
        ConnectionSession::builder(DeviceDescriptor::from_config(&config))
            .with_mode(config.mode)
            .with_malformed_policy(config.malformed_policy)
            .with_error_callback(move |e: &SessionError| {
                let _ = errors_tx.send(e.to_string());
            })
            .build(),
    );

    for watch in &args.watch {
        let key = SubscriptionKey::parse(watch);
        let label = key.to_string();
        session.set_data_point(key, move |values| {
            println!("{label} = {}", format_values(values));
        })?;
    }

    let mut live = session.subscribe_live_data();
    let mut connection = session.subscribe_connection_changed();
    let print_all = args.json || args.watch.is_empty();

    session.start()?;
    if let Some(message) = &args.send {
        session.send_message(message);
    }

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping session");
                break Ok(());
            }
            Some(message) = errors.recv() => {
                break Err(anyhow::anyhow!(message));
            }
            event = connection.recv() => match event {
                Ok(true) => info!(mode = %config.mode, port = %config.port, "Connected"),
                Ok(false) => break Ok(()),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break Ok(()),
            },
            message = live.recv(), if print_all => match message {
                Ok(message) => print_json(&message)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Output fell behind, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break Ok(()),
            },
        }
    };

    session.stop();
    let waiter = Arc::clone(&session);
    tokio::task::spawn_blocking(move || waiter.wait()).await?;

    // A failure can race the connection event that ended the loop.
    if let Ok(message) = errors.try_recv() {
        error!(error = %message, "Session ended with an error");
        bail!(message);
    }
    outcome
}
