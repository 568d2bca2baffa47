//! Command-line interface definitions and parsing

use clap::{Args, Parser, Subcommand};
use sensorlink_core::constants::DEFAULT_RFCOMM_CHANNEL;
use sensorlink_core::{BluetoothAddress, DeviceConfig, MalformedPolicy, Port, TransportMode};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sensorlink", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log filter, e.g. `debug` or `sensorlink_session=trace` (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List serial ports present on this machine
    Ports,

    /// Connect to a device and print what it sends until Ctrl-C
    Listen(ListenArgs),

    /// Decode wire lines to JSON (from the argument, or stdin line by line)
    Decode {
        /// Wire line such as `Gas:number(300)|`
        line: Option<String>,
    },

    /// Build a wire line from NAME=VALUE fields
    ///
    /// VALUE is read as JSON when it parses (`300`, `"text"`, `[0,30]`)
    /// and as a plain string otherwise.
    Encode {
        #[arg(required = true, value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// JSON device configuration file; the flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Transport: `serial` or `bluetooth`
    #[arg(short, long)]
    pub mode: Option<TransportMode>,

    /// Serial device path, or RFCOMM channel in Bluetooth mode
    #[arg(short, long)]
    pub port: Option<String>,

    /// Bluetooth MAC address
    #[arg(short, long)]
    pub address: Option<BluetoothAddress>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Bluetooth read timeout in milliseconds; 0 blocks until data arrives
    #[arg(long, value_name = "MS")]
    pub read_timeout_ms: Option<u64>,

    /// Field to print; `a,b` fires only when one message carries both
    #[arg(short, long = "watch", value_name = "KEY")]
    pub watch: Vec<String>,

    /// Message to send once the session is started, e.g. `SECURITY`
    #[arg(short, long)]
    pub send: Option<String>,

    /// Print every decoded message as one JSON object per line
    #[arg(long)]
    pub json: bool,

    /// Log and skip undecodable lines instead of disconnecting
    #[arg(long)]
    pub skip_malformed: bool,
}

impl ListenArgs {
    /// Merge the configuration file (if any) with the command-line flags.
    pub fn device_config(&self) -> sensorlink_core::Result<DeviceConfig> {
        let mut config = match &self.config {
            Some(path) => DeviceConfig::from_json_file(path)?,
            None => DeviceConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(port) = &self.port {
            config.port = Port::from(port.as_str());
        } else if config.mode == TransportMode::Bluetooth && config.port.as_channel().is_err() {
            config.port = Port::Channel(DEFAULT_RFCOMM_CHANNEL);
        }
        if let Some(address) = self.address {
            config.address = Some(address);
        }
        if let Some(baud) = self.baud {
            config.baud_rate = Some(baud);
        }
        if let Some(timeout) = self.read_timeout_ms {
            config.read_timeout_ms = Some(timeout);
        }
        if self.skip_malformed {
            config.malformed_policy = MalformedPolicy::SkipAndLog;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn listen_args(argv: &[&str]) -> ListenArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Listen(args) => args,
            other => panic!("expected listen, got {other:?}"),
        }
    }

    #[test]
    fn test_listen_serial_defaults() {
        let config = listen_args(&["sensorlink", "listen"]).device_config().unwrap();
        assert_eq!(config, DeviceConfig::default());
    }

    #[test]
    fn test_listen_bluetooth_defaults_channel() {
        let config = listen_args(&[
            "sensorlink",
            "listen",
            "--mode",
            "bt",
            "--address",
            "98:D3:31:F5:2A:10",
        ])
        .device_config()
        .unwrap();

        assert_eq!(config.mode, TransportMode::Bluetooth);
        assert_eq!(config.port, Port::Channel(DEFAULT_RFCOMM_CHANNEL));
        assert_eq!(config.address, Some("98:D3:31:F5:2A:10".parse().unwrap()));
    }

    #[test]
    fn test_listen_flags() {
        let args = listen_args(&[
            "sensorlink",
            "listen",
            "-p",
            "/dev/ttyACM0",
            "-b",
            "115200",
            "-w",
            "IUD",
            "-w",
            "angles,distances",
            "--send",
            "SECURITY",
            "--skip-malformed",
            "--json",
        ]);
        assert_eq!(args.watch, vec!["IUD", "angles,distances"]);
        assert_eq!(args.send.as_deref(), Some("SECURITY"));
        assert!(args.json);

        let config = args.device_config().unwrap();
        assert_eq!(config.port, Port::Path("/dev/ttyACM0".to_string()));
        assert_eq!(config.baud_rate, Some(115200));
        assert_eq!(config.malformed_policy, MalformedPolicy::SkipAndLog);
    }

    #[rstest]
    #[case(&["sensorlink", "listen", "--mode", "usb"])]
    #[case(&["sensorlink", "listen", "--address", "nope"])]
    #[case(&["sensorlink", "encode"])]
    fn test_rejected_arguments(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_global_log_level() {
        let cli = Cli::try_parse_from(["sensorlink", "ports", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
