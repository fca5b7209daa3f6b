//! Command-line tool for finding, watching and controlling Daikin units.
//!
//! This example demonstrates:
//! - One-shot discovery of units on the local network
//! - Running the registry and printing metrics as units come and go
//! - Reading and changing a single unit's control state
//!
//! Run with: cargo run --example aircon_monitor -- --help

use std::time::Duration;

use clap::{Parser, Subcommand};
use daikin_rs::{
    ControlCodec, ControlState, Device, Discovery, DiscoveryConfig, FanRate, HttpTransport,
    Humidity, Mode, Registry, RegistryConfig, RegistryEvent, Temperature, TemperatureRange, Varz,
    discover,
};

#[derive(Parser)]
#[command(name = "aircon-monitor")]
#[command(about = "Discover, watch and control Daikin air conditioners", long_about = None)]
struct Cli {
    /// Use the 19-25°C temperature range of older firmware
    #[arg(long, global = true)]
    narrow: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "5", global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover all units on the network
    Discover {
        /// Discovery timeout in seconds
        #[arg(short, long, default_value = "3")]
        wait: u64,
    },

    /// Track units and print metrics whenever they change
    Monitor {
        /// Seconds between discovery probes
        #[arg(long, default_value = "30")]
        announce: u64,

        /// Seconds between polls of known units
        #[arg(long, default_value = "10")]
        update: u64,
    },

    /// Show the control and sensor state of one unit
    Status {
        /// Address of the unit
        address: String,
    },

    /// Turn a unit on with the given settings
    On {
        /// Address of the unit
        address: String,
        /// Mode: auto, dehumidify, cool, heat or fan
        #[arg(short, long, default_value = "auto")]
        mode: Mode,
        /// Target temperature in °C; negative for manual
        #[arg(short, long, allow_hyphen_values = true)]
        temp: Option<f64>,
        /// Target humidity in percent; negative for auto
        #[arg(long, allow_hyphen_values = true)]
        humidity: Option<i32>,
        /// Fan level 1-5
        #[arg(short, long)]
        fan: Option<u8>,
    },

    /// Turn a unit off
    Off {
        /// Address of the unit
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let range = if cli.narrow {
        TemperatureRange::NARROW
    } else {
        TemperatureRange::WIDE
    };
    let codec = ControlCodec::default().with_range(range);
    let transport = HttpTransport::with_timeout(Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Discover { wait } => {
            let units = discover(&DiscoveryConfig::default(), Duration::from_secs(wait)).await?;
            if units.is_empty() {
                println!("No units found on the network.");
            }
            for unit in units {
                println!(
                    "{}\t{}\t{}\t{}\tver={}",
                    unit.address, unit.mac, unit.name, unit.group, unit.firmware_version
                );
            }
        }
        Commands::Monitor { announce, update } => {
            let discovery = Discovery::bind(&DiscoveryConfig::default()).await?;
            let config = RegistryConfig::default()
                .with_announce_interval(Duration::from_secs(announce))
                .with_poll_interval(Duration::from_secs(update))
                .with_codec(codec);
            let (registry, mut events) = Registry::new(config, transport);
            let runner = tokio::spawn(registry.run(discovery));

            let varz = Varz::new();
            while let Some(event) = events.recv().await {
                if let RegistryEvent::Removed { mac } = &event {
                    println!("-- lost {mac}");
                }
                varz.apply(&event);
                print!("{varz}");
            }
            runner.await??;
        }
        Commands::Status { address } => {
            let device = Device::new(address, transport).with_codec(codec);
            let state = device.fetch().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::On {
            address,
            mode,
            temp,
            humidity,
            fan,
        } => {
            let mut state = ControlState::on(mode, temp.map(Temperature::from).unwrap_or_default());
            if let Some(h) = humidity {
                state.humidity = Humidity::from(h);
            }
            state.fan_rate = fan.map(FanRate::Level).unwrap_or(FanRate::Auto);
            Device::new(address, transport)
                .with_codec(codec)
                .set_control(&state)
                .await?;
            println!("✓ on");
        }
        Commands::Off { address } => {
            let device = Device::new(address, transport).with_codec(codec);
            let mut state = device.get_control().await?;
            state.power = false;
            device.set_control(&state).await?;
            println!("✓ off");
        }
    }

    Ok(())
}
