//! Command line definitions for the `homedeck` binary.

use clap::{Parser, Subcommand, ValueEnum};
use homedeck_api::models::{DeviceType, Id};

#[derive(Parser, Debug)]
#[command(name = "homedeck", version, about = "Manage homes, rooms and devices")]
pub struct Cli {
    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the token
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Create an account
    Register {
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Show the signed in account
    Whoami,
    /// Manage homes
    #[command(subcommand)]
    Homes(HomeCommands),
    /// Manage rooms of a home
    #[command(subcommand)]
    Rooms(RoomCommands),
    /// Inspect and control devices
    #[command(subcommand)]
    Devices(DeviceCommands),
    /// Print the activity log, newest first
    Logs {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Poll the devices of a room and print every refresh
    Watch {
        room_id: Id,
        /// Stop after this many refreshes
        #[arg(short, long)]
        ticks: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HomeCommands {
    List,
    Create {
        name: String,
        #[arg(short, long)]
        location: Option<String>,
    },
    Rename {
        home_id: Id,
        name: String,
    },
    /// Delete a home; its devices become unassigned
    Delete {
        home_id: Id,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoomCommands {
    List {
        home_id: Id,
    },
    Create {
        home_id: Id,
        name: String,
    },
    Rename {
        room_id: Id,
        name: String,
    },
    /// Delete a room; its devices become unassigned
    Delete {
        room_id: Id,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeviceCommands {
    List {
        room_id: Id,
    },
    Show {
        device_id: Id,
    },
    /// List unassigned devices on a network
    Discover {
        bssid: String,
    },
    Add {
        name: String,
        #[arg(short = 't', long = "type", value_enum)]
        device_type: CliDeviceType,
        #[arg(short, long)]
        room: Option<Id>,
        #[arg(short, long)]
        bssid: Option<String>,
    },
    Assign {
        device_id: Id,
        room_id: Id,
    },
    /// Take a device out of its room
    Remove {
        device_id: Id,
    },
    On {
        device_id: Id,
    },
    Off {
        device_id: Id,
    },
    /// Set a fan level between 0 and 3
    Speed {
        device_id: Id,
        speed: u8,
    },
    /// Enable or disable human detection on a camera
    Detect {
        device_id: Id,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Set a sensor alert threshold in Celsius, or clear it when omitted
    Threshold {
        device_id: Id,
        #[arg(allow_negative_numbers = true)]
        celsius: Option<f32>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliDeviceType {
    Light,
    Fan,
    Camera,
    Sensor,
}

impl From<CliDeviceType> for DeviceType {
    fn from(device_type: CliDeviceType) -> Self {
        match device_type {
            CliDeviceType::Light => DeviceType::Light,
            CliDeviceType::Fan => DeviceType::Fan,
            CliDeviceType::Camera => DeviceType::Camera,
            CliDeviceType::Sensor => DeviceType::Sensor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_commands() {
        let cli = Cli::parse_from(["homedeck", "devices", "speed", "3", "2"]);
        assert!(matches!(
            cli.command,
            Commands::Devices(DeviceCommands::Speed { device_id: 3, speed: 2 })
        ));

        let cli = Cli::parse_from(["homedeck", "devices", "add", "Porch", "--type", "camera", "--room", "1"]);
        match cli.command {
            Commands::Devices(DeviceCommands::Add { name, device_type, room, bssid }) => {
                assert_eq!(name, "Porch");
                assert_eq!(DeviceType::from(device_type), DeviceType::Camera);
                assert_eq!(room, Some(1));
                assert_eq!(bssid, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["homedeck", "devices", "threshold", "5"]);
        assert!(matches!(
            cli.command,
            Commands::Devices(DeviceCommands::Threshold { device_id: 5, celsius: None })
        ));
    }

    #[test]
    fn test_parse_nested_subcommands() {
        let cli = Cli::try_parse_from(["homedeck", "homes", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::Homes(HomeCommands::List)));

        let cli = Cli::try_parse_from(["homedeck", "rooms", "rename", "2", "Study"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rooms(RoomCommands::Rename { room_id: 2, ref name }) if name == "Study"
        ));

        let cli = Cli::try_parse_from(["homedeck", "devices", "detect", "1", "false"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Devices(DeviceCommands::Detect { device_id: 1, enabled: false })
        ));

        assert!(Cli::try_parse_from(["homedeck", "list"]).is_err());
    }

    #[test]
    fn test_parse_global_log_level() {
        let cli = Cli::parse_from(["homedeck", "homes", "list", "--log-level", "debug"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Homes(HomeCommands::List)));
    }
}
