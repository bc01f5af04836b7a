mod cli;

use anyhow::bail;
use clap::Parser;
use homedeck_api::models::*;
use homedeck_client::{ClientSettings, Dashboard, Poller, Services, compose};
use time::format_description::well_known::Rfc3339;

use crate::cli::{Cli, Commands, DeviceCommands, HomeCommands, RoomCommands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = ClientSettings::new()?;

    let level = cli.log_level.clone().unwrap_or_else(|| settings.log_level.clone());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");

            format!("{app_name}={level},homedeck_mock={level}").into()
        }))
        .init();

    let services = compose(&settings)?;
    tracing::debug!("using {:?} registry", services.mode);

    let mut dashboard = Dashboard::new(
        services.registry.clone(),
        services.session.clone(),
        services.tokens.clone(),
    );
    execute(cli.command, &services, &settings, &mut dashboard).await?;

    if dashboard.needs_login() {
        bail!("Not signed in, run `homedeck login`");
    }
    if !dashboard.notices().is_empty() {
        for notice in dashboard.notices() {
            eprintln!("error: {}", notice.message());
        }
        bail!("Command failed");
    }

    Ok(())
}

async fn execute(
    command: Commands,
    services: &Services,
    settings: &ClientSettings,
    dashboard: &mut Dashboard,
) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            if let Some(user) = dashboard.login(&username, &password).await {
                println!("Signed in as {}", user.username);
            } else if dashboard.needs_login() {
                bail!("Invalid username or password");
            }
        }
        Commands::Logout => {
            services.session.logout().await?;
            println!("Signed out");
        }
        Commands::Register {
            username,
            password,
            email,
        } => {
            let user = services
                .session
                .register(RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("Registered {} (#{})", user.username, user.id);
        }
        Commands::Whoami => {
            let user = services.session.current_user().await?;
            match user.email {
                Some(email) => println!("{} <{}>", user.username, email),
                None => println!("{}", user.username),
            }
        }
        Commands::Homes(command) => homes(command, dashboard).await,
        Commands::Rooms(command) => rooms(command, dashboard).await,
        Commands::Devices(command) => devices(command, dashboard).await,
        Commands::Logs { limit } => {
            dashboard.refresh_logs().await;
            for entry in dashboard.logs().iter().take(limit) {
                let timestamp = entry.timestamp.format(&Rfc3339).unwrap_or_default();
                println!("{}  {:<7}  {}", timestamp, entry.severity.to_string(), entry.message);
            }
        }
        Commands::Watch { room_id, ticks } => {
            if !services.tokens.is_authenticated() {
                bail!("Not signed in, run `homedeck login`");
            }

            let mut poller = Poller::devices(services.registry.clone(), room_id, settings.poll_interval());
            let mut seen = 0;

            while poller.changed().await {
                let snapshot = poller.latest();
                if let Some(error) = snapshot.error {
                    eprintln!("refresh failed: {error}");
                }
                if let Some(devices) = snapshot.data {
                    println!("--");
                    devices.iter().for_each(|device| println!("{}", describe(device)));
                }

                seen += 1;
                if ticks.is_some_and(|ticks| seen >= ticks) {
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn homes(command: HomeCommands, dashboard: &mut Dashboard) {
    match command {
        HomeCommands::List => {
            dashboard.refresh_homes().await;
            for home in dashboard.homes() {
                println!("{:>4}  {}  {}", home.id, home.name, home.location.as_deref().unwrap_or("-"));
            }
        }
        HomeCommands::Create { name, location } => {
            if let Some(home) = dashboard.create_home(&name, location).await {
                println!("Created home {} (#{})", home.name, home.id);
            }
        }
        HomeCommands::Rename { home_id, name } => {
            if let Some(home) = dashboard.rename_home(home_id, &name).await {
                println!("Renamed home #{} to {}", home.id, home.name);
            }
        }
        HomeCommands::Delete { home_id } => {
            if dashboard.delete_home(home_id).await {
                println!("Deleted home #{home_id}");
            }
        }
    }
}

async fn rooms(command: RoomCommands, dashboard: &mut Dashboard) {
    match command {
        RoomCommands::List { home_id } => {
            dashboard.select_home(home_id).await;
            for room in dashboard.rooms() {
                println!("{:>4}  {}", room.id, room.name);
            }
        }
        RoomCommands::Create { home_id, name } => {
            dashboard.select_home(home_id).await;
            if let Some(room) = dashboard.create_room(&name).await {
                println!("Created room {} (#{})", room.name, room.id);
            }
        }
        RoomCommands::Rename { room_id, name } => {
            if let Some(room) = dashboard.rename_room(room_id, &name).await {
                println!("Renamed room #{} to {}", room.id, room.name);
            }
        }
        RoomCommands::Delete { room_id } => {
            if dashboard.delete_room(room_id).await {
                println!("Deleted room #{room_id}");
            }
        }
    }
}

async fn devices(command: DeviceCommands, dashboard: &mut Dashboard) {
    let updated = match command {
        DeviceCommands::List { room_id } => {
            dashboard.select_room(room_id).await;
            dashboard.devices().iter().for_each(|device| println!("{}", describe(device)));
            None
        }
        DeviceCommands::Show { device_id } => dashboard.device(device_id).await,
        DeviceCommands::Discover { bssid } => {
            let found = dashboard.discover(&bssid).await;
            if found.is_empty() {
                println!("No unassigned devices on {bssid}");
            }
            found.iter().for_each(|device| println!("{}", describe(device)));
            None
        }
        DeviceCommands::Add {
            name,
            device_type,
            room,
            bssid,
        } => {
            let mut request = CreateDeviceRequest::new(name, device_type.into());
            if let Some(room_id) = room {
                request = request.in_room(room_id);
            }
            if let Some(bssid) = bssid {
                request = request.on_network(bssid);
            }
            dashboard.add_device(request).await
        }
        DeviceCommands::Assign { device_id, room_id } => dashboard.assign_device(device_id, room_id).await,
        DeviceCommands::Remove { device_id } => {
            if dashboard.remove_device(device_id).await {
                println!("Removed device #{device_id} from its room");
            }
            None
        }
        DeviceCommands::On { device_id } => dashboard.control_device(device_id, DeviceCommand::on()).await,
        DeviceCommands::Off { device_id } => dashboard.control_device(device_id, DeviceCommand::off()).await,
        DeviceCommands::Speed { device_id, speed } => {
            dashboard
                .control_device(device_id, DeviceCommand::set_speed(speed))
                .await
        }
        DeviceCommands::Detect { device_id, enabled } => {
            dashboard.toggle_human_detection(device_id, enabled).await
        }
        DeviceCommands::Threshold { device_id, celsius } => {
            dashboard.set_temperature_threshold(device_id, celsius).await
        }
    };

    if let Some(device) = updated {
        println!("{}", describe(&device));
    }
}

fn describe(device: &DeviceResponse) -> String {
    let mut line = format!(
        "{:>4}  {:<20} {:<6} {:<3}",
        device.id,
        device.name,
        device.device_type.to_string(),
        device.state.to_string()
    );

    if let Some(speed) = device.speed {
        line.push_str(&format!("  speed {speed}"));
    }
    if let Some(enabled) = device.human_detection_enabled {
        line.push_str(if enabled { "  detection on" } else { "  detection off" });
    }
    if device.recording {
        line.push_str("  recording");
    }
    if let (Some(temperature), Some(humidity)) = (device.temperature, device.humidity) {
        line.push_str(&format!("  {temperature:.1}°C {humidity:.0}%"));
    }
    if let Some(threshold) = device.temperature_threshold {
        line.push_str(&format!("  limit {threshold:.1}°C"));
    }
    if device.alert {
        line.push_str("  ALERT");
    }
    if device.room_id.is_none() {
        line.push_str("  (unassigned)");
    }

    line
}
