mod common;

use homedeck_api::models::*;
use homedeck_api::{Error, Registry, Session};

use crate::common::test_server::{TEST_PASSWORD, TestServer};

const LAN: &str = "aa:bb:cc:dd:ee:ff";

async fn kitchen(registry: &impl Registry) -> (HomeResponse, RoomResponse) {
    let home = registry
        .create_home(CreateHomeRequest {
            name: "Lake House".to_string(),
            location: None,
        })
        .await
        .unwrap();
    let room = registry
        .create_room(CreateRoomRequest {
            home_id: home.id,
            name: "Kitchen".to_string(),
        })
        .await
        .unwrap();

    (home, room)
}

#[tokio::test]
async fn test_register_and_login() {
    let server = TestServer::start().await;
    let registry = server.registry();

    let user = registry
        .register(RegisterRequest {
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.username, "alice");

    let auth = registry
        .login(LoginRequest {
            username: "alice".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(registry.tokens().get(), Some(auth.id_token));
    assert_eq!(registry.current_user().await.unwrap().username, "alice");

    registry.logout().await.unwrap();
    assert!(registry.current_user().await.unwrap_err().is_auth());
}

#[tokio::test]
async fn test_duplicate_username_is_validation() {
    let server = TestServer::start().await;
    let registry = server.registry();

    let err = registry
        .register(RegisterRequest {
            username: "admin".to_string(),
            email: None,
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_bad_credentials() {
    let server = TestServer::start().await;
    let registry = server.registry();

    let err = registry
        .login(LoginRequest {
            username: "admin".to_string(),
            password: "wrong-password".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_auth());
    assert!(!registry.tokens().is_authenticated());
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let server = TestServer::start().await;
    let registry = server.registry();
    registry.tokens().set("not-a-jwt").unwrap();

    let err = registry.list_homes().await.unwrap_err();
    assert!(err.is_auth());
    assert!(!registry.tokens().is_authenticated());
}

#[tokio::test]
async fn test_household_round_trip() {
    let server = TestServer::start().await;
    let registry = server.signed_in().await;

    let (home, room) = kitchen(&registry).await;
    let homes = registry.list_homes().await.unwrap();
    assert_eq!(homes.iter().map(|h| (h.id, h.name.as_str())).collect::<Vec<_>>(), [(home.id, "Lake House")]);
    let rooms = registry.list_rooms(home.id).await.unwrap();
    assert_eq!(rooms.iter().map(|r| r.id).collect::<Vec<_>>(), [room.id]);
    assert_eq!(registry.get_room(room.id).await.unwrap().name, "Kitchen");
    assert!(registry.get_room(room.id + 100).await.unwrap_err().is_not_found());

    let light = registry
        .create_device(CreateDeviceRequest::new("Ceiling Light", DeviceType::Light).in_room(room.id))
        .await
        .unwrap();
    let light = registry.control_device(light.id, DeviceCommand::on()).await.unwrap();
    assert_eq!(light.state, PowerState::On);

    let devices = registry.list_devices(room.id).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].state, PowerState::On);

    let messages = registry
        .list_activity_log()
        .await
        .unwrap()
        .into_iter()
        .take(4)
        .map(|entry| entry.message)
        .collect::<Vec<_>>();
    assert_eq!(
        messages,
        [
            "Device Ceiling Light action: ON",
            "Device installed: Ceiling Light",
            "Room added: Kitchen",
            "New home created: Lake House",
        ]
    );
}

#[tokio::test]
async fn test_unsupported_command_is_invalid_operation() {
    let server = TestServer::start().await;
    let registry = server.signed_in().await;
    let (_, room) = kitchen(&registry).await;

    let light = registry
        .create_device(CreateDeviceRequest::new("Lamp", DeviceType::Light).in_room(room.id))
        .await
        .unwrap();

    let err = registry
        .control_device(light.id, DeviceCommand::set_speed(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    let err = registry.toggle_human_detection(light.id, true).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    let err = registry
        .set_temperature_threshold(light.id, Some(30.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

#[tokio::test]
async fn test_fan_and_sensor_controls() {
    let server = TestServer::start().await;
    let registry = server.signed_in().await;
    let (_, room) = kitchen(&registry).await;

    let fan = registry
        .create_device(CreateDeviceRequest::new("Stand Fan", DeviceType::Fan).in_room(room.id))
        .await
        .unwrap();
    assert_eq!(fan.state, PowerState::Off);

    let fan = registry
        .control_device(fan.id, DeviceCommand::set_speed(2))
        .await
        .unwrap();
    assert_eq!(fan.state, PowerState::On);
    assert_eq!(fan.speed, Some(2));

    let sensor = registry
        .create_device(CreateDeviceRequest::new("Climate", DeviceType::Sensor).in_room(room.id))
        .await
        .unwrap();
    let sensor = registry
        .set_temperature_threshold(sensor.id, Some(-40.0))
        .await
        .unwrap();
    assert_eq!(sensor.temperature_threshold, Some(-40.0));
    assert_eq!(sensor.alert, sensor.temperature.is_some_and(|t| t > -40.0));

    let sensor = registry.set_temperature_threshold(sensor.id, None).await.unwrap();
    assert!(!sensor.alert);
}

#[tokio::test]
async fn test_missing_device_is_not_found() {
    let server = TestServer::start().await;
    let registry = server.signed_in().await;

    assert!(registry.get_device(9999).await.unwrap_err().is_not_found());
    assert!(registry.unassign_device(9999).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_foreign_home_is_forbidden() {
    let server = TestServer::start().await;
    let owner = server.signed_in().await;
    let (home, _) = kitchen(&owner).await;

    let intruder = server.registry();
    intruder
        .register(RegisterRequest {
            username: "mallory".to_string(),
            email: None,
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap();
    intruder
        .login(LoginRequest {
            username: "mallory".to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap();

    let err = intruder.delete_home(home.id).await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: Some(403), .. }));
    assert!(intruder.list_homes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_room_releases_devices() {
    let server = TestServer::start().await;
    let registry = server.signed_in().await;
    let (home, room) = kitchen(&registry).await;

    let fan = registry
        .create_device(
            CreateDeviceRequest::new("Stand Fan", DeviceType::Fan)
                .in_room(room.id)
                .on_network(LAN),
        )
        .await
        .unwrap();
    assert!(registry.discover_devices(LAN).await.unwrap().is_empty());

    registry.delete_room(room.id).await.unwrap();
    assert!(registry.list_rooms(home.id).await.unwrap().is_empty());

    let found = registry.discover_devices(LAN).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, fan.id);
    assert_eq!(found[0].room_id, None);

    let room = registry
        .create_room(CreateRoomRequest {
            home_id: home.id,
            name: "Porch".to_string(),
        })
        .await
        .unwrap();
    let fan = registry.assign_device(fan.id, room.id).await.unwrap();
    assert_eq!(fan.room_id, Some(room.id));
}
