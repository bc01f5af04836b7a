use axum::http::{Method, StatusCode};
use homedeck_server::tests::{create_test_device, create_test_home, create_test_room};
use serde_json::json;

mod common;
use common::mock_app::MockApp;

const LAN: &str = "32:c5:1b:f7:65:fa";

#[tokio::test]
async fn test_create_room() {
    let app = MockApp::new().await.with_router();
    let home = create_test_home(app.storage.clone(), app.admin.id, "MyHome")
        .await
        .unwrap();

    let (status, room) = app
        .send(
            Method::POST,
            "/api/rooms",
            Some(json!({ "home_id": home.id, "name": "Kitchen" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["name"], json!("Kitchen"));
    assert_eq!(room["home_id"], json!(home.id));

    let (status, rooms) = app
        .send(Method::GET, &format!("/api/homes/{}/rooms", home.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().unwrap().len(), 1);
    assert_eq!(rooms[0]["id"], room["id"]);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/rooms",
            Some(json!({ "home_id": home.id, "name": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_room_in_foreign_home() {
    let app = MockApp::new().await.with_router();
    let (other, _) = app.create_other_user("neighbour").await;
    let home = create_test_home(app.storage.clone(), other.id, "Neighbour Home")
        .await
        .unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            "/api/rooms",
            Some(json!({ "home_id": home.id, "name": "Attic" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_room() {
    let app = MockApp::new().await.with_router();
    let home = create_test_home(app.storage.clone(), app.admin.id, "MyHome")
        .await
        .unwrap();
    let room = create_test_room(app.storage.clone(), home.id, "Bedroom")
        .await
        .unwrap();

    let (status, found) = app
        .send(Method::GET, &format!("/api/rooms/{}", room.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], json!("Bedroom"));
    assert_eq!(found["home_id"], json!(home.id));

    let (status, _) = app.send(Method::GET, "/api/rooms/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (other, _) = app.create_other_user("neighbour").await;
    let foreign_home = create_test_home(app.storage.clone(), other.id, "Neighbour Home")
        .await
        .unwrap();
    let attic = create_test_room(app.storage.clone(), foreign_home.id, "Attic")
        .await
        .unwrap();

    let (status, _) = app
        .send(Method::GET, &format!("/api/rooms/{}", attic.id), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_room() {
    let app = MockApp::new().await.with_router();
    let home = create_test_home(app.storage.clone(), app.admin.id, "MyHome")
        .await
        .unwrap();
    let room = create_test_room(app.storage.clone(), home.id, "Bedroom")
        .await
        .unwrap();

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/rooms/{}", room.id),
            Some(json!({ "name": "Guest Room" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], json!("Guest Room"));

    let (status, _) = app
        .send(Method::PUT, "/api/rooms/999", Some(json!({ "name": "Ghost" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_room_unassigns_devices() {
    let app = MockApp::new().await.with_router();
    let home = create_test_home(app.storage.clone(), app.admin.id, "MyHome")
        .await
        .unwrap();
    let room = create_test_room(app.storage.clone(), home.id, "Bedroom")
        .await
        .unwrap();
    let kept = create_test_room(app.storage.clone(), home.id, "Living Room")
        .await
        .unwrap();
    create_test_device(app.storage.clone(), Some(room.id), "Stand Fan", "FAN", LAN)
        .await
        .unwrap();
    create_test_device(app.storage.clone(), Some(kept.id), "Main Camera", "CAMERA", LAN)
        .await
        .unwrap();

    let (status, devices) = app
        .send(Method::GET, &format!("/api/rooms/{}/devices", room.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(devices.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/rooms/{}", room.id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, rooms) = app
        .send(Method::GET, &format!("/api/homes/{}/rooms", home.id), None)
        .await;
    assert_eq!(rooms.as_array().unwrap().len(), 1);
    assert_eq!(rooms[0]["name"], json!("Living Room"));

    let (status, devices) = app
        .send(Method::GET, &format!("/api/rooms/{}/devices", room.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(devices.as_array().unwrap().is_empty());

    let (_, found) = app
        .send(Method::GET, &format!("/api/devices/lan?bssid={LAN}"), None)
        .await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], json!("Stand Fan"));

    let (_, devices) = app
        .send(Method::GET, &format!("/api/rooms/{}/devices", kept.id), None)
        .await;
    assert_eq!(devices[0]["recording"], json!(true));
}
