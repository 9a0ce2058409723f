mod common;

use actix_web::{App, test};
use serde_json::{Value, json};
use wgpanel_api::app_config;

use common::{ScriptedRunner, TestEnv, VALID_WG, auth_cookie};

#[actix_web::test]
async fn save_then_load_round_trips() {
    let env = TestEnv::new();
    let state = env.state(ScriptedRunner::new());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::post()
        .uri("/api/save_config")
        .cookie(cookie.clone())
        .set_json(json!({ "config": VALID_WG }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(std::fs::read_to_string(env.wg_config()).unwrap(), VALID_WG);

    let req = test::TestRequest::get()
        .uri("/api/load_config")
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["config"], VALID_WG);
    assert_eq!(
        body["message"],
        format!("Configuration loaded from {}", env.wg_config().display())
    );
}

#[actix_web::test]
async fn load_missing_config_is_not_found() {
    let env = TestEnv::new();
    let state = env.state(ScriptedRunner::new());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::get()
        .uri("/api/load_config")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Configuration file not found");
}

#[actix_web::test]
async fn invalid_configs_are_rejected() {
    let env = TestEnv::new();
    let state = env.state(ScriptedRunner::new());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let cases = [
        (json!({}), 400, "No configuration data provided"),
        (
            json!({ "config": "[Peer]\nPublicKey = a\n[Interface]\nPrivateKey = b\n" }),
            400,
            "Invalid WireGuard configuration format. Must contain [Interface] and [Peer] sections.",
        ),
        (
            json!({ "config": "[Interface]\nPrivateKey = a\n[Peer]\nEndpoint = x:1\n" }),
            400,
            "Configuration must contain PrivateKey in [Interface] and PublicKey in [Peer] sections.",
        ),
    ];

    for (payload, status, message) in cases {
        let req = test::TestRequest::post()
            .uri("/api/save_config")
            .cookie(cookie.clone())
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), status);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], message);
    }
    assert!(!env.wg_config().exists());
}

#[actix_web::test]
async fn malformed_json_is_a_validation_error() {
    let env = TestEnv::new();
    let state = env.state(ScriptedRunner::new());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::post()
        .uri("/api/save_config")
        .cookie(cookie)
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "success": false, "message": "Invalid request body" }));
}

#[actix_web::test]
async fn start_without_config_runs_nothing() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    let state = env.state(runner.clone());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::post()
        .uri("/api/toggle")
        .cookie(cookie)
        .set_json(json!({ "action": "start" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    assert!(runner.calls().is_empty());
}

#[actix_web::test]
async fn start_twice_is_idempotent() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.wg_config().parent().unwrap()).unwrap();
    std::fs::write(env.wg_config(), VALID_WG).unwrap();

    let runner = ScriptedRunner::new();
    runner
        .on("wg-quick up wg0", 0, "[#] ip link add wg0 type wireguard")
        .on("wg-quick up wg0", 1, "wg-quick: `wg0' already exists");
    let state = env.state(runner.clone());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let toggle = || {
        test::TestRequest::post()
            .uri("/api/toggle")
            .cookie(cookie.clone())
            .set_json(json!({ "action": "start" }))
            .to_request()
    };

    let first: Value = test::call_and_read_body_json(&app, toggle()).await;
    assert_eq!(first["message"], "WireGuard started successfully");
    let second: Value = test::call_and_read_body_json(&app, toggle()).await;
    assert_eq!(second["success"], true);
    assert_eq!(second["message"], "WireGuard is already running");
    assert_eq!(runner.calls(), vec!["wg-quick up wg0", "wg-quick up wg0"]);
}

#[actix_web::test]
async fn stop_reports_already_stopped_and_failures() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    runner
        .on("wg-quick down wg0", 1, "wg-quick: `wg0' is not a WireGuard interface")
        .on("wg-quick down wg0", 1, "RTNETLINK answers: Operation not permitted");
    let state = env.state(runner);
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let stop = || {
        test::TestRequest::post()
            .uri("/api/toggle")
            .cookie(cookie.clone())
            .set_json(json!({ "action": "stop" }))
            .to_request()
    };

    let body: Value = test::call_and_read_body_json(&app, stop()).await;
    assert_eq!(body["message"], "WireGuard is already stopped");

    let resp = test::call_service(&app, stop()).await;
    assert_eq!(resp.status(), 502);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "Failed to stop WireGuard: RTNETLINK answers: Operation not permitted"
    );
}

#[actix_web::test]
async fn toggle_rejects_bad_action_and_method() {
    let env = TestEnv::new();
    let state = env.state(ScriptedRunner::new());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::post()
        .uri("/api/toggle")
        .cookie(cookie.clone())
        .set_json(json!({ "action": "restart" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], r#"Invalid action. Use "start" or "stop"."#);

    let req = test::TestRequest::get()
        .uri("/api/toggle")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 405);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "success": false, "message": "Method not allowed" }));
}

#[actix_web::test]
async fn wrong_method_without_session_is_unauthenticated() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    let app = test::init_service(App::new().configure(app_config(env.state(runner.clone())))).await;

    let req = test::TestRequest::get().uri("/api/toggle").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert!(runner.calls().is_empty());
}

#[actix_web::test]
async fn status_reports_interface_and_handshake() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    runner
        .on(
            "ip link show wg0",
            0,
            "5: wg0: <POINTOPOINT,NOARP,UP,LOWER_UP> mtu 1420 qdisc noqueue state UNKNOWN",
        )
        .on(
            "wg show wg0",
            0,
            "interface: wg0\n  listening port: 51820\n\npeer: xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=\n  latest handshake: 1 minute, 4 seconds ago\n  transfer: 1.2 KiB received, 3.4 KiB sent",
        );
    let state = env.state(runner);
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::get()
        .uri("/api/status")
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["isActive"], true);
    assert_eq!(body["details"]["interface_up"], true);
    assert_eq!(body["details"]["recent_handshake"], true);
    assert_eq!(body["details"]["last_handshake"], "1 minute, 4 seconds ago");
    assert!(body["details"]["peer_info"].as_str().unwrap().contains("peer:"));
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn status_when_down() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    runner
        .on("ip link show wg0", 1, "Device \"wg0\" does not exist.")
        .on("wg show wg0", 1, "Unable to access interface: No such device");
    let state = env.state(runner);
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::get()
        .uri("/api/status")
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], false);
    assert_eq!(body["details"]["wg_running"], false);
    assert!(body["details"]["peer_info"].is_null());
}

#[actix_web::test]
async fn status_survives_hung_commands() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::new();
    runner.hang("ip link show wg0").hang("wg show wg0");
    let state = env.state(runner.clone());
    let cookie = auth_cookie(&state);
    let app = test::init_service(App::new().configure(app_config(state))).await;

    let req = test::TestRequest::get()
        .uri("/api/status")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["isActive"], false);
    assert_eq!(body["details"]["interface_up"], false);
    assert_eq!(body["details"]["wg_running"], false);
    assert_eq!(runner.calls(), vec!["ip link show wg0", "wg show wg0"]);
}
