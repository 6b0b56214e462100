//! `/API/` handlers.
//!
//! Each handler reads the status snapshot or the saved settings and, for
//! commands, enqueues a message toward the owning actor. Malformed bodies
//! are client errors and leave no partial state behind.

use device_actors::Mailbox;
use device_config::SavedSettings;
use device_types::{ActuatorMessage, DeviceInfo, IndicatorMessage, StatusSnapshot};
use futures_util::FutureExt;
use paneld_web::{ApiHandler, ApiRequest, ApiResponse, Method, RouteTable};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

pub const KEY_MEMO: &str = "memo";
pub const KEY_SERVO_TRIM: &str = "servo_trim";

/// Everything the handlers may touch.
pub struct ApiContext {
    pub info: DeviceInfo,
    pub snapshot: StatusSnapshot,
    pub settings: SavedSettings,
    pub indicators: Mailbox<IndicatorMessage>,
    pub actuator: Mailbox<ActuatorMessage>,
}

/// Register the device API on a route table.
pub fn register_routes(table: &mut RouteTable, ctx: Arc<ApiContext>) {
    let c = Arc::clone(&ctx);
    let handler: ApiHandler = Arc::new(move |_req| {
        let c = Arc::clone(&c);
        async move { get_data(&c) }.boxed()
    });
    table.register(Method::GET, "get_data", handler);

    let c = Arc::clone(&ctx);
    let handler: ApiHandler = Arc::new(move |req| {
        let c = Arc::clone(&c);
        async move { set_data(&c, req).await }.boxed()
    });
    table.register(Method::POST, "set_data", handler);

    let c = Arc::clone(&ctx);
    let handler: ApiHandler = Arc::new(move |_req| {
        let c = Arc::clone(&c);
        async move { save(&c) }.boxed()
    });
    table.register(Method::POST, "save", handler);

    let c = Arc::clone(&ctx);
    let handler: ApiHandler = Arc::new(move |_req| {
        let c = Arc::clone(&c);
        async move { get_led(&c) }.boxed()
    });
    table.register(Method::GET, "get_led", handler);

    let c = Arc::clone(&ctx);
    let handler: ApiHandler = Arc::new(move |req| {
        let c = Arc::clone(&c);
        async move { set_led(&c, req).await }.boxed()
    });
    table.register(Method::POST, "set_led", handler);
}

fn get_data(ctx: &ApiContext) -> ApiResponse {
    let status = ctx.snapshot.load();
    let memo = ctx.settings.get(KEY_MEMO).unwrap_or_default();
    let servo_trim = ctx
        .settings
        .get(KEY_SERVO_TRIM)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);
    ApiResponse::json(serde_json::json!({
        "ip_address": status.ip_string(),
        "target": ctx.info.target,
        "cores": ctx.info.cores,
        "chip": ctx.info.chip,
        "revision": ctx.info.revision,
        "flash": ctx.info.flash_mb,
        "memo": memo,
        "servo_trim": servo_trim,
    }))
}

async fn set_data(ctx: &ApiContext, req: ApiRequest) -> ApiResponse {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(&req.body) else {
        return ApiResponse::client_error("malformed JSON body");
    };

    if let Some(memo) = body.get(KEY_MEMO) {
        let Some(memo) = memo.as_str() else {
            return ApiResponse::client_error("memo must be a string");
        };
        info!(memo = %memo, "memo updated");
        ctx.settings.set(KEY_MEMO, memo);
        return ApiResponse::empty();
    }

    if let Some(trim) = body.get(KEY_SERVO_TRIM) {
        let Some(trim) = trim.as_f64() else {
            return ApiResponse::client_error("servo_trim must be a number");
        };
        if ctx.actuator.send(ActuatorMessage::SetTrim(trim)).await.is_err() {
            return ApiResponse::server_error("actuator unavailable");
        }
        ctx.settings.set(KEY_SERVO_TRIM, &trim.to_string());
        return ApiResponse::empty();
    }

    ApiResponse::client_error("expected memo or servo_trim")
}

fn save(ctx: &ApiContext) -> ApiResponse {
    match ctx.settings.save() {
        Ok(()) => ApiResponse::empty(),
        Err(e) => {
            error!(error = %e, "failed to persist settings");
            ApiResponse::server_error("failed to persist settings")
        }
    }
}

fn get_led(ctx: &ApiContext) -> ApiResponse {
    let status = ctx.snapshot.load();
    ApiResponse::json(serde_json::json!({ "led": status.led }))
}

#[derive(Deserialize)]
struct LedBody {
    led: [bool; 4],
}

async fn set_led(ctx: &ApiContext, req: ApiRequest) -> ApiResponse {
    let Ok(body) = serde_json::from_slice::<LedBody>(&req.body) else {
        return ApiResponse::client_error("expected led array of four booleans");
    };
    if ctx
        .indicators
        .send(IndicatorMessage::SetBank(body.led))
        .await
        .is_err()
    {
        return ApiResponse::server_error("indicators unavailable");
    }
    ApiResponse::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::ActuatorActor;
    use crate::indicator::IndicatorActor;
    use bytes::Bytes;
    use device_actors::{mailbox, spawn};
    use device_hal::sim::{SimIndicators, SimPulse};
    use std::time::Duration;

    struct Fixture {
        table: RouteTable,
        snapshot: StatusSnapshot,
        settings: SavedSettings,
        _dir: tempfile::TempDir,
    }

    /// Real indicator/actuator actors on simulated hardware behind the
    /// API context.
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = StatusSnapshot::new();
        let settings = SavedSettings::new();
        settings.attach(dir.path());

        let (bank, _bank_control) = SimIndicators::new();
        let (indicator_tx, indicator_rx) = mailbox("indicator", 8);
        spawn(IndicatorActor::new(Box::new(bank), snapshot.clone()), indicator_rx);

        let (pulse, _pulse_control) = SimPulse::new();
        let (actuator_tx, actuator_rx) = mailbox("actuator", 8);
        spawn(ActuatorActor::new(Box::new(pulse)), actuator_rx);

        let mut table = RouteTable::new();
        register_routes(
            &mut table,
            Arc::new(ApiContext {
                info: DeviceInfo::simulated(),
                snapshot: snapshot.clone(),
                settings: settings.clone(),
                indicators: indicator_tx,
                actuator: actuator_tx,
            }),
        );
        Fixture {
            table,
            snapshot,
            settings,
            _dir: dir,
        }
    }

    async fn call(table: &RouteTable, method: Method, path: &str, body: &str) -> ApiResponse {
        let handler = table
            .resolve(&method, path)
            .unwrap_or_else(|| panic!("no route for {path}"));
        handler(ApiRequest {
            method,
            path: path.to_string(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        })
        .await
    }

    fn body_json(response: &ApiResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[tokio::test]
    async fn led_round_trip() {
        let fx = fixture();
        let response = call(
            &fx.table,
            Method::POST,
            "set_led",
            r#"{"led":[true,false,true,false]}"#,
        )
        .await;
        assert_eq!(response.status, 200);

        // The bank state lands in the snapshot once the indicator actor
        // has applied it.
        for _ in 0..100 {
            if fx.snapshot.load().led == [true, false, true, false] {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let response = call(&fx.table, Method::GET, "get_led", "").await;
        assert_eq!(
            body_json(&response),
            serde_json::json!({"led": [true, false, true, false]})
        );
    }

    #[tokio::test]
    async fn set_led_rejects_malformed_bodies() {
        let fx = fixture();
        for body in [r#"{"led":[true,false]}"#, r#"{"led":"on"}"#, "junk"] {
            let response = call(&fx.table, Method::POST, "set_led", body).await;
            assert_eq!(response.status, 400, "body {body:?} should be rejected");
        }
        assert_eq!(fx.snapshot.load().led, [false; 4]);
    }

    #[tokio::test]
    async fn memo_set_save_reload_round_trip() {
        let fx = fixture();
        let response = call(&fx.table, Method::POST, "set_data", r#"{"memo":"hello"}"#).await;
        assert_eq!(response.status, 200);
        let response = call(&fx.table, Method::POST, "save", "").await;
        assert_eq!(response.status, 200);

        // A reload of the saved settings sees the persisted memo.
        let reloaded = SavedSettings::new();
        reloaded.attach(fx._dir.path());
        assert_eq!(reloaded.get("memo").as_deref(), Some("hello"));

        let response = call(&fx.table, Method::GET, "get_data", "").await;
        let data = body_json(&response);
        assert_eq!(data["memo"], "hello");
        assert_eq!(data["target"], "sim");
        assert_eq!(data["ip_address"], "");
    }

    #[tokio::test]
    async fn servo_trim_is_stored_and_reported() {
        let fx = fixture();
        let response = call(&fx.table, Method::POST, "set_data", r#"{"servo_trim":-2.5}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(fx.settings.get(KEY_SERVO_TRIM).as_deref(), Some("-2.5"));

        let response = call(&fx.table, Method::GET, "get_data", "").await;
        assert_eq!(body_json(&response)["servo_trim"], -2.5);
    }

    #[tokio::test]
    async fn set_data_rejects_unknown_and_wrong_typed_fields() {
        let fx = fixture();
        for body in [
            r#"{"memo":7}"#,
            r#"{"servo_trim":"lots"}"#,
            r#"{"other":1}"#,
            "not json",
        ] {
            let response = call(&fx.table, Method::POST, "set_data", body).await;
            assert_eq!(response.status, 400, "body {body:?} should be rejected");
        }
        assert_eq!(fx.settings.get(KEY_MEMO), None);
    }

    #[tokio::test]
    async fn save_without_medium_is_a_server_error() {
        let fx = fixture();
        // Detached store: like saving after the medium vanished.
        let detached = SavedSettings::new();
        let mut table = RouteTable::new();
        register_routes(
            &mut table,
            Arc::new(ApiContext {
                info: DeviceInfo::simulated(),
                snapshot: fx.snapshot.clone(),
                settings: detached,
                indicators: mailbox("indicator", 8).0,
                actuator: mailbox("actuator", 8).0,
            }),
        );
        let response = call(&table, Method::POST, "save", "").await;
        assert_eq!(response.status, 500);
    }
}
