//! Integration tests: line-delimited JSON requests through the RPC engine.

use std::sync::Arc;

use feederhub::adapters::memory::MemorySampleStore;
use feederhub::config::SystemConfig;
use feederhub::rpc::engine::RpcEngine;
use serde_json::Value;

use super::mock_ports::Harness;

fn call(engine: &mut RpcEngine, h: &Harness, line: &str) -> Value {
    serde_json::from_str(&engine.dispatch(line.as_bytes(), &h.service)).unwrap()
}

fn setup() -> (RpcEngine, Harness) {
    let h = Harness::new();
    (RpcEngine::new(h.service.config()), h)
}

#[test]
fn ingest_returns_created() {
    let (mut e, h) = setup();
    let resp = call(
        &mut e,
        &h,
        r#"{"id":1,"op":"ingest","suhu":35.0,"pakan_cm":14.0,"waktu":"07:00"}"#,
    );
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["ok"], true);
    assert_eq!(resp["status"], 201);
    assert_eq!(resp["data"]["sample"]["id"], 1);
    assert_eq!(resp["data"]["alerts"][0], "combined");
    assert_eq!(resp["data"]["notified"][0], "combined");
}

#[test]
fn current_is_null_before_ingest() {
    let (mut e, h) = setup();
    let resp = call(&mut e, &h, r#"{"id":2,"op":"current"}"#);
    assert_eq!(resp["status"], 200);
    assert!(resp["data"].is_null());
    assert!(resp.get("error").is_none());
}

#[test]
fn errors_carry_kind_and_status() {
    let (mut e, h) = setup();

    let resp = call(&mut e, &h, r#"{"id":3,"op":"schedule_remove","time":"07:30"}"#);
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["status"], 404);
    assert_eq!(resp["error"]["kind"], "not_found");

    let resp = call(&mut e, &h, r#"{"id":4,"op":"schedule_add","jadwal":"7:30"}"#);
    assert_eq!(resp["status"], 400);
    assert_eq!(resp["error"]["kind"], "validation");

    let resp = call(&mut e, &h, r#"{"id":5,"op":"recent","hours":500}"#);
    assert_eq!(resp["status"], 400);

    let resp = call(&mut e, &h, r#"{"id":6,"op":"self_destruct"}"#);
    assert_eq!(resp["id"], 6);
    assert_eq!(resp["error"]["kind"], "bad_request");

    let resp = call(&mut e, &h, "not json");
    assert_eq!(resp["id"], 0);
    assert_eq!(resp["status"], 400);

    assert_eq!(e.rejected(), 5);
    assert_eq!(e.handled(), 0);
}

#[test]
fn schedule_round_trip_over_the_wire() {
    let (mut e, h) = setup();
    call(&mut e, &h, r#"{"op":"schedule_add","time":"18:00"}"#);
    call(&mut e, &h, r#"{"op":"schedule_add","time":"07:30"}"#);
    let resp = call(&mut e, &h, r#"{"op":"schedule_list"}"#);
    assert_eq!(resp["data"], serde_json::json!(["07:30", "18:00"]));
}

#[test]
fn feed_and_history() {
    let (mut e, h) = setup();
    let fed = call(&mut e, &h, r#"{"op":"feed"}"#);
    assert_eq!(fed["data"]["source"], "manual");
    let history = call(&mut e, &h, r#"{"op":"history"}"#);
    assert_eq!(history["data"].as_array().map(Vec::len), Some(1));
}

#[test]
fn split_frames_are_reassembled() {
    let (mut e, h) = setup();
    assert!(e.feed_bytes(br#"{"id":9,"op":"sch"#, &h.service).is_empty());
    let out = e.feed_bytes(b"edule_list\"}\n{\"id\":10,\"op\":\"current\"}\n", &h.service);
    assert_eq!(out.len(), 2);
    let first: Value = serde_json::from_str(&out[0]).unwrap();
    let second: Value = serde_json::from_str(&out[1]).unwrap();
    assert_eq!(first["id"], 9);
    assert_eq!(second["id"], 10);
}

#[test]
fn burst_over_limit_is_rejected() {
    let config = SystemConfig {
        rate_limit_per_sec: 1,
        rate_limit_burst: 3,
        ..SystemConfig::default()
    };
    let h = Harness::with(config.clone(), Arc::new(MemorySampleStore::new()));
    let mut e = RpcEngine::new(&config);

    for _ in 0..3 {
        assert_eq!(call(&mut e, &h, r#"{"op":"current"}"#)["status"], 200);
    }
    let resp = call(&mut e, &h, r#"{"id":42,"op":"current"}"#);
    assert_eq!(resp["status"], 429);
    assert_eq!(resp["id"], 42);
    assert_eq!(resp["error"]["kind"], "rate_limited");
}
