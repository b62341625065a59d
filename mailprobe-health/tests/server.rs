#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use mailprobe_common::Signal;
use mailprobe_health::{HealthChecker, HealthConfig, HealthError, HealthServer};
use mailprobe_metrics::ProbeMetrics;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::broadcast,
};

fn config(listen_address: &str) -> HealthConfig {
    HealthConfig {
        listen_address: listen_address.to_string(),
        ..HealthConfig::default()
    }
}

async fn request(address: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream
        .write_all(format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").as_bytes())
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn serves_until_signalled() {
    let checker = Arc::new(HealthChecker::new());
    let server = HealthServer::new(
        &config("127.0.0.1:0"),
        Arc::clone(&checker),
        Arc::new(ProbeMetrics::new().unwrap()),
    )
    .await
    .unwrap();
    let address = server.local_addr().unwrap();

    let (shutdown, receiver) = broadcast::channel(1);
    let handle = tokio::spawn(server.serve(receiver));

    assert!(request(address, "/health/live").await.starts_with("HTTP/1.1 200"));
    assert!(request(address, "/health/ready").await.starts_with("HTTP/1.1 503"));

    checker.set_monitors_running(1);
    assert!(request(address, "/health/ready").await.starts_with("HTTP/1.1 200"));

    shutdown.send(Signal::Shutdown).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn occupied_address_fails_to_bind() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = taken.local_addr().unwrap().to_string();

    let result = HealthServer::new(
        &config(&address),
        Arc::new(HealthChecker::new()),
        Arc::new(ProbeMetrics::new().unwrap()),
    )
    .await;

    assert!(matches!(result, Err(HealthError::Bind { address: reported, .. }) if reported == address));
}
