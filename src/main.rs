mod broadcast;
mod config;
mod frame;
mod routes;
mod services;
mod state;

use config::AppConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    let deck = services::map::build_deck(&config);
    tracing::info!(maps = deck.len(), dir = %config.maps_dir.display(), "deck loaded");

    let world = state::World::new(&config, deck);
    let state = state::AppState::new(config, world);

    let _render = services::render::spawn_render_task(state.clone());

    let port = state.config.port;
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("listener has no local addr");

    tracing::info!(port = addr.port(), "mapcast listening");
    if let Some(ip) = local_lan_ip() {
        tracing::info!("viewer page: http://{ip}:{}/", addr.port());
    }
    axum::serve(listener, app).await.expect("server failed");
}

/// Best-effort LAN address for the startup banner. Connecting a UDP
/// socket toward a public resolver picks the outbound interface without
/// sending any packets.
fn local_lan_ip() -> Option<std::net::IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let addr = socket.local_addr().ok()?;
    Some(addr.ip())
}
