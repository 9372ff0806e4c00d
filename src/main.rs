//! # RESTer - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa el logging, registra las rutas de
//! demostración y arranca el servidor. Un template inválido, una
//! configuración inválida o un bind fallido terminan el proceso con código 1.

use rester::commands;
use rester::config::Config;
use rester::router::Router;
use rester::server::Server;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    // Bloquea el thread principal mientras sirve
    if let Err(e) = run(config) {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}

/// Registra las rutas y arranca el servidor
fn run(config: Config) -> rester::Result<()> {
    let mut router = Router::new();
    commands::register_demo_routes(&mut router)?;

    Server::new(config, router).run()
}
