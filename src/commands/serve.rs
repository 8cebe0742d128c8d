use std::{io, net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    amqp::{listener::start_listener, Producer},
    api::health_checks::ok,
    app::App,
    config::Config,
    database::setup_database,
    environment::Environment,
    oauth2::ClientRegistry,
    password::PasswordEncoder,
    router::router,
};

pub async fn handle_serve_command(environment: Environment, config: Config) {
    let port = config.server.port;

    // Orchestrators only probe liveness while migrations run
    let liveness_server_task = tokio::spawn(start_liveness_server(port));

    let (db, migration_receiver) = match setup_database(&config.database).await {
        Ok(setup) => setup,
        Err(e) => {
            error!("❌ Failed to connect to the database: {}", e);
            liveness_server_task.abort();
            return;
        }
    };

    match migration_receiver.await {
        Ok(Ok(())) => {
            info!("✅ Database is ready!");
        }
        Ok(Err(e)) => {
            error!("❌ Database setup failed: {}", e);
            liveness_server_task.abort();
            return;
        }
        Err(_) => {
            error!("❌ Database setup channel closed unexpectedly");
            liveness_server_task.abort();
            return;
        }
    }

    let password_encoder = PasswordEncoder::new(environment.bcrypt_cost());

    let clients = match ClientRegistry::with_trusted_client(&password_encoder) {
        Ok(clients) => Arc::new(clients),
        Err(e) => {
            error!("❌ Failed to register the trusted client: {}", e);
            liveness_server_task.abort();
            return;
        }
    };

    let app = App {
        config: config.clone(),
        environment,
        db,
        producer: Producer::amqp(config.amqp.clone()),
        clients,
        password_encoder,
    };

    if config.amqp.listen {
        tokio::spawn(start_listener(config.amqp.clone()));
    } else {
        info!("Queue listener disabled");
    }

    liveness_server_task.abort();
    let _ = liveness_server_task.await;

    if let Err(e) = start_server(router(app), port).await {
        error!("❌ Server error: {}", e);
    }
}

async fn start_liveness_server(port: u16) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    let migration_router = Router::new().route("/liveness", get(ok));
    axum::serve(listener, migration_router).await
}

async fn start_server(router: Router, port: u16) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("🌐 Server starting on http://{}", addr);
    axum::serve(listener, router).await
}
