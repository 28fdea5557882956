// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use axum_server::tls_rustls::RustlsConfig;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use authx::{
    api::router,
    auth::{AuthorizationConfig, AuthorizationConfigError, UserInterceptor},
    authx::{Authx, AuthxSettings},
    config::{Config, ConfigError, LogFormat, ProviderBackend, TlsPaths},
    inventory::{CaLoadError, CertificateMinter, JoinTokenService},
    password::Password,
    state::AppState,
    storage::{Backend, Providers, StoreError, TtlSweeper},
};

/// Time in-flight requests get to finish after a shutdown signal.
const GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to load CA: {0}")]
    Ca(#[from] CaLoadError),
    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationConfigError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serve on {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    init_tracing(config.as_ref().map(|c| c.debug).unwrap_or(false));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => {
            info!("authx stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "authx failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info,tower_http=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);
    match LogFormat::from_env() {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    info!(?config, "starting authx");

    let minter = CertificateMinter::from_files(&config.ca_cert_path, &config.ca_private_key_path)?;
    let management_ca = std::fs::read_to_string(&config.management_cluster_cert_path).map_err(
        |source| StartupError::Read {
            path: config.management_cluster_cert_path.display().to_string(),
            source,
        },
    )?;

    let backend = match config.provider_backend {
        ProviderBackend::Memory => Backend::memory(),
        ProviderBackend::Persistent => Backend::open_persistent(&config.database_path())?,
    };
    let providers = Providers::new(backend)?;
    info!(backend = providers.backend.name(), "providers ready");

    let authx = Authx::new(
        providers.clone(),
        AuthxSettings {
            jwt_secret: config.jwt_secret.clone(),
            expiration_secs: config.expiration_secs,
            device_expiration_secs: config.device_expiration_secs,
            password: Password::default(),
        },
    );
    let join_tokens = JoinTokenService::new(
        providers.join_tokens.clone(),
        management_ca,
        config.join_expiration_secs,
    );

    let interceptor = match &config.authorization_config_path {
        Some(path) => {
            let authorization = AuthorizationConfig::from_file(path)?;
            Some(UserInterceptor::new(authorization, config.jwt_secret.as_bytes()))
        }
        None => {
            warn!("no authorization config, RPC surface is unguarded");
            None
        }
    };

    let app = router(AppState::new(authx, join_tokens, minter), interceptor);

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(TtlSweeper::new(providers).run(shutdown.clone()));

    let addr = config.bind_addr()?;
    let served = match &config.tls {
        Some(tls) => serve_tls(addr, tls, app, shutdown.clone()).await,
        None => serve_plain(addr, app, shutdown.clone()).await,
    };

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "ttl sweeper did not stop cleanly");
    }
    served
}

async fn serve_plain(
    addr: SocketAddr,
    app: axum::Router,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Serve { addr, source })?;
    info!(%addr, "authx listening on http (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|source| StartupError::Serve { addr, source })
}

async fn serve_tls(
    addr: SocketAddr,
    tls: &TlsPaths,
    app: axum::Router,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    // Install the ring crypto provider for rustls before any TLS operation.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }
    let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .map_err(|source| StartupError::Read {
            path: tls.cert.display().to_string(),
            source,
        })?;

    let handle = axum_server::Handle::new();
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal(shutdown).await;
        signal_handle.graceful_shutdown(Some(GRACE_PERIOD));
    });

    info!(%addr, "authx listening on https (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|source| StartupError::Serve { addr, source })
}

/// Resolves on Ctrl-C or SIGTERM, or once `shutdown` is cancelled elsewhere.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
        () = shutdown.cancelled() => {}
    }
    shutdown.cancel();
}
