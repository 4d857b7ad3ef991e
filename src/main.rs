use std::{process::ExitCode, sync::Arc};

use anchorly::{
    build_api_route_filter, handle_rejection, CredentialService, InMemoryLinkRepository,
    InMemoryUserRepository, LinkService, Settings,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warp::Filter;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (auth_config, server_config) = match Settings::from_env()
        .and_then(|settings| Ok((settings.auth()?, settings.server())))
    {
        Ok(configs) => configs,
        Err(e) => {
            error!(error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let users = CredentialService::new(Arc::new(InMemoryUserRepository::new()), &auth_config);
    let links = LinkService::new(Arc::new(InMemoryLinkRepository::new()));

    let routes = build_api_route_filter(&users, &links)
        .recover(handle_rejection)
        .with(warp::trace::request());

    info!(addr = %server_config.addr, issuer = %auth_config.issuer, "listening");
    warp::serve(routes).run(server_config.addr).await;

    ExitCode::SUCCESS
}
