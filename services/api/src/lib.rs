mod admin;
mod cli;
mod infra;
mod routes;
mod server;

use campaign_dialer::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
