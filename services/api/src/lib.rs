mod cli;
mod extract;
mod infra;
mod routes;
mod seed;
mod server;

use ecodata::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
