mod cli;
mod infra;
mod report;
mod routes;
mod server;

use care_match::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
