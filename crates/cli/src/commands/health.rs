//! `pl-cli health`

use url::Url;

use super::{CliError, client};

/// Report whether the backend answers.
///
/// # Errors
///
/// Returns the backend error when it is unreachable or failing.
#[allow(clippy::print_stdout)]
pub async fn run(backend_url: &Url) -> Result<(), CliError> {
    let api = client(backend_url)?;
    api.ping().await?;
    println!("Backend at {backend_url} is reachable.");
    Ok(())
}
