use crate::args::InitArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its secrets subdirectory and an initial `config.json` file using the
/// sheet URL from `args` along with default settings. If `args` names a token file, it is moved to
/// its default location in the secrets directory.
///
/// # Errors
/// - Returns an error if the sheet URL is invalid or any file operations fail.
pub async fn init(finanzas_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(
        finanzas_home,
        args.sheet_url(),
        args.token_file(),
        args.listen(),
    )
    .await
    .context("Unable to create the data directory and configs")
    .pub_result(ErrorType::Config)?;
    if !config.token_path().is_file() {
        return Ok(format!(
            "Created {}. Put an OAuth access token for the Sheets API in {} before serving",
            config.config_path().display(),
            config.token_path().display()
        )
        .into());
    }
    Ok(format!("Created {}", config.config_path().display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_without_token() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("finanzas");
        let args = InitArgs::new(
            "https://docs.google.com/spreadsheets/d/abc/edit",
            None,
            Some("0.0.0.0:9999".to_string()),
        );
        let out = init(&home, &args).await.unwrap();
        assert!(out.message().contains("token"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:9999");
    }

    #[tokio::test]
    async fn test_init_bad_url_is_config_error() {
        let dir = TempDir::new().unwrap();
        let args = InitArgs::new("https://example.com", None, None);
        let err = init(dir.path(), &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
