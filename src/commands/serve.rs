use crate::api::Mode;
use crate::args::ServeArgs;
use crate::commands::Out;
use crate::dispatch::Dispatcher;
use crate::error::{ErrorType, IntoResult};
use crate::{server, Config, Result};
use std::sync::Arc;
use tracing::info;

/// Runs the HTTP API until the process is interrupted. The listen address from `args` wins over
/// the one in the config file.
pub async fn serve(config: Config, mode: Mode, args: &ServeArgs) -> Result<Out<()>> {
    let addr = args.listen().unwrap_or(config.listen_addr()).to_string();
    let dispatcher = Arc::new(Dispatcher::from_config(&config, mode)?);
    info!(
        "Serving the sheet {} ({mode:?} mode)",
        config.spreadsheet_id()
    );
    server::serve(dispatcher, &addr)
        .await
        .pub_result(ErrorType::Service)?;
    Ok("The server has stopped".into())
}
