use crate::api::Mode;
use crate::args::{GetArgs, PostArgs};
use crate::commands::Out;
use crate::dispatch::{Dispatcher, Envelope};
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Result};
use anyhow::Context;

/// Runs one query request against the configured workbook. A failed request is not an error here:
/// the envelope says so.
pub async fn get(config: Config, mode: Mode, args: &GetArgs) -> Result<Out<Envelope>> {
    let dispatcher = Dispatcher::from_config(&config, mode)?;
    let envelope = dispatcher.query(args.action()).await;
    Ok(out(envelope))
}

/// Runs one command request, read from the JSON file in `args`, against the configured workbook.
pub async fn post(config: Config, mode: Mode, args: &PostArgs) -> Result<Out<Envelope>> {
    let body = utils::read(args.file())
        .await
        .context("Unable to read the request file")
        .pub_result(ErrorType::Request)?;
    let dispatcher = Dispatcher::from_config(&config, mode)?;
    let envelope = dispatcher.command(&body).await;
    Ok(out(envelope))
}

fn out(envelope: Envelope) -> Out<Envelope> {
    let message = if envelope.is_success() {
        "The request succeeded"
    } else {
        "The request failed"
    };
    Out::new(message, envelope)
}
