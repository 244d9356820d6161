//! Turns requests into workbook operations and results into response envelopes.
//!
//! Requests come in two kinds. A query names its action in the query string (`test` or `getData`)
//! and a command is a JSON body with an `action` field (`sync`, `addMovimiento` or `addTarjeta`).
//! Every response is an `Envelope`, including failures: nothing here returns an error.

use crate::api::{self, Mode, StoreError, SHEET_NOT_FOUND};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{CardInstallment, FinanceData, Movement, SyncPayload};
use crate::workbook::{SyncResults, Workbook};
use crate::{Config, Result};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The message returned by the `test` action.
pub const API_MESSAGE: &str = "Mi Finanzas API v1.0";

/// The error returned for an unknown action.
pub const INVALID_ACTION: &str = "Acción no válida";

/// The error returned by `sync` when the request has no `data`.
pub const NO_DATA: &str = "No data provided";

/// The error returned by the add actions when the request has no `item`.
pub const NO_ITEM: &str = "No item provided";

/// The actions of a query request.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryAction {
    #[default]
    Test,
    GetData,
}

serde_plain::derive_display_from_serialize!(QueryAction);
serde_plain::derive_fromstr_from_deserialize!(QueryAction);

/// The actions of a command request.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandAction {
    #[default]
    Sync,
    AddMovimiento,
    AddTarjeta,
}

serde_plain::derive_display_from_serialize!(CommandAction);
serde_plain::derive_fromstr_from_deserialize!(CommandAction);

/// Parses an action name. A missing or empty name means the default action.
fn parse_action<A>(action: Option<&str>) -> Option<A>
where
    A: FromStr + Default,
{
    match action {
        None | Some("") => Some(A::default()),
        Some(name) => name.parse().ok(),
    }
}

/// The JSON body of a command request. The payload fields are kept as raw JSON until the action is
/// known.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommandBody {
    action: Option<String>,
    data: Option<Value>,
    item: Option<Value>,
}

/// The response to every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(flatten)]
    pub body: Body,
}

/// What a response carries besides `success`. Each variant becomes a single key of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Message(String),
    Data(Box<FinanceData>),
    Results(SyncResults),
    Row(usize),
    Error(String),
}

impl From<Body> for Envelope {
    fn from(body: Body) -> Self {
        Self {
            success: !matches!(body, Body::Error(_)),
            body,
        }
    }
}

impl Envelope {
    pub fn error(message: impl Into<String>) -> Self {
        Body::Error(message.into()).into()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Serves requests against a workbook, one at a time.
pub struct Dispatcher {
    workbook: Mutex<Workbook>,
}

impl Dispatcher {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook: Mutex::new(workbook),
        }
    }

    /// Creates a dispatcher for the workbook configured in `config`, using the store selected by
    /// `mode`.
    pub fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        let store = api::store(config, mode).pub_result(ErrorType::Store)?;
        Ok(Self::new(Workbook::new(store, config.sheets().clone())))
    }

    /// Handles a query request. `action` is the value of the `action` query parameter.
    pub async fn query(&self, action: Option<&str>) -> Envelope {
        let Some(action) = parse_action::<QueryAction>(action) else {
            warn!("Invalid query action {action:?}");
            return Envelope::error(INVALID_ACTION);
        };
        debug!("Query {action}");
        let mut workbook = self.workbook.lock().await;
        let result = match action {
            QueryAction::Test => Ok(Body::Message(API_MESSAGE.to_string())),
            QueryAction::GetData => workbook
                .get_data()
                .await
                .map(|data| Body::Data(Box::new(data))),
        };
        respond(result)
    }

    /// Handles a command request. `body` is the raw request body.
    pub async fn command(&self, body: &str) -> Envelope {
        let parsed = serde_json::from_str::<CommandBody>(body)
            .context("Unable to parse the request body");
        let request = match parsed {
            Ok(request) => request,
            Err(e) => return fail(e),
        };
        let Some(action) = parse_action::<CommandAction>(request.action.as_deref()) else {
            warn!("Invalid command action {:?}", request.action);
            return Envelope::error(INVALID_ACTION);
        };
        debug!("Command {action}");
        let mut workbook = self.workbook.lock().await;
        match action {
            CommandAction::Sync => {
                let payload = match payload::<SyncPayload>(request.data, "data") {
                    Ok(Some(payload)) => payload,
                    Ok(None) => return Envelope::error(NO_DATA),
                    Err(e) => return fail(e),
                };
                let results = workbook.sync(payload).await;
                info!("Sync finished");
                Body::Results(results).into()
            }
            CommandAction::AddMovimiento => {
                let movement = match payload::<Movement>(request.item, "item") {
                    Ok(Some(movement)) => movement,
                    Ok(None) => return Envelope::error(NO_ITEM),
                    Err(e) => return fail(e),
                };
                respond(workbook.add_movement(&movement).await.map(Body::Row))
            }
            CommandAction::AddTarjeta => {
                let card = match payload::<CardInstallment>(request.item, "item") {
                    Ok(Some(card)) => card,
                    Ok(None) => return Envelope::error(NO_ITEM),
                    Err(e) => return fail(e),
                };
                respond(workbook.add_card(&card).await.map(Body::Row))
            }
        }
    }
}

/// Deserializes a request field. Absent and `null` both give `None`.
fn payload<T>(value: Option<Value>, field: &str) -> Res<Option<T>>
where
    T: DeserializeOwned,
{
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .with_context(|| format!("Invalid '{field}' in the request")),
    }
}

fn respond(result: std::result::Result<Body, StoreError>) -> Envelope {
    match result {
        Ok(body) => body.into(),
        Err(StoreError::NotFound(table)) => {
            warn!("The sheet '{table}' does not exist");
            Envelope::error(SHEET_NOT_FOUND)
        }
        Err(StoreError::Backend(e)) => fail(e),
    }
}

fn fail(e: anyhow::Error) -> Envelope {
    warn!("Request failed: {e:#}");
    Envelope::error(format!("{e:#}"))
}
