//! Newline-delimited JSON transport for catalog RPC messages.
//!
//! Request and response objects use the NestJS microservice envelope, but
//! frames are one JSON object per line rather than Nest's `<len>#<json>`
//! framing, so stock Nest TCP clients need a line-based adapter.
//!
//! # Responsibility
//! - Accept TCP clients and read one request object per line.
//! - Route each request through `RpcDispatcher` against the shared store.
//! - Write exactly one response line per non-blank request line.
//!
//! # Invariants
//! - The store connection is held by one request at a time.
//! - A failing request never terminates its client connection.

use anyhow::{Context, Result};
use catalog_core::{
    CatalogError, ProductCatalog, RpcDispatcher, RpcError, SqliteProductRepository,
};
use log::{debug, info, warn};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Process-wide store handle shared by client threads.
pub type SharedStore = Arc<Mutex<Connection>>;

#[derive(Debug, Deserialize)]
struct Pattern {
    cmd: String,
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    pattern: Pattern,
    #[serde(default)]
    data: Value,
}

/// Accepts clients until the listener fails, one thread per client.
pub fn serve(listener: TcpListener, store: SharedStore) -> Result<()> {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!("event=client_accept module=server status=error error={err}");
                continue;
            }
        };

        let store = Arc::clone(&store);
        thread::Builder::new()
            .name("catalog-client".to_string())
            .spawn(move || handle_client(stream, &store))
            .context("failed to spawn client thread")?;
    }

    Ok(())
}

fn handle_client(stream: TcpStream, store: &Mutex<Connection>) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    info!("event=client_connect module=server status=ok peer={peer}");

    if let Err(err) = pump(stream, store) {
        warn!("event=client_io module=server status=error peer={peer} error={err:#}");
    }

    info!("event=client_disconnect module=server status=ok peer={peer}");
}

fn pump(stream: TcpStream, store: &Mutex<Connection>) -> Result<()> {
    let reader = BufReader::new(stream.try_clone().context("failed to clone stream")?);
    let mut writer = BufWriter::new(stream);

    for line in reader.lines() {
        let line = line.context("failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(store, &line);
        writeln!(writer, "{response}").context("failed to write response")?;
        writer.flush().context("failed to flush response")?;
    }

    Ok(())
}

/// Handles one request line and returns the response envelope.
pub fn handle_line(store: &Mutex<Connection>, line: &str) -> Value {
    let request: RpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            debug!("event=request_decode module=server status=error error={err}");
            let err = RpcError::InvalidPayload(format!("malformed request: {err}"));
            return failure(Value::Null, &err);
        }
    };

    match execute(store, &request.pattern.cmd, request.data) {
        Ok(response) => json!({
            "id": request.id,
            "response": response,
            "isDisposed": true,
        }),
        Err(err) => failure(request.id, &err),
    }
}

fn execute(store: &Mutex<Connection>, command: &str, data: Value) -> Result<Value, RpcError> {
    // Poisoning is ignored: SQLite statements are atomic on their own.
    let conn = store.lock().unwrap_or_else(PoisonError::into_inner);
    let repo = SqliteProductRepository::try_new(&conn).map_err(CatalogError::from)?;
    let dispatcher = RpcDispatcher::new(ProductCatalog::new(repo));
    dispatcher.dispatch(command, data)
}

fn failure(id: Value, err: &RpcError) -> Value {
    json!({
        "id": id,
        "err": err.to_body(),
        "isDisposed": true,
    })
}
