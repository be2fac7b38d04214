//! The agent protocol's command loop (§4.J, §5): one connection, one
//! command at a time, strictly request/response. This is where the
//! wire-only `agent-protocol` crate meets every domain crate the agent
//! depends on directly.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use agent_protocol::{read_frame, write_frame, Handshake, ProtocolError, Request, Response};
use catalog::Catalog;
use cipher::MasterKey;
use core::baseline::BaselineProvider;
use core::error::{Error, Result};
use core::timestamp::TimestampSource;
use logging::debug_log;
use pipeline::{Pipeline, PipelineOptions};

use crate::convert;

/// Runs the agent protocol loop to completion: emits the handshake, then
/// dispatches frames from `stdin` until the peer closes the transport.
///
/// # Errors
///
/// Returns any [`Error`] that is not recoverable as a response payload —
/// in practice only a transport I/O failure or [`Error::TransportClosed`]
/// once the peer goes away.
pub fn serve(
    catalog: &Catalog,
    backup_root: &Path,
    master_key: &MasterKey,
    options: PipelineOptions,
) -> Result<()> {
    let timestamps = TimestampSource::new();
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    write_frame(&mut writer, &Handshake::default()).map_err(protocol_io_to_core)?;

    loop {
        let request = match read_frame::<_, Request>(&mut reader) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug_log!(Protocol, 1, "transport closed, ending session");
                return Ok(());
            }
            Err(ProtocolError::Io(io_err)) => return Err(Error::Io(io_err)),
            Err(malformed) => {
                write_frame(&mut writer, &Response::unknown_command(malformed.to_string()))
                    .map_err(protocol_io_to_core)?;
                continue;
            }
        };

        debug_log!(Protocol, 1, "dispatching {:?}", request);
        let response = handle(catalog, backup_root, &timestamps, master_key, options, &request);
        write_frame(&mut writer, &response).map_err(protocol_io_to_core)?;
    }
}

/// Runs one command to a [`Response`], converting any domain error into
/// the `{"status":"error",...}` shape rather than propagating it — per
/// §7, a known command's failure is reported, not fatal (§4.J "Unknown
/// commands... do not close the connection").
fn handle(
    catalog: &Catalog,
    backup_root: &Path,
    timestamps: &TimestampSource,
    master_key: &MasterKey,
    options: PipelineOptions,
    request: &Request,
) -> Response {
    match dispatch(catalog, backup_root, timestamps, master_key, options, request) {
        Ok(response) => response,
        Err(err) => Response::error(err.to_string(), err.kind()),
    }
}

fn dispatch(
    catalog: &Catalog,
    backup_root: &Path,
    timestamps: &TimestampSource,
    master_key: &MasterKey,
    options: PipelineOptions,
    request: &Request,
) -> Result<Response> {
    match request {
        Request::Ping => Ok(Response::pong()),

        Request::SaveVersion { path, data } => {
            core::path::resolve_relative(backup_root, path)?;
            let bytes = BASE64.decode(data).map_err(|err| Error::ProtocolError {
                reason: format!("save_version payload is not valid base64: {err}"),
            })?;

            let mut temp = tempfile::NamedTempFile::new()?;
            temp.write_all(&bytes)?;
            let pipeline = Pipeline::new(catalog, backup_root, timestamps, Some(master_key), options);

            let _lock = catalog.try_lock()?;
            pipeline.save_version(path, temp.path())?;
            Ok(Response::ok_path(path.clone()))
        }

        Request::DeleteFile { path } => {
            core::path::resolve_relative(backup_root, path)?;
            let pipeline = Pipeline::new(catalog, backup_root, timestamps, Some(master_key), options);

            let _lock = catalog.try_lock()?;
            pipeline.delete_version(path)?;
            Ok(Response::ok_path(path.clone()))
        }

        Request::GetSignature { path } => {
            core::path::resolve_relative(backup_root, path)?;
            let pipeline = Pipeline::new(catalog, backup_root, timestamps, Some(master_key), options);

            match pipeline.materialize_latest(path) {
                Ok(baseline_path) => {
                    let signature =
                        compute_baseline_signature(&baseline_path).inspect_err(|_| {
                            let _ = std::fs::remove_file(&baseline_path);
                        })?;
                    let _ = std::fs::remove_file(&baseline_path);
                    Ok(Response::ok_signature(convert::signature_to_wire(&signature)))
                }
                Err(Error::NotFound { .. }) => Ok(Response::not_found()),
                Err(err) => Err(err),
            }
        }

        Request::SaveDelta { path, delta } => {
            core::path::resolve_relative(backup_root, path)?;
            let script = convert::wire_to_delta_script(delta)?;
            let pipeline = Pipeline::new(catalog, backup_root, timestamps, Some(master_key), options);

            let _lock = catalog.try_lock()?;
            pipeline.save_delta(path, &script)?;
            Ok(Response::ok_path(path.clone()))
        }

        Request::GetStats => {
            let stats = catalog.stats()?;
            Ok(Response::ok_stats(convert::stats_to_wire(stats)))
        }

        Request::Prune { path } => {
            let now_micros = now_micros();
            let _lock = catalog.try_lock()?;
            let pruned = match path {
                Some(path) => retention::prune_path(catalog, backup_root, path, now_micros)?
                    .retired
                    .len(),
                None => retention::prune_all(catalog, backup_root, now_micros)?
                    .iter()
                    .map(|report| report.retired.len())
                    .sum(),
            };
            Ok(Response::ok_pruned(pruned as u64))
        }

        Request::Gc => {
            let _lock = catalog.try_lock()?;
            let report = gc::collect(catalog, backup_root)?;
            Ok(Response::ok_message(format!(
                "removed {} objects ({} bytes reclaimed), repaired {} ref-count(s)",
                report.objects_removed, report.bytes_reclaimed, report.objects_repaired
            )))
        }
    }
}

fn compute_baseline_signature(baseline_path: &Path) -> Result<delta::Signature> {
    let file = File::open(baseline_path)?;
    delta::compute_signature(file, delta::DEFAULT_BLOCK_SIZE).map_err(Error::Io)
}

fn now_micros() -> i64 {
    i64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros(),
    )
    .unwrap_or(i64::MAX)
}

fn protocol_io_to_core(err: ProtocolError) -> Error {
    match err {
        ProtocolError::Io(io_err) => Error::Io(io_err),
        other => Error::ProtocolError {
            reason: other.to_string(),
        },
    }
}
