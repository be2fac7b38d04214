//! Wire-to-domain conversions for the agent's command dispatch (§4.J,
//! §6). `agent-protocol` has no dependency on `delta` or `catalog`, so
//! this module is where their wire shapes meet the real types.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use agent_protocol::wire::{WireBlockSignature, WireDeltaOp, WireDeltaScript, WireSignature, WireStats};
use catalog::Stats;
use core::error::{Error, Result};
use delta::{BlockSignature, DeltaOp, DeltaOpBody, DeltaScript, Signature};
use hashcodec::hash::Sha256Digest;

/// Renders a computed baseline [`Signature`] as its wire form (§6).
pub fn signature_to_wire(signature: &Signature) -> WireSignature {
    WireSignature {
        file_size: signature.file_size,
        block_size: signature.block_size,
        block_count: signature.block_count(),
        file_hash: signature.file_hash.to_hex(),
        blocks: signature
            .blocks
            .iter()
            .map(|block| WireBlockSignature {
                num: block.block_index,
                weak_hash: block.weak_hash,
                strong_hash: block.strong_hash.to_hex(),
                size: block.size,
            })
            .collect(),
    }
}

/// Parses a [`WireDeltaScript`] into the domain [`DeltaScript`] the
/// pipeline applies, decoding base64 literals and hex strong hashes
/// along the way.
///
/// # Errors
///
/// Returns [`Error::ProtocolError`] if a literal's `data` is not valid
/// base64.
pub fn wire_to_delta_script(wire: &WireDeltaScript) -> Result<DeltaScript> {
    let ops = wire
        .ops
        .iter()
        .map(wire_op_to_delta_op)
        .collect::<Result<Vec<_>>>()?;
    Ok(DeltaScript {
        block_size: wire.block_size,
        ops,
    })
}

fn wire_op_to_delta_op(op: &WireDeltaOp) -> Result<DeltaOp> {
    match op {
        WireDeltaOp::Block { block_num, position } => Ok(DeltaOp {
            offset: *position,
            body: DeltaOpBody::Copy {
                block_index: *block_num,
            },
        }),
        WireDeltaOp::Data { data, position } => {
            let bytes = BASE64.decode(data).map_err(|err| Error::ProtocolError {
                reason: format!("delta literal is not valid base64: {err}"),
            })?;
            Ok(DeltaOp {
                offset: *position,
                body: DeltaOpBody::Literal { bytes },
            })
        }
    }
}

/// Copies `catalog::Stats` into its wire form; the two are field-for-field
/// identical, but `catalog` and `agent-protocol` never depend on each
/// other, so the agent binary is the only place that may know both.
pub fn stats_to_wire(stats: Stats) -> WireStats {
    WireStats {
        total_versions: stats.total_versions,
        total_paths: stats.total_paths,
        total_dedup_objects: stats.total_dedup_objects,
        dedup_store_bytes: stats.dedup_store_bytes,
        logical_bytes: stats.logical_bytes,
    }
}
