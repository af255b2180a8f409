//! gekko-eval - call a guest function in a GameCube/Wii RAM image
//!
//! Usage: `gekko-eval <ram-image> <entry> [gpr-arg ...]`
//!
//! Numbers are decimal or `0x`-prefixed hex. The outcome and the final
//! register snapshot are printed as JSON.

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ge_core::config::Config;
use ge_memory::{BufferProvider, MemoryProvider};
use ge_ppc::{CallResult, CallWorker, FunctionCall, InterpreterContext};
use serde_json::json;

fn parse_u32(text: &str) -> Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("'{text}' is not a 32-bit number"))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("Usage: {} <ram-image> <entry> [gpr-arg ...]", args[0]);
    }

    let config = Config::load().context("Failed to load configuration")?;
    ge_core::logging::init(&config);

    let image_path = &args[1];
    let entry = parse_u32(&args[2])?;
    let gpr_args = args[3..]
        .iter()
        .map(|arg| parse_u32(arg))
        .collect::<Result<Vec<_>>>()?;

    let image = fs::read(image_path).with_context(|| format!("Failed to read {image_path}"))?;
    tracing::info!("Loaded {} ({} bytes)", image_path, image.len());

    let provider = BufferProvider::from_bytes(image);
    if provider.size() < config.memory.ram_size as usize {
        provider.resize(config.memory.ram_size as usize);
    }

    let ctx = InterpreterContext::new(Arc::new(provider), config);
    let worker = CallWorker::spawn(&ctx).context("Failed to start call worker")?;
    let result = worker
        .call(&FunctionCall::new(entry).args(&gpr_args))
        .context("Call failed")?;

    let outcome = match &result {
        CallResult::Completed { .. } => json!({ "outcome": "completed" }),
        CallResult::Faulted {
            cause, address, pc, ..
        } => json!({
            "outcome": "faulted",
            "cause": cause.to_string(),
            "address": format!("0x{address:08x}"),
            "pc": format!("0x{pc:08x}"),
        }),
        CallResult::Invalid { reason, pc, .. } => json!({
            "outcome": "invalid",
            "reason": reason,
            "pc": format!("0x{pc:08x}"),
        }),
    };

    let report = json!({ "result": outcome, "registers": result.snapshot() });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode result")?
    );
    Ok(())
}
