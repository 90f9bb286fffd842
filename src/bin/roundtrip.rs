//! Round-trip a JSON record document through the codec.
//!
//! Usage:
//!   roundtrip [OPTIONS] FILE.json
//!
//! Registers a demonstration record type (`demo:blend`), decodes FILE.json
//! into it, re-encodes the instance to wire bytes, and prints a hex dump.
//!
//! Options:
//!   --human, -H  Human-readable output (kind tag, pretty-printed record)
//!
//! Example document:
//!   {"mix": {"strength": 3}, "solvents": ["water"], "ratios": {"water": 0.8}}

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use autocodec::{FieldDescriptor, Record, RecordId, Registry, WireWriter};

#[derive(Debug)]
struct Blend {
    id: RecordId,
    strength: i32,
    solvents: Vec<String>,
    ratios: HashMap<String, f64>,
}

impl Record for Blend {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::scalar("strength", "mix/strength", |r| &r.strength, |r, v| {
                r.strength = v
            }),
            FieldDescriptor::list("solvents", "solvents", |r: &Blend| &r.solvents, |r, v| {
                r.solvents = v
            })
            .optional(),
            FieldDescriptor::map("ratios", "ratios", |r: &Blend| &r.ratios, |r, v| r.ratios = v)
                .optional(),
        ]
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let human = if let Some(pos) = args.iter().position(|a| a == "--human" || a == "-H") {
        args.remove(pos);
        true
    } else {
        false
    };
    let path = match args.as_slice() {
        [p] => p.clone(),
        _ => bail!("usage: roundtrip [--human] FILE.json"),
    };

    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let root: serde_json::Value = serde_json::from_str(&text).context("parsing json")?;

    let mut registry = Registry::new();
    let handle = registry.register_record_type::<Blend, _>("demo:blend".parse()?, |id| Blend {
        id,
        strength: 0,
        solvents: Vec::new(),
        ratios: HashMap::new(),
    });

    let blend: Blend = registry.decode_text("demo:from-file".parse()?, &root)?;

    let mut w = WireWriter::new();
    registry.encode_wire(&blend, &mut w)?;
    let bytes = w.into_bytes();

    if human {
        println!("record kind: {}", handle.kind());
        println!("decoded: {blend:#?}");
        println!("wire form ({} bytes):", bytes.len());
    } else {
        println!("{blend:?}");
    }
    print_hex(&bytes);
    Ok(())
}

fn print_hex(bytes: &[u8]) {
    for chunk in bytes.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("  {}", hex.join(" "));
    }
}
