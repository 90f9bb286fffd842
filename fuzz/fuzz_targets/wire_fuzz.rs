#![no_main]

//! Feed arbitrary bytes to the wire decoder: it must return an error or a
//! record, never panic or allocate proportionally to a forged size prefix.

use std::collections::HashMap;
use std::sync::OnceLock;

use autocodec::{FieldDescriptor, Record, RecordId, Registry, WireReader};
use libfuzzer_sys::fuzz_target;

struct Target {
    count: u32,
    name: String,
    tags: Vec<String>,
    weights: HashMap<String, f64>,
}

impl Record for Target {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::scalar("count", "count", |r| &r.count, |r, v| r.count = v),
            FieldDescriptor::scalar("name", "name", |r| &r.name, |r, v| r.name = v),
            FieldDescriptor::list("tags", "tags", |r| &r.tags, |r, v| r.tags = v),
            FieldDescriptor::map("weights", "weights", |r| &r.weights, |r, v| r.weights = v),
        ]
    }
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = Registry::new();
        registry.register_record_type::<Target, _>("fuzz:target".parse().expect("id"), |_| {
            Target {
                count: 0,
                name: String::new(),
                tags: Vec::new(),
                weights: HashMap::new(),
            }
        });
        registry
    })
}

fuzz_target!(|data: &[u8]| {
    let id: RecordId = "fuzz:case".parse().expect("id");
    let mut r = WireReader::new(data);
    let _ = registry().decode_wire::<Target>(id, &mut r);
});
