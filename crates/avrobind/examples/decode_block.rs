//! Builds a container block of packet records, compresses it with every
//! codec, then decodes it back record by record.
//!
//! Usage: cargo run --example decode_block [record-count]

use avrobind::{
    record, resolve_codec, CodecName, Decoder, RecordDef, Schema, SchemaDef, Timestamp, Value,
    Writer,
};
use avrobind::codec::write_value;

#[derive(Debug, Default)]
struct Packet {
    length: i32,
    action: String,
    at: Timestamp,
}

record! {
    Packet {
        length: "length",
        action: "action",
        at: "timestamp",
    }
}

fn main() {
    let count: usize = std::env::args()
        .nth(1)
        .map(|n| n.parse().expect("record count must be a number"))
        .unwrap_or(1_000);

    let schema = Schema::new(
        RecordDef::new("packet")
            .field("payload", SchemaDef::BYTES)
            .field("length", SchemaDef::INT)
            .field("action", SchemaDef::STRING)
            .field("timestamp", SchemaDef::LONG.logical("timestamp-millis")),
    )
    .expect("Failed to build schema");

    let mut writer = Writer::new();
    for i in 0..count {
        let value = Value::record([
            ("payload", Value::Bytes(vec![(i % 251) as u8; 64])),
            ("length", Value::Int(64)),
            ("action", Value::from(if i % 3 == 0 { "STS_DROP" } else { "STS_ACCEPT" })),
            ("timestamp", Value::Long(1_658_335_430_564 + i as i64)),
        ]);
        write_value(&schema, &mut writer, &value).expect("Failed to encode record");
    }
    let block = writer.into_bytes();
    println!("Block: {} records, {} bytes uncompressed", count, block.len());

    println!("\n=== Codecs ===");
    for name in CodecName::ALL {
        let codec = resolve_codec(name.as_str()).expect("built-in codec");
        let compressed = codec.encode(&block).expect("Failed to compress");
        let restored = codec.decode(&compressed).expect("Failed to decompress");
        assert_eq!(restored, block);

        let mut decoder = Decoder::new(&schema, &restored);
        let mut accepted = 0;
        let mut last = Packet::default();
        while !decoder.is_empty() {
            decoder.decode(&mut last).expect("Failed to decode record");
            if last.action == "STS_ACCEPT" {
                accepted += 1;
            }
        }

        println!(
            "  {:<10} {:>8} bytes ({:>5.1}%)  accepted={} last={} len={}",
            name.as_str(),
            compressed.len(),
            100.0 * compressed.len() as f64 / block.len().max(1) as f64,
            accepted,
            last.at,
            last.length,
        );
    }
}
