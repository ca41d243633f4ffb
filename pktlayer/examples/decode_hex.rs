//! Decodes an Ethernet frame given as hexadecimal text and prints its layers.
//!
//! # Usage
//!
//! Paste a frame, for example from a packet capture tool, as one hexadecimal string:
//!
//!   > $ cargo run --example decode_hex -- ffffffffffff02000000000108060001080006040001020000000001c0a80101000000000000c0a80102
//!
//! With `--strict` a malformed enclosed header fails the decode instead of being kept as
//! undecoded octets. The example also checks that the decoded packet serializes to the input.
use structopt::StructOpt;

use pktlayer::packet::{DecodeConfig, Dispatcher};

fn main() {
    let Config {
        strict,
        max_depth,
        hex: text,
    } = Config::from_args();

    let bytes = match hex::decode(text.trim()) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("Not a hexadecimal frame: {}", err);
            std::process::exit(1);
        },
    };

    let config = DecodeConfig::new()
        .strict(strict)
        .max_depth(max_depth);
    let dispatcher = Dispatcher::standard().with_config(config);

    let packet = match dispatcher.decode_frame(&bytes) {
        Ok(packet) => packet,
        Err(err) => {
            eprintln!("Failed to decode {} octets: {}", bytes.len(), err);
            std::process::exit(1);
        },
    };

    println!("{}", packet);
    if !packet.checksums_valid() {
        println!("Some checksums are incorrect");
    }

    let encoded = packet.to_bytes();
    if encoded != bytes {
        eprintln!("Re-encoded frame differs: {}", hex::encode(&encoded));
        std::process::exit(2);
    }
}

#[derive(StructOpt)]
struct Config {
    /// Fail on malformed enclosed headers.
    #[structopt(long = "strict")]
    strict: bool,
    /// Keep payloads nested deeper than this undecoded.
    #[structopt(long = "max-depth", default_value = "16")]
    max_depth: usize,
    /// The frame, as hexadecimal digits.
    hex: String,
}
