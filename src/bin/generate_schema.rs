//! Generate JSON Schema for the source list configuration
//!
//! This binary prints the JSON Schema of `SourceListConfig`, for editors
//! and tools that validate the configuration file.
//!
//! Usage:
//!   cargo run --features dev-bins --bin generate_schema > source-list-schema.json

use source_list::config::SourceListConfig;

fn main() {
    let schema = SourceListConfig::json_schema().expect("Failed to build schema");
    let output = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
    println!("{}", output);
}
