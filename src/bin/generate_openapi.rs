//! Writes the service's OpenAPI document as pretty-printed JSON.
//!
//! Usage:
//!   cargo run --bin generate_openapi                          # stdout
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
    process,
};

use aerium::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn output_arg() -> Option<PathBuf> {
    let args: Vec<String> = env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--output")
        .map(|w| PathBuf::from(&w[1]))
}

fn main() {
    let mut json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialise OpenAPI document");
    // Keep the file friendly to diff tools and POSIX text consumers.
    json.push('\n');

    match output_arg() {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                eprintln!("Error writing to {}: {e}", path.display());
                process::exit(1);
            }
            eprintln!("OpenAPI document written to {}", path.display());
        }
        None => {
            io::stdout()
                .write_all(json.as_bytes())
                .expect("Failed to write to stdout");
        }
    }
}
