//! Writes one message per severity through the default logger, then renders a value.
//!
//! Run with: cargo run -p twlc --example quickstart

use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Animal {
    name: String,
    age: u32,
}

fn main() -> anyhow::Result<()> {
    let log = twlc::logger();

    log.info("starting up");
    log.success("connected");
    log.warning("cache is cold");
    log.debug("retrying in 2s");
    log.trace("entered main loop");
    log.error("disk full");

    let dog = Animal { name: "Dog".into(), age: 5 };
    log.info(&twlc::render_value(&dog, true));
    log.info(&twlc::render_value(&dog, false));
    log.info(&twlc::render_value_as_json(&dog)?);

    if let Some(path) = log.current_log_file_path() {
        println!("log file: {}", path.display());
    }
    Ok(())
}
