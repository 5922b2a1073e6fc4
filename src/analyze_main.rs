// src/analyze_main.rs
//
// Offline intake: run the upload-time analysis on one or more files and
// print the catalog record (`{durationSeconds, bpm}`) for each.

use anyhow::Context;

use trackwave::intake;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    anyhow::ensure!(!paths.is_empty(), "usage: analyze <audio-file> [...]");

    for path in paths {
        let result = intake::analyze_file(path.clone()).await;
        if let Some(notice) = result.notice {
            eprintln!("{path}: {}", notice.message());
        }
        let record =
            serde_json::to_string_pretty(&result.analysis).context("serializing analysis")?;
        println!("{path}\n{record}");
    }

    Ok(())
}
