//! Oval annotation CLI tool
//!
//! Command-line interface for extracting face ovals from skin segmentation
//! masks with the oval-annotate library.

#[cfg(feature = "cli")]
use oval_annotate::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(2);
}
