use std::path::PathBuf;

use palc::Parser;

/// CLI arguments
#[derive(Parser)]
#[command(name = "tortuga", long_about = "Runs a turtle-graphics script and draws it to a bitmap")]
pub struct Cli {
	/// Script to execute; defaults to ./script0.txt
	pub script: Option<PathBuf>,
}
