#[tokio::main]
async fn main() {
  // Minimal CLI: support --version/-V
  let mut args = std::env::args().skip(1);
  if let Some(arg) = args.next() {
    if arg == "--version" || arg == "-V" {
      println!("voxmail {}", env!("CARGO_PKG_VERSION"));
      return;
    }
    if arg == "--help" || arg == "-h" {
      eprintln!("Usage: voxmail [--version]");
      eprintln!("Configured through VOXMAIL_*, OPENAI_API_KEY and ELEVENLABS_API_KEY environment variables.");
      return;
    }
  }

  if let Err(e) = voxmail::app::run().await {
    eprintln!("error: {e}");
    std::process::exit(1);
  }
}
