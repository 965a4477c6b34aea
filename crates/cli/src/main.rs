fn main() {
    if let Err(e) = luasense_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
