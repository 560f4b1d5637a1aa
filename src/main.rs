fn main() {
    if let Err(err) = kbo_ingest::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
