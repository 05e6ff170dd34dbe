fn main() {
    if let Err(e) = lockwatch::cli::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
