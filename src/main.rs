fn main() {
    if let Err(e) = memcost::cli::run() {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
