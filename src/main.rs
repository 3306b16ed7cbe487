use chiffres::cli;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("Error: {err:#}");
        #[allow(clippy::exit)]
        std::process::exit(1);
    }
}
