mod cli_runtime;

fn main() {
    if let Err(err) = cli_runtime::run() {
        eprintln!("{:#}", err);
        std::process::exit(containers_freeze::error::exit_code_for(&err));
    }
}
