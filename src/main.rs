mod cli;
mod commands;
mod digest;
mod env_loader;
mod error;
mod logging;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        if let Some(failure) = err.downcast_ref::<error::DigestError>() {
            eprintln!("failed stage: {}", failure.stage());
        }
        std::process::exit(1);
    }
}
