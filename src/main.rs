use jettonutils_rs::cli::Cli;
use jettonutils_rs::utils::init_logger;


fn main() -> anyhow::Result<()> {
    init_logger()?;
    let cli = Cli::parse_args();
    cli.execute()?;
    Ok(())
}
