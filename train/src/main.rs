use anyhow::{Context, Result};
use log::LevelFilter;
use std::{env, path::PathBuf, sync::Arc};
use structopt::StructOpt;
use train::config::Config;

#[derive(Debug, Clone, StructOpt)]
/// Pretrain a lightnet classifier
struct Args {
    #[structopt(long, default_value = "train.json5")]
    /// configuration file
    pub config_file: PathBuf,
}

#[tokio::main]
pub async fn main() -> Result<()> {
    // setup logging
    {
        let mut builder = pretty_env_logger::formatted_builder();
        match env::var("RUST_LOG") {
            Ok(filters) => builder.parse_filters(&filters),
            Err(_) => builder.filter_level(LevelFilter::Info),
        };
        builder.init();
    }

    // parse arguments
    let Args { config_file } = Args::from_args();
    let config = Arc::new(
        Config::open(&config_file)
            .with_context(|| format!("failed to load config file '{}'", config_file.display()))?,
    );

    // start training program
    train::start(config).await?;

    Ok(())
}
