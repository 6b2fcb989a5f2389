use anyhow::Result;
use clap::Parser;
use listingfinder::app;
use listingfinder::config::{self, ClassifiedsArgs, CommonArgs};
use listingfinder::logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Classifieds Post Scraper")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    classifieds: ClassifiedsArgs,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    logging::init(args.common.debug);

    app::run_classifieds(&args.common, &args.classifieds)?;
    Ok(())
}
