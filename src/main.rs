use anyhow::Result;
use clap::Parser;
use listingfinder::app;
use listingfinder::config::{self, ClassifiedsArgs, CommonArgs, RoomsArgs};
use listingfinder::logging;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Listingfinder - Rental and Classifieds Listing Scraper")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    rooms: RoomsArgs,

    #[command(flatten)]
    classifieds: ClassifiedsArgs,

    /// Skip the rental site scraper
    #[arg(long)]
    skip_rooms: bool,

    /// Skip the classifieds scraper
    #[arg(long)]
    skip_classifieds: bool,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    logging::init(args.common.debug);

    let mut total = 0;

    if !args.skip_rooms {
        total += app::run_rooms(&args.common, &args.rooms)?;
    } else {
        info!("Skipping rental site scraper");
    }

    if !args.skip_classifieds {
        total += app::run_classifieds(&args.common, &args.classifieds)?;
    } else {
        info!("Skipping classifieds scraper");
    }

    info!("Total records scraped: {}", total);
    Ok(())
}
