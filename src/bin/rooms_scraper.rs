use anyhow::Result;
use clap::Parser;
use listingfinder::app;
use listingfinder::config::{self, CommonArgs, RoomsArgs};
use listingfinder::logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rental Listing Scraper")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    rooms: RoomsArgs,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    logging::init(args.common.debug);

    app::run_rooms(&args.common, &args.rooms)?;
    Ok(())
}
