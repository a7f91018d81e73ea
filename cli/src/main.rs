#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use log::LevelFilter;
use structopt::StructOpt;

use movie::{KmlDocument, Movie, MovieConfig};
use network::{IsoUtc, Network};

#[derive(StructOpt)]
#[structopt(
    name = "kml_movie",
    about = "Plots timed links between places as a KML movie for Google Earth"
)]
struct Args {
    /// The path to a semicolon-separated node table: id, longitude, latitude
    #[structopt(long, default_value = "Nodes.csv")]
    nodes: String,
    /// The path to a semicolon-separated link table: id, origin, destination, departure, arrival
    #[structopt(long, default_value = "Links.csv")]
    links: String,
    /// A JSON file with movie settings. Any of the flags below override it.
    #[structopt(long)]
    config: Option<String>,
    /// When the movie starts, like 2014-01-01T07:59:00Z
    #[structopt(long)]
    begin: Option<String>,
    /// When the movie ends, like 2014-01-01T08:06:00Z
    #[structopt(long)]
    end: Option<String>,
    /// Seconds a node stays visible after a departure or arrival
    #[structopt(long)]
    delay_node: Option<i64>,
    /// Seconds each piece of a link stays visible
    #[structopt(long)]
    delay_link: Option<i64>,
    /// Spacing of the samples along each link, in (0, 1]
    #[structopt(long)]
    sample_step: Option<f64>,
    /// Where to write the KML file
    #[structopt(long)]
    output: Option<String>,
    /// Also write the nodes and link arcs as GeoJSON to this path
    #[structopt(long)]
    geojson: Option<String>,
    /// Log more details
    #[structopt(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Result<MovieConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                let contents = fs_err::read_to_string(path)?;
                serde_json::from_str(&contents).with_context(|| format!("parsing {path}"))?
            }
            None => MovieConfig::default(),
        };

        if let Some(ref begin) = self.begin {
            config.begin = Some(begin.clone());
        }
        if let Some(ref end) = self.end {
            config.end = Some(end.clone());
        }
        if let Some(delay) = self.delay_node {
            config.delay_node = delay;
        }
        if let Some(delay) = self.delay_link {
            config.delay_link = delay;
        }
        if let Some(step) = self.sample_step {
            config.sample_step = step;
        }
        if let Some(ref output) = self.output {
            config.output = output.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::from_args();
    setup_logging(args.verbose);
    run(args)
}

fn log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn setup_logging(verbose: bool) {
    // RUST_LOG still wins, for debugging one module at a time
    env_logger::Builder::new()
        .filter_level(log_level(verbose))
        .parse_default_env()
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = args.config()?;
    let time_format = IsoUtc;
    let network = Network::load_from_paths(&args.nodes, &args.links, &time_format)?;
    let params = config.timeline_params(&network, &time_format)?;
    debug!("Movie window {:?}", params.window);

    // Everything is validated here, before any file is touched
    let movie = Movie::build(&network, &params)?;

    let mut doc = KmlDocument::new(config.kml_styles(), &time_format);
    movie.write(&mut doc);
    doc.save(&config.output)?;
    info!(
        "Wrote {} placemarks for {} links to {}",
        doc.num_placemarks(),
        movie.links.len(),
        config.output
    );

    if let Some(ref path) = args.geojson {
        movie::export_to_geojson(path, &network, &movie, &time_format)?;
        info!("Wrote GeoJSON to {path}");
    }
    Ok(())
}
