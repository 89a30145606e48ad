use anyhow::{anyhow, Result};
use blognav::config::Config;
use blognav::loader::Loader;
use blognav::nav::Sequence;
use blognav::store::CategoryIndexStore;
use blognav::telemetry;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = App::new("blognav")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lists blog posts by category and year and finds their previous/next links")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .takes_value(true)
                .default_value(".")
                .help("The directory to search (upwards) for blognav.yaml"),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .takes_value(true)
                .default_value("warn")
                .help("Log verbosity; RUST_LOG takes precedence"),
        )
        .subcommand(SubCommand::with_name("categories").about("Lists the known categories"))
        .subcommand(
            SubCommand::with_name("index")
                .about("Prints the posts of one or all categories grouped by year")
                .arg(Arg::with_name("CATEGORY").index(1)),
        )
        .subcommand(
            SubCommand::with_name("nav")
                .about("Prints the previous (older) and next (newer) post paths for a post")
                .arg(Arg::with_name("CATEGORY").required(true).index(1))
                .arg(Arg::with_name("TITLE").required(true).index(2)),
        )
        .get_matches();

    telemetry::init(telemetry::parse_level(
        matches.value_of("log-level").unwrap_or("warn"),
    )?)?;

    let config = Config::from_directory(Path::new(matches.value_of("project").unwrap_or(".")))?;
    let records = Loader::new(&config.posts_url).load(&config.posts_source_directory)?;
    let mut store = CategoryIndexStore::new(config.categories);
    store.ensure_built(&records)?;

    match matches.subcommand() {
        ("categories", Some(_)) => print(&store.categories().iter().collect::<Vec<_>>()),
        ("index", Some(m)) => print_index(&store, m),
        ("nav", Some(m)) => print_nav(&store, m),
        (name, _) => Err(anyhow!("unknown subcommand `{}`", name)),
    }
}

fn print_index(store: &CategoryIndexStore, matches: &ArgMatches) -> Result<()> {
    match matches.value_of("CATEGORY") {
        Some(category) => {
            let mut listing = BTreeMap::new();
            listing.insert(category, store.index(category)?);
            print(&listing)
        }
        None => match store.built() {
            Some(index) => print(index),
            None => Err(anyhow!("category index wasn't built")),
        },
    }
}

#[derive(Serialize)]
struct Links<'a> {
    title: &'a str,
    previous: &'a str,
    next: &'a str,
}

fn print_nav(store: &CategoryIndexStore, matches: &ArgMatches) -> Result<()> {
    // both are required arguments
    let category = matches.value_of("CATEGORY").unwrap_or_default();
    let title = matches.value_of("TITLE").unwrap_or_default();

    let sequence = Sequence::flatten(store.index(category)?);
    if sequence.index_of(title).is_none() {
        warn!(category, title, "no post with this title");
    }
    let neighbors = sequence.neighbors_of(title);
    print(&Links {
        title,
        previous: neighbors.previous_path(),
        next: neighbors.next_path(),
    })
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    serde_yaml::to_writer(stdout.lock(), value)?;
    println!();
    Ok(())
}
