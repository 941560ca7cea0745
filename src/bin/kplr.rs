use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kplr::cache::{DataOptions, DataProduct};
use kplr::catalog::Catalog;
use kplr::client::Kplr;
use kplr::domain::{KeplerId, KoiNumber, Sort};
use kplr::error::KplrError;
use kplr::output::{CatalogListing, FileListing, JsonOutput};
use kplr::query::Query;
use kplr::transport::HttpTransport;

#[derive(Parser)]
#[command(name = "kplr")]
#[command(about = "Query the Kepler archives and cache Kepler data products")]
#[command(version, author)]
struct Cli {
    /// Local data directory (defaults to $KPLR_DATA_DIR or ~/.kplr).
    #[arg(long, global = true)]
    data_root: Option<String>,

    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show one KOI, e.g. 145.01")]
    Koi { number: String },
    #[command(about = "Search the KOI table")]
    Kois(SearchArgs),
    #[command(about = "Show one confirmed planet, e.g. 62b")]
    Planet { name: String },
    #[command(about = "Show one KIC target")]
    Star { kepid: String },
    #[command(about = "List light curves for a KIC target")]
    LightCurves(DataArgs),
    #[command(about = "List target pixel files for a KIC target")]
    TargetPixelFiles(DataArgs),
    #[command(about = "Download whole archive catalogs")]
    Catalog(CatalogArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Archive predicate, e.g. "koi_period>300".
    #[arg(long = "where")]
    where_clause: Option<String>,

    #[arg(long)]
    sort: Option<String>,

    #[arg(long, requires = "sort")]
    desc: bool,

    #[arg(long)]
    max_records: Option<u64>,
}

#[derive(Args)]
struct DataArgs {
    kepid: String,

    /// Skip short cadence data.
    #[arg(long)]
    long_only: bool,

    /// Download every listed file.
    #[arg(long)]
    fetch: bool,

    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalogs to download; all of them when omitted.
    #[arg(value_enum)]
    catalogs: Vec<Catalog>,

    #[arg(long)]
    overwrite: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<KplrError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KplrError) -> u8 {
    match error {
        KplrError::Http(_) | KplrError::Status { .. } | KplrError::Api { .. } => 3,
        error if error.is_caller_error() => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = Kplr::from_env(cli.data_root.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Koi { number } => {
            let koi = api.koi(number.parse::<KoiNumber>()?)?;
            JsonOutput::print_record(&koi).into_diagnostic()
        }
        Commands::Kois(args) => {
            let kois = api.kois(&search_query(args))?;
            JsonOutput::print_records(&kois).into_diagnostic()
        }
        Commands::Planet { name } => {
            let planet = api.planet(&name)?;
            JsonOutput::print_record(&planet).into_diagnostic()
        }
        Commands::Star { kepid } => {
            let star = api.star(kepid.parse::<KeplerId>()?)?;
            JsonOutput::print_record(&star).into_diagnostic()
        }
        Commands::LightCurves(args) => run_data(&api, DataProduct::LightCurve, args),
        Commands::TargetPixelFiles(args) => run_data(&api, DataProduct::TargetPixelFile, args),
        Commands::Catalog(args) => run_catalog(&api, args),
    }
}

fn search_query(args: SearchArgs) -> Query {
    let mut query = Query::new();
    if let Some(clause) = args.where_clause {
        query = query.where_clause(clause);
    }
    if let Some(column) = args.sort {
        query = query.sort(if args.desc {
            Sort::descending(column)
        } else {
            Sort::ascending(column)
        });
    }
    if let Some(limit) = args.max_records {
        query = query.max_records(limit);
    }
    query
}

fn run_data(api: &Kplr<HttpTransport>, product: DataProduct, args: DataArgs) -> miette::Result<()> {
    let kepid = args.kepid.parse::<KeplerId>()?;
    let options = DataOptions {
        short_cadence: !args.long_only,
        fetch: args.fetch,
        overwrite: args.overwrite,
    };
    let files = api.data_files(product, kepid, options)?;
    let cache = api.file_cache();
    let listings: Vec<FileListing> = files
        .iter()
        .map(|file| FileListing::new(file, cache.url(&file.entry), cache.path(&file.entry)))
        .collect();
    JsonOutput::print_files(&listings).into_diagnostic()
}

fn run_catalog(api: &Kplr<HttpTransport>, args: CatalogArgs) -> miette::Result<()> {
    let catalogs = if args.catalogs.is_empty() {
        Catalog::ALL.to_vec()
    } else {
        args.catalogs
    };
    let store = api.catalogs();
    let mut listings = Vec::with_capacity(catalogs.len());
    for catalog in catalogs {
        let path = store.fetch(catalog, args.overwrite)?;
        listings.push(CatalogListing {
            catalog,
            table: catalog.table(),
            path,
        });
    }
    JsonOutput::print_catalogs(&listings).into_diagnostic()
}
