use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use parcel_checkin::report;
use parcel_checkin::scanner::{KeyboardWedge, ManualEntry, ScanSource};
use parcel_checkin::session::{self, SessionEnd, SessionEvent};
use parcel_checkin::{logging, sheet, ColumnAliases, DeliveryError, DeliveryState};

#[derive(Parser)]
#[command(name = "parcel-checkin")]
#[command(about = "Check delivered parcels against an imported customer roster", long_about = None)]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a roster and print its customers and totals
    Check {
        #[command(flatten)]
        roster: RosterArgs,
    },
    /// Import a roster and reconcile codes read from stdin
    Scan {
        #[command(flatten)]
        roster: RosterArgs,
        #[arg(long, value_enum, default_value_t = InputSource::Manual)]
        source: InputSource,
        /// Stop after the first session instead of reopening the scanner
        #[arg(long)]
        once: bool,
        /// Write a markdown delivery report when scanning ends
        #[arg(long)]
        report: Option<PathBuf>,
        /// Print the final roster as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct RosterArgs {
    /// Spreadsheet to import (.csv, .xlsx, .xls, .ods)
    #[arg(long)]
    file: PathBuf,
    /// Extra header spelling for the customer name, tried first
    #[arg(long = "name-column")]
    name_columns: Vec<String>,
    /// Extra header spelling for the parcel count, tried first
    #[arg(long = "parcels-column")]
    parcels_columns: Vec<String>,
    /// Extra header spelling for the waybill number, tried first
    #[arg(long = "waybill-column")]
    waybill_columns: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputSource {
    /// One code per line, typed by hand
    Manual,
    /// Hardware scanner in keyboard-emulation mode
    Wedge,
}

impl RosterArgs {
    fn aliases(&self) -> ColumnAliases {
        ColumnAliases::default().with_extra(
            &self.name_columns,
            &self.parcels_columns,
            &self.waybill_columns,
        )
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("failed to initialize logging")?;

    match cli.command {
        Commands::Check { roster } => {
            let Some(state) = load_roster(&roster)? else {
                return Ok(());
            };
            println!("{}", report::stats_line(&state.totals()));
            print!("{}", report::customer_list(state.customers()));
        }
        Commands::Scan {
            roster,
            source,
            once,
            report: report_path,
            json,
        } => {
            let Some(mut state) = load_roster(&roster)? else {
                return Ok(());
            };
            println!("{}", report::stats_line(&state.totals()));

            let stdin = io::stdin();
            let mut input: Box<dyn ScanSource> = match source {
                InputSource::Manual => Box::new(ManualEntry::new(stdin.lock())),
                InputSource::Wedge => Box::new(KeyboardWedge::new(stdin.lock())),
            };

            scan_loop(&mut state, input.as_mut(), once)?;

            println!();
            println!("{}", report::stats_line(&state.totals()));
            print!("{}", report::customer_list(state.customers()));

            if let Some(path) = report_path {
                let label = roster.file.display().to_string();
                std::fs::write(&path, report::build_report(&label, state.roster()))
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                println!("Report written to {}.", path.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(state.roster())?);
            }
        }
    }

    Ok(())
}

/// Imports the roster file; `None` after reporting an empty import.
fn load_roster(args: &RosterArgs) -> anyhow::Result<Option<DeliveryState>> {
    let rows = sheet::read_rows(&args.file)?;
    let mut state = DeliveryState::new(args.aliases());

    match state.import_rows(&rows) {
        Ok(totals) => {
            println!(
                "Loaded {} customers from {}.",
                totals.total_customers,
                display_name(&args.file)
            );
            Ok(Some(state))
        }
        Err(DeliveryError::EmptyImport) => {
            println!("No data found in {}.", display_name(&args.file));
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn scan_loop(
    state: &mut DeliveryState,
    source: &mut dyn ScanSource,
    once: bool,
) -> anyhow::Result<()> {
    loop {
        let result = session::run(state, source, |event| match event {
            SessionEvent::Scanned(outcome) => println!(
                "{} - parcel scanned ({}/{})",
                outcome.customer.name, outcome.customer.scanned_parcels, outcome.customer.parcels
            ),
            SessionEvent::NotFound(code) => println!("Waybill number not found: {code}"),
        });

        let summary = match result {
            Ok(summary) => summary,
            Err(err) if err.is_recoverable() => {
                println!("{err}");
                return Ok(());
            }
            Err(err) => return Err(err).context("scan session failed"),
        };

        match summary.end {
            SessionEnd::CustomerComplete(outcome) => {
                println!("{} - all parcels scanned!", outcome.customer.name);
                print!("{}", report::scan_card(&outcome));
                io::stdout().flush()?;
                if once {
                    return Ok(());
                }
            }
            SessionEnd::SourceClosed => return Ok(()),
            SessionEnd::NoRoster => {
                println!("Import a roster before scanning.");
                return Ok(());
            }
        }
    }
}
