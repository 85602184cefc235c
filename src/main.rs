use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use persons::{Persons, TimeGapMode};

/// Identify unique persons in a CSV table of names.
///
/// The input needs forename and surname columns (recognised by name);
/// id, middle-name and year columns are picked up when present.
#[derive(Parser, Debug)]
#[command(name = "persons", version, about)]
struct Args {
    /// Input CSV file.
    input: PathBuf,

    /// Output CSV file.
    #[arg(short, long, default_value = "persons.csv")]
    output: PathBuf,

    /// CSV file of previously identified unique persons.
    #[arg(long)]
    known: Option<PathBuf>,

    /// Keep noble particles in surnames.
    #[arg(long)]
    keep_particles: bool,

    /// Skip name normalization.
    #[arg(long)]
    raw_names: bool,

    /// Compare only the first forename component.
    #[arg(long)]
    only_first_forename: bool,

    /// Match names only when their middle initials are identical.
    #[arg(long)]
    middle_name_rule: bool,

    /// Do not match names carrying strictly less information.
    #[arg(long)]
    no_subsets: bool,

    /// Match interlaced names (compatible, neither containing the other).
    #[arg(long)]
    interlaced: bool,

    /// Align forename components in any order.
    #[arg(long)]
    ignore_order: bool,

    /// Drop the requirement that initials agree position by position.
    #[arg(long)]
    any_position: bool,

    /// Split clusters at year gaps larger than --max-time-gap.
    #[arg(long, conflicts_with = "report_time_gaps")]
    split_time_gaps: bool,

    /// Report the largest year gap per cluster instead of splitting.
    #[arg(long)]
    report_time_gaps: bool,

    /// Largest year gap tolerated inside one cluster.
    #[arg(long, default_value_t = 50)]
    max_time_gap: i32,

    /// Largest component handed to transitive reduction.
    #[arg(long, default_value_t = 50)]
    max_graph_size: usize,
}

impl Args {
    fn to_options(&self) -> Persons {
        let mut persons = Persons::new();
        persons.remove_particles_suffixes = !self.keep_particles;
        persons.normalize_names = !self.raw_names;
        persons.only_first_fnm = self.only_first_forename;
        persons.middle_name_rule = self.middle_name_rule;
        persons.match_subsets = !self.no_subsets;
        persons.match_interlaced = self.interlaced;
        persons.ignore_order_of_forenames = self.ignore_order;
        persons.absolute_position_matters = !self.any_position;
        persons.time_gap = if self.split_time_gaps {
            TimeGapMode::Split
        } else if self.report_time_gaps {
            TimeGapMode::Report
        } else {
            TimeGapMode::Off
        };
        persons.maximum_time_gap = self.max_time_gap;
        persons.max_graph_size = self.max_graph_size;
        persons
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let persons = args.to_options();

    let result = persons.persons_from_csv(&args.input, args.known.as_deref());
    let table = match result {
        Ok(table) => table,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = table.write_csv_path(&args.output) {
        eprintln!("error: {error}");
        return ExitCode::FAILURE;
    }

    info!(
        persons = table.person_count(),
        records = table.rows().len(),
        output = %args.output.display(),
        "saved result"
    );
    ExitCode::SUCCESS
}
