//! `bankform`: render the Form 67f title sheet from an account export.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use bankform_xlsx::{
    EnumDocumentNumber, Result, STR_OUTPUT_SUFFIX, SpecHeaderMetadata, SpecSourceOptions,
    SpecTitleFormPreset, derive_accounts, derive_holder, derive_output_path, read_source,
    render_title_sheet_with_report, save_title_sheet,
};
use chrono::{FixedOffset, Utc};
use clap::{ArgAction, Parser};
use tracing::{error, info};

/// Moscow time, used for the default formation date.
const N_UTC_OFFSET_SECS: i32 = 3 * 3600;
/// Blank underline left for a hand-written number.
const N_LEN_DOCUMENT_NUMBER_BLANK: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "bankform",
    version,
    about = "Render the bank-account disclosure title sheet (Form 67f)"
)]
struct Cli {
    /// Account export (.xlsx/.xls/.ods or Arrow IPC)
    input: PathBuf,

    /// Output file; defaults to `<input stem>_формат.xlsx` next to the input
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Source worksheet; the first one by default
    #[arg(long = "sheet")]
    sheet: Option<String>,

    /// Formation date (DD.MM.YYYY); today in UTC+3 by default
    #[arg(long = "formation-date")]
    formation_date: Option<String>,

    /// "As of" date; the formation date by default
    #[arg(long = "as-of")]
    as_of: Option<String>,

    /// Document number printed after "№"
    #[arg(long = "document-number")]
    document_number: Option<String>,

    /// Holder date of birth
    #[arg(long = "dob")]
    dob: Option<String>,

    /// Holder place of birth
    #[arg(long = "pob")]
    pob: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(logging::derive_level_filter(cli.verbose, cli.quiet));

    match run(cli) {
        Ok(path_out) => {
            info!(path = %path_out.display(), "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<PathBuf> {
    let options = SpecSourceOptions {
        sheet_name: cli.sheet.clone(),
    };
    let df = read_source(&cli.input, &options)?;
    let l_accounts = derive_accounts(&df)?;
    let holder = derive_holder(&df)?;

    let formation_date = cli.formation_date.clone().unwrap_or_else(derive_today);
    let preset = SpecTitleFormPreset::default();
    let header = SpecHeaderMetadata::builder(&preset)
        .as_of_date(cli.as_of.clone().unwrap_or_else(|| formation_date.clone()))
        .formation_date(formation_date)
        .document_number(derive_document_number(cli.document_number.as_deref()))
        .full_name(holder.full_name)
        .tax_id(holder.tax_id)
        .date_of_birth(cli.dob.clone())
        .place_of_birth(cli.pob.clone())
        .build()?;

    let (document, report) = render_title_sheet_with_report(&header, &l_accounts, &preset);
    info!("{report}");

    let path_out = cli
        .output
        .unwrap_or_else(|| derive_output_path(&cli.input, STR_OUTPUT_SUFFIX));
    save_title_sheet(&document, &path_out)?;
    Ok(path_out)
}

/// Today's date in UTC+3 as `DD.MM.YYYY`.
fn derive_today() -> String {
    let now = Utc::now();
    match FixedOffset::east_opt(N_UTC_OFFSET_SECS) {
        Some(tz) => now.with_timezone(&tz).format("%d.%m.%Y").to_string(),
        None => now.format("%d.%m.%Y").to_string(),
    }
}

fn derive_document_number(value: Option<&str>) -> EnumDocumentNumber {
    match value {
        Some(val) => EnumDocumentNumber::Text(val.to_string()),
        None => EnumDocumentNumber::Text(" ".repeat(N_LEN_DOCUMENT_NUMBER_BLANK)),
    }
}
