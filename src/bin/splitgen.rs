use clap::Parser;
use log::{info, warn};
use splitgen::driver::{Driver, RunOptions};
use splitgen::error::{Result, SplitGenError};
use splitgen::report::{ReportSet, report_stem};
use splitgen::resolver::FragmentResolver;
use splitgen::scoring::ScoreTable;
use splitgen::services::{
    ConfigClient, FlyCoreClient, SageClient, SettingsService,
};
use splitgen::{DEFAULT_CONFIG_URL, PROGRAM_NAME};
use std::io::{BufRead, IsTerminal};
use std::path::Path;
use std::{env, fs, io};

#[derive(Parser)]
#[command(name = "splitgen", about = "Generate Gen1 initial split crosses", version)]
struct Cli {
    /// Input file with one fragment per line (read STDIN when omitted)
    #[arg(long)]
    file: Option<String>,

    /// Restrict crosses to pairs containing this fragment
    #[arg(long)]
    aline: Option<String>,

    /// Emit every eligible combination rather than only the best cross
    #[arg(long)]
    all: bool,

    /// User id to put on the order worksheet (defaults to $USER)
    #[arg(long)]
    name: Option<String>,

    /// Task label used for output file names when reading STDIN
    #[arg(long)]
    task: Option<String>,

    /// Turn on verbose output
    #[arg(long)]
    verbose: bool,

    /// Turn on debug output
    #[arg(long)]
    debug: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn read_input(cli: &Cli) -> Result<Vec<String>> {
    match &cli.file {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(text.lines().map(str::to_string).collect())
        }
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(no_input());
            }
            piped_input(stdin.lock())
        }
    }
}

fn no_input() -> SplitGenError {
    SplitGenError::MissingInput(
        "You must either specify a file or pass data in through STDIN".to_string(),
    )
}

/// An empty pipe is the same as no input at all.
fn piped_input(reader: impl BufRead) -> Result<Vec<String>> {
    let input: Vec<String> = reader
        .lines()
        .map(|line| line.map_err(SplitGenError::from))
        .collect::<Result<_>>()?;
    if input.iter().all(|line| line.trim().is_empty()) {
        return Err(no_input());
    }
    Ok(input)
}

fn order_name(settings: &dyn SettingsService, requested: Option<&str>) -> Result<String> {
    let userid = match requested {
        Some(name) => name.to_string(),
        None => env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
    };
    Ok(settings.workday_name(&userid)?.unwrap_or(userid))
}

fn run(cli: &Cli) -> Result<()> {
    let config_url =
        env::var("CONFIG_SERVER").unwrap_or_else(|_| DEFAULT_CONFIG_URL.to_string());
    let config = ConfigClient::new(&config_url, PROGRAM_NAME)?;
    let rest = config.rest_services()?;
    let sage_url = rest
        .get("sage")
        .ok_or_else(|| SplitGenError::Service("no sage service configured".to_string()))?;
    let flycore_url = rest
        .get("flycore")
        .ok_or_else(|| SplitGenError::Service("no flycore service configured".to_string()))?;
    let sage = SageClient::new(&sage_url.url)?;
    let flycore = FlyCoreClient::new(&flycore_url.url)?;

    let mut scores = ScoreTable::new(config.score_table()?);
    let vt_cache = config.vt_cache()?;
    info!("Found {} entries in VT cache", vt_cache.len());
    let mut resolver = FragmentResolver::new(&sage, vt_cache);

    let name = order_name(&config, cli.name.as_deref())?;
    info!("Will use name {name} on output spreadsheet");

    // Input is read before any output file is touched, so a missing
    // input never leaves empty reports behind.
    let input = read_input(cli)?;
    let stem = report_stem(
        cli.file.as_deref(),
        cli.task.as_deref(),
        cli.aline.as_deref(),
        cli.all,
    );
    let mut reports = ReportSet::create(Path::new("."), &stem, &name)?;

    let options = RunOptions {
        input,
        a_line: cli.aline.clone(),
        all_combinations: cli.all,
    };
    let outcome = Driver::new(&sage, &flycore).run(
        &options,
        &mut scores,
        &mut resolver,
        &mut reports,
    );
    // Reports are flushed and closed on every control path, fatal or not.
    reports.close()?;
    outcome?;

    let added = resolver.new_entries();
    if !added.is_empty() {
        info!("Adding {} entries to the VT cache", added.len());
        for (vt, fragment) in added {
            if let Err(err) = config.store_vt_entry(vt, fragment) {
                warn!("Could not store VT cache entry {vt}: {err}");
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    if let Err(err) = run(&cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pipe_is_missing_input() {
        let err = piped_input(io::Cursor::new("")).unwrap_err();
        assert!(matches!(err, SplitGenError::MissingInput(_)));
        let err = piped_input(io::Cursor::new("\n  \n")).unwrap_err();
        assert!(matches!(err, SplitGenError::MissingInput(_)));
    }

    #[test]
    fn piped_lines_are_kept_verbatim() {
        let input = piped_input(io::Cursor::new("112C03\nVT000123\n")).unwrap();
        assert_eq!(input, vec!["112C03", "VT000123"]);
    }
}
