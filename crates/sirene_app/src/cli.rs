use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use sirene_engine::FetchSettings;

/// Resolve French SIREN numbers into their establishment lists (SIRET)
/// and export the result as a two-sheet Excel workbook.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// SIREN numbers, or any text containing them.
    #[arg(value_name = "SIREN")]
    pub sirens: Vec<String>,

    /// Read SIRENs from a file (.txt, .csv, .xlsx or .xls).
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Only scan this column of the input file.
    #[arg(long, value_name = "NAME", requires = "input")]
    pub column: Option<String>,

    /// Output workbook path. Defaults to sirets.xlsx for a single SIREN,
    /// sirets_batch.xlsx otherwise.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Sirene API key.
    #[arg(long, env = "INSEE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Keep closed establishments instead of only active ones.
    #[arg(long)]
    pub include_closed: bool,

    /// Establishments requested per page.
    #[arg(long, default_value_t = 500)]
    pub page_size: u32,

    /// Request budget per SIREN before the fetch is aborted.
    #[arg(long, default_value_t = 500)]
    pub max_pages: u32,

    /// Consecutive 429 responses tolerated before giving up.
    #[arg(long, default_value_t = 15)]
    pub max_retries: u32,

    /// Politeness delay before each request, in milliseconds.
    #[arg(long, default_value_t = 200, value_name = "MS")]
    pub base_delay_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout_secs: u64,

    /// Query the registry as of this date instead of today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Also write the log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            only_active: !self.include_closed,
            as_of_date: self.as_of,
            page_size: self.page_size,
            max_pages: self.max_pages,
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..FetchSettings::default()
        }
    }

    /// Output path when none was given on the command line.
    pub fn default_output(siren_count: usize) -> PathBuf {
        if siren_count == 1 {
            PathBuf::from("sirets.xlsx")
        } else {
            PathBuf::from("sirets_batch.xlsx")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_are_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn settings_carry_the_overrides() {
        let cli = Cli::parse_from([
            "sirene-batch",
            "--api-key",
            "k",
            "--include-closed",
            "--page-size",
            "100",
            "--base-delay-ms",
            "10",
            "481986446",
        ]);
        let settings = cli.fetch_settings();
        assert!(!settings.only_active);
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.base_delay, Duration::from_millis(10));
        // Untouched knobs keep their defaults.
        assert_eq!(settings.max_retries, 15);
    }

    #[test]
    fn default_output_depends_on_batch_size() {
        assert_eq!(Cli::default_output(1), PathBuf::from("sirets.xlsx"));
        assert_eq!(Cli::default_output(3), PathBuf::from("sirets_batch.xlsx"));
    }
}
