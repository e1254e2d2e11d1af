use crate::CLAP_STYLING;
use clap::{arg, command};
use pyscout_core::config::{DEFAULT_DOWNLOADS_DIR, DEFAULT_RESULTS_DIR, MAIN_DOC_URL, MAIN_PEPS_URL};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("pyscout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pyscout")
        .about("Scrapes docs.python.org and peps.python.org into small reports")
        .styles(CLAP_STYLING)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            arg!(-c --"clear-cache" "Clear the HTTP cache before scraping")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-o --"output" <MODE>)
                .required(false)
                .global(true)
                .help("Where to send the results (printed as plain lines when omitted)")
                .value_parser(["pretty", "file"]),
        )
        .arg(
            arg!(-q --"quiet" "Hide the progress bar")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"cache-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory holding the HTTP cache")
                .default_value("~/.cache/pyscout/"),
        )
        .arg(
            arg!(--"results-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory for result files")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .default_value(DEFAULT_RESULTS_DIR),
        )
        .arg(
            arg!(--"downloads-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory for downloaded archives")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .default_value(DEFAULT_DOWNLOADS_DIR),
        )
        .arg(
            arg!(--"docs-url" <URL>)
                .required(false)
                .global(true)
                .hide(true)
                .value_parser(clap::value_parser!(Url))
                .default_value(MAIN_DOC_URL),
        )
        .arg(
            arg!(--"peps-url" <URL>)
                .required(false)
                .global(true)
                .hide(true)
                .value_parser(clap::value_parser!(Url))
                .default_value(MAIN_PEPS_URL),
        )
        .subcommand(command!("whats-new").about("Lists the \"What's New\" articles with their editors"))
        .subcommand(
            command!("latest-versions").about("Lists documented Python versions and their status"),
        )
        .subcommand(command!("download").about("Downloads the A4 PDF documentation archive"))
        .subcommand(
            command!("pep").about("Counts PEPs by status and writes the summary to a file"),
        )
}
