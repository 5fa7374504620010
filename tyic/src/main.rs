#![allow(unknown_lints, dangerous_implicit_autorefs)]

use clap::{App, Arg, ArgMatches, SubCommand};
use codespan_reporting::{
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use std::{
    fs::{read_to_string, write},
    io,
};
use tyinfer::{common::diagnostic::Diagnostic, solve_scenario, solve_scenario_traced};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();

    let matches = App::new("Type inference scenario solver")
        .version(env!("CARGO_PKG_VERSION"))
        .author(clap::crate_authors!("\n"))
        .about("Solves the type constraints described by a scenario file")
        .subcommand(
            SubCommand::with_name("solve")
                .about("Prints the inferred types and the diagnostics of a scenario")
                .arg(
                    Arg::with_name("dot")
                        .long("dot")
                        .help("Writes the solver trace in the graphviz dot format")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::with_name("no-color")
                        .long("no-color")
                        .help("Disables colors in the diagnostics"),
                )
                .arg(
                    Arg::with_name("input")
                        .value_name("INPUT")
                        .help("The scenario file to be solved")
                        .required(true),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("solve", Some(matches)) => solve(matches),
        (name, _) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Unknow subcommand {}", name),
        )),
    }
}

fn solve(matches: &ArgMatches<'_>) -> io::Result<()> {
    let input = matches
        .value_of("input")
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Missing input file"))?;
    let dot = matches.value_of("dot");

    let code = read_to_string(input)?;

    let report = match dot {
        Some(_) => solve_scenario_traced(&code),
        None => solve_scenario(&code),
    };

    println!("{}", report);

    if let (Some(path), Some(trace)) = (dot, report.dot.as_ref()) {
        write(path, trace)?;
    }

    let color = if matches.is_present("no-color") {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    handle_errors(report.diagnostics, input, &code, color)
}

fn handle_errors(
    diagnostics: Vec<Diagnostic>,
    input: &str,
    code: &str,
    color: ColorChoice,
) -> io::Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }

    let mut files = SimpleFiles::new();
    let file_id = files.add(input, code);

    let writer = StandardStream::stderr(color);
    let config = term::Config::default();

    for diagnostic in diagnostics {
        let diagnostic = diagnostic.codespan_diagnostic(file_id);

        term::emit(&mut writer.lock(), &config, &files, &diagnostic)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    }

    std::process::exit(1);
}
