use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, InfoArgs, ReportFormat};
use crate::config::open_options;
use crate::input::InputReader;
use crate::report::FileReport;
use mpegbound::process::file::MpegFile;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing MPEG stream: {}", args.input.display());

    let options = open_options(cli)?;
    let mut input = InputReader::new(&args.input)?;
    if input.is_pipe() {
        log::debug!("Reading from stdin");
    }

    let file = MpegFile::open(&mut input, &options)?;
    let report = FileReport::new(&args.input, &file);

    let print = || -> Result<()> {
        match args.format {
            ReportFormat::Text => report.print_text(),
            ReportFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
        }
        Ok(())
    };

    match multi {
        Some(multi) => multi.suspend(print),
        None => print(),
    }
}
