use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, ScanArgs};
use crate::config::open_options;
use crate::input::InputReader;
use crate::report::FileReport;
use mpegbound::process::OpenOptions;
use mpegbound::process::file::MpegFile;
use mpegbound::utils::errors::BoundaryError;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ScanEntry {
    Ok { report: FileReport },
    Corrupt { path: String, error: String },
    Failed { path: String, error: String },
}

#[derive(Debug, Default)]
struct ScanSummary {
    ok: usize,
    corrupt: usize,
    failed: usize,
}

pub fn cmd_scan(args: &ScanArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let options = open_options(cli)?;
    log::info!(
        "Scanning {} file(s) at read style {}",
        args.inputs.len(),
        options.read_style
    );

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new(args.inputs.len() as u64));
            pb.set_style(ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} files ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
            )?);
            Some(pb)
        }
        None => None,
    };

    let mut summary = ScanSummary::default();
    let mut entries = Vec::with_capacity(args.inputs.len());

    for input in &args.inputs {
        if let Some(ref pb) = pb {
            pb.set_message(input.display().to_string());
        }

        let entry = scan_one(input, &options);
        match &entry {
            ScanEntry::Ok { .. } => summary.ok += 1,
            ScanEntry::Corrupt { path, error } => {
                summary.corrupt += 1;
                log::warn!("{path}: {error}");
            }
            ScanEntry::Failed { path, error } => {
                summary.failed += 1;
                log::error!("{path}: {error}");
            }
        }
        entries.push(entry);

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    if let Some(path) = &args.output_path {
        let writer = BufWriter::new(File::create(path)?);
        serde_yaml_ng::to_writer(writer, &entries)?;
        log::info!("Wrote scan report to {}", path.display());
    }

    println!("Scan Summary");
    println!("  Files scanned             {}", args.inputs.len());
    println!("  Synchronized              {}", summary.ok);
    println!("  Corrupt                   {}", summary.corrupt);
    println!("  Unreadable                {}", summary.failed);
    println!();

    if cli.strict && summary.corrupt + summary.failed > 0 {
        anyhow::bail!(
            "{} of {} file(s) could not be opened",
            summary.corrupt + summary.failed,
            args.inputs.len()
        );
    }

    Ok(())
}

fn scan_one(input: &Path, options: &OpenOptions) -> ScanEntry {
    let path = input.display().to_string();

    let result =
        InputReader::new(input).and_then(|mut reader| MpegFile::open(&mut reader, options));

    match result {
        Ok(file) => ScanEntry::Ok {
            report: FileReport::new(input, &file),
        },
        Err(e) => match e.downcast_ref::<BoundaryError>() {
            Some(corrupt @ BoundaryError::CorruptFile { .. }) => ScanEntry::Corrupt {
                path,
                error: corrupt.to_string(),
            },
            _ => ScanEntry::Failed {
                path,
                error: format!("{e:#}"),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn classifies_scan_results() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let mut good = vec![0u8; 10];
        good.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        good.resize(1024, 0);
        let good_path = dir.path().join("good.mp3");
        fs::write(&good_path, good)?;

        let corrupt_path = dir.path().join("corrupt.mp3");
        fs::write(&corrupt_path, vec![0u8; 20000])?;

        let missing_path = dir.path().join("missing.mp3");

        let options = OpenOptions::default();
        assert!(matches!(scan_one(&good_path, &options), ScanEntry::Ok { .. }));
        assert!(matches!(
            scan_one(&corrupt_path, &options),
            ScanEntry::Corrupt { .. }
        ));
        assert!(matches!(
            scan_one(&missing_path, &options),
            ScanEntry::Failed { .. }
        ));
        Ok(())
    }
}
