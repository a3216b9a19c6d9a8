use clap::Parser;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use treemirror::cli::{handle_error, init_logging, Args, CliConfig, CliUtils, Commands, TreeArgs};
use treemirror::error::MirrorError;
use treemirror::mirror::{MirrorProcessor, MirrorSummary};
use treemirror::tools::{self, DateDelta, PRTIME_CSV_HEADER};
use treemirror::transform::{
    FixedContent, Frobnicator, MimeFilter, Transform, WechatAudio, XmlScrubber,
};

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        CliUtils::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    debug!("Parsed CLI arguments: {:?}", args);

    if let Err(e) = run(&args) {
        tracing::error!("{:#}", e);
        match e.downcast_ref::<MirrorError>() {
            Some(mirror_error) => handle_error(mirror_error),
            None => CliUtils::show_error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Commands::Frob {
            tree,
            prepend,
            append,
        } => {
            // Fails before the output directory is created
            let mut frob = Frobnicator::from_hex(prepend.as_deref(), append.as_deref())?;
            mirror(args, tree, &mut frob)?;
        }
        Commands::Mime {
            tree,
            exclude,
            stats,
            list,
        } => {
            let mut filter = MimeFilter::new(exclude.iter().cloned()).with_listing(*list);
            mirror(args, tree, &mut filter)?;
            if *stats {
                println!("\n{}", filter.statistics_report());
            }
        }
        Commands::Redact { tree, content } => {
            let mut redact = FixedContent::from_file(content)?;
            mirror(args, tree, &mut redact)?;
        }
        Commands::ScrubXml { tree } => {
            let mut scrubber = XmlScrubber::new();
            mirror(args, tree, &mut scrubber)?;
            let totals = scrubber.totals();
            CliUtils::show_success(
                &format!(
                    "Redacted {} user items and {} path items",
                    totals.users, totals.paths
                ),
                args.quiet,
            );
        }
        Commands::WechatAudio {
            tree,
            silk_decoder,
            sox,
        } => {
            let mut audio = WechatAudio::new(silk_decoder, sox);
            audio.check_tools()?;
            mirror(args, tree, &mut audio)?;
        }
        Commands::Luhn { numbers } => check_luhn(numbers),
        Commands::Prtime { times, input } => convert_prtimes(times, input.as_deref())?,
        Commands::Deltadate { first, second } => {
            let first = tools::parse_date(first)?;
            let second = tools::parse_date(second)?;
            println!("{}", DateDelta::between(first, second).report());
        }
    }

    Ok(())
}

/// Run the mirror engine for one of the tree subcommands and print the tally
fn mirror<T>(args: &Args, tree: &TreeArgs, transform: &mut T) -> Result<MirrorSummary>
where
    T: Transform + ?Sized,
{
    let config = CliConfig::mirror_config(tree)?;
    let mut processor = MirrorProcessor::new(config);

    // Only draw progress when the console is not already carrying log lines
    if args.log_file.is_some() && !args.quiet {
        processor = processor.with_progress(CliUtils::create_progress_bar(0));
    }

    let summary = processor.run(transform)?;

    if !args.quiet {
        print!("{}", summary.report());
        let stats = &summary.statistics;
        println!(
            "\nRead {}, wrote {} in {}",
            CliUtils::format_file_size(stats.bytes_read),
            CliUtils::format_file_size(stats.bytes_written),
            CliUtils::format_duration(Duration::from_millis(stats.processing_time_ms))
        );
    }

    if let Some(report_path) = &tree.report {
        let json = summary.to_json().context("Failed to serialize report")?;
        std::fs::write(report_path, json)
            .with_context(|| format!("Failed to write report '{}'", report_path.display()))?;
        CliUtils::show_success(
            &format!("Report written to {}", report_path.display()),
            args.quiet,
        );
    }

    if summary.has_failures() {
        CliUtils::show_warning(
            &format!("{} files failed to process", summary.failed_count()),
            args.quiet,
        );
    }

    Ok(summary)
}

fn check_luhn(numbers: &[String]) {
    for number in numbers {
        match tools::luhn_is_valid(number) {
            Ok(valid) => println!("{} {}", number, valid),
            Err(e) => CliUtils::show_error(&e.to_string()),
        }
    }
}

fn convert_prtimes(times: &[i64], input: Option<&Path>) -> Result<()> {
    let mut values = times.to_vec();

    if let Some(path) = input {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open '{}'", path.display()))?;
        for (index, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read '{}'", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let value = tools::parse_prtime(&line)
                .with_context(|| format!("{}:{}", path.display(), index + 1))?;
            values.push(value);
        }
    }

    if values.is_empty() {
        anyhow::bail!("No PRTime values given. Use -t or -i");
    }

    println!("{}", PRTIME_CSV_HEADER);
    for value in values {
        println!("{}", tools::convert_prtime(value).csv_line());
    }
    Ok(())
}
