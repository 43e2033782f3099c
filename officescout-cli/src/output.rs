use anyhow::Result;
use colored::Colorize;
use officescout::{CacheInfo, MatchRecord, Scout, SearchOutput};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Matches,
    Stats,
    Json,
}

/// Spreadsheet column name for a 1-based column index (1 -> A, 27 -> AA)
fn column_name(mut column: usize) -> String {
    let mut name = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        name.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    name.iter().rev().collect()
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn rounded(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}

pub fn print_search_output(output: &SearchOutput, scout: &Scout, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&output.records)?);
            return Ok(());
        }
        OutputMode::Matches => print_records(&output.records),
        OutputMode::Stats => print_stats(output, scout),
    }

    println!(
        "\nFound {} matches in {} files ({} searched, {} failed) in {}",
        output.total_matches(),
        output.files_with_matches(),
        output.files_processed,
        output.files_failed,
        humantime::format_duration(rounded(output.elapsed))
    );
    Ok(())
}

fn print_records(records: &[MatchRecord]) {
    let mut current: Option<&Path> = None;
    for record in records {
        if current != Some(record.file()) {
            println!("\n{}", record.file().display().to_string().blue());
            current = Some(record.file());
        }

        match record {
            MatchRecord::Excel {
                sheet,
                row,
                column,
                content,
                keyword,
                ..
            } => println!(
                "{} [{}] {}",
                format!("{}!{}{}", sheet, column_name(*column), row).green(),
                keyword.yellow(),
                one_line(content)
            ),
            MatchRecord::Word {
                content,
                keyword,
                position,
                ..
            } => println!(
                "{} [{}] {}",
                format!("@{}", position).green(),
                keyword.yellow(),
                one_line(content)
            ),
        }
    }
}

fn print_stats(output: &SearchOutput, scout: &Scout) {
    let stats = scout.metrics().get_stats();
    println!("Files: {} eligible", output.files_total);
    println!(
        "Cache: {} hits, {} misses, {} evictions",
        stats.cache_hits, stats.cache_misses, stats.cache_evictions
    );
    println!(
        "Decoded: {} workbooks, {} documents ({} bytes)",
        stats.excel_decodes, stats.word_decodes, stats.bytes_read
    );
    for error in &output.errors {
        println!("{} {}", "error:".red().bold(), error);
    }
}

pub fn print_cache_info(label: &str, info: CacheInfo) {
    println!(
        "{}: {} word, {} excel entries",
        label, info.word_entry_count, info.excel_entry_count
    );
}
