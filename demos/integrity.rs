use std::fs::File;

use clap::Parser;
use memmap2::Mmap;

#[derive(Parser, Debug)]
struct Args {
    /// Path to target CSV file
    path: String,

    /// Also check that re-encoding then decoding yields the same rows
    #[arg(long)]
    roundtrip: bool,
}

// NOTE: the `csv` crate is only a faithful reference on well-formed data, so
// mismatches on nonsensical quoting are expected.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let file = File::open(&args.path)?;
    let map = unsafe { Mmap::map(&file)? };
    let text = std::str::from_utf8(&map)?;

    let rows = roster_search::decode(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.strip_prefix('\u{feff}').unwrap_or(text).as_bytes());

    let mut mismatches: u64 = 0;
    let mut count: u64 = 0;

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        count += 1;

        let same = rows
            .get(i)
            .map(|row| row.iter().eq(record.iter()))
            .unwrap_or(false);

        if !same {
            mismatches += 1;

            if mismatches == 1 {
                eprintln!("first mismatch at row {}:", i);
                eprintln!("  roster-search: {:?}", rows.get(i));
                eprintln!("  csv:           {:?}", record);
            }
        }
    }

    if count != rows.len() as u64 {
        eprintln!(
            "row count differs: {} (roster-search) vs. {} (csv)",
            rows.len(),
            count
        );
    }

    println!("{}", mismatches);

    if args.roundtrip {
        let reencoded = roster_search::encode(&rows);

        anyhow::ensure!(
            roster_search::decode(&reencoded) == rows,
            "decoding the re-encoded rows did not yield the same rows"
        );
    }

    Ok(())
}
