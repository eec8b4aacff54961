use std::fs::File;

use chrono::Local;
use clap::Parser;
use memmap2::Mmap;
use roster_search::{HeaderPolicy, RosterLoaderBuilder, EXPIRING_SOON_DAYS};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Path to the roster CSV export
    path: String,

    /// Free-text query matched against name, phone, teacher, circle & national id
    #[arg(default_value = "")]
    query: String,

    /// Only keep students at this exact level
    #[arg(long)]
    level: Option<String>,

    /// Whether the first row is data, instead of sniffing for a header
    #[arg(long)]
    no_header: bool,

    /// Whether to reject rows not having the expected number of fields
    #[arg(long)]
    strict: bool,

    /// Whether to print dashboard figures instead of matching students
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = File::open(&args.path)?;
    let map = unsafe { Mmap::map(&file)? };
    let text = std::str::from_utf8(&map)?;

    let roster = RosterLoaderBuilder::new()
        .header(if args.no_header {
            HeaderPolicy::Absent
        } else {
            HeaderPolicy::Sniff
        })
        .flexible(!args.strict)
        .build()
        .load(text)?;

    if args.stats {
        let stats = roster.stats();

        println!("total\t{}", stats.total);
        println!("nationalities\t{}", stats.nationalities);
        println!("paid\t{}", stats.paid);
        println!("unpaid\t{}", roster.unpaid().count());
        println!("teachers\t{}", stats.teachers);

        let today = Local::now().date_naive();

        println!("expired_ids\t{}", roster.expired_ids(today).len());
        println!(
            "expiring_ids\t{}",
            roster.expiring_ids(today, EXPIRING_SOON_DAYS).len()
        );

        for (level, count) in stats.levels.iter() {
            println!("level:{}\t{}", level, count);
        }

        return Ok(());
    }

    for student in roster.filter(&args.query, args.level.as_deref()) {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            student.id, student.name, student.phone, student.level, student.teacher
        );
    }

    Ok(())
}
