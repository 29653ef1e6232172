use {
    rotalog::{Compression, Level, LoggerBuilder, TimeZone},
    std::time::Instant,
};

/// Rotates every 1000 entries and gzips each file as it is rotated out.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut logger = LoggerBuilder::new("./compressed_logs", "gzip.log")
        .max_entries(1000)
        .max_files(4) // Three archives plus the active file
        .compression(Compression::Gzip)
        .time_zone(TimeZone::UTC)
        .file_mode(0o640) // Set file permissions to: owner rw, group r, others none
        .console(false)
        .level(Level::Debug)
        .build()?;

    for i in 1..=10_000 {
        logger.debug(&format!(
            "Log entry #{i}: This is a sample log message that will contribute to file size"
        ));
    }
    logger.close();

    println!("Done logging: {:?}", start.elapsed());
    for path in logger.queued_files() {
        let size = std::fs::metadata(&path).map_or(0, |m| m.len());
        println!("{} : {} Bytes", path.display(), size);
    }
    Ok(())
}
