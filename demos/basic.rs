use rotalog::{Level, Logger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = Logger::new("example.log", "logs", 1000, 5)?;

    logger.set_console_level(Level::Debug);
    logger.set_format("[%timestamp%] [%level%] %message%")?;
    logger.set_console_enabled(true);
    logger.set_file_enabled(true);

    logger.debug("This is a debug message.");
    logger.info("This is an info message.");
    logger.warning("This is a warning message.");
    logger.error("This is an error message.");

    // Move to a new file name and folder; files under ./logs are removed.
    logger.set_filename("newlog.log", "newlogs", 500)?;
    logger.set_max_entries(500);
    logger.set_max_files(3);

    logger.info("This is a new info message.");
    logger.error("This is a new error message.");

    logger.close();
    Ok(())
}
