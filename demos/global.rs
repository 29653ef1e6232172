use rotalog::{global, Level, LoggerBuilder};

fn main() {
    // Exits the process if the configuration is invalid.
    global::init_or_exit(
        LoggerBuilder::new("./logs", "global.log")
            .max_entries(100)
            .max_files(3)
            .file_level(Level::Warning),
    );

    global::info("System startup");
    global::warning("Configuration file missing, using defaults");
    global::error("Server failed to bind port 8080");

    global::with(|logger| logger.close());
}
