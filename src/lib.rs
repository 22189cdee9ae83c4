pub mod app_logic;
pub mod core;

#[cfg(test)]
pub(crate) fn initialize_logging() {
    use simplelog::{Config, LevelFilter, TestLogger};
    // Ignored if another test already installed the logger.
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}
