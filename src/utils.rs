use log::{Level, LevelFilter, Log, Metadata, Record};

/// Returns `log2(n)` when `n` is a non-zero power of two.
pub fn log2_exact(n: usize) -> Option<u32> {
    if n.is_power_of_two() {
        Some(n.trailing_zeros())
    } else {
        None
    }
}

pub fn calculate_mask(bits: u32) -> u32 {
    match bits {
        0 => 0,
        32.. => u32::MAX,
        b => (1u32 << b) - 1,
    }
}

pub fn calculate_miss_rate(misses: u64, accesses: u64) -> f64 {
    if accesses == 0 {
        0.0
    } else {
        misses as f64 / accesses as f64
    }
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => eprintln!("{}", record.args()),
            level => eprintln!("[{}] {}", level, record.args()),
        }
    }

    fn flush(&self) {}
}

pub fn level_for(verbose: bool, debug: bool) -> LevelFilter {
    match (verbose, debug) {
        (_, true) => LevelFilter::Debug,
        (true, false) => LevelFilter::Info,
        (false, false) => LevelFilter::Warn,
    }
}

/// Installs the stderr logger. Later calls only change the level.
pub fn init_logger(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log2_only_for_powers_of_two() {
        assert_eq!(log2_exact(1), Some(0));
        assert_eq!(log2_exact(16), Some(4));
        assert_eq!(log2_exact(0), None);
        assert_eq!(log2_exact(12), None);
    }

    #[test]
    fn masks() {
        assert_eq!(calculate_mask(0), 0);
        assert_eq!(calculate_mask(4), 0xF);
        assert_eq!(calculate_mask(16), 0xFFFF);
        assert_eq!(calculate_mask(32), u32::MAX);
    }

    #[test]
    fn miss_rate_of_empty_run_is_zero() {
        assert_eq!(calculate_miss_rate(0, 0), 0.0);
        assert_eq!(calculate_miss_rate(1, 4), 0.25);
    }

    #[test]
    fn debug_wins_over_verbose() {
        assert_eq!(level_for(true, true), LevelFilter::Debug);
        assert_eq!(level_for(true, false), LevelFilter::Info);
        assert_eq!(level_for(false, false), LevelFilter::Warn);
    }

    #[test]
    fn logger_follows_max_level() {
        init_logger(LevelFilter::Info);
        let info = Metadata::builder().level(Level::Info).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(LOGGER.enabled(&info));
        assert!(!LOGGER.enabled(&debug));

        init_logger(LevelFilter::Debug);
        assert!(LOGGER.enabled(&debug));
        init_logger(LevelFilter::Warn);
        assert!(!LOGGER.enabled(&info));
    }
}
