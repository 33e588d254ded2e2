/// Logs the statement a driver is about to run when the `debug-print`
/// feature is enabled.
#[macro_export]
#[cfg(feature = "debug-print")]
macro_rules! debug_print {
    ($( $args:expr ),*) => { log::debug!( $( $args ),* ); }
}

/// Expands to nothing without the `debug-print` feature.
#[macro_export]
#[cfg(not(feature = "debug-print"))]
macro_rules! debug_print {
    ($( $args:expr ),*) => {
        true;
    };
}
