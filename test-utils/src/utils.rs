use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const RUST_LOG_DEFAULT: &str = "eods=info";

static INIT_TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process. `RUST_LOG` overrides
/// [`RUST_LOG_DEFAULT`].
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(RUST_LOG_DEFAULT));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[macro_export]
macro_rules! assert_delegation_error {
    ($result:expr, $matcher:pat) => {
        match $result {
            Err($matcher) => {}
            other => panic!(
                "expected error matching {}, got {:?}",
                stringify!($matcher),
                other
            ),
        }
    };
}

#[macro_export]
macro_rules! assert_eq_noise {
    ($a:expr, $b:expr, $tolerance:expr) => {
        let diff = ($a - $b).abs();
        assert!(
            diff <= $tolerance,
            "Difference between {} and {} larger than {} tolerated",
            $a,
            $b,
            $tolerance
        )
    };

    ($a:expr, $b:expr) => {
        let tolerance = fixed_macro::types::I80F48!(0.00001);
        let diff = ($a - $b).abs();
        assert!(
            diff < tolerance,
            "Difference between {} and {} larger than {} tolerated",
            $a,
            $b,
            tolerance
        )
    };
}
