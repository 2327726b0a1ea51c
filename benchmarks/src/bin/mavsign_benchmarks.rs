#[cfg(feature = "signing")]
use mavsign_benchmarks::signing::{benchmark_sign, benchmark_verify};

fn main() {
    // Setup logger
    env_logger::builder()
        .filter_level(log::LevelFilter::Info) // Suppress everything below `info` for third-party modules.
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Trace) // Allow everything from current package
        .filter_module("mavsign", log::LevelFilter::Info)
        .init();

    #[cfg(feature = "signing")]
    {
        log::info!("[benchmark_sign]");
        benchmark_sign(100_000);

        log::info!("[benchmark_verify]");
        benchmark_verify(100_000);
    }
}

#[cfg(test)]
mod benchmark_tests {
    #[test]
    #[cfg(feature = "signing")]
    fn run_benchmark_sign() {
        super::benchmark_sign(100);
    }

    #[test]
    #[cfg(feature = "signing")]
    fn run_benchmark_verify() {
        super::benchmark_verify(100);
    }
}
