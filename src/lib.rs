//! # Bench Prep Workspace
//!
//! Umbrella crate for the benchmark preparation workspace. It re-exports the
//! member crates so a single dependency gives access to both:
//!
//! - [`bench_prep`]: schemas, fold splits, per-series scaling and artifact output
//! - [`series_math`]: the standardization and rounding kernels underneath
//!
//! ## Example
//!
//! ```
//! use bench_prep_workspace::series_math::{round_to, StandardScaler};
//!
//! let scaler = StandardScaler::fit(&[1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(round_to(scaler.transform(3.0), 5), 1.22474);
//! ```

pub use bench_prep;
pub use series_math;

/// Versions of the member crates, as `(name, version)` pairs
pub fn member_versions() -> [(&'static str, &'static str); 2] {
    [
        (bench_prep::NAME, bench_prep::VERSION),
        (series_math::NAME, series_math::VERSION),
    ]
}
