//! Query layer over the transit store. Each submodule covers one
//! aggregate; writers use short per-batch transactions and uniqueness is
//! enforced by the store's conflict keys, never by application locks.

pub mod affiliates;
pub mod agencies;
pub mod compensations;
pub mod delays;
pub mod routes;
pub mod stops;
pub mod trips;
pub mod vehicles;

/// Clamps a caller-supplied limit: non-positive falls back to the
/// endpoint default, anything above the cap is cut to the cap.
pub fn clamp_limit(limit: i64, default: i64, cap: i64) -> i64 {
    if limit <= 0 {
        default
    } else if limit > cap {
        cap
    } else {
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_defaults() {
        assert_eq!(clamp_limit(0, 50, 50), 50);
        assert_eq!(clamp_limit(-3, 10, 10), 10);
    }

    #[test]
    fn test_clamp_limit_caps() {
        assert_eq!(clamp_limit(100, 5, 20), 20);
        assert_eq!(clamp_limit(15, 5, 20), 15);
    }
}
