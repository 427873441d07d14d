use std::time::{Duration, Instant};

const PROBES: usize = 20;

/// Smallest non-zero delta between two consecutive clock reads, taken as the
/// minimum over several probes.
pub fn measure_resolution() -> Duration {
    let mut best = Duration::MAX;
    for _ in 0..PROBES {
        best = best.min(probe_once());
    }
    best
}

fn probe_once() -> Duration {
    let start = Instant::now();
    loop {
        let delta = Instant::now().duration_since(start);
        if !delta.is_zero() {
            return delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_positive_and_small() {
        let resolution = measure_resolution();
        assert!(!resolution.is_zero());
        assert!(resolution < Duration::from_millis(50));
    }
}
