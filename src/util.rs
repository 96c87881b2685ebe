use std::process;
use std::fs::File;
use std::io::Read;

/// Linear-congruential generator used for the random-phase/random-decision
/// policies.
pub struct Random {
    seed: f64,
}

impl Random {
    /// `seed` must never be 0.
    pub fn new(seed: f64) -> Random {
        Random { seed: if seed == 0.0 { 1.0 } else { seed } }
    }

    /// A random float `0 <= x < 1`.
    pub fn drand(&mut self) -> f64 {
        self.seed *= 1389796.0;
        let q = (self.seed / 2147483647.0) as i64;
        self.seed -= (q as f64) * 2147483647.0;
        self.seed / 2147483647.0
    }

    /// A random integer `0 <= x < size`.
    pub fn irand(&mut self, size: usize) -> usize {
        (self.drand() * (size as f64)) as usize
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.drand() < p
    }
}

#[cfg(not(target_os = "linux"))]
pub fn mem_used_peak() -> Option<usize> {
    None
}

#[cfg(target_os = "linux")]
pub fn mem_used_peak() -> Option<usize> {
    let mut buf = String::new();
    let mut stats = File::open(&format!("/proc/{}/status", process::id())).expect("Couldn't open /proc/../status");
    stats.read_to_string(&mut buf).expect("Couldn't read from /proc/../status");
    let line = buf.lines()
                  .filter(|line| line.starts_with("VmPeak:"))
                  .next().expect("Couldn't find VmPeak in /proc/../status");
    let mem_kb: String = line.chars().filter(|c| c.is_digit(10)).collect();
    let mem_kb: usize = mem_kb.parse().unwrap();

    Some(mem_kb)
}
