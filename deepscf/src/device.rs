//! Execution placement chosen once when an engine is built.
//!
//! `Device::Cpu` runs per-atom work serially on the calling thread;
//! `Device::Parallel` owns a dedicated rayon pool. Nothing here is global.

use crate::error::{DeepScfError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Device {
    #[default]
    Cpu,
    /// `threads == 0` lets rayon pick the thread count.
    Parallel { threads: usize },
}

impl FromStr for Device {
    type Err = DeepScfError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "cpu" => Ok(Device::Cpu),
            "parallel" => Ok(Device::Parallel { threads: 0 }),
            _ => {
                let threads = lower
                    .strip_prefix("parallel:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| {
                        DeepScfError::Config(format!(
                            "unknown device '{}', expected cpu, parallel or parallel:N",
                            s
                        ))
                    })?;
                Ok(Device::Parallel { threads })
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Parallel { threads: 0 } => write!(f, "parallel"),
            Device::Parallel { threads } => write!(f, "parallel:{}", threads),
        }
    }
}

#[derive(Debug)]
pub struct Executor {
    device: Device,
    pool: Option<ThreadPool>,
}

impl Executor {
    pub fn new(device: Device) -> Result<Self> {
        let pool = match device {
            Device::Cpu => None,
            Device::Parallel { threads } => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| DeepScfError::Config(format!("cannot build thread pool: {}", e)))?,
            ),
        };
        Ok(Self { device, pool })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Runs `f` for every atom index and collects the results in order.
    pub fn map_atoms<T, F>(&self, natm: usize, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        match &self.pool {
            None => (0..natm).map(f).collect(),
            Some(pool) => pool.install(|| (0..natm).into_par_iter().map(&f).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("Parallel".parse::<Device>().unwrap(), Device::Parallel { threads: 0 });
        assert_eq!("parallel:3".parse::<Device>().unwrap(), Device::Parallel { threads: 3 });
        assert!(matches!("gpu".parse::<Device>(), Err(DeepScfError::Config(_))));
        assert_eq!(Device::Parallel { threads: 2 }.to_string(), "parallel:2");
    }

    #[test]
    fn test_map_atoms_preserves_order() {
        for device in [Device::Cpu, Device::Parallel { threads: 2 }] {
            let exec = Executor::new(device).unwrap();
            let squares = exec.map_atoms(6, |a| Ok(a * a)).unwrap();
            assert_eq!(squares, vec![0, 1, 4, 9, 16, 25]);
        }
    }

    #[test]
    fn test_map_atoms_propagates_errors() {
        let exec = Executor::new(Device::Parallel { threads: 2 }).unwrap();
        let result: Result<Vec<usize>> = exec.map_atoms(4, |a| {
            if a == 2 {
                Err(DeepScfError::Numeric("bad atom".to_string()))
            } else {
                Ok(a)
            }
        });
        assert!(matches!(result, Err(DeepScfError::Numeric(_))));
    }
}
