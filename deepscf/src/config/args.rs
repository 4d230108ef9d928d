//! Command-line argument parsing for DeepSCF runs

use clap::Parser;

/// SCF with a learned correction potential, driven by a YAML configuration
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override device (cpu, parallel, parallel:N)
    #[arg(long)]
    pub device: Option<String>,

    /// Override maximum SCF cycles
    #[arg(long)]
    pub max_cycle: Option<usize>,

    /// Override DIIS subspace size
    #[arg(long)]
    pub diis_subspace_size: Option<usize>,

    /// Override energy convergence threshold
    #[arg(long)]
    pub convergence_threshold: Option<f64>,

    /// Load the correction model from this JSON file
    #[arg(long)]
    pub model: Option<String>,

    /// Write descriptors of the final density to this pickle file
    #[arg(long)]
    pub dump_descriptors: Option<String>,

    /// Run plain Hartree-Fock without the correction
    #[arg(long)]
    pub hf_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_parse() {
        let args = Args::parse_from([
            "deepscf",
            "-c",
            "water.yaml",
            "--device",
            "parallel:4",
            "--max-cycle",
            "20",
            "--model",
            "model.json",
            "--hf-only",
        ]);
        assert_eq!(args.config_file, "water.yaml");
        assert_eq!(args.device.as_deref(), Some("parallel:4"));
        assert_eq!(args.max_cycle, Some(20));
        assert_eq!(args.model.as_deref(), Some("model.json"));
        assert!(args.hf_only);
        assert!(args.output.is_none());
    }
}
