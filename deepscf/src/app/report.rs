use super::runner::RunSummary;
use tracing::{info, warn};

pub fn report_summary(summary: &RunSummary) {
    let outcome = &summary.outcome;
    if outcome.converged {
        info!("SCF converged after {} cycles.", outcome.cycles);
    } else {
        warn!("SCF did not converge within {} cycles.", outcome.cycles);
    }

    info!("Orbital energies:");
    for (i, energy) in outcome.mo_energy.iter().enumerate() {
        info!("  Level {}: {:.8} au", i + 1, energy);
    }

    let e = &outcome.energies;
    info!("One-electron energy:   {:.10} au", e.one_electron);
    info!("Coulomb energy:        {:.10} au", e.coulomb);
    info!("Correction energy:     {:.10} au", e.correction);
    if let Some(baseline) = summary.baseline_energy {
        info!("Uncorrected energy:    {:.10} au", baseline);
    }
    info!("Total energy:          {:.10} au", outcome.e_tot);
}
