use crate::config::{Config, LengthUnit};
use basis::molecule::BOHR_PER_ANGSTROM;
use basis::{Atom, BasisSet, Molecule};
use color_eyre::eyre::{Result, WrapErr};
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::info;

/// Builds the molecule described by the configuration, positions in Bohr.
pub fn build_molecule(config: &Config, basis_sets: &HashMap<String, BasisSet>) -> Result<Molecule> {
    info!("Preparing geometry...");
    let factor = match config.unit.unwrap_or_default() {
        LengthUnit::Angstrom => BOHR_PER_ANGSTROM,
        LengthUnit::Bohr => 1.0,
    };

    let atoms = config
        .geometry
        .iter()
        .map(|atom| {
            let position = Vector3::from(atom.coords) * factor;
            Atom::new(&atom.element, position)
                .wrap_err_with(|| format!("Invalid element symbol: {}", atom.element))
        })
        .collect::<Result<Vec<_>>>()?;

    for (i, atom) in atoms.iter().enumerate() {
        info!(
            "  Atom {:>2} {:>2}: [{:.6}, {:.6}, {:.6}] bohr",
            i + 1,
            atom.symbol,
            atom.position.x,
            atom.position.y,
            atom.position.z
        );
    }

    let mol = Molecule::build(atoms, config.charge.unwrap_or(0), basis_sets)?;
    info!("{} atoms, {} basis functions, {} electrons", mol.natm(), mol.nao(), mol.nelectron());
    Ok(mol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AtomConfig;

    fn config(unit: LengthUnit) -> Config {
        serde_yml::from_str::<Config>(&format!(
            "geometry:\n  - element: h\n    coords: [0.0, 0.0, 0.0]\n  - element: H\n    coords: [0.0, 0.0, 0.74]\nunit: {}\n",
            match unit {
                LengthUnit::Angstrom => "angstrom",
                LengthUnit::Bohr => "bohr",
            }
        ))
        .unwrap()
        .with_defaults()
    }

    fn sto3g_h() -> HashMap<String, BasisSet> {
        let mut sets = HashMap::new();
        sets.insert("H".to_string(), BasisSet::builtin("sto-3g", "H").unwrap());
        sets
    }

    #[test]
    fn test_unit_conversion() {
        let mol = build_molecule(&config(LengthUnit::Angstrom), &sto3g_h()).unwrap();
        assert_eq!(mol.atoms[0].symbol, "H");
        assert!((mol.atoms[1].position.z - 0.74 * BOHR_PER_ANGSTROM).abs() < 1e-12);

        let mol = build_molecule(&config(LengthUnit::Bohr), &sto3g_h()).unwrap();
        assert!((mol.atoms[1].position.z - 0.74).abs() < 1e-12);
        assert_eq!(mol.nao(), 2);
    }

    #[test]
    fn test_bad_element() {
        let mut config = config(LengthUnit::Bohr);
        config.geometry.push(AtomConfig {
            element: "Qq".to_string(),
            coords: [1.0, 0.0, 0.0],
        });
        assert!(build_molecule(&config, &sto3g_h()).is_err());
    }
}
