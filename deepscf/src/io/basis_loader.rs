//! Basis set loading
//!
//! Each element resolves in order: built-in data, a local
//! `basis_sets/<name>.<symbol>.nwchem` file, the Basis Set Exchange.

use crate::config::Config;
use basis::{BasisError, BasisSet};
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const LOCAL_BASIS_DIR: &str = "basis_sets";

/// Basis sets for every element of the configured geometry, keyed by the
/// canonical element symbol.
pub fn load_basis_sets(config: &Config) -> Result<HashMap<String, BasisSet>> {
    let mut sets: HashMap<String, BasisSet> = HashMap::new();
    for atom in &config.geometry {
        let symbol = basis::basis_set::lookup_element(&atom.element)?
            .get_symbol()
            .to_string();
        if sets.contains_key(&symbol) {
            continue;
        }
        let name = config.basis_for(&symbol);
        let set = resolve_basis(&name, &symbol, Path::new(LOCAL_BASIS_DIR))?;
        info!("{}: {} basis, {} functions", symbol, set.name, set.num_functions());
        sets.insert(symbol, set);
    }
    Ok(sets)
}

/// Built-in data first, then `<dir>/<name>.<symbol>.nwchem`, then the web.
pub fn resolve_basis(name: &str, symbol: &str, dir: &Path) -> Result<BasisSet> {
    match BasisSet::builtin(name, symbol) {
        Ok(set) => return Ok(set),
        Err(BasisError::MissingBasis { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    let local_path = dir.join(format!("{}.{}.nwchem", name.to_lowercase(), symbol.to_lowercase()));
    if local_path.exists() {
        debug!("Loading basis from local file: {}", local_path.display());
        let text = fs::read_to_string(&local_path)
            .wrap_err_with(|| format!("Failed to read local basis set file: {}", local_path.display()))?;
        return pick_element(name, symbol, &text);
    }

    fetch_basis(name, symbol)
}

/// Downloads `name` for `symbol` from the Basis Set Exchange in NWChem format.
pub fn fetch_basis(name: &str, symbol: &str) -> Result<BasisSet> {
    let url = format!(
        "https://www.basissetexchange.org/api/basis/{}/format/nwchem?elements={}",
        name, symbol
    );
    info!("Fetching {} basis for {} from {}", name, symbol, url);
    let response = reqwest::blocking::get(&url)
        .and_then(|r| r.error_for_status())
        .wrap_err_with(|| format!("Failed to fetch basis set {} for {}", name, symbol))?;
    let text = response
        .text()
        .wrap_err("Failed to get response text from basis set API")?;
    debug!("Received {} characters from API", text.len());
    pick_element(name, symbol, &text)
}

fn pick_element(name: &str, symbol: &str, text: &str) -> Result<BasisSet> {
    let mut sets = BasisSet::parse_nwchem(name, text)
        .wrap_err_with(|| format!("Malformed {} basis data for {}", name, symbol))?;
    sets.remove(symbol)
        .ok_or_else(|| eyre!("basis {} has no entry for {}", name, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_takes_precedence() {
        let set = resolve_basis("STO-3G", "He", Path::new("does-not-exist")).unwrap();
        assert_eq!(set.symbol, "He");
        assert_eq!(set.num_functions(), 1);
    }

    #[test]
    fn test_local_file_fallback() {
        let dir = std::env::temp_dir().join(format!("deepscf-basis-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let text = "BASIS \"custom\" SPHERICAL\nHe    S\n      1.5   1.0\nHe    P\n      0.8   1.0\nEND\n";
        fs::write(dir.join("custom.he.nwchem"), text).unwrap();

        let set = resolve_basis("custom", "He", &dir).unwrap();
        assert_eq!(set.shells.len(), 2);
        assert_eq!(set.num_functions(), 4);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unknown_element_is_an_error() {
        assert!(resolve_basis("sto-3g", "Xx", Path::new(".")).is_err());
    }
}
