/* Atomic basis sets: NWChem-format parsing and a small built-in library.

   Example of the NWChem format accepted here:

   BASIS "ao basis" SPHERICAL PRINT
   C    S
         71.6168370              0.15432897
         13.0450960              0.53532814
          3.5305122              0.44463454
   C    SP
          2.9412494             -0.09996723             0.15591627
          0.6834831              0.39951283             0.60768372
          0.2222899              0.70011547             0.39195739
   END

   SP (or L) blocks carry an s and a p contraction over shared exponents and
   are split into two shells.
*/

use crate::error::BasisError;
use crate::shell::ShellSpec;
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSet {
    pub name: String,
    pub symbol: String,
    pub atomic_number: u32,
    pub shells: Vec<ShellSpec>,
}

#[derive(Clone, Copy, PartialEq)]
enum BlockKind {
    Single(usize),
    SP,
}

fn block_kind(token: &str) -> Option<BlockKind> {
    match token.to_ascii_uppercase().as_str() {
        "S" => Some(BlockKind::Single(0)),
        "P" => Some(BlockKind::Single(1)),
        "D" => Some(BlockKind::Single(2)),
        "F" => Some(BlockKind::Single(3)),
        "SP" | "L" => Some(BlockKind::SP),
        _ => None,
    }
}

fn parse_number(token: &str, line: usize) -> Result<f64, BasisError> {
    token
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map_err(|_| BasisError::Parse {
            line,
            message: format!("'{}' is not a number", token),
        })
}

pub fn lookup_element(symbol: &str) -> Result<Element, BasisError> {
    let mut normalized = symbol.to_ascii_lowercase();
    if let Some(first) = normalized.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    Element::from_symbol(&normalized).ok_or_else(|| BasisError::UnknownElement(symbol.to_string()))
}

struct PendingBlock {
    symbol: String,
    kind: BlockKind,
    line: usize,
    rows: Vec<Vec<f64>>,
}

impl PendingBlock {
    fn into_shells(self) -> Result<Vec<ShellSpec>, BasisError> {
        let exponents: Vec<f64> = self.rows.iter().map(|r| r[0]).collect();
        match self.kind {
            BlockKind::Single(l) => {
                let coefficients = self.rows.iter().map(|r| r[1..].to_vec()).collect();
                Ok(vec![ShellSpec::new(l, exponents, coefficients)?])
            }
            BlockKind::SP => {
                if self.rows.iter().any(|r| r.len() != 3) {
                    return Err(BasisError::Parse {
                        line: self.line,
                        message: "SP block rows need an exponent and two coefficients".to_string(),
                    });
                }
                let s = self.rows.iter().map(|r| vec![r[1]]).collect();
                let p = self.rows.iter().map(|r| vec![r[2]]).collect();
                Ok(vec![
                    ShellSpec::new(0, exponents.clone(), s)?,
                    ShellSpec::new(1, exponents, p)?,
                ])
            }
        }
    }
}

impl BasisSet {
    /// Parses every element found in an NWChem-format basis file.
    pub fn parse_nwchem(name: &str, input: &str) -> Result<HashMap<String, BasisSet>, BasisError> {
        let mut sets: HashMap<String, BasisSet> = HashMap::new();
        let mut pending: Option<PendingBlock> = None;

        let flush = |block: Option<PendingBlock>, sets: &mut HashMap<String, BasisSet>| -> Result<(), BasisError> {
            if let Some(block) = block {
                if block.rows.is_empty() {
                    return Err(BasisError::Parse {
                        line: block.line,
                        message: "shell block without primitives".to_string(),
                    });
                }
                let element = lookup_element(&block.symbol)?;
                let symbol = element.get_symbol().to_string();
                let shells = block.into_shells()?;
                sets.entry(symbol.clone())
                    .or_insert_with(|| BasisSet {
                        name: name.to_string(),
                        symbol,
                        atomic_number: element.get_atomic_number() as u32,
                        shells: Vec::new(),
                    })
                    .shells
                    .extend(shells);
            }
            Ok(())
        };

        for (lineno, raw) in input.lines().enumerate() {
            let line = raw.trim();
            let lineno = lineno + 1;
            if line.is_empty() || line.starts_with('#') || line.to_ascii_uppercase().starts_with("BASIS") {
                continue;
            }
            if line.eq_ignore_ascii_case("END") {
                flush(pending.take(), &mut sets)?;
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let is_header = tokens.len() >= 2
                && tokens[0].chars().all(char::is_alphabetic)
                && block_kind(tokens[1]).is_some();

            if is_header {
                flush(pending.take(), &mut sets)?;
                let kind = block_kind(tokens[1]).ok_or_else(|| BasisError::Parse {
                    line: lineno,
                    message: format!("unknown shell type '{}'", tokens[1]),
                })?;
                pending = Some(PendingBlock {
                    symbol: tokens[0].to_string(),
                    kind,
                    line: lineno,
                    rows: Vec::new(),
                });
            } else {
                let block = pending.as_mut().ok_or_else(|| BasisError::Parse {
                    line: lineno,
                    message: "primitive row outside of a shell block".to_string(),
                })?;
                let row = tokens
                    .iter()
                    .map(|t| parse_number(t, lineno))
                    .collect::<Result<Vec<_>, _>>()?;
                if row.len() < 2 {
                    return Err(BasisError::Parse {
                        line: lineno,
                        message: "expected an exponent followed by coefficients".to_string(),
                    });
                }
                block.rows.push(row);
            }
        }
        flush(pending.take(), &mut sets)?;

        Ok(sets)
    }

    /// Built-in basis data for light elements.
    pub fn builtin(name: &str, symbol: &str) -> Result<BasisSet, BasisError> {
        let element = lookup_element(symbol)?;
        let symbol = element.get_symbol();
        let missing = || BasisError::MissingBasis {
            basis: name.to_string(),
            element: symbol.to_string(),
        };

        let text = builtin_text(&name.to_ascii_lowercase(), symbol).ok_or_else(missing)?;
        let mut sets = Self::parse_nwchem(&name.to_ascii_lowercase(), text)?;
        sets.remove(symbol).ok_or_else(missing)
    }

    pub fn num_functions(&self) -> usize {
        self.shells.iter().map(ShellSpec::num_functions).sum()
    }
}

fn builtin_text(name: &str, symbol: &str) -> Option<&'static str> {
    match (name, symbol) {
        ("sto-3g", "H") => Some(STO3G_H),
        ("sto-3g", "He") => Some(STO3G_HE),
        ("sto-3g", "Li") => Some(STO3G_LI),
        ("sto-3g", "C") => Some(STO3G_C),
        ("sto-3g", "N") => Some(STO3G_N),
        ("sto-3g", "O") => Some(STO3G_O),
        ("6-31g", "H") => Some(B631G_H),
        ("6-31g", "He") => Some(B631G_HE),
        _ => None,
    }
}

const STO3G_H: &str = "
H    S
      3.42525091             0.15432897
      0.62391373             0.53532814
      0.16885540             0.44463454
";

const STO3G_HE: &str = "
He    S
      6.36242139             0.15432897
      1.15892300             0.53532814
      0.31364979             0.44463454
";

const STO3G_LI: &str = "
Li    S
     16.1195750              0.15432897
      2.9362007              0.53532814
      0.7946505              0.44463454
Li    SP
      0.6362897             -0.09996723             0.15591627
      0.1478601              0.39951283             0.60768372
      0.0480887              0.70011547             0.39195739
";

const STO3G_C: &str = "
C    S
     71.6168370              0.15432897
     13.0450960              0.53532814
      3.5305122              0.44463454
C    SP
      2.9412494             -0.09996723             0.15591627
      0.6834831              0.39951283             0.60768372
      0.2222899              0.70011547             0.39195739
";

const STO3G_N: &str = "
N    S
     99.1061690              0.15432897
     18.0523120              0.53532814
      4.8856602              0.44463454
N    SP
      3.7804559             -0.09996723             0.15591627
      0.8784966              0.39951283             0.60768372
      0.2857144              0.70011547             0.39195739
";

const STO3G_O: &str = "
O    S
    130.7093200              0.15432897
     23.8088610              0.53532814
      6.4436083              0.44463454
O    SP
      5.0331513             -0.09996723             0.15591627
      1.1695961              0.39951283             0.60768372
      0.3803890              0.70011547             0.39195739
";

const B631G_H: &str = "
H    S
     18.7311370              0.03349460
      2.8253937              0.23472695
      0.6401217              0.81375733
H    S
      0.1612778              1.0000000
";

const B631G_HE: &str = "
He    S
     38.4216340              0.0237660
      5.7780300              0.1546790
      1.2417740              0.4696300
He    S
      0.2979640              1.0000000
";
