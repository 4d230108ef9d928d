extern crate nalgebra as na;

use crate::aux_basis::AuxiliaryBasisSpec;
use crate::error::{DeepScfError, Result};
use crate::projection::ProjectionTensor;
use na::DMatrix;
use serde::{Deserialize, Serialize};

/// How the per-atom auxiliary functions are grouped into eigen-blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLayout {
    /// One block per shell covering every radial and magnetic component.
    #[default]
    Shell,
    /// One block per contracted radial function, `2l + 1` wide.
    Radial,
}

/// `(l, width)` of every block, in auxiliary-basis order.
pub fn block_sections(aux: &AuxiliaryBasisSpec, layout: BlockLayout) -> Vec<(usize, usize)> {
    match layout {
        BlockLayout::Shell => aux.shells.iter().map(|s| (s.l, s.num_functions())).collect(),
        BlockLayout::Radial => aux
            .shells
            .iter()
            .flat_map(|s| std::iter::repeat((s.l, 2 * s.l + 1)).take(s.num_contracted()))
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct ShellBlock {
    pub l: usize,
    /// First column of the block within an atom's auxiliary functions.
    pub offset: usize,
    pub width: usize,
    per_atom: Vec<DMatrix<f64>>,
}

impl ShellBlock {
    /// `nao × width` projection slice of atom `a`.
    pub fn atom(&self, a: usize) -> &DMatrix<f64> {
        &self.per_atom[a]
    }
}

#[derive(Debug, Clone)]
pub struct ShellBlocks {
    blocks: Vec<ShellBlock>,
    nao: usize,
    natm: usize,
    width: usize,
}

impl ShellBlocks {
    pub fn partition(tensor: &ProjectionTensor, sections: &[(usize, usize)]) -> Result<Self> {
        let total: usize = sections.iter().map(|&(_, w)| w).sum();
        if total != tensor.width() {
            return Err(DeepScfError::Config(format!(
                "block widths sum to {} but the projection tensor is {} wide",
                total,
                tensor.width()
            )));
        }

        let mut offset = 0;
        let mut blocks = Vec::with_capacity(sections.len());
        for &(l, width) in sections {
            let per_atom = (0..tensor.natm())
                .map(|a| tensor.atom(a).columns(offset, width).into_owned())
                .collect();
            blocks.push(ShellBlock {
                l,
                offset,
                width,
                per_atom,
            });
            offset += width;
        }

        Ok(Self {
            blocks,
            nao: tensor.nao(),
            natm: tensor.natm(),
            width: total,
        })
    }

    pub fn from_spec(tensor: &ProjectionTensor, aux: &AuxiliaryBasisSpec, layout: BlockLayout) -> Result<Self> {
        Self::partition(tensor, &block_sections(aux, layout))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShellBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn nao(&self) -> usize {
        self.nao
    }

    pub fn natm(&self) -> usize {
        self.natm
    }

    /// Descriptor width per atom.
    pub fn width(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(nao: usize, natm: usize, width: usize) -> ProjectionTensor {
        let flat = DMatrix::from_fn(nao, natm * width, |r, c| (r * 1000 + c) as f64);
        ProjectionTensor::from_overlap(&flat, natm, width).unwrap()
    }

    #[test]
    fn test_sections_per_layout() {
        let aux = AuxiliaryBasisSpec::default();
        assert_eq!(block_sections(&aux, BlockLayout::Shell), vec![(0, 12), (1, 36), (2, 60)]);

        let radial = block_sections(&aux, BlockLayout::Radial);
        assert_eq!(radial.len(), 36);
        assert_eq!(radial[0], (0, 1));
        assert_eq!(radial[12], (1, 3));
        assert_eq!(radial[35], (2, 5));
        assert_eq!(radial.iter().map(|s| s.1).sum::<usize>(), 108);
    }

    #[test]
    fn test_partition_keeps_order_and_offsets() {
        let t = tensor(3, 2, 9);
        let blocks = ShellBlocks::partition(&t, &[(0, 1), (1, 3), (2, 5)]).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks.width(), 9);

        let d = blocks.iter().nth(2).unwrap();
        assert_eq!(d.offset, 4);
        assert_eq!(d.atom(1).shape(), (3, 5));
        // atom 1, AO 2, auxiliary column 4 of that atom
        assert_eq!(d.atom(1)[(2, 0)], t.get(2, 1, 4));
    }

    #[test]
    fn test_partition_width_mismatch_is_config_error() {
        let t = tensor(2, 1, 4);
        assert!(matches!(
            ShellBlocks::partition(&t, &[(0, 1), (1, 2)]),
            Err(DeepScfError::Config(_))
        ));
    }
}
