#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use crate::basis_set::BasisSet;
    use crate::gto::{cartesian_powers, Primitive};
    use crate::integrals::{self, EriTensor};
    use crate::molecule::{Atom, Molecule};
    use crate::shell::ShellSpec;
    use nalgebra::{DMatrix, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;
    use std::f64::consts::PI;

    fn single_s(alpha: f64, center: Vector3<f64>) -> crate::shell::BasisFunction {
        ShellSpec::new(0, vec![alpha], vec![vec![1.0]])
            .unwrap()
            .place(center)
            .unwrap()
            .remove(0)
    }

    fn h2_sto3g() -> Molecule {
        let mut basis = HashMap::new();
        basis.insert("H".to_string(), BasisSet::builtin("sto-3g", "H").unwrap());
        let atoms = vec![
            Atom::new("H", Vector3::zeros()).unwrap(),
            Atom::new("H", Vector3::new(0.0, 0.0, 1.4)).unwrap(),
        ];
        Molecule::build(atoms, 0, &basis).unwrap()
    }

    #[test]
    fn test_cartesian_powers_order() {
        assert_eq!(
            cartesian_powers(2),
            vec![[2, 0, 0], [1, 1, 0], [1, 0, 1], [0, 2, 0], [0, 1, 1], [0, 0, 2]]
        );
        assert_eq!(cartesian_powers(1).len(), 3);
    }

    #[test]
    fn test_s_function_one_electron_integrals() {
        let alpha = 0.8;
        let f = single_s(alpha, Vector3::new(0.3, -0.2, 1.0));

        let s = integrals::overlap(&f, &f);
        assert!((s - 1.0).abs() < 1e-12, "overlap = {}", s);

        let t = integrals::kinetic(&f, &f);
        assert!((t - 1.5 * alpha).abs() < 1e-12, "kinetic = {}", t);

        let z = 2.0;
        let v = integrals::nuclear(&f, &f, &[(f.center, z)]);
        let expected = -z * 2.0 * (2.0 * alpha / PI).sqrt();
        assert!((v - expected).abs() < 1e-12, "nuclear = {}, expected {}", v, expected);
    }

    #[test]
    fn test_s_function_self_repulsion() {
        let alpha = 1.3;
        let f = single_s(alpha, Vector3::zeros());
        let eri = integrals::repulsion(&f, &f, &f, &f);
        let expected = 2.0 * (alpha / PI).sqrt();
        assert!((eri - expected).abs() < 1e-12, "eri = {}, expected {}", eri, expected);
    }

    #[test]
    fn test_two_center_kinetic_closed_form() {
        let a = Primitive::new(1.2, [0, 0, 0], Vector3::zeros());
        let b = Primitive::new(0.8, [0, 0, 0], Vector3::new(0.4, -0.7, 1.1));
        let mu = a.alpha * b.alpha / (a.alpha + b.alpha);
        let r2 = (a.center - b.center).norm_squared();

        let s = Primitive::Sab(&a, &b);
        let expected_s = (PI / (a.alpha + b.alpha)).powf(1.5) * (-mu * r2).exp();
        assert!((s - expected_s).abs() < 1e-12);

        let t = Primitive::Tab(&a, &b);
        let expected_t = mu * (3.0 - 2.0 * mu * r2) * s;
        assert!((t - expected_t).abs() < 1e-12, "T = {}, expected {}", t, expected_t);
    }

    #[test]
    fn test_kinetic_matches_numerical_laplacian() {
        // -1/2 <a|d2/dx2|b> from central differences of the overlap in b's centre
        let a = Primitive::new(0.9, [1, 0, 1], Vector3::new(0.1, 0.0, -0.2));
        let b = Primitive::new(0.6, [0, 2, 0], Vector3::new(0.0, 0.5, 0.3));

        let h = 1e-3;
        let mut numerical = 0.0;
        for d in 0..3 {
            let mut bp = b;
            let mut bm = b;
            bp.center[d] += h;
            bm.center[d] -= h;
            let second = (Primitive::Sab(&a, &bp) - 2.0 * Primitive::Sab(&a, &b) + Primitive::Sab(&a, &bm)) / (h * h);
            numerical += -0.5 * second;
        }
        let analytical = Primitive::Tab(&a, &b);
        assert!(
            (numerical - analytical).abs() < 1e-5,
            "Laplacian mismatch: numerical = {}, analytical = {}",
            numerical,
            analytical
        );
    }

    #[test]
    fn test_vab_symmetric() {
        let a = Primitive::new(1.0, [1, 0, 0], Vector3::new(1.0, 1.0, 0.0));
        let b = Primitive::new(0.8, [0, 1, 1], Vector3::new(0.0, 1.0, 1.0));
        let C = Vector3::new(0.05, 0.0, 0.0);

        let val_ab = Primitive::Vab(&a, &b, C, 1.0);
        let val_ba = Primitive::Vab(&b, &a, C, 1.0);
        let diff = (val_ab - val_ba).abs();
        assert!(diff < 1e-12, "Vab is not symmetric! diff={}", diff);
    }

    #[test]
    fn test_eri_permutational_symmetry() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut random_primitive = |powers: [usize; 3]| {
            Primitive::new(
                rng.gen_range(0.3..2.0),
                powers,
                Vector3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)),
            )
        };
        let a = random_primitive([1, 0, 0]);
        let b = random_primitive([0, 0, 0]);
        let c = random_primitive([0, 1, 1]);
        let d = random_primitive([0, 0, 1]);

        let reference = Primitive::JKabcd(&a, &b, &c, &d);
        for value in [
            Primitive::JKabcd(&b, &a, &c, &d),
            Primitive::JKabcd(&a, &b, &d, &c),
            Primitive::JKabcd(&c, &d, &a, &b),
            Primitive::JKabcd(&d, &c, &b, &a),
        ] {
            assert!((value - reference).abs() < 1e-12, "{} vs {}", value, reference);
        }
    }

    #[test]
    fn test_spherical_shells_are_orthonormal() {
        let d_shell = ShellSpec::new(2, vec![1.1, 0.35], vec![vec![0.6], vec![0.5]]).unwrap();
        let p_shell = ShellSpec::new(1, vec![0.9], vec![vec![1.0]]).unwrap();
        let mut functions = d_shell.place(Vector3::new(0.2, 0.1, -0.3)).unwrap();
        functions.extend(p_shell.place(Vector3::new(0.2, 0.1, -0.3)).unwrap());
        assert_eq!(functions.len(), 8);

        let s = integrals::overlap_matrix(&functions);
        let diff = (&s - DMatrix::identity(8, 8)).abs().max();
        assert!(diff < 1e-12, "overlap deviates from identity by {}", diff);
    }

    #[test]
    fn test_h2_sto3g_reference_integrals() {
        let mol = h2_sto3g();
        assert_eq!(mol.nao(), 2);
        assert!((mol.nuclear_repulsion() - 1.0 / 1.4).abs() < 1e-12);
        assert_eq!(mol.nelectron(), 2);

        let s = mol.overlap();
        assert!((s[(0, 1)] - 0.6593).abs() < 2e-4, "S12 = {}", s[(0, 1)]);

        let h = mol.core_hamiltonian();
        assert!((h[(0, 0)] + 1.1204).abs() < 2e-4, "H11 = {}", h[(0, 0)]);
        assert!((h[(0, 1)] + 0.9584).abs() < 2e-4, "H12 = {}", h[(0, 1)]);

        let eri = EriTensor::build(mol.functions());
        assert!((eri.get(0, 0, 0, 0) - 0.7746).abs() < 2e-4);
        assert!((eri.get(0, 0, 1, 1) - 0.5697).abs() < 2e-4);
        assert!((eri.get(0, 1, 0, 1) - 0.2970).abs() < 2e-4);
        assert!((eri.get(1, 0, 0, 0) - 0.4441).abs() < 2e-4);
    }

    #[test]
    fn test_coulomb_exchange_contractions() {
        let mol = h2_sto3g();
        let eri = EriTensor::build(mol.functions());
        let dm = DMatrix::from_row_slice(2, 2, &[0.6, 0.6, 0.6, 0.6]);
        let j = eri.coulomb(&dm);
        let k = eri.exchange(&dm);

        let mut expected_j = 0.0;
        let mut expected_k = 0.0;
        for kk in 0..2 {
            for l in 0..2 {
                expected_j += eri.get(0, 1, kk, l) * dm[(kk, l)];
                expected_k += eri.get(0, kk, 1, l) * dm[(kk, l)];
            }
        }
        assert!((j[(0, 1)] - expected_j).abs() < 1e-14);
        assert!((k[(0, 1)] - expected_k).abs() < 1e-14);
        assert!((&j - j.transpose()).abs().max() < 1e-14);
    }

    #[test]
    fn test_water_sto3g_layout() {
        let mut basis = HashMap::new();
        for symbol in ["O", "H"] {
            basis.insert(symbol.to_string(), BasisSet::builtin("sto-3g", symbol).unwrap());
        }
        let atoms = vec![
            Atom::new("O", Vector3::new(0.0, 0.0, 0.0)).unwrap(),
            Atom::new("H", Vector3::new(0.0, 1.43, -0.98)).unwrap(),
            Atom::new("H", Vector3::new(0.0, -1.43, -0.98)).unwrap(),
        ];
        let mol = Molecule::build(atoms, 0, &basis).unwrap();
        assert_eq!(mol.nao(), 7);
        assert_eq!(mol.natm(), 3);
        assert_eq!(mol.function_atom(), &[0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(mol.nelectron(), 10);

        let s = mol.overlap();
        for i in 0..7 {
            assert!((s[(i, i)] - 1.0).abs() < 1e-10);
        }
    }
}
