//! Integration test suite for the mathematical correctness of the
//! offline/online reduction pipeline.
//!
//! # Test Methodology
//!
//! The pipeline is validated against ground truths that can be computed
//! directly with full-order solves:
//!
//! 1.  **Exactness at full rank.** A Galerkin projection onto a basis that
//!     spans the entire state space is a similarity transformation, so the
//!     reduced transfer function must reproduce the full-order transfer
//!     function to floating-point accuracy. This checks the whole
//!     sample-extract-project-solve chain without any truncation error.
//! 2.  **Accuracy under truncation.** For a benchmark system with a smooth
//!     resolvent, a POD basis keeping every direction above a small relative
//!     singular-value threshold must predict the output at independent
//!     validation points far from the spectrum with small absolute error.
//! 3.  **Closed-form projection columns.** Before any orthogonalization, the
//!     columns of the candidate projection matrices V and W must match the
//!     weighted resolvent directions `w_b (sI - A)^{-1} B` and
//!     `w_c (conj(s) I - A^H)^{-1} C^H` computed by direct full-order solves.
//! 4.  **Conditioning behavior.** Rank requests beyond the data must fail
//!     loudly, and the biorthogonal normalization must both enforce
//!     `W^H V = I` on benign inputs and visibly amplify small system
//!     perturbations. The latter is demonstrated by a regression test, not
//!     asserted away, because the amplification is a documented property of
//!     the exact pairing inversion.

use anyhow::{Result, ensure};
use faer::{Mat, Scale, c64};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rom_core::{
    BiorthogonalizeOptions, FullOrderSolver, RomConfig, SamplingDomain, System, Truncation,
    build_projection_matrices, build_rom, evaluate_output, orthogonalize,
};

/// Evaluates the full-order transfer function H(s) = C (sI - A)^{-1} B by a
/// direct dense solve.
fn full_order_output(system: &System, s: c64) -> Result<c64> {
    let solver = FullOrderSolver::new(system);
    let x = solver.solve_primal(s, system.b().as_ref())?;
    Ok((system.c() * &x)[(0, 0)])
}

/// A dense random real system with spectral radius well below the sampling
/// and evaluation shifts used by the tests.
fn random_real_system(n: usize, seed: u64) -> System {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = Mat::from_fn(n, n, |_, _| rng.random_range(-0.5..0.5));
    let b = Mat::from_fn(n, 1, |_, _| rng.random_range(-1.0..1.0));
    let c = Mat::from_fn(1, n, |_, _| rng.random_range(-1.0..1.0));
    System::from_real(a, b, c).unwrap()
}

/// A diagonal benchmark system with eigenvalues spread over (-9.8, -0.2) and
/// symmetric input/output maps. Its resolvent is smooth over the sampling
/// interval, so the snapshot singular values decay geometrically and a
/// relative truncation threshold controls the discarded amplitude directly.
fn diagonal_benchmark_system(n: usize) -> System {
    let a = Mat::from_fn(n, n, |i, j| {
        if i == j {
            -(0.2 + 9.6 * (i as f64) / ((n - 1) as f64))
        } else {
            0.0
        }
    });
    let b = Mat::from_fn(n, 1, |_, _| 1.0);
    let c = Mat::from_fn(1, n, |_, _| 1.0);
    System::from_real(a, b, c).unwrap()
}

/// Scenario A: for a random real 20-dimensional system, the offline/online
/// pipeline with basis rank k = n must agree with the direct full-order
/// evaluation at s = 1.4 + 2i to better than 1e-10 relative error.
#[test]
fn test_full_rank_rom_matches_direct_evaluation() -> Result<()> {
    let n = 20;
    let system = random_real_system(n, 2024);
    let domain = SamplingDomain::real(2.0, 5.0)?;
    let config = RomConfig::new(30, Truncation::Rank(n), 77);
    let handle = build_rom(&system, &domain, &config)?;
    ensure!(handle.order() == n);

    let s = c64::new(1.4, 2.0);
    let direct = full_order_output(&system, s)?;
    let reduced = evaluate_output(&handle, s)?;
    let rel_err = (direct - reduced).norm() / direct.norm();
    ensure!(
        rel_err < 1e-10,
        "full-rank ROM output error too high: {rel_err:.3e}"
    );
    Ok(())
}

/// Scenario B: POD with a relative singular-value truncation on a diagonal
/// benchmark system. 50 snapshots are drawn from (0.01, 10); the ROM output
/// is validated at 200 independent points from the complex rectangle
/// (1, 70) x (1, 70)i, all at distance >= 1 from the spectrum.
#[test]
fn test_pod_rom_error_at_independent_validation_points() -> Result<()> {
    let n = 60;
    let system = diagonal_benchmark_system(n);
    let domain = SamplingDomain::real(0.01, 10.0)?;
    // Keep every direction with a singular value above 1e-9 of the dominant
    // one. The validation error is proportional to the largest discarded
    // singular value, with a constant of a few units for this benchmark, so
    // the maximum stays several orders of magnitude below the 1e-6 bound.
    let config = RomConfig {
        with_adjoint: false,
        ..RomConfig::new(50, Truncation::RelativeTol(1e-9), 11)
    };
    let handle = build_rom(&system, &domain, &config)?;
    let order = handle.order();
    ensure!(
        order >= 3 && order < n,
        "expected a nontrivial reduction, got order {order}"
    );

    let validation_domain = SamplingDomain::complex(1.0, 70.0, 1.0, 70.0)?;
    let mut rng = StdRng::seed_from_u64(314);
    let mut max_err: f64 = 0.0;
    for _ in 0..200 {
        let s = validation_domain.draw(&mut rng);
        let direct = full_order_output(&system, s)?;
        let reduced = evaluate_output(&handle, s)?;
        max_err = max_err.max((direct - reduced).norm());
    }
    ensure!(
        max_err < 1e-6,
        "validation error too high for order {order}: {max_err:.3e}"
    );
    Ok(())
}

/// Scenario C: with full-rank primal and adjoint bases, the candidate
/// projection matrices built through the reduced models must match the exact
/// closed-form resolvent columns, scaled by the same weights, to 1e-12
/// relative error per column, before any orthogonalization.
#[test]
fn test_projection_matrices_match_closed_form_columns() -> Result<()> {
    let n = 10;
    let system = random_real_system(n, 555);
    let domain = SamplingDomain::real(2.0, 5.0)?;
    let config = RomConfig::new(25, Truncation::Rank(n), 9);
    let handle = build_rom(&system, &domain, &config)?;

    let r = 100;
    let mut rng = StdRng::seed_from_u64(4242);
    let points: Vec<c64> = (0..r)
        .map(|_| c64::new(rng.random_range(2.0..6.0), rng.random_range(1.0..3.0)))
        .collect();
    let weights_b: Vec<c64> = (0..r)
        .map(|_| c64::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)))
        .collect();
    let weights_c: Vec<c64> = (0..r)
        .map(|_| c64::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)))
        .collect();

    let (v, w) = build_projection_matrices(&handle, &points, &weights_b, &weights_c)?;
    ensure!(v.ncols() == r && w.ncols() == r);

    let solver = FullOrderSolver::new(&system);
    let c_adj = system.c_adjoint();
    for (i, &s) in points.iter().enumerate() {
        let x_raw = solver.solve_primal(s, system.b().as_ref())?;
        let x = &x_raw * Scale(weights_b[i]);
        let y_raw = solver.solve_adjoint(s, c_adj.as_ref())?;
        let y = &y_raw * Scale(weights_c[i]);

        let v_col = v.as_ref().get(.., i..i + 1).to_owned();
        let w_col = w.as_ref().get(.., i..i + 1).to_owned();
        let v_err = (&v_col - &x).norm_l2() / x.norm_l2();
        let w_err = (&w_col - &y).norm_l2() / y.norm_l2();
        ensure!(
            v_err < 1e-12 && w_err < 1e-12,
            "column {i} deviates from the closed form: v_err = {v_err:.3e}, w_err = {w_err:.3e}"
        );
    }
    Ok(())
}

/// A fixed truncation rank beyond min(n, snapshot count) must fail with a
/// rank error, not produce a degenerate basis.
#[test]
fn test_rank_beyond_data_fails() -> Result<()> {
    let system = random_real_system(10, 1);
    let domain = SamplingDomain::real(2.0, 5.0)?;
    let config = RomConfig::new(15, Truncation::Rank(30), 3);
    let err = build_rom(&system, &domain, &config).unwrap_err();
    ensure!(
        err.to_string().contains("Rank exceeded"),
        "unexpected error: {err}"
    );
    Ok(())
}

/// Well-conditioned biorthogonal normalization must enforce W^H V = I to
/// floating-point accuracy.
#[test]
fn test_biorthonormalized_pair_satisfies_the_pairing() -> Result<()> {
    let n = 20;
    let system = random_real_system(n, 31);
    let domain = SamplingDomain::real(2.0, 5.0)?;
    let config = RomConfig::new(30, Truncation::Rank(n), 8);
    let handle = build_rom(&system, &domain, &config)?;

    let points: Vec<c64> = (0..6).map(|i| c64::new(2.5 + i as f64 * 0.5, 1.0)).collect();
    let ones = vec![c64::new(1.0, 0.0); 6];
    let (v, w) = build_projection_matrices(&handle, &points, &ones, &ones)?;
    let (v, w) = orthogonalize(
        v.as_ref(),
        w.as_ref(),
        true,
        &BiorthogonalizeOptions::default(),
    )?;

    let pairing = w.as_ref().adjoint() * &v;
    let mut defect: f64 = 0.0;
    for i in 0..6 {
        for j in 0..6 {
            let expected = if i == j { 1.0 } else { 0.0 };
            defect = defect.max((pairing[(i, j)] - c64::new(expected, 0.0)).norm());
        }
    }
    ensure!(defect < 1e-8, "pairing defect too high: {defect:.3e}");
    Ok(())
}

/// Regression (not a correctness assertion): the exact inversion of W^H V
/// amplifies system perturbations by the condition number of the pairing.
/// Perturbing A by eps*I can move the biorthonormalized V by orders of
/// magnitude more than eps. This test pins down that both the unperturbed and
/// the perturbed pipeline produce valid pairings and reports a finite
/// deviation; it deliberately places no upper bound on the amplification.
#[test]
fn test_pairing_inversion_sensitivity_to_system_perturbation() -> Result<()> {
    let n = 20;
    let eps = 1e-8;
    let system = random_real_system(n, 31);
    let perturbed = {
        let a = Mat::from_fn(n, n, |i, j| {
            system.a()[(i, j)] + if i == j { c64::new(eps, 0.0) } else { c64::new(0.0, 0.0) }
        });
        System::new(a, system.b().clone(), system.c().clone())?
    };

    let domain = SamplingDomain::real(2.0, 5.0)?;
    let config = RomConfig::new(30, Truncation::Rank(n), 8);
    let points: Vec<c64> = (0..6).map(|i| c64::new(2.5 + i as f64 * 0.5, 1.0)).collect();
    let ones = vec![c64::new(1.0, 0.0); 6];
    let options = BiorthogonalizeOptions::default();

    let build_pair = |sys: &System| -> Result<(Mat<c64>, Mat<c64>)> {
        let handle = build_rom(sys, &domain, &config)?;
        let (v, w) = build_projection_matrices(&handle, &points, &ones, &ones)?;
        Ok(orthogonalize(v.as_ref(), w.as_ref(), true, &options)?)
    };

    let (v_base, _) = build_pair(&system)?;
    let (v_perturbed, _) = build_pair(&perturbed)?;

    let deviation = (&v_base - &v_perturbed).norm_l2();
    let amplification = deviation / eps;
    ensure!(
        deviation.is_finite(),
        "perturbed pipeline produced a non-finite basis"
    );
    // Typical observed amplification is several orders of magnitude above 1;
    // the value is reported for inspection when running with --nocapture.
    println!(
        "perturbation eps = {eps:.1e}, basis deviation = {deviation:.3e}, amplification = {amplification:.3e}"
    );
    Ok(())
}

/// The whole offline phase, including projection-matrix assembly, is a
/// deterministic function of the seed.
#[test]
fn test_pipeline_is_deterministic_for_a_fixed_seed() -> Result<()> {
    let system = random_real_system(12, 66);
    let domain = SamplingDomain::complex(2.0, 6.0, -1.0, 1.0)?;
    let config = RomConfig::new(20, Truncation::EnergyFraction(0.999999), 17);
    let points: Vec<c64> = (0..4).map(|i| c64::new(3.0 + i as f64, 0.5)).collect();
    let ones = vec![c64::new(1.0, 0.0); 4];

    let handle_a = build_rom(&system, &domain, &config)?;
    let handle_b = build_rom(&system, &domain, &config)?;
    ensure!(handle_a.order() == handle_b.order());

    let (v_a, w_a) = build_projection_matrices(&handle_a, &points, &ones, &ones)?;
    let (v_b, w_b) = build_projection_matrices(&handle_b, &points, &ones, &ones)?;
    ensure!((&v_a - &v_b).norm_l2() < 1e-14);
    ensure!((&w_a - &w_b).norm_l2() < 1e-14);
    Ok(())
}
