use finspace::core::array::LongArray;
use finspace::core::compress::Compressor;
use finspace::setcover::designs::{all_subsets, fano_plane, greedy_cover};
use finspace::setcover::{
    candidates, covers, load_codewords, save_codewords, CoverageExecutor, ExecutorRegistry,
    InProcessExecutor, ReferenceExecutor, SetCoverParams, SpaceExecutor,
};
use finspace::ComputeError;

/// Nested-loop recomputation of the coverage flags.
fn brute_force(candidates: &[u64], codewords: &[u64], t: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(candidates.len());
    for &p in candidates {
        let mut hit = 0u8;
        for &c in codewords {
            let mut shared = 0;
            for bit in 0..64 {
                if (p >> bit) & 1 == 1 && (c >> bit) & 1 == 1 {
                    shared += 1;
                }
            }
            if shared >= t {
                hit = 1;
                break;
            }
        }
        out.push(hit);
    }
    out
}

fn executors() -> Vec<Box<dyn CoverageExecutor>> {
    vec![
        Box::new(InProcessExecutor),
        Box::new(SpaceExecutor::default()),
        Box::new(SpaceExecutor::new(5)),
        Box::new(SpaceExecutor::new(1)),
        Box::new(ReferenceExecutor),
    ]
}

#[test]
fn candidates_are_the_colex_m_subsets() {
    let c = candidates(7, 3).unwrap();
    assert_eq!(c.len(), 35);
    assert_eq!(c.get(0).unwrap(), 0b0000111);
    assert_eq!(c.get(34).unwrap(), 0b1110000);
    assert!(c.iter().all(|p| p.count_ones() == 3 && p < 1 << 7));
    assert!(c.as_slice().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn fano_plane_covers_every_triple() {
    let params = SetCoverParams::new(7, 3, 2, fano_plane()).unwrap();
    assert_eq!(params.candidate_count(), 35);

    let expected = brute_force(
        params.candidates().as_slice(),
        params.codewords().as_slice(),
        2,
    );
    assert!(expected.iter().all(|&b| b == 1));

    for exec in executors() {
        let coverage = params.evaluate(exec.as_ref()).unwrap();
        assert_eq!(coverage.covered.as_slice(), expected.as_slice(), "{}", exec.name());
        assert!(coverage.is_complete(), "{}", exec.name());
        assert_eq!(coverage.covered_count, 35);
        assert_eq!(coverage.uncovered().count(), 0);
    }
}

#[test]
fn fano_plane_does_not_cover_at_threshold_three() {
    let params = SetCoverParams::new(7, 3, 3, fano_plane()).unwrap();
    let expected = brute_force(
        params.candidates().as_slice(),
        params.codewords().as_slice(),
        3,
    );
    for exec in executors() {
        let coverage = params.evaluate(exec.as_ref()).unwrap();
        assert_eq!(coverage.covered.as_slice(), expected.as_slice(), "{}", exec.name());
        // Only the 7 lines themselves are covered.
        assert_eq!(coverage.covered_count, 7, "{}", exec.name());
        assert!(!coverage.is_complete());
    }
}

#[test]
fn executors_agree_with_brute_force_on_partial_codewords() {
    let codewords = LongArray::wrap(vec![0b1111_0000_0000, 0b0000_0011_1100, 0b1000_1000_1001]);
    for (v, m, t) in [(12, 4, 2), (12, 5, 3), (10, 3, 1), (9, 0, 0)] {
        let params = SetCoverParams::new(v, m, t, codewords.clone()).unwrap();
        let expected = brute_force(params.candidates().as_slice(), codewords.as_slice(), t);
        for exec in executors() {
            let coverage = params.evaluate(exec.as_ref()).unwrap();
            assert_eq!(
                coverage.covered.as_slice(),
                expected.as_slice(),
                "{} v={v} m={m} t={t}",
                exec.name()
            );
        }
    }
}

#[test]
fn covers_uses_popcount_of_the_intersection() {
    assert!(covers(0b0111, 2, &[0b0011]));
    assert!(!covers(0b0111, 3, &[0b0011, 0b1100]));
    assert!(!covers(0b0111, 1, &[]));
    assert!(covers(0, 0, &[0]));
}

#[test]
fn executor_output_length_is_checked() {
    let candidates = [1u64, 2, 3];
    let mut short = [0u8; 2];
    for exec in executors() {
        assert!(
            matches!(
                exec.evaluate(&candidates, &[1], 1, &mut short),
                Err(ComputeError::Index { .. })
            ),
            "{}",
            exec.name()
        );
    }
}

#[test]
fn registry_resolves_names_explicitly() {
    let registry = ExecutorRegistry::with_defaults();
    assert_eq!(registry.names(), vec!["in-process", "reference", "space"]);
    assert_eq!(registry.get("space").unwrap().name(), "space");
    assert!(matches!(
        registry.get("opencl"),
        Err(ComputeError::InvalidConfig { .. })
    ));

    let params = SetCoverParams::new(7, 3, 2, fano_plane()).unwrap();
    for name in registry.names() {
        let coverage = params.evaluate_with(&registry, &name).unwrap();
        assert_eq!(coverage.executor, name);
        assert!(coverage.is_complete());
    }

    let mut empty = ExecutorRegistry::new();
    assert!(empty.get("in-process").is_err());
    assert!(empty.register(Box::new(InProcessExecutor)).is_none());
    assert!(empty.register(Box::new(InProcessExecutor)).is_some());
}

#[test]
fn known_designs_are_coverings() {
    let trivial = all_subsets(6, 3).unwrap();
    assert_eq!(trivial.len(), 20);
    let params = SetCoverParams::new(6, 3, 3, trivial).unwrap();
    assert!(params.evaluate(&InProcessExecutor).unwrap().is_complete());

    for (v, m, k, t) in [(7, 3, 3, 2), (8, 4, 4, 3), (9, 5, 4, 3), (10, 4, 5, 2)] {
        let design = greedy_cover(v, m, k, t).unwrap();
        assert!(design.iter().all(|c| c.count_ones() == k));
        assert!(design.len() < candidates(v, k).unwrap().len());
        let params = SetCoverParams::new(v, m, t, design).unwrap();
        let coverage = params.evaluate(&ReferenceExecutor).unwrap();
        assert!(coverage.is_complete(), "greedy ({v},{m},{k},{t})");
    }

    assert!(greedy_cover(7, 3, 1, 2).is_err());
}

#[test]
fn params_validate_their_inputs() {
    assert!(matches!(
        SetCoverParams::new(65, 3, 2, fano_plane()),
        Err(ComputeError::Overflow { .. })
    ));
    assert!(matches!(
        SetCoverParams::new(5, 6, 2, fano_plane()),
        Err(ComputeError::InvalidConfig { .. })
    ));
}

#[test]
fn threshold_above_subset_size_covers_nothing() {
    let params = SetCoverParams::new(7, 3, 4, fano_plane()).unwrap();
    for exec in executors() {
        let coverage = params.evaluate(exec.as_ref()).unwrap();
        assert_eq!(coverage.covered_count, 0, "{}", exec.name());
        assert_eq!(coverage.uncovered().count(), 35, "{}", exec.name());
    }
}

#[test]
fn codeword_files_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let codewords = greedy_cover(9, 4, 4, 3).unwrap();
    for c in Compressor::ALL {
        let path = dir.path().join(format!("wheel-9-4-3.{}", c.name()));
        save_codewords(&codewords, &path, c).unwrap();
        assert_eq!(load_codewords(&path, c).unwrap(), codewords);
    }
    assert!(load_codewords(&dir.path().join("missing"), Compressor::None).is_err());
}
