use std::fs;

use finspace::config::{CodewordSource, ComputeConfig, ExportConfig, SetCoverConfig};
use finspace::core::compress::Compressor;
use finspace::setcover::designs::fano_plane;
use finspace::setcover::{save_codewords, ExecutorRegistry};
use finspace::ComputeError;

#[test]
fn minimal_config_gets_defaults() {
    let cfg =
        SetCoverConfig::from_json_str(r#"{"v": 7, "m": 3, "t": 2, "codewords": {"kind": "fano"}}"#)
            .unwrap();
    assert_eq!(cfg.codewords, CodewordSource::Fano);
    assert_eq!(cfg.executor, "in-process");
    assert_eq!(cfg.threads, None);
    assert_eq!(cfg.export, None);
    cfg.validate().unwrap();
}

#[test]
fn full_config_parses() {
    let cfg = SetCoverConfig::from_json_str(
        r#"{
            "v": 12, "m": 4, "t": 2,
            "codewords": {"kind": "file", "path": "wheel.gz", "compression": "gzip"},
            "executor": "space",
            "threads": 3,
            "export": {"dir": "out/run1", "compression": "zlib", "force": true}
        }"#,
    )
    .unwrap();
    assert_eq!(
        cfg.codewords,
        CodewordSource::File {
            path: "wheel.gz".into(),
            compression: Compressor::Gzip
        }
    );
    assert_eq!(cfg.compute(), ComputeConfig::with_threads(3));
    assert_eq!(
        cfg.export,
        Some(ExportConfig {
            dir: "out/run1".into(),
            compression: Compressor::Zlib,
            force: true
        })
    );
}

#[test]
fn inconsistent_parameters_are_rejected() {
    let base = |v: u32, m: u32, t: u32, codewords: &str| {
        SetCoverConfig::from_json_str(&format!(
            r#"{{"v": {v}, "m": {m}, "t": {t}, "codewords": {codewords}}}"#
        ))
        .unwrap()
    };
    let fano = r#"{"kind": "fano"}"#;

    for cfg in [
        base(7, 8, 2, fano),
        base(65, 3, 2, fano),
        base(7, 3, 2, r#"{"kind": "all_subsets", "k": 8}"#),
        base(7, 3, 2, r#"{"kind": "greedy", "k": 9}"#),
        base(7, 3, 2, r#"{"kind": "inline", "values": []}"#),
    ] {
        assert!(
            matches!(cfg.validate(), Err(ComputeError::InvalidConfig { .. })),
            "{cfg:?}"
        );
    }

    let strict = base(7, 3, 4, fano);
    strict.validate().unwrap();
    let coverage = strict
        .params(std::path::Path::new("."))
        .unwrap()
        .evaluate_with(&ExecutorRegistry::with_defaults(), &strict.executor)
        .unwrap();
    assert_eq!(coverage.covered_count, 0);

    let mut cfg = base(7, 3, 2, fano);
    cfg.threads = Some(0);
    assert!(cfg.validate().is_err());

    assert!(matches!(
        SetCoverConfig::from_json_str(r#"{"v": 7, "m": 3, "t": 2, "codewords": {"kind": "lzma"}}"#),
        Err(ComputeError::InvalidConfig { .. })
    ));
}

#[test]
fn config_file_resolves_codewords_relative_to_its_directory() {
    let tmp = tempfile::tempdir().unwrap();
    save_codewords(&fano_plane(), &tmp.path().join("fano.bin"), Compressor::Deflate).unwrap();

    let path = tmp.path().join("run.json");
    fs::write(
        &path,
        r#"{"v": 7, "m": 3, "t": 2,
            "codewords": {"kind": "file", "path": "fano.bin", "compression": "deflate"},
            "executor": "reference"}"#,
    )
    .unwrap();

    let cfg = SetCoverConfig::load(&path).unwrap();
    let params = cfg.params(tmp.path()).unwrap();
    assert_eq!(params.codewords(), &fano_plane());

    let registry = ExecutorRegistry::with_defaults();
    let coverage = cfg
        .compute()
        .install(|| params.evaluate_with(&registry, &cfg.executor))
        .unwrap()
        .unwrap();
    assert!(coverage.is_complete());
    assert_eq!(coverage.executor, "reference");
}

#[test]
fn generated_codeword_sources_build_coverings() {
    for source in [
        r#"{"kind": "inline", "values": [7, 25, 97, 42, 82, 76, 52]}"#,
        r#"{"kind": "all_subsets", "k": 3}"#,
        r#"{"kind": "greedy", "k": 3}"#,
    ] {
        let cfg = SetCoverConfig::from_json_str(&format!(
            r#"{{"v": 7, "m": 3, "t": 2, "codewords": {source}}}"#
        ))
        .unwrap();
        let params = cfg.params(std::path::Path::new(".")).unwrap();
        let registry = ExecutorRegistry::with_defaults();
        let coverage = params.evaluate_with(&registry, &cfg.executor).unwrap();
        assert!(coverage.is_complete(), "{source}");
    }
}

#[test]
fn missing_config_file_is_an_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        SetCoverConfig::load(&tmp.path().join("absent.json")),
        Err(ComputeError::Io { .. })
    ));
}

#[test]
fn compute_config_builds_named_pools() {
    let pool = ComputeConfig::with_threads(2).build_pool().unwrap();
    assert_eq!(pool.current_num_threads(), 2);
    let name = pool.install(|| std::thread::current().name().map(str::to_string));
    assert!(name.unwrap().starts_with("finspace-worker-"));
    assert!(ComputeConfig::default().threads() >= 1);
}
