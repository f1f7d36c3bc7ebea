// tests/binpkgs.rs

//! Binary package selection against a `Packages` index and on-disk stores.

mod common;

use common::{cpv, Fixture};
use eclean::{BinpkgSearch, CleanPolicy, Error, ExcludeSpec, SilentOutput};
use std::path::PathBuf;

#[test]
fn test_buildable_binaries_kept_without_changed_deps() {
    let fx = Fixture::new();
    fx.ebuild("app-misc/foo-1.0", &[("EAPI", "8"), ("RDEPEND", "dev-libs/new")]);
    fx.packages_index(&[
        &[
            ("CPV", "app-misc/foo-1.0"),
            ("EAPI", "8"),
            ("RDEPEND", "dev-libs/old"),
            ("PATH", "app-misc/foo/foo-1.0-1.gpkg.tar"),
        ],
        &[
            ("CPV", "app-misc/removed-1.0"),
            ("PATH", "app-misc/removed/removed-1.0-1.gpkg.tar"),
        ],
    ]);
    let (repo, vdb, binaries) = (fx.repo(), fx.vdb(), fx.binaries());
    let search = BinpkgSearch::new(&binaries, &repo, &vdb, &SilentOutput);

    let obsolete = search
        .find(&fx.pkgdir, &ExcludeSpec::new(), &CleanPolicy::new())
        .unwrap();
    assert_eq!(obsolete.keys().collect::<Vec<_>>(), vec![&cpv("app-misc/removed-1.0")]);
    assert_eq!(
        obsolete[&cpv("app-misc/removed-1.0")],
        vec![fx.pkgdir.join("app-misc/removed/removed-1.0-1.gpkg.tar")]
    );

    let policy = CleanPolicy {
        changed_deps: true,
        ..CleanPolicy::default()
    };
    let obsolete = search.find(&fx.pkgdir, &ExcludeSpec::new(), &policy).unwrap();
    assert_eq!(obsolete.len(), 2);
}

#[test]
fn test_changed_deps_ignores_slot_operators() {
    let fx = Fixture::new();
    fx.ebuild(
        "app-misc/foo-1.0",
        &[("EAPI", "8"), ("RDEPEND", "ssl? ( dev-libs/openssl:= ) sys-libs/zlib")],
    );
    fx.packages_index(&[&[
        ("CPV", "app-misc/foo-1.0"),
        ("EAPI", "8"),
        ("USE", "amd64 ssl"),
        ("RDEPEND", "dev-libs/openssl:0/3= sys-libs/zlib"),
        ("PATH", "app-misc/foo/foo-1.0-1.gpkg.tar"),
    ]]);
    let (repo, vdb, binaries) = (fx.repo(), fx.vdb(), fx.binaries());
    let policy = CleanPolicy {
        changed_deps: true,
        ..CleanPolicy::default()
    };

    let obsolete = BinpkgSearch::new(&binaries, &repo, &vdb, &SilentOutput)
        .find(&fx.pkgdir, &ExcludeSpec::new(), &policy)
        .unwrap();
    assert!(obsolete.is_empty());
}

#[test]
fn test_destructive_package_names_keeps_available_versions() {
    let fx = Fixture::new();
    fx.ebuild("app-misc/foo-1.0", &[("EAPI", "8")]);
    fx.ebuild("app-misc/foo-2.0", &[("EAPI", "8")]);
    fx.install("app-misc/foo-2.0", &[("BUILD_TIME", "500")]);
    fx.packages_index(&[
        &[
            ("CPV", "app-misc/foo-1.0"),
            ("BUILD_TIME", "100"),
            ("PATH", "app-misc/foo/foo-1.0-1.gpkg.tar"),
        ],
        &[
            ("CPV", "app-misc/foo-0.9"),
            ("BUILD_TIME", "50"),
            ("PATH", "app-misc/foo/foo-0.9-1.gpkg.tar"),
        ],
    ]);
    let (repo, vdb, binaries) = (fx.repo(), fx.vdb(), fx.binaries());
    let search = BinpkgSearch::new(&binaries, &repo, &vdb, &SilentOutput);

    let policy = CleanPolicy {
        package_names: true,
        ..CleanPolicy::destructive()
    };
    let obsolete = search.find(&fx.pkgdir, &ExcludeSpec::new(), &policy).unwrap();
    assert_eq!(obsolete.keys().collect::<Vec<_>>(), vec![&cpv("app-misc/foo-0.9")]);

    let obsolete = search
        .find(&fx.pkgdir, &ExcludeSpec::new(), &CleanPolicy::destructive())
        .unwrap();
    assert_eq!(obsolete.len(), 2);
}

#[test]
fn test_unique_use_drops_older_build() {
    let fx = Fixture::new();
    fx.ebuild("app-misc/foo-1.0", &[("EAPI", "8")]);
    fx.packages_index(&[
        &[
            ("BUILD_ID", "1"),
            ("BUILD_TIME", "100"),
            ("CPV", "app-misc/foo-1.0"),
            ("EAPI", "8"),
            ("USE", "amd64 ssl"),
            ("PATH", "app-misc/foo/foo-1.0-1.gpkg.tar"),
        ],
        &[
            ("BUILD_ID", "2"),
            ("BUILD_TIME", "200"),
            ("CPV", "app-misc/foo-1.0"),
            ("EAPI", "8"),
            ("USE", "amd64 ssl"),
            ("PATH", "app-misc/foo/foo-1.0-2.gpkg.tar"),
        ],
        &[
            ("BUILD_ID", "3"),
            ("BUILD_TIME", "150"),
            ("CPV", "app-misc/foo-1.0"),
            ("EAPI", "8"),
            ("USE", "amd64"),
            ("PATH", "app-misc/foo/foo-1.0-3.gpkg.tar"),
        ],
    ]);
    let (repo, vdb, binaries) = (fx.repo(), fx.vdb(), fx.binaries());
    let policy = CleanPolicy {
        unique_use: true,
        ..CleanPolicy::default()
    };

    let obsolete = BinpkgSearch::new(&binaries, &repo, &vdb, &SilentOutput)
        .find(&fx.pkgdir, &ExcludeSpec::new(), &policy)
        .unwrap();
    assert_eq!(
        obsolete[&cpv("app-misc/foo-1.0")],
        vec![fx.pkgdir.join("app-misc/foo/foo-1.0-1.gpkg.tar")]
    );
}

#[test]
fn test_exclusions_and_time_limit() {
    let fx = Fixture::new();
    fx.packages_index(&[
        &[("CPV", "sys-kernel/linux-firmware-20240101"), ("MTIME", "100")],
        &[("CPV", "app-misc/recent-1.0"), ("MTIME", "900")],
        &[("CPV", "app-misc/stale-1.0"), ("MTIME", "100")],
    ]);
    let (repo, vdb, binaries) = (fx.repo(), fx.vdb(), fx.binaries());
    let mut exclude = ExcludeSpec::new();
    exclude.add_category("sys-kernel");
    let policy = CleanPolicy {
        time_limit: Some(500),
        ..CleanPolicy::default()
    };

    let obsolete = BinpkgSearch::new(&binaries, &repo, &vdb, &SilentOutput)
        .find(&fx.pkgdir, &exclude, &policy)
        .unwrap();
    assert_eq!(
        obsolete[&cpv("app-misc/stale-1.0")],
        vec![fx.pkgdir.join(PathBuf::from("app-misc/stale-1.0.tbz2"))]
    );
    assert_eq!(obsolete.len(), 1);
}

#[test]
fn test_inaccessible_pkgdir() {
    let fx = Fixture::new();
    let (repo, vdb, binaries) = (fx.repo(), fx.vdb(), fx.binaries());
    let missing = fx.root().join("nowhere");
    let search = BinpkgSearch::new(&binaries, &repo, &vdb, &SilentOutput);

    let err = search
        .find(&missing, &ExcludeSpec::new(), &CleanPolicy::new())
        .unwrap_err();
    assert!(matches!(err, Error::InaccessibleDirectory { .. }));

    let policy = CleanPolicy {
        ignore_failure: true,
        ..CleanPolicy::default()
    };
    assert!(search.find(&missing, &ExcludeSpec::new(), &policy).unwrap().is_empty());
}
