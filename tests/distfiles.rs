// tests/distfiles.rs

//! Source archive selection against on-disk stores.

mod common;

use common::{cpv, names, Fixture};
use eclean::policy::parse_size_limit;
use eclean::{CleanPolicy, DistfilesSearch, Error, ExcludeSpec, SilentOutput};

const KB: usize = 1024;

/// pkg-1.0 and pkg-2.0 archives; only pkg-2.0 is still in the repository
fn two_versions() -> Fixture {
    let fx = Fixture::new();
    fx.distfile("pkg-1.0.tar.gz", 500 * KB, 100);
    fx.distfile("pkg-2.0.tar.gz", 500 * KB, 200);
    fx.ebuild(
        "app-misc/pkg-2.0",
        &[("EAPI", "8"), ("SRC_URI", "https://example.org/pkg-2.0.tar.gz")],
    );
    fx
}

#[test]
fn test_zero_size_limit_with_time_limit() {
    let fx = two_versions();
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let policy = CleanPolicy {
        size_limit: Some(parse_size_limit("0").unwrap()),
        time_limit: Some(150),
        ..CleanPolicy::default()
    };

    let result = DistfilesSearch::new(&repo, &vdb, &SilentOutput)
        .find(&fx.distdir, &ExcludeSpec::new(), &policy, false)
        .unwrap();

    assert_eq!(names(&result.obsolete), vec!["pkg-1.0.tar.gz"]);
    assert_eq!(result.obsolete["pkg-1.0.tar.gz"], vec![fx.distdir.join("pkg-1.0.tar.gz")]);
    assert!(result.rescued.is_empty());
}

#[test]
fn test_exclusion_rescues_package_files() {
    let fx = two_versions();
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let mut exclude = ExcludeSpec::new();
    exclude.add_package("app-misc/pkg").unwrap();
    let search = DistfilesSearch::new(&repo, &vdb, &SilentOutput);

    let result = search
        .find(&fx.distdir, &exclude, &CleanPolicy::new(), false)
        .unwrap();
    assert!(result.obsolete.is_empty());
    assert_eq!(names(&result.rescued), vec!["pkg-1.0.tar.gz"]);

    // Deprecation reporting skips the rescue pass
    let reported = search
        .find(&fx.distdir, &exclude, &CleanPolicy::new(), true)
        .unwrap();
    assert_eq!(names(&reported.obsolete), vec!["pkg-1.0.tar.gz"]);
    assert!(reported.rescued.is_empty());
}

#[test]
fn test_rescued_partitions_candidates() {
    let fx = two_versions();
    fx.distfile("other-3.1.tar.xz", KB, 100);
    fx.distfile("pkg_data-1.zip", KB, 100);
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let mut exclude = ExcludeSpec::new();
    exclude.add_package("app-misc/pkg").unwrap();
    let search = DistfilesSearch::new(&repo, &vdb, &SilentOutput);

    let before_rescue = search
        .find(&fx.distdir, &exclude, &CleanPolicy::new(), true)
        .unwrap()
        .obsolete;
    let result = search
        .find(&fx.distdir, &exclude, &CleanPolicy::new(), false)
        .unwrap();

    for name in result.rescued.keys() {
        assert!(before_rescue.contains_key(name));
        assert!(!result.obsolete.contains_key(name));
    }
    let mut rejoined = result.obsolete.clone();
    rejoined.extend(result.rescued.clone());
    assert_eq!(rejoined, before_rescue);
    assert_eq!(names(&result.obsolete), vec!["other-3.1.tar.xz"]);
}

#[test]
fn test_runs_are_idempotent() {
    let fx = two_versions();
    fx.distfile(".hidden", KB, 100);
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let search = DistfilesSearch::new(&repo, &vdb, &SilentOutput);

    let first = search
        .find(&fx.distdir, &ExcludeSpec::new(), &CleanPolicy::new(), false)
        .unwrap();
    let second = search
        .find(&fx.distdir, &ExcludeSpec::new(), &CleanPolicy::new(), false)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_renamed_sources_are_protected() {
    let fx = Fixture::new();
    fx.distfile("foo-1.0.tar.gz", KB, 100);
    fx.distfile("v1.0.tar.gz", KB, 100);
    fx.ebuild(
        "app-misc/foo-1.0",
        &[("SRC_URI", "https://github.com/foo/foo/archive/v1.0.tar.gz -> foo-1.0.tar.gz")],
    );
    let (repo, vdb) = (fx.repo(), fx.vdb());

    let result = DistfilesSearch::new(&repo, &vdb, &SilentOutput)
        .find(&fx.distdir, &ExcludeSpec::new(), &CleanPolicy::new(), false)
        .unwrap();
    assert_eq!(names(&result.obsolete), vec!["v1.0.tar.gz"]);
}

#[test]
fn test_destructive_keeps_installed_and_reports_deprecated() {
    let fx = Fixture::new();
    fx.distfile("foo-1.0.tar.gz", KB, 100);
    fx.distfile("foo-2.0.tar.gz", KB, 100);
    fx.distfile("gone-0.1.tar.gz", KB, 100);
    fx.ebuild("app-misc/foo-1.0", &[("SRC_URI", "mirror://foo/foo-1.0.tar.gz")]);
    fx.ebuild("app-misc/foo-2.0", &[("SRC_URI", "mirror://foo/foo-2.0.tar.gz")]);
    fx.install("app-misc/foo-2.0", &[("SRC_URI", "mirror://foo/foo-2.0.tar.gz")]);
    fx.install("app-misc/gone-0.1", &[("SRC_URI", "mirror://gone/gone-0.1.tar.gz")]);
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let search = DistfilesSearch::new(&repo, &vdb, &SilentOutput);

    let result = search
        .find(&fx.distdir, &ExcludeSpec::new(), &CleanPolicy::destructive(), false)
        .unwrap();
    assert_eq!(names(&result.obsolete), vec!["foo-1.0.tar.gz"]);
    assert_eq!(
        result.deprecated.keys().collect::<Vec<_>>(),
        vec![&cpv("app-misc/gone-0.1")]
    );

    let policy = CleanPolicy {
        package_names: true,
        ..CleanPolicy::destructive()
    };
    let result = search
        .find(&fx.distdir, &ExcludeSpec::new(), &policy, false)
        .unwrap();
    assert_eq!(names(&result.obsolete), vec!["gone-0.1.tar.gz"]);
}

#[test]
fn test_destructive_fetch_restricted() {
    let fx = Fixture::new();
    fx.distfile("game-data.zip", KB, 100);
    fx.distfile("tool-1.0.tar.gz", KB, 100);
    fx.ebuild(
        "games-misc/game-1.0",
        &[("SRC_URI", "game-data.zip"), ("RESTRICT", "fetch")],
    );
    fx.ebuild("dev-util/tool-1.0", &[("SRC_URI", "https://x.org/tool-1.0.tar.gz")]);
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let policy = CleanPolicy {
        fetch_restricted: true,
        ..CleanPolicy::destructive()
    };

    let result = DistfilesSearch::new(&repo, &vdb, &SilentOutput)
        .find(&fx.distdir, &ExcludeSpec::new(), &policy, false)
        .unwrap();
    assert_eq!(names(&result.obsolete), vec!["tool-1.0.tar.gz"]);
}

#[test]
fn test_size_limit_and_filename_exclusions() {
    let fx = Fixture::new();
    fx.distfile("huge.iso", 64 * KB, 100);
    fx.distfile("small.patch", KB, 100);
    fx.distfile("keep-me.tar.gz", KB, 100);
    fx.distfile("firefox-de.xpi", KB, 100);
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let mut exclude = ExcludeSpec::new();
    exclude.add_filename("keep-me.tar.gz");
    exclude.add_filename_pattern(r"firefox-.*\.xpi").unwrap();
    let policy = CleanPolicy {
        size_limit: Some(32 * KB as u64),
        ..CleanPolicy::default()
    };

    let result = DistfilesSearch::new(&repo, &vdb, &SilentOutput)
        .find(&fx.distdir, &exclude, &policy, false)
        .unwrap();
    assert_eq!(names(&result.obsolete), vec!["small.patch"]);
}

#[test]
fn test_missing_distdir() {
    let fx = Fixture::new();
    let (repo, vdb) = (fx.repo(), fx.vdb());
    let missing = fx.root().join("nowhere");
    let search = DistfilesSearch::new(&repo, &vdb, &SilentOutput);

    let err = search
        .find(&missing, &ExcludeSpec::new(), &CleanPolicy::new(), false)
        .unwrap_err();
    assert!(matches!(err, Error::InaccessibleDirectory { .. }));

    let policy = CleanPolicy {
        ignore_failure: true,
        ..CleanPolicy::default()
    };
    let result = search.find(&missing, &ExcludeSpec::new(), &policy, false).unwrap();
    assert!(result.obsolete.is_empty());
}
