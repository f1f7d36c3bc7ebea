// src/distfiles/protect.rs

//! Protection and rescue passes over the cleaning candidates

use crate::cpv::Cpv;
use crate::output::OutputSink;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Filename -> paths of the files carrying it
pub type Candidates = BTreeMap<String, Vec<PathBuf>>;

/// Local filenames a `SRC_URI` value downloads to
///
/// `uri -> name` pairs save under `name`; anything else under the last
/// path component of the URI.
pub fn src_uri_filenames(src_uri: &str) -> Vec<&str> {
    let tokens: Vec<&str> = src_uri.split_whitespace().collect();
    let mut names = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1) == Some(&"->") {
            if let Some(name) = tokens.get(i + 2) {
                names.push(*name);
            }
            i += 3;
        } else {
            names.push(tokens[i].rsplit('/').next().unwrap_or(tokens[i]));
            i += 1;
        }
    }

    names
}

/// Drop every candidate a retained package still downloads
pub fn remove_protected(retained: &BTreeMap<Cpv, String>, candidates: &mut Candidates) {
    for src_uri in retained.values() {
        if candidates.is_empty() {
            return;
        }
        for name in src_uri_filenames(src_uri) {
            candidates.remove(name);
        }
    }
}

/// Move candidates whose name matches an excluded package's prefix
pub fn rescue(patterns: &[Regex], candidates: &mut Candidates, output: &dyn OutputSink) -> Candidates {
    let mut rescued = Candidates::new();
    if patterns.is_empty() {
        return rescued;
    }

    let matched: Vec<String> = candidates
        .keys()
        .filter(|name| patterns.iter().any(|re| re.is_match(name)))
        .cloned()
        .collect();

    for name in matched {
        if let Some(paths) = candidates.remove(&name) {
            output.message(&format!("   ...kept excluded package file: {}", name));
            rescued.insert(name, paths);
        }
    }

    rescued
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CollectOutput;

    fn candidates(names: &[&str]) -> Candidates {
        names
            .iter()
            .map(|n| (n.to_string(), vec![PathBuf::from("/distfiles").join(n)]))
            .collect()
    }

    #[test]
    fn test_src_uri_filenames() {
        let names = src_uri_filenames(
            "https://example.org/foo-1.0.tar.gz \
             ssl? ( https://example.org/v1.0.tar.gz -> foo-ssl-1.0.tar.gz ) \
             mirror://gnu/bar.patch",
        );
        assert_eq!(
            names,
            vec!["foo-1.0.tar.gz", "ssl?", "(", "foo-ssl-1.0.tar.gz", ")", "bar.patch"]
        );
        assert!(src_uri_filenames("").is_empty());
    }

    #[test]
    fn test_remove_protected_resolves_renames() {
        let mut retained = BTreeMap::new();
        retained.insert(
            Cpv::parse("app-misc/foo-2.0").unwrap(),
            "https://example.org/v2.0.tar.gz -> foo-2.0.tar.gz".to_string(),
        );
        let mut dirty = candidates(&["foo-1.0.tar.gz", "foo-2.0.tar.gz", "v2.0.tar.gz"]);

        remove_protected(&retained, &mut dirty);
        assert_eq!(
            dirty.keys().collect::<Vec<_>>(),
            vec!["foo-1.0.tar.gz", "v2.0.tar.gz"]
        );
    }

    #[test]
    fn test_rescue_moves_matches() {
        let output = CollectOutput::new();
        let patterns = vec![Regex::new("^foo[-_.]").unwrap()];
        let mut dirty = candidates(&["foo-1.0.tar.gz", "foobar-1.0.tar.gz"]);

        let rescued = rescue(&patterns, &mut dirty, &output);
        assert_eq!(rescued.keys().collect::<Vec<_>>(), vec!["foo-1.0.tar.gz"]);
        assert_eq!(dirty.keys().collect::<Vec<_>>(), vec!["foobar-1.0.tar.gz"]);
        assert_eq!(output.messages().len(), 1);
    }
}
