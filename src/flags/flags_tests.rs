use super::{FlagEntry, resolve_for_platform};
use crate::context::{BuildContext, OsName, PythonVersion};

fn ctx(os: OsName, arch: &str) -> BuildContext {
    BuildContext::new(PythonVersion::new(3, 11), os, arch)
}

fn entry(toml: &str) -> FlagEntry {
    toml::from_str(toml).unwrap()
}

#[test]
fn test_unscoped_entry_matches_everywhere() {
    let unscoped = FlagEntry::new("-O2");
    for os in [OsName::Windows, OsName::Linux, OsName::Darwin, OsName::Other] {
        for arch in ["x86_64", "arm64", ""] {
            assert!(unscoped.applies_to(&ctx(os, arch)));
        }
    }
}

#[test]
fn test_platform_scope_is_disjunctive() {
    let entry = entry(r#"arg = "-Wcpp"
platforms = ["linux", "darwin"]"#);
    assert!(entry.applies_to(&ctx(OsName::Linux, "x86_64")));
    assert!(entry.applies_to(&ctx(OsName::Darwin, "arm64")));
    assert!(!entry.applies_to(&ctx(OsName::Windows, "x86_64")));
}

#[test]
fn test_arch_scope() {
    let arm = entry(r#"arg = "-O3"
arch = ["arm64"]"#);
    assert!(arm.applies_to(&ctx(OsName::Linux, "arm64")));
    assert!(!arm.applies_to(&ctx(OsName::Linux, "x86_64")));
    assert!(!arm.applies_to(&ctx(OsName::Linux, "")));
}

#[test]
fn test_anon_arch_matches_only_unspecified() {
    let anon = entry(r#"arg = "-O1"
arch = ["anon"]"#);
    assert!(anon.applies_to(&ctx(OsName::Windows, "")));
    assert!(!anon.applies_to(&ctx(OsName::Windows, "x86_64")));
    assert!(!anon.applies_to(&ctx(OsName::Windows, "arm64")));
}

#[test]
fn test_scopes_compose_conjunctively() {
    let entry = entry(
        r#"arg = "-fast"
platforms = ["darwin"]
arch = ["arm64"]
marker = "python_version >= '3.10'""#,
    );
    assert!(entry.applies_to(&ctx(OsName::Darwin, "arm64")));
    assert!(!entry.applies_to(&ctx(OsName::Linux, "arm64")));
    assert!(!entry.applies_to(&ctx(OsName::Darwin, "x86_64")));

    let py39 = BuildContext::new(PythonVersion::new(3, 9), OsName::Darwin, "arm64");
    assert!(!entry.applies_to(&py39));
}

#[test]
fn test_resolution_preserves_order_and_duplicates() {
    let entries = vec![
        FlagEntry::new("-b"),
        FlagEntry::new("-a"),
        FlagEntry::new("-b"),
    ];
    let resolved = resolve_for_platform(&entries, &ctx(OsName::Linux, "x86_64"), &[], &[]);
    assert_eq!(resolved, vec!["-b", "-a", "-b"]);
}

#[test]
fn test_prefix_prepended_suffix_appended() {
    let entries = vec![FlagEntry::new("-I/abc/def")];
    let prefix = vec!["-I/usr/local/include".to_string()];
    let suffix = vec!["-L/usr/local/lib".to_string()];
    let resolved =
        resolve_for_platform(&entries, &ctx(OsName::Darwin, "x86_64"), &prefix, &suffix);
    assert_eq!(resolved, vec!["-I/usr/local/include", "-I/abc/def", "-L/usr/local/lib"]);
}

#[test]
fn test_injected_defaults_are_not_duplicated() {
    let entries = vec![FlagEntry::new("-I/usr/local/include"), FlagEntry::new("-L/usr/local/lib")];
    let prefix = vec!["-I/usr/local/include".to_string()];
    let suffix = vec!["-L/usr/local/lib".to_string()];
    let resolved =
        resolve_for_platform(&entries, &ctx(OsName::Darwin, "x86_64"), &prefix, &suffix);
    assert_eq!(resolved, vec!["-I/usr/local/include", "-L/usr/local/lib"]);
}

#[test]
fn test_injected_flags_deduplicate_among_themselves() {
    let entries = vec![FlagEntry::new("-Wall")];
    let prefix = vec!["-I/usr/local/include".to_string(), "-I/usr/local/include".to_string()];
    let suffix = vec!["-I/usr/local/include".to_string()];
    let resolved =
        resolve_for_platform(&entries, &ctx(OsName::Darwin, "x86_64"), &prefix, &suffix);
    assert_eq!(resolved, vec!["-I/usr/local/include", "-Wall"]);
}

#[test]
fn test_filtered_entries_do_not_leak() {
    let entries = vec![
        entry(r#"arg = "-win"
platforms = ["windows"]"#),
        FlagEntry::new("-always"),
    ];
    let resolved = resolve_for_platform(&entries, &ctx(OsName::Linux, "x86_64"), &[], &[]);
    assert_eq!(resolved, vec!["-always"]);
}
