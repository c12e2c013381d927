//! Unit tests for repository path containment

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {

    use gitfront::error::{GitFrontError, exit_code_of};
    use gitfront::guard::{PathGuard, is_within_root, normalize_workspace, sanitize_relative_segment};
    use gitfront::system::MockSystem;
    use std::path::{Path, PathBuf};

    fn is_traversal(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<GitFrontError>(),
            Some(GitFrontError::PathTraversal { .. })
        )
    }

    #[test]
    fn test_documented_examples() {
        let guard = PathGuard::new("/repo");

        let err = guard.resolve("../../etc").unwrap_err();
        assert!(is_traversal(&err));
        assert_eq!(exit_code_of(&err), 2);

        assert_eq!(
            guard.resolve("sub/dir").unwrap(),
            PathBuf::from("/repo/sub/dir")
        );
    }

    #[test]
    fn test_root_with_trailing_separator_and_dots() {
        let guard = PathGuard::new("/srv/./repo/");
        assert_eq!(guard.root(), Path::new("/srv/repo"));
        assert_eq!(guard.resolve("a.md").unwrap(), PathBuf::from("/srv/repo/a.md"));
        assert!(guard.resolve("../repo2/a.md").is_err());
    }

    #[test]
    fn test_prefix_sharing_sibling_is_outside() {
        assert!(!is_within_root(Path::new("/repo"), Path::new("/repository")));
        assert!(!is_within_root(Path::new("/repo"), Path::new("/repo-backup/x")));
        assert!(!is_within_root(Path::new("/repo/docs"), Path::new("/repo")));
        assert!(is_within_root(Path::new("/repo"), Path::new("/repo/./x/../y")));
    }

    #[test]
    fn test_windows_separators_are_guarded() {
        let guard = PathGuard::new("/repo");
        assert_eq!(
            guard.resolve("docs\\api\\ref.md").unwrap(),
            PathBuf::from("/repo/docs/api/ref.md")
        );
        assert!(is_traversal(&guard.resolve("docs\\..\\..\\etc").unwrap_err()));
    }

    #[test]
    fn test_sanitize_then_guard() {
        let guard = PathGuard::new("/repo");

        // Leading parent references are dropped before the guard sees the name
        let name = sanitize_relative_segment("../../../reports");
        assert_eq!(name, "reports");
        assert_eq!(guard.resolve(&name).unwrap(), PathBuf::from("/repo/reports"));

        // Traversal hidden after the prefix survives sanitizing and is rejected
        let name = sanitize_relative_segment("../a/../../etc");
        assert_eq!(name, "a/../../etc");
        assert!(is_traversal(&guard.resolve(&name).unwrap_err()));

        assert_eq!(sanitize_relative_segment("..\\..\\x"), "x");
        assert_eq!(sanitize_relative_segment("../.."), "");
        assert_eq!(sanitize_relative_segment("..name"), "..name");
    }

    #[test]
    fn test_normalize_workspace_forms() {
        assert_eq!(normalize_workspace("").unwrap(), "");
        assert_eq!(normalize_workspace("  /").unwrap(), "");
        assert_eq!(normalize_workspace("/guides/intro/").unwrap(), "guides/intro");
        assert_eq!(normalize_workspace("guides\\intro").unwrap(), "guides/intro");
        assert_eq!(normalize_workspace("guides/./x/../intro").unwrap(), "guides/intro");
        assert!(is_traversal(&normalize_workspace("guides/../../x").unwrap_err()));
    }

    #[test]
    fn test_resolve_real_in_memory_has_no_symlinks() {
        let system = MockSystem::new().with_dir("/repo/docs").unwrap();
        let guard = PathGuard::new("/repo");

        assert_eq!(
            guard.resolve_real(&system, "docs/new/file.md").unwrap(),
            PathBuf::from("/repo/docs/new/file.md")
        );
        assert!(is_traversal(
            &guard.resolve_real(&system, "../elsewhere").unwrap_err()
        ));
    }
}
