//! Unit tests for repository operations using the mock system and engine

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {

    use anyhow::Result;
    use gitfront::config::Settings;
    use gitfront::error::{GitFrontError, exit_code_of};
    use gitfront::git::{MockEngine, SPARSE_CHECKOUT_KEY};
    use gitfront::operations::{
        FOLDER_MARKER, KeyGenerator, RepoContext, SEED_FILE, configure_lfs, copy_to_install,
        create_folder, delete_path, file_tree, generate_key, init_pull, init_repo,
        read_public_key, safe_push, sparse_pull, sparse_update, upload_file, workspace_info,
        write_file,
    };
    use gitfront::system::{MockSystem, System};
    use std::path::{Path, PathBuf};

    const REMOTE: &str = "git@gitee.com:team/docs.git";

    fn repo_system() -> MockSystem {
        MockSystem::new().with_dir("/repo").unwrap()
    }

    fn repo_engine(system: &MockSystem) -> MockEngine {
        MockEngine::new()
            .with_system(system.clone())
            .with_repository("/repo")
    }

    fn with_remote(engine: MockEngine) -> MockEngine {
        engine.with_response("remote get-url origin", REMOTE)
    }

    fn kind_of(err: &anyhow::Error) -> Option<&GitFrontError> {
        err.downcast_ref::<GitFrontError>()
    }

    #[test]
    fn init_repo_creates_repository_and_remote() {
        let system = MockSystem::new();
        let engine = MockEngine::new().with_system(system.clone());
        let mut settings = Settings::new("/srv/docs");
        settings.remote_url = Some(REMOTE.to_owned());
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let initialized = init_repo(&ctx, None).unwrap();

        assert_eq!(initialized.root, PathBuf::from("/srv/docs"));
        assert_eq!(initialized.remote_url.as_deref(), Some(REMOTE));
        assert!(system.is_dir(Path::new("/srv/docs/.git/info")));
        assert_eq!(
            engine.raw_commands(),
            vec![
                "remote get-url origin".to_owned(),
                format!("remote add origin {REMOTE}"),
            ]
        );

        let err = init_repo(&ctx, Some("not a url")).unwrap_err();
        assert_eq!(exit_code_of(&err), 1);
    }

    #[test]
    fn write_file_commits_and_pushes() {
        let system = repo_system();
        let engine = with_remote(repo_engine(&system)).with_response("status", " M docs/a.md\n");
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let change = write_file(&ctx, "docs/a.md", "hello", None).unwrap();

        assert_eq!(change.path, "docs/a.md");
        assert!(change.committed);
        assert_eq!(
            system.read_to_string(Path::new("/repo/docs/a.md")).unwrap(),
            "hello"
        );
        assert_eq!(
            engine.raw_commands(),
            vec![
                "add --all -- docs/a.md",
                "status --porcelain",
                "commit -m Updated",
                "remote get-url origin",
                "push origin master",
            ]
        );
    }

    #[test]
    fn write_file_without_changes_does_not_commit() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let change = write_file(&ctx, "a.md", "same", Some("Edit a")).unwrap();

        assert!(!change.committed);
        assert_eq!(engine.count_raw("commit"), 0);
        assert_eq!(engine.count_raw("push"), 0);
    }

    #[test]
    fn write_file_rejects_unsafe_paths() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        for path in ["../outside.md", "docs/../../outside.md", ".git/config", "/etc/passwd"] {
            let err = write_file(&ctx, path, "x", None).unwrap_err();
            assert!(
                matches!(kind_of(&err), Some(GitFrontError::PathTraversal { .. })),
                "{path} was accepted"
            );
        }

        let err = write_file(&ctx, "", "x", None).unwrap_err();
        assert_eq!(exit_code_of(&err), 1);

        assert_eq!(system.write_count(), 0);
        assert!(engine.raw_commands().is_empty());
    }

    #[test]
    fn create_folder_sanitizes_name_and_adds_marker() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let created = create_folder(&ctx, "../../reports", Some("docs")).unwrap();

        assert_eq!(created.path, "docs/reports");
        assert!(created.published);
        assert!(system.is_dir(Path::new("/repo/docs/reports")));
        assert!(system.is_file(&Path::new("/repo/docs/reports").join(FOLDER_MARKER)));
    }

    #[test]
    fn create_folder_rejects_empty_and_escaping_names() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let err = create_folder(&ctx, "../..", None).unwrap_err();
        assert!(matches!(
            kind_of(&err),
            Some(GitFrontError::Configuration { .. })
        ));

        // Traversal after the leading run is left to the path guard
        let err = create_folder(&ctx, "a/../../../etc", None).unwrap_err();
        assert!(matches!(
            kind_of(&err),
            Some(GitFrontError::PathTraversal { .. })
        ));
    }

    #[test]
    fn create_folder_survives_push_failure() {
        let system = repo_system();
        let engine = with_remote(repo_engine(&system))
            .with_response("status", "A  reports/.myignore\n")
            .with_failure("push", "rejected: non-fast-forward");
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let created = create_folder(&ctx, "reports", None).unwrap();

        assert!(!created.published);
        assert!(system.is_dir(Path::new("/repo/reports")));
    }

    #[test]
    fn delete_path_removes_files_and_folders() {
        let system = MockSystem::new()
            .with_file("/repo/docs/a.md", b"a")
            .unwrap()
            .with_file("/repo/old/b.md", b"b")
            .unwrap();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        delete_path(&ctx, "docs/a.md", None).unwrap();
        assert!(!system.exists(Path::new("/repo/docs/a.md")));

        let change = delete_path(&ctx, "old", Some("Drop old")).unwrap();
        assert_eq!(change.path, "old");
        assert!(!system.exists(Path::new("/repo/old/b.md")));

        let err = delete_path(&ctx, "missing.md", None).unwrap_err();
        assert!(matches!(kind_of(&err), Some(GitFrontError::FileIo { .. })));

        let err = delete_path(&ctx, ".", None).unwrap_err();
        assert!(matches!(
            kind_of(&err),
            Some(GitFrontError::Configuration { .. })
        ));
        assert!(system.exists(Path::new("/repo")));
    }

    #[test]
    fn copy_to_install_checks_out_parent_and_copies() {
        let system = MockSystem::new()
            .with_file("/repo/docs/setup.exe", b"binary")
            .unwrap();
        let engine = repo_engine(&system);
        let mut settings = Settings::new("/repo");
        settings.install_path = Some("/opt/install".to_owned());
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let installed = copy_to_install(&ctx, "docs/setup.exe").unwrap();

        assert_eq!(installed.source, "docs/setup.exe");
        assert_eq!(installed.destination, PathBuf::from("/opt/install/setup.exe"));
        assert_eq!(
            system
                .read_to_string(Path::new("/opt/install/setup.exe"))
                .unwrap(),
            "binary"
        );
        assert_eq!(
            system
                .read_to_string(Path::new("/repo/.git/info/sparse-checkout"))
                .unwrap(),
            "docs/*\n!/*"
        );
        assert_eq!(engine.count_raw("sparse-checkout reapply"), 1);
        assert_eq!(engine.count_raw("pull"), 0);
    }

    #[test]
    fn copy_to_install_requires_install_path() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let err = copy_to_install(&ctx, "a.txt").unwrap_err();
        assert!(matches!(
            kind_of(&err),
            Some(GitFrontError::Configuration { .. })
        ));
    }

    #[test]
    fn sparse_pull_keeps_patterns_and_pulls() {
        let system = repo_system();
        let engine = with_remote(repo_engine(&system));
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();
        let pattern_file = Path::new("/repo/.git/info/sparse-checkout");

        sparse_update(&ctx, "docs").unwrap();
        engine.reset_calls();
        let writes_before = system.write_count();

        let pulled = sparse_pull(&ctx, "/other/").unwrap();

        assert_eq!(pulled.workspace, "other");
        assert!(!pulled.changed);
        assert_eq!(system.read_to_string(pattern_file).unwrap(), "docs/*\n!/*");
        assert_eq!(system.write_count(), writes_before);
        assert_eq!(
            engine.raw_commands(),
            vec![
                "remote get-url origin",
                "sparse-checkout reapply",
                "pull origin master"
            ]
        );
    }

    #[test]
    fn sparse_pull_checks_workspace_and_remote_first() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let err = sparse_pull(&ctx, "../etc").unwrap_err();
        assert_eq!(exit_code_of(&err), 2);

        let err = sparse_pull(&ctx, "docs").unwrap_err();
        assert_eq!(exit_code_of(&err), 1);
        assert_eq!(engine.count_raw("sparse-checkout"), 0);
        assert_eq!(engine.count_raw("pull"), 0);
    }

    #[test]
    fn init_pull_seeds_empty_remote() {
        let system = MockSystem::new();
        let engine = with_remote(MockEngine::new().with_system(system.clone()))
            .with_failure("pull", "fatal: couldn't find remote ref master")
            .with_response("status", "A  README.md\n");
        let mut settings = Settings::new("/srv/docs");
        settings.remote_url = Some(REMOTE.to_owned());
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let outcome = init_pull(&ctx).unwrap();

        assert!(!outcome.pulled);
        assert!(outcome.seeded);
        assert_eq!(
            system
                .read_to_string(&Path::new("/srv/docs").join(SEED_FILE))
                .unwrap(),
            "# docs\n"
        );
        assert_eq!(
            engine.raw_commands(),
            vec![
                "remote get-url origin",
                "remote get-url origin",
                "pull origin master",
                "add --all -- README.md",
                "status --porcelain",
                "commit -m Initial commit",
                "push --set-upstream origin master",
            ]
        );
    }

    #[test]
    fn init_pull_pulls_existing_branch() {
        let system = repo_system();
        let engine = with_remote(repo_engine(&system));
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let outcome = init_pull(&ctx).unwrap();

        assert!(outcome.pulled);
        assert!(!outcome.seeded);
        assert_eq!(engine.count_raw("push"), 0);
        assert!(!system.exists(Path::new("/repo/README.md")));
    }

    #[test]
    fn init_pull_propagates_other_failures() {
        let system = repo_system();
        let engine = with_remote(repo_engine(&system))
            .with_failure("pull", "fatal: Authentication failed");
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let err = init_pull(&ctx).unwrap_err();

        assert_eq!(exit_code_of(&err), 3);
        assert!(!system.exists(Path::new("/repo/README.md")));
        assert_eq!(engine.count_raw("commit"), 0);
    }

    #[test]
    fn upload_pulls_before_copying() {
        let system = repo_system()
            .with_file("/home/portal/report.pdf", b"%PDF")
            .unwrap();
        let engine =
            with_remote(repo_engine(&system)).with_response("status", "A  docs/report.pdf\n");
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let uploaded =
            upload_file(&ctx, Path::new("/home/portal/report.pdf"), "docs", None).unwrap();

        assert_eq!(uploaded.path, "docs/report.pdf");
        assert!(uploaded.committed);
        assert_eq!(
            system
                .read_to_string(Path::new("/repo/docs/report.pdf"))
                .unwrap(),
            "%PDF"
        );
        assert_eq!(
            engine.raw_commands(),
            vec![
                "remote get-url origin",
                "pull origin master",
                "add --all -- docs/report.pdf",
                "status --porcelain",
                "commit -m Updated: report.pdf",
                "remote get-url origin",
                "push origin master",
            ]
        );
    }

    #[test]
    fn upload_stops_when_pull_fails() {
        let system = repo_system()
            .with_file("/home/portal/report.pdf", b"%PDF")
            .unwrap();
        let engine = with_remote(repo_engine(&system))
            .with_failure("pull", "CONFLICT (content): Merge conflict in docs/report.pdf");
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();
        let source = Path::new("/home/portal/report.pdf");

        let err = upload_file(&ctx, source, "docs", None).unwrap_err();
        assert_eq!(exit_code_of(&err), 3);
        assert!(!system.exists(Path::new("/repo/docs/report.pdf")));

        let err = upload_file(&ctx, source, "../outside", None).unwrap_err();
        assert_eq!(exit_code_of(&err), 2);

        let err = upload_file(&ctx, Path::new("/home/portal/missing.pdf"), "", None).unwrap_err();
        assert_eq!(exit_code_of(&err), 5);
    }

    #[test]
    fn safe_push_requires_remote() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let err = safe_push(&ctx, None).unwrap_err();
        assert_eq!(exit_code_of(&err), 1);
        assert_eq!(engine.count_raw("push"), 0);
    }

    #[test]
    fn safe_push_runs_full_cycle() {
        let system = repo_system();
        let engine = with_remote(repo_engine(&system)).with_response("status", "?? new.md\n");
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let outcome = safe_push(&ctx, Some("Sync")).unwrap();

        assert!(outcome.committed);
        assert_eq!(
            engine.raw_commands(),
            vec![
                "remote get-url origin",
                "pull origin master",
                "add --all -- .",
                "status --porcelain",
                "commit -m Sync",
                "push origin master",
            ]
        );
    }

    #[test]
    fn lfs_validates_extensions() {
        let system = repo_system();
        let engine = repo_engine(&system);
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let err = configure_lfs(&ctx, &["psd".to_owned()]).unwrap_err();
        assert_eq!(exit_code_of(&err), 1);
        assert!(engine.raw_commands().is_empty());

        let configured = configure_lfs(&ctx, &[".psd".to_owned()]).unwrap();
        assert_eq!(configured.tracked, vec![".psd"]);
        assert_eq!(
            engine.raw_commands(),
            vec!["lfs install --local", "lfs track *.psd"]
        );

        engine.reset_calls();
        configure_lfs(&ctx, &[]).unwrap();
        assert_eq!(engine.raw_commands(), vec!["lfs install --local"]);
    }

    #[test]
    fn file_tree_uses_default_branch() {
        let system = repo_system();
        let engine = repo_engine(&system).with_response(
            "ls-tree -r -z master",
            "100644 blob aaaa\tREADME.md\0100644 blob bbbb\tdocs/index.md\0100644 blob cccc\t文档/说明.md\0",
        );
        let settings = Settings::new("/repo");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let listing = file_tree(&ctx, None).unwrap();
        let children = listing.tree.children.unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].name, "docs");
        assert_eq!(children[2].name, "文档");
        assert_eq!(listing.index["docs/index.md"].hash.as_deref(), Some("bbbb"));
        assert_eq!(listing.index["文档/说明.md"].hash.as_deref(), Some("cccc"));

        let err = {
            let engine = repo_engine(&system).with_failure("ls-tree", "fatal: Not a valid object name");
            let ctx = RepoContext::new(&system, &engine, &settings).unwrap();
            file_tree(&ctx, Some("missing")).unwrap_err()
        };
        assert!(matches!(
            kind_of(&err),
            Some(GitFrontError::EngineCommand { .. })
        ));
    }

    #[test]
    fn workspace_info_reports_state() {
        let system = MockSystem::new();
        let engine = MockEngine::new().with_system(system.clone());
        let mut settings = Settings::new("/repo");
        settings.remote_url = Some(REMOTE.to_owned());
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();

        let info = workspace_info(&ctx, "/docs/").unwrap();
        assert_eq!(info.workspace, "docs");
        assert_eq!(info.path, PathBuf::from("/repo/docs"));
        assert!(!info.initialized);
        assert_eq!(info.sparse_state, "uninitialized");
        assert_eq!(info.remote_url.as_deref(), Some(REMOTE));

        let engine = repo_engine(&system).with_config("/repo", SPARSE_CHECKOUT_KEY, "true");
        let ctx = RepoContext::new(&system, &engine, &settings).unwrap();
        assert_eq!(workspace_info(&ctx, "").unwrap().sparse_state, "initialized");

        assert!(workspace_info(&ctx, "../etc").is_err());
    }

    struct FakeKeygen {
        system: MockSystem,
    }

    impl KeyGenerator for FakeKeygen {
        fn generate(&self, key_path: &Path, email: &str) -> Result<()> {
            let mut public = key_path.as_os_str().to_owned();
            public.push(".pub");
            self.system.write(key_path, b"PRIVATE")?;
            self.system
                .write(Path::new(&public), format!("ssh-rsa AAAA {email}\n").as_bytes())?;
            Ok(())
        }
    }

    #[test]
    fn generate_key_provisions_ssh_directory() {
        let system = MockSystem::new().with_home_dir("/home/dev").unwrap();
        let generator = FakeKeygen {
            system: system.clone(),
        };
        let settings = Settings::new("/repo");

        let err = read_public_key(&system, &settings.ssh).unwrap_err();
        assert!(matches!(kind_of(&err), Some(GitFrontError::FileIo { .. })));

        let key = generate_key(&system, &generator, &settings.ssh, "dev@example.com", false)
            .unwrap();

        assert_eq!(key.key_path, PathBuf::from("/home/dev/.ssh/gitee_id_rsa"));
        assert_eq!(key.public_key, "ssh-rsa AAAA dev@example.com");
        assert_eq!(system.mode_of(Path::new("/home/dev/.ssh")), Some(0o700));
        let ssh_config = system
            .read_to_string(Path::new("/home/dev/.ssh/config"))
            .unwrap();
        assert!(ssh_config.contains("Host gitee.com"));

        let err = generate_key(&system, &generator, &settings.ssh, "dev@example.com", false)
            .unwrap_err();
        assert_eq!(exit_code_of(&err), 1);

        let key = generate_key(&system, &generator, &settings.ssh, "ops@example.com", true)
            .unwrap();
        assert_eq!(key.public_key, "ssh-rsa AAAA ops@example.com");
        assert_eq!(read_public_key(&system, &settings.ssh).unwrap(), key);
    }

    #[test]
    fn ssh_config_is_appended_not_replaced() {
        let system = MockSystem::new()
            .with_home_dir("/home/dev")
            .unwrap()
            .with_file("/home/dev/.ssh/config", b"Host github.com\n  User git\n")
            .unwrap();
        let generator = FakeKeygen {
            system: system.clone(),
        };
        let settings = Settings::new("/repo");

        generate_key(&system, &generator, &settings.ssh, "dev@example.com", false).unwrap();

        let ssh_config = system
            .read_to_string(Path::new("/home/dev/.ssh/config"))
            .unwrap();
        assert!(ssh_config.starts_with("Host github.com\n  User git\n\n# gitee.com\nHost gitee.com\n"));
    }
}
