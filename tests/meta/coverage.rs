//! Structural checks keeping `tests/unit` a mirror of `src`

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    fn manifest_path(relative: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
    }

    // Relative paths of every `.rs` file below `dir`, skipping module roots
    fn source_files(dir: &Path, base: &Path, files: &mut BTreeSet<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                source_files(&path, base, files)?;
                continue;
            }
            let is_rust = path.extension().and_then(|ext| ext.to_str()) == Some("rs");
            let is_root = matches!(
                path.file_name().and_then(|name| name.to_str()),
                Some("mod.rs" | "lib.rs" | "main.rs")
            );
            if is_rust && !is_root {
                let relative = path
                    .strip_prefix(base)
                    .map_err(|_stripped| io::Error::other("path outside base directory"))?;
                files.insert(relative.to_path_buf());
            }
        }
        Ok(())
    }

    fn collect(relative: &str) -> io::Result<BTreeSet<PathBuf>> {
        let base = manifest_path(relative);
        let mut files = BTreeSet::new();
        source_files(&base, &base, &mut files)?;
        Ok(files)
    }

    fn listing(paths: &[&PathBuf], prefix: &str) -> String {
        paths
            .iter()
            .map(|path| format!("  - {prefix}/{}", path.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // Tests every source file has a unit test file at the same relative path
    // Fails if a new module is added without tests
    #[test]
    fn test_every_source_file_has_unit_tests() -> io::Result<()> {
        let sources = collect("src")?;
        let tests = collect("tests/unit")?;
        let missing: Vec<&PathBuf> = sources.difference(&tests).collect();

        assert!(
            missing.is_empty(),
            "Source files without unit tests:\n{}",
            listing(&missing, "src")
        );
        Ok(())
    }

    // Tests every unit test file still has a source counterpart
    // Fails if a module is removed but its tests are left behind
    #[test]
    fn test_every_unit_test_has_source() -> io::Result<()> {
        let sources = collect("src")?;
        let tests = collect("tests/unit")?;
        let orphaned: Vec<&PathBuf> = tests.difference(&sources).collect();

        assert!(
            orphaned.is_empty(),
            "Unit test files without a source file:\n{}",
            listing(&orphaned, "tests/unit")
        );
        Ok(())
    }

    // Tests each unit test file is declared by its directory's mod.rs
    // Fails if a test file exists on disk but is never compiled
    #[test]
    fn test_unit_files_are_declared() -> io::Result<()> {
        let base = manifest_path("tests/unit");
        let mut undeclared = Vec::new();

        for relative in collect("tests/unit")? {
            let Some(stem) = relative.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let parent = relative.parent().unwrap_or_else(|| Path::new(""));
            let declarations = fs::read_to_string(base.join(parent).join("mod.rs"))?;
            if !declarations.lines().any(|line| line.trim() == format!("mod {stem};")) {
                undeclared.push(relative);
            }
        }

        assert!(
            undeclared.is_empty(),
            "Unit test files missing a `mod` declaration:\n{}",
            listing(&undeclared.iter().collect::<Vec<_>>(), "tests/unit")
        );
        Ok(())
    }

    // Tests every test file defines at least one test with a described intent
    // Fails if a test file is empty or a test lacks its `// Tests` comment
    #[test]
    fn test_test_files_contain_described_tests() -> io::Result<()> {
        let mut files = collect("tests/unit")?
            .into_iter()
            .map(|relative| Path::new("unit").join(relative))
            .collect::<Vec<_>>();
        files.push(PathBuf::from("pipeline.rs"));

        let base = manifest_path("tests");
        let mut offenders = Vec::new();
        for relative in &files {
            let content = fs::read_to_string(base.join(relative))?;
            let tests = content.matches("#[test]").count();
            let described = content.matches("// Tests ").count();
            if tests == 0 || described < tests {
                offenders.push(relative);
            }
        }

        assert!(
            offenders.is_empty(),
            "Test files with no tests or undescribed tests:\n{}",
            listing(&offenders, "tests")
        );
        Ok(())
    }
}
