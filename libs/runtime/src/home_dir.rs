use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

/// Resolve the service home directory to an absolute path.
///
/// `explicit` may start with `~` (expanded against the user home) or be
/// relative (joined to the current directory). With no explicit value the
/// result is `<platform home>/<default_subdir>`, where the platform home is
/// `%APPDATA%` on Windows and `$HOME` elsewhere. With `create` set the
/// directory is created if missing.
pub fn resolve_home_dir(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match explicit {
        Some(raw) => expand(&raw)?,
        None => platform_home()?.join(default_subdir),
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("cannot create home dir {}", resolved.display()))?;
    }
    Ok(resolved)
}

fn expand(raw: &str) -> Result<PathBuf> {
    let path = if raw == "~" {
        platform_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        platform_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()
            .context("cannot read current directory")?
            .join(path))
    }
}

fn platform_home() -> Result<PathBuf> {
    let var = if cfg!(windows) { "APPDATA" } else { "HOME" };
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .ok_or_else(|| anyhow!("{var} is not set to an absolute path"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_absolute_path_is_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a/b");
        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().into_owned()), ".x", true).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn relative_path_is_made_absolute_without_creating() {
        let resolved = resolve_home_dir(Some("some/rel/dir".into()), ".x", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/rel/dir"));
    }
}
