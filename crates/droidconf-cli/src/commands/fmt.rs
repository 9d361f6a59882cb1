//! Canonical formatting.

use super::ResolveArgs;
use anyhow::{Context, Result, bail};
use droidconf_config::render;
use std::path::Path;
use tracing::info;

pub fn run(args: &ResolveArgs, path: &Path, check: bool) -> Result<()> {
    let canonical = canonical_text(args, path)?;

    if !check {
        print!("{}", canonical);
        return Ok(());
    }

    let current = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if current != canonical {
        bail!("{} is not in canonical form", path.display());
    }
    info!(path = %path.display(), "Descriptor is canonical");
    Ok(())
}

fn canonical_text(args: &ResolveArgs, path: &Path) -> Result<String> {
    let descriptor = args.resolve(path)?;
    Ok(render(&descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::exit_code;
    use crate::commands::tests::{args, project};

    #[test]
    fn test_check_fails_for_hand_written_file() {
        let (_dir, descriptor) = project(Some(""));
        let err = run(&args(), &descriptor, true).unwrap_err();
        assert!(err.to_string().contains("not in canonical form"));
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_check_passes_after_formatting() {
        let (_dir, descriptor) = project(Some(""));
        let canonical = canonical_text(&args(), &descriptor).unwrap();
        std::fs::write(&descriptor, &canonical).unwrap();

        assert!(run(&args(), &descriptor, true).is_ok());
        assert_eq!(canonical_text(&args(), &descriptor).unwrap(), canonical);
    }
}
