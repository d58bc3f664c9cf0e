use std::error::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

/// Emits the git describe string used in the CLI version.
/// # Errors
/// * if `git` is not installed
/// * if there is no .git folder, e.g. when building from a source tarball
fn emit_git() -> Result<(), Box<dyn Error>> {
    let gitcl = GitclBuilder::default()
        .describe(false, true, Some("ThisPatternShouldNotMatchAnythingEver"))
        .build()?;

    Emitter::default()
        .fail_on_error()
        .add_instructions(&gitcl)?
        .emit()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    if emit_git().is_err() {
        // no git info available, allow a user override and otherwise fall back to "unknown"
        let git_desc = option_env!("MUTFIT_GIT_DESCRIBE")
            .unwrap_or("unknown");
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE={git_desc}");
    }

    // track the toml and src folder in addition to what vergen emits
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=src");

    Ok(())
}
