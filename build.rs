use vergen_gitcl::{Emitter, Gitcl};

/// Embed the git branch, commit and dirty state reported by `GET /health`.
///
/// Outside a git checkout vergen emits nothing and `version_string()`
/// reports "unknown".
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let git = Gitcl::builder().branch(true).sha(true).dirty(true).build();
    Emitter::default().add_instructions(&git)?.emit()?;
    Ok(())
}
