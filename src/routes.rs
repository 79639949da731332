mod assets;
mod health_check;
mod submit;

pub use assets::form_script;
pub use health_check::health_check;
pub use submit::{reject_non_post, submit_form, SubmitError};

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
