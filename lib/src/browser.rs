use crate::error::Result;

/// Open a stored URL in the system's default browser.
pub fn open_url(url: &str) -> Result<()> {
    open::that(url)?;
    Ok(())
}
