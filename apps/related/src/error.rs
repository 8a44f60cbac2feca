pub type Result<T> = color_eyre::Result<T>;

pub use color_eyre::eyre::WrapErr;
pub use color_eyre::eyre::eyre as error;

/// Converts library (`anyhow`) results into reports, keeping the cause chain
/// in the message.
pub trait IntoReport<T> {
    fn into_report(self) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoReport<T> for std::result::Result<T, E> {
    fn into_report(self) -> Result<T> {
        self.map_err(|e| error!("{:#}", e))
    }
}
