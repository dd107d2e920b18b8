use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Trade entered at bar {0} is still open; statistics need closed trades")]
    OpenTrade(usize),
}
