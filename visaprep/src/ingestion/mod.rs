//! Dataset download and train/test split.

mod download;
mod split;
mod stage;

pub use download::{download, url_basename, Downloader, HttpDownloader};
pub use split::{
    prepare, test_row_count, train_test_split, COLUMN_CASE_STATUS, COLUMN_COMPANY_AGE, COLUMN_ID,
    COLUMN_YEAR_ESTB,
};
pub use stage::DataIngestion;
