//! CLI presentation: text and json formatters per command family.

mod filter;
mod import;
mod package;

pub use filter::{format_filter_check, PathCheck};
pub use import::format_import_report;
pub use package::{
    format_install_result, format_package_list, format_plan, format_uninstall_result,
    format_usage,
};

use crate::error::PackageError;
use serde::Serialize;

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, PackageError> {
    serde_json::to_string_pretty(value).map_err(|e| PackageError::Output(e.to_string()))
}
