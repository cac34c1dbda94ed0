//! Site directories: one listing call each, parsed into records with name/id lookups.

mod projects;
mod workbooks;
mod views;
mod groups;
mod users;

pub use projects::{Project, Projects};
pub use workbooks::{download_workbook, Workbook, Workbooks};
pub use views::{query_view_data, View, WorkbookViews};
pub use groups::{groups_for_user, Group, Groups, ALL_USERS_GROUP};
pub use users::{users_in_group, User, Users};

use crate::error::{ClientError, ClientResult};
use crate::xml::Element;

/// First record whose `field` equals `value`. A miss reports every known value.
fn lookup<'a, T>(records: &'a [T], value: &str, field: impl Fn(&T) -> &str) -> ClientResult<&'a T> {
    records
        .iter()
        .find(|r| field(r) == value)
        .ok_or_else(|| ClientError::not_found(value, records.iter().map(|r| field(r).to_string())))
}

fn opt_attr(el: &Element, key: &str) -> Option<String> { el.attr(key).map(str::to_string) }

fn req_attr(el: &Element, key: &str) -> ClientResult<String> { el.required_attr(key).map(str::to_string) }
