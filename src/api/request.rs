use time::{macros::format_description, OffsetDateTime};

use crate::api;

pub use crate::db::request::{Id, Status, UnknownStatus};

#[derive(Clone, Debug)]
pub struct ServiceRequest {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub owner: api::User,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ServiceRequest {
    pub fn created(&self) -> String {
        format_timestamp(self.created_at)
    }

    pub fn updated(&self) -> String {
        format_timestamp(self.updated_at)
    }

    /// Entries of the admin's status selector, the current status selected.
    pub fn status_options(&self) -> Vec<StatusOption> {
        Status::ALL
            .into_iter()
            .map(|status| StatusOption {
                value: status.as_str(),
                label: status.label(),
                selected: status == self.status,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .unwrap_or_default()
}
