use std::str::FromStr;

use derive_more::Display;
use enum_utils::TryFromRepr;
use futures::TryStreamExt as _;
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteRow, SqliteTypeInfo, SqliteValueRef},
    Database, Decode, Encode, Error, FromRow, Row as _, Sqlite, Type,
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{user, Client};

#[derive(Clone, Debug)]
pub struct ServiceRequest {
    pub id: Id,
    pub owner: user::Id,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for ServiceRequest {
    fn from_row(row: &SqliteRow) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            created_at: from_nanos(row.try_get("created_at")?)?,
            updated_at: from_nanos(row.try_get("updated_at")?)?,
        })
    }
}

// Timestamps are stored as unix nanoseconds to keep their order in SQL.

fn to_nanos(at: OffsetDateTime) -> Result<i64, Error> {
    i64::try_from(at.unix_timestamp_nanos())
        .map_err(|e| Error::Encode(e.into()))
}

fn from_nanos(nanos: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(nanos.into())
        .map_err(|e| Error::Decode(e.into()))
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Type<Sqlite> for Id {
    fn type_info() -> SqliteTypeInfo {
        <Uuid as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <Uuid as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for Id {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        <Uuid as Decode<Sqlite>>::decode(value).map(Self)
    }
}

impl<'q> Encode<'q, Sqlite> for Id {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <Uuid as Encode<Sqlite>>::encode_by_ref(&self.0, buf)
    }
}

/// Any status may be changed to any other one by an admin.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Status {
    /// Submitted by the customer and not looked at yet.
    Submitted = 1,

    /// An admin is working on the request.
    InProgress = 2,

    /// The request is done.
    Resolved = 3,

    /// The request won't be done.
    Rejected = 4,
}

impl Status {
    pub const ALL: [Self; 4] = [
        Self::Submitted,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
    ];

    /// Form value of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(UnknownStatus)
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display("unknown status")]
pub struct UnknownStatus;

impl Type<Sqlite> for Status {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <i64 as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for Status {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let repr = <i64 as Decode<Sqlite>>::decode(value)?;
        let repr = u8::try_from(repr)?;
        let status = Self::try_from(repr).map_err(|_| "invalid status")?;
        Ok(status)
    }
}

impl<'q> Encode<'q, Sqlite> for Status {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        let repr = i64::from((*self) as u8);
        <i64 as Encode<Sqlite>>::encode(repr, buf)
    }
}

impl Client {
    pub async fn get_request_by_id(
        &self,
        id: Id,
    ) -> Result<Option<ServiceRequest>, Error> {
        const SQL: &str = "\
            SELECT id, owner_id, title, description, status, \
                   created_at, updated_at \
            FROM requests \
            WHERE id = ?";
        sqlx::query_as(SQL).bind(id).fetch_optional(&self.0).await
    }

    pub async fn write_request(
        &self,
        request: &ServiceRequest,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO requests (id, owner_id, title, description, status, \
                                  created_at, updated_at) \
            VALUES (?, ?, ?, ?, ?, ?, ?) \
            ON CONFLICT (id) DO UPDATE \
            SET owner_id = excluded.owner_id, \
                title = excluded.title, \
                description = excluded.description, \
                status = excluded.status, \
                created_at = excluded.created_at, \
                updated_at = excluded.updated_at";

        sqlx::query(SQL)
            .bind(request.id)
            .bind(request.owner)
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.status)
            .bind(to_nanos(request.created_at)?)
            .bind(to_nanos(request.updated_at)?)
            .execute(&self.0)
            .await
            .map(drop)
    }

    /// Newest first.
    pub async fn get_requests(&self) -> Result<Vec<ServiceRequest>, Error> {
        const SQL: &str = "\
            SELECT id, owner_id, title, description, status, \
                   created_at, updated_at \
            FROM requests \
            ORDER BY created_at DESC, \
                     id DESC";
        sqlx::query_as::<_, ServiceRequest>(SQL)
            .fetch(&self.0)
            .try_collect()
            .await
    }

    /// Newest first.
    pub async fn get_requests_by_owner(
        &self,
        owner: user::Id,
    ) -> Result<Vec<ServiceRequest>, Error> {
        const SQL: &str = "\
            SELECT id, owner_id, title, description, status, \
                   created_at, updated_at \
            FROM requests \
            WHERE owner_id = ? \
            ORDER BY created_at DESC, \
                     id DESC";
        sqlx::query_as::<_, ServiceRequest>(SQL)
            .bind(owner)
            .fetch(&self.0)
            .try_collect()
            .await
    }

    /// Returns `false` if no request with the given `id` exists.
    pub async fn delete_request(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM requests WHERE id = ?";
        let deleted = sqlx::query(SQL)
            .bind(id)
            .execute(&self.0)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
