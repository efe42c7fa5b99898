use std::{collections::HashMap, str::FromStr};

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Argon2,
};
use derive_more::Display;
use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteRow, SqliteTypeInfo, SqliteValueRef},
    Database, Decode, Encode, Error, FromRow, QueryBuilder, Row as _, Sqlite,
    Type,
};
use uuid::Uuid;

use super::Client;

#[derive(Clone, Debug)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role: Role,
}

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: row.try_get("role")?,
        })
    }
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
        Self(Uuid::new_v4())
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

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer = 1,
    Admin = 2,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Admin => "Admin",
        }
    }
}

impl Type<Sqlite> for Role {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <i64 as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for Role {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let repr = <i64 as Decode<Sqlite>>::decode(value)?;
        let repr = u8::try_from(repr)?;
        let role = Self::try_from(repr).map_err(|_| "invalid role")?;
        Ok(role)
    }
}

impl<'q> Encode<'q, Sqlite> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        let repr = i64::from((*self) as u8);
        <i64 as Encode<Sqlite>>::encode(repr, buf)
    }
}

/// Salted argon2 hash in PHC string form.
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(secret: &str) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
        Ok(Self(hash.to_string()))
    }

    /// Recomputes the hash of `secret` with the stored salt and compares.
    pub fn verify(&self, secret: &str) -> bool {
        password_hash::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(secret.as_bytes(), &hash)
                .is_ok()
        })
    }
}

impl Type<Sqlite> for PasswordHash {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for PasswordHash {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        <String as Decode<Sqlite>>::decode(value).map(Self)
    }
}

impl<'q> Encode<'q, Sqlite> for PasswordHash {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <String as Encode<Sqlite>>::encode_by_ref(&self.0, buf)
    }
}

impl Client {
    pub async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error> {
        const SQL: &str = "SELECT id, name, email, password_hash, role \
                           FROM users \
                           WHERE email = ? \
                           LIMIT 1";
        sqlx::query_as(SQL).bind(email).fetch_optional(&self.0).await
    }

    pub async fn get_user_by_id(&self, id: Id) -> Result<Option<User>, Error> {
        const SQL: &str = "SELECT id, name, email, password_hash, role \
                           FROM users \
                           WHERE id = ? \
                           LIMIT 1";
        sqlx::query_as(SQL).bind(id).fetch_optional(&self.0).await
    }

    pub async fn get_users_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, User>, Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, email, password_hash, role \
             FROM users \
             WHERE id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        Ok(query
            .build_query_as::<User>()
            .fetch_all(&self.0)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect())
    }

    pub async fn get_customers(&self) -> Result<Vec<User>, Error> {
        const SQL: &str = "SELECT id, name, email, password_hash, role \
                           FROM users \
                           WHERE role = ? \
                           ORDER BY name, email";
        sqlx::query_as(SQL)
            .bind(Role::Customer)
            .fetch_all(&self.0)
            .await
    }

    pub async fn admin_exists(&self) -> Result<bool, Error> {
        const SQL: &str = "SELECT COUNT(*) FROM users WHERE role = ?";
        let count: i64 = sqlx::query_scalar(SQL)
            .bind(Role::Admin)
            .fetch_one(&self.0)
            .await?;
        Ok(count > 0)
    }

    pub async fn write_user(&self, user: &User) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO users (id, name, email, password_hash, role) \
            VALUES (?, ?, ?, ?, ?) \
            ON CONFLICT (id) DO UPDATE \
            SET name = excluded.name, \
                email = excluded.email, \
                password_hash = excluded.password_hash, \
                role = excluded.role";

        sqlx::query(SQL)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .execute(&self.0)
            .await
            .map(drop)
    }

    /// Deletes a customer together with all of their requests.
    ///
    /// Returns `false` if no customer with the given `id` exists.
    pub async fn delete_customer(&self, id: Id) -> Result<bool, Error> {
        const DELETE_REQUESTS: &str = "DELETE FROM requests WHERE owner_id = ?";
        const DELETE_USER: &str = "DELETE FROM users WHERE id = ? AND role = ?";

        let mut tx = self.0.begin().await?;
        sqlx::query(DELETE_REQUESTS)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query(DELETE_USER)
            .bind(id)
            .bind(Role::Customer)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_hashed_password() {
        let hash = PasswordHash::new("password").unwrap();
        assert!(hash.verify("password"));
        assert!(!hash.verify("Password"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn never_stores_plaintext() {
        let hash = PasswordHash::new("password").unwrap();
        assert_ne!(hash.0, "password");
        assert!(hash.0.starts_with("$argon2"));
    }

    #[test]
    fn salts_every_hash() {
        let first = PasswordHash::new("password").unwrap();
        let second = PasswordHash::new("password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_malformed_stored_hash() {
        assert!(!PasswordHash("not a hash".to_string()).verify("not a hash"));
    }
}
