//! Generic repository
//!
//! One implementation of insert/get/update/delete/list shared by every
//! entity. An entity describes its table through [`Entity`] (and
//! [`Editable`] when it may be updated); the repository builds the SQL,
//! binds values, runs it under the statement timeout and maps rows back.
//! Entities are borrowed for the duration of a call and never retained.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::query_builder::Separated;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::database::Database;
use super::filters::{FilterSpec, ListQuery, Predicate};
use super::metadata::{Metadata, PaginatedResult};
use super::models::{Comment, Direct, Message, Story};
use crate::clock::Clock;
use crate::error::{AppError, StoreOp, ValidationErrors};

/// Field mapping between an entity and its table.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Select list, in the order `FromRow` expects.
    const COLUMNS: &'static str;
    /// Columns written on insert, matching [`Entity::bind_insert`].
    const INSERT_COLUMNS: &'static [&'static str];
    /// Column holding the owning user's id.
    const OWNER_COLUMN: &'static str;
    /// Fields a caller may sort by. Must contain `id`.
    const SORT_SAFELIST: &'static [&'static str];

    fn id(&self) -> i64;

    /// Bind one value per [`Entity::INSERT_COLUMNS`] entry, in order.
    /// `now` stamps creation timestamps.
    fn bind_insert(&self, now: DateTime<Utc>, values: &mut Separated<'_, '_, Sqlite, &'static str>);

    /// Entity-specific filter fields of a list query.
    fn predicates(_query: &ListQuery, _errors: &mut ValidationErrors) -> Vec<Predicate> {
        Vec::new()
    }
}

/// Entities whose rows may be rewritten after insert.
pub trait Editable: Entity {
    /// Push `column = value` pairs for every mutable column.
    fn bind_update(&self, now: DateTime<Utc>, set: &mut Separated<'_, '_, Sqlite, &'static str>);
}

/// One page of rows plus the number of rows matching the predicates.
#[derive(Debug, Clone)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total_records: i64,
}

/// Validate a raw list query for `E`: paging, sort and filter fields.
///
/// All fields are checked before failing.
pub fn parse_list_query<E: Entity>(
    query: &ListQuery,
) -> Result<(FilterSpec, Vec<Predicate>), AppError> {
    let (filter, mut errors) = FilterSpec::parse(query, E::SORT_SAFELIST);
    let predicates = E::predicates(query, &mut errors);
    errors.into_result()?;
    Ok((filter, predicates))
}

fn push_predicates(query: &mut QueryBuilder<'_, Sqlite>, predicates: &[Predicate]) {
    for predicate in predicates {
        predicate.push(query);
    }
}

pub struct Repository<E> {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            clock: self.clock.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            _entity: PhantomData,
        }
    }

    /// Insert a row and return it with its generated id and timestamps.
    ///
    /// # Errors
    /// `WriteFailed` when the store rejects the row; nothing is returned in
    /// that case.
    pub async fn insert(&self, entity: &E) -> Result<E, AppError> {
        let now = self.clock.now();

        let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        query
            .push(E::TABLE)
            .push(" (")
            .push(E::INSERT_COLUMNS.join(", "))
            .push(") VALUES (");
        {
            let mut values = query.separated(", ");
            entity.bind_insert(now, &mut values);
        }
        query.push(") RETURNING ").push(E::COLUMNS);

        // Drain every row: the implicit transaction only commits once the
        // statement has been stepped to completion.
        let inserted = self
            .db
            .bounded(
                StoreOp::Write,
                "INSERT",
                E::TABLE,
                query.build_query_as::<E>().fetch_all(self.db.pool()),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::WriteFailed(format!("insert into {} returned no row", E::TABLE))
            })?;

        tracing::debug!(table = E::TABLE, id = inserted.id(), "Row inserted");
        Ok(inserted)
    }

    /// Fetch one row by id.
    ///
    /// Ids below 1 are never looked up.
    pub async fn get(&self, id: i64) -> Result<E, AppError> {
        if id < 1 {
            return Err(AppError::RecordNotFound);
        }

        let sql = format!("SELECT {} FROM {} WHERE id = ?", E::COLUMNS, E::TABLE);
        self.db
            .bounded(
                StoreOp::Read,
                "SELECT",
                E::TABLE,
                sqlx::query_as::<_, E>(&sql)
                    .bind(id)
                    .fetch_optional(self.db.pool()),
            )
            .await?
            .ok_or(AppError::RecordNotFound)
    }

    /// Hard-delete a row.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(AppError::RecordNotFound);
        }

        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        let result = self
            .db
            .bounded(
                StoreOp::Write,
                "DELETE",
                E::TABLE,
                sqlx::query(&sql).bind(id).execute(self.db.pool()),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RecordNotFound);
        }

        tracing::debug!(table = E::TABLE, id, "Row deleted");
        Ok(())
    }

    /// Hard-delete a row only if `owner_id` owns it.
    ///
    /// Someone else's row is reported exactly like a missing one.
    pub async fn delete_owned(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(AppError::RecordNotFound);
        }

        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND {} = ?",
            E::TABLE,
            E::OWNER_COLUMN
        );
        let result = self
            .db
            .bounded(
                StoreOp::Write,
                "DELETE",
                E::TABLE,
                sqlx::query(&sql)
                    .bind(id)
                    .bind(owner_id)
                    .execute(self.db.pool()),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RecordNotFound);
        }

        tracing::debug!(table = E::TABLE, id, owner_id, "Row deleted by owner");
        Ok(())
    }

    /// One page of rows matching `predicates`, plus the total match count.
    ///
    /// Rows are ordered by the requested sort field and then by id, so pages
    /// never overlap even when sort values repeat.
    pub async fn list(
        &self,
        filter: &FilterSpec,
        predicates: &[Predicate],
    ) -> Result<Page<E>, AppError> {
        if !E::SORT_SAFELIST.contains(&filter.sort_field()) {
            let mut errors = ValidationErrors::new();
            errors.add("sort", "invalid sort value");
            return Err(AppError::ValidationFailed(errors));
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
        query
            .push(E::COLUMNS)
            .push(" FROM ")
            .push(E::TABLE)
            .push(" WHERE 1 = 1");
        push_predicates(&mut query, predicates);
        query
            .push(" ORDER BY ")
            .push(filter.sort_field())
            .push(" ")
            .push(filter.sort_direction().as_sql())
            .push(", id ASC")
            .push(" LIMIT ")
            .push_bind(filter.limit())
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let items = self
            .db
            .bounded(
                StoreOp::Read,
                "SELECT",
                E::TABLE,
                query.build_query_as::<E>().fetch_all(self.db.pool()),
            )
            .await?;
        let total_records = self.count(predicates).await?;

        Ok(Page {
            items,
            total_records,
        })
    }

    /// Number of rows matching `predicates`.
    pub async fn count(&self, predicates: &[Predicate]) -> Result<i64, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        query.push(E::TABLE).push(" WHERE 1 = 1");
        push_predicates(&mut query, predicates);

        self.db
            .bounded(
                StoreOp::Read,
                "COUNT",
                E::TABLE,
                query.build_query_scalar::<i64>().fetch_one(self.db.pool()),
            )
            .await
    }

    /// Every row matching `predicates`, oldest id first.
    pub async fn find_all(&self, predicates: &[Predicate]) -> Result<Vec<E>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
        query
            .push(E::COLUMNS)
            .push(" FROM ")
            .push(E::TABLE)
            .push(" WHERE 1 = 1");
        push_predicates(&mut query, predicates);
        query.push(" ORDER BY id ASC");

        self.db
            .bounded(
                StoreOp::Read,
                "SELECT",
                E::TABLE,
                query.build_query_as::<E>().fetch_all(self.db.pool()),
            )
            .await
    }

    /// [`Repository::list`] plus page metadata.
    pub async fn paginate(
        &self,
        filter: &FilterSpec,
        predicates: &[Predicate],
    ) -> Result<PaginatedResult<E>, AppError> {
        let page = self.list(filter, predicates).await?;
        Ok(PaginatedResult {
            metadata: Metadata::compute(page.total_records, filter.page(), filter.page_size()),
            items: page.items,
        })
    }

    /// Validate a raw list query and return the requested page.
    pub async fn list_from_query(
        &self,
        query: &ListQuery,
    ) -> Result<PaginatedResult<E>, AppError> {
        let (filter, predicates) = parse_list_query::<E>(query)?;
        self.paginate(&filter, &predicates).await
    }
}

impl<E: Editable> Repository<E> {
    /// Rewrite a row's mutable columns.
    ///
    /// # Errors
    /// `EditConflict` when the row disappeared before the write landed.
    pub async fn update(&self, entity: &E) -> Result<E, AppError> {
        if entity.id() < 1 {
            return Err(AppError::RecordNotFound);
        }

        let now = self.clock.now();

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE ");
        query.push(E::TABLE).push(" SET ");
        {
            let mut set = query.separated(", ");
            entity.bind_update(now, &mut set);
        }
        query
            .push(" WHERE id = ")
            .push_bind(entity.id())
            .push(" RETURNING ")
            .push(E::COLUMNS);

        let updated = self
            .db
            .bounded(
                StoreOp::Write,
                "UPDATE",
                E::TABLE,
                query.build_query_as::<E>().fetch_all(self.db.pool()),
            )
            .await?;

        match updated.into_iter().next() {
            Some(updated) => {
                tracing::debug!(table = E::TABLE, id = updated.id(), "Row updated");
                Ok(updated)
            }
            None => {
                tracing::info!(table = E::TABLE, id = entity.id(), "Edit conflict");
                Err(AppError::EditConflict)
            }
        }
    }
}

// =============================================================================
// Entity-specific queries
// =============================================================================

impl Repository<Story> {
    /// Persist `visible = false` for a story.
    ///
    /// Repeating it on an already demoted row changes nothing. Returns
    /// whether the row still exists.
    pub async fn demote(&self, id: i64) -> Result<bool, AppError> {
        let result = self
            .db
            .bounded(
                StoreOp::Write,
                "UPDATE",
                Story::TABLE,
                sqlx::query("UPDATE stories SET visible = 0 WHERE id = ?")
                    .bind(id)
                    .execute(self.db.pool()),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Repository<Comment> {
    pub async fn get_all_from_post(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        self.find_all(&[Predicate::Eq("post_id", post_id)]).await
    }
}

impl Repository<Direct> {
    /// Conversations where `user_id` is either participant.
    pub async fn get_all_from_user(&self, user_id: i64) -> Result<Vec<Direct>, AppError> {
        self.find_all(&[Predicate::EitherEq("user1", "user2", user_id)])
            .await
    }
}

impl Repository<Message> {
    pub async fn get_all_from_direct(&self, direct_id: i64) -> Result<Vec<Message>, AppError> {
        self.find_all(&[Predicate::Eq("direct_id", direct_id)])
            .await
    }
}
