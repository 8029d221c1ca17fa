//! SQLite-backed resource store.
//!
//! # Invariants
//! - The wrapped connection is migrated to `latest_version()` before use.
//! - Listing order is `created_at ASC, rowid ASC`.
//! - File batches are written in one immediate transaction.
//! - Opening a store moves the slug token counter past every stored slug.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory};
use crate::model::file::{FileKind, ProjectFile};
use crate::model::language::language_of;
use crate::model::slug::{advance_slug_token_past, slug_token_of};
use crate::model::organization::{Organization, OrganizationRole};
use crate::model::project::Project;
use crate::repo::{ResourceStore, StoreError, StoreResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

const ORGANIZATION_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    slug,
    role,
    owner_id,
    created_at
FROM organizations";

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    organization_id,
    name,
    description,
    slug,
    created_at
FROM projects";

const FILE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    path,
    kind,
    content,
    created_at,
    updated_at
FROM files";

/// Persistent `ResourceStore` that owns one SQLite connection.
pub struct SqliteResourceStore {
    conn: Connection,
}

impl SqliteResourceStore {
    /// Wraps a migrated connection, verifying its schema first.
    ///
    /// Slugs issued afterwards never reuse a token already stored here.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(&conn)?;
        resume_slug_tokens(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database and wraps it.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Borrows the underlying connection for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn count(&self, table: &'static str) -> StoreResult<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count in {table}")))
    }
}

impl ResourceStore for SqliteResourceStore {
    fn insert_organization(&mut self, organization: &Organization) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO organizations (
                id,
                name,
                description,
                slug,
                role,
                owner_id,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                organization.id,
                organization.name,
                organization.description,
                organization.slug,
                organization.role.as_str(),
                organization.owner_id,
                organization.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_organization(&self, id: &str) -> StoreResult<Option<Organization>> {
        let sql = format!("{ORGANIZATION_SELECT_SQL} WHERE id = ?1;");
        self.conn
            .query_row(&sql, [id], |row| Ok(parse_organization_row(row)))
            .optional()?
            .transpose()
    }

    fn list_organizations_owned_by(&self, owner_id: &str) -> StoreResult<Vec<Organization>> {
        let sql =
            format!("{ORGANIZATION_SELECT_SQL} WHERE owner_id = ?1 ORDER BY created_at ASC, rowid ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([owner_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_organization_row(row)?);
        }
        Ok(items)
    }

    fn count_organizations(&self) -> StoreResult<usize> {
        self.count("organizations")
    }

    fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO projects (
                id,
                organization_id,
                name,
                description,
                slug,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project.id,
                project.organization_id,
                project.name,
                project.description,
                project.slug,
                project.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let sql = format!("{PROJECT_SELECT_SQL} WHERE id = ?1;");
        self.conn
            .query_row(&sql, [id], |row| Ok(parse_project_row(row)))
            .optional()?
            .transpose()
    }

    fn list_projects(&self, organization_id: &str) -> StoreResult<Vec<Project>> {
        let sql = format!(
            "{PROJECT_SELECT_SQL} WHERE organization_id = ?1 ORDER BY created_at ASC, rowid ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([organization_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_project_row(row)?);
        }
        Ok(items)
    }

    fn count_projects(&self) -> StoreResult<usize> {
        self.count("projects")
    }

    fn insert_files(&mut self, files: &[ProjectFile]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for file in files {
            tx.execute(
                "INSERT INTO files (
                    id,
                    project_id,
                    name,
                    path,
                    kind,
                    content,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    file.id,
                    file.project_id,
                    file.name,
                    file.path,
                    file.kind.as_str(),
                    file.content,
                    file.created_at,
                    file.updated_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_file(&self, id: &str) -> StoreResult<Option<ProjectFile>> {
        let sql = format!("{FILE_SELECT_SQL} WHERE id = ?1;");
        self.conn
            .query_row(&sql, [id], |row| Ok(parse_file_row(row)))
            .optional()?
            .transpose()
    }

    fn list_files(&self, project_id: &str) -> StoreResult<Vec<ProjectFile>> {
        let sql =
            format!("{FILE_SELECT_SQL} WHERE project_id = ?1 ORDER BY created_at ASC, rowid ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([project_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_file_row(row)?);
        }
        Ok(items)
    }

    fn update_file_content(
        &mut self,
        id: &str,
        content: &str,
        updated_at: i64,
    ) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE files
             SET content = ?2,
                 updated_at = ?3
             WHERE id = ?1
               AND kind = 'file';",
            params![id, content, updated_at],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: "file",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn count_files(&self) -> StoreResult<usize> {
        self.count("files")
    }
}

fn parse_organization_row(row: &Row<'_>) -> StoreResult<Organization> {
    let role_text: String = row.get("role")?;
    let role = OrganizationRole::parse(&role_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid role `{role_text}` in organizations.role"))
    })?;

    Ok(Organization {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        slug: row.get("slug")?,
        role,
        owner_id: row.get("owner_id")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_project_row(row: &Row<'_>) -> StoreResult<Project> {
    Ok(Project {
        id: row.get("id")?,
        organization_id: row.get("organization_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        slug: row.get("slug")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_file_row(row: &Row<'_>) -> StoreResult<ProjectFile> {
    let kind_text: String = row.get("kind")?;
    let kind = FileKind::parse(&kind_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid file kind `{kind_text}` in files.kind"))
    })?;
    let name: String = row.get("name")?;

    Ok(ProjectFile {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        path: row.get("path")?,
        kind,
        content: row.get("content")?,
        language: language_of(&name),
        name,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["organizations", "projects", "files"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn resume_slug_tokens(conn: &Connection) -> StoreResult<()> {
    let mut stmt = conn.prepare(
        "SELECT slug FROM organizations
         UNION ALL
         SELECT slug FROM projects;",
    )?;
    let mut rows = stmt.query([])?;
    let mut highest: Option<u64> = None;
    while let Some(row) = rows.next()? {
        let slug: String = row.get(0)?;
        highest = highest.max(slug_token_of(&slug));
    }

    if let Some(token) = highest {
        advance_slug_token_past(token);
        info!("event=slug_resume module=repo status=ok token={token}");
    }
    Ok(())
}
