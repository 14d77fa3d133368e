use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use estimate_core::{
    Category, CategoryLine, EstimateRepository, EstimationData, LaborEntry, LaborEstimate,
    LineItem, MiscEquipmentEstimate, NewProject, PercentageLine, Project, ProjectListing,
    ProjectReview, ProjectStatus, ProjectSummary, RepositoryError, WireConduitEstimate,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens a database from a file path, `:memory:` or a `sqlite:` URL.
    ///
    /// Files are created if missing. An in-memory database is held on a
    /// single connection so every query sees the same data.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (options, max_connections) = if connection_string == ":memory:" {
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else if connection_string.starts_with("sqlite:") {
            (
                SqliteConnectOptions::from_str(connection_string)
                    .with_context(|| format!("Invalid database URL: {}", connection_string))?,
                5,
            )
        } else {
            (
                SqliteConnectOptions::new()
                    .filename(connection_string)
                    .create_if_missing(true),
                5,
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.foreign_keys(true))
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn project_status(
        &self,
        project_id: i64,
    ) -> Result<ProjectStatus, RepositoryError> {
        let row = sqlx::query("SELECT status FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        let status: String = row.try_get("status").map_err(db_error)?;
        ProjectStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Database(format!("Invalid project status: {}", status)))
    }

    /// Fails unless the project has reached `required`.
    async fn require_status(
        &self,
        project_id: i64,
        required: ProjectStatus,
    ) -> Result<ProjectStatus, RepositoryError> {
        let current = self.project_status(project_id).await?;
        if current < required {
            return Err(RepositoryError::InvalidState(format!(
                "project {} is '{}' but '{}' is required",
                project_id,
                current.as_str(),
                required.as_str()
            )));
        }
        Ok(current)
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn count_from(
    row: &SqliteRow,
    column: &str,
) -> Result<u32, RepositoryError> {
    let value: i64 = row.try_get(column).map_err(db_error)?;
    u32::try_from(value)
        .map_err(|_| RepositoryError::Database(format!("Invalid {}: {}", column, value)))
}

fn approval_from(row: &SqliteRow) -> Result<Option<bool>, RepositoryError> {
    let approved: Option<i64> = row.try_get("approved").map_err(db_error)?;
    Ok(approved.map(|value| value != 0))
}

/// Moves the project forward to `reached`; a resubmitted earlier stage never
/// moves it back.
async fn advance_status(
    tx: &mut Transaction<'_, Sqlite>,
    project_id: i64,
    current: ProjectStatus,
    reached: ProjectStatus,
) -> Result<(), RepositoryError> {
    let status = current.max(reached);
    sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(project_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    Ok(())
}

async fn replace_line_items(
    tx: &mut Transaction<'_, Sqlite>,
    project_id: i64,
    sections: [(Category, &[LineItem]); 2],
) -> Result<(), RepositoryError> {
    for (category, items) in sections {
        sqlx::query("DELETE FROM line_items WHERE project_id = ? AND category = ?")
            .bind(project_id)
            .bind(category.key())
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;

        for item in items {
            sqlx::query(
                "INSERT INTO line_items (project_id, category, name, cost, quantity, subtotal)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(project_id)
            .bind(category.key())
            .bind(&item.name)
            .bind(decimal_to_text(item.cost))
            .bind(decimal_to_text(item.quantity))
            .bind(decimal_to_text(item.subtotal))
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        }
    }
    Ok(())
}

fn row_to_project(row: &SqliteRow) -> Result<Project, RepositoryError> {
    let status: String = row.try_get("status").map_err(db_error)?;
    let chargers_count: i64 = row.try_get("chargers_count").map_err(db_error)?;

    Ok(Project {
        id: row.try_get("id").map_err(db_error)?,
        address: row.try_get("address").map_err(db_error)?,
        company: row.try_get("company").map_err(db_error)?,
        start_date: row
            .try_get::<NaiveDate, _>("start_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get start_date: {}", e)))?,
        project_type: row.try_get("project_type").map_err(db_error)?,
        chargers_count: u32::try_from(chargers_count).map_err(|_| {
            RepositoryError::Database(format!("Invalid chargers count: {}", chargers_count))
        })?,
        status: ProjectStatus::parse(&status).ok_or_else(|| {
            RepositoryError::Database(format!("Invalid project status: {}", status))
        })?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

impl SqliteRepository {
    async fn load_line_items(
        &self,
        project_id: i64,
        category: Category,
    ) -> Result<Vec<LineItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT name, cost, quantity, subtotal FROM line_items
             WHERE project_id = ? AND category = ?
             ORDER BY id",
        )
        .bind(project_id)
        .bind(category.key())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| -> Result<LineItem, RepositoryError> {
                Ok(LineItem {
                    name: row.try_get("name").map_err(db_error)?,
                    cost: get_decimal(row, "cost")?,
                    quantity: get_decimal(row, "quantity")?,
                    subtotal: get_decimal(row, "subtotal")?,
                })
            })
            .collect()
    }

    async fn load_wire_conduit(
        &self,
        project_id: i64,
    ) -> Result<Option<WireConduitEstimate>, RepositoryError> {
        let Some(row) = sqlx::query(
            "SELECT sales_tax_percentage, sales_tax_amount, awg_total, conduit_total,
                    grand_total, notes_awg, notes_conduit
             FROM wire_conduit_estimations WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };

        Ok(Some(WireConduitEstimate {
            project_id,
            awg_entries: self.load_line_items(project_id, Category::Awg).await?,
            conduit_entries: self.load_line_items(project_id, Category::Conduit).await?,
            sales_tax_percentage: get_decimal(&row, "sales_tax_percentage")?,
            sales_tax_amount: get_decimal(&row, "sales_tax_amount")?,
            awg_total: get_decimal(&row, "awg_total")?,
            conduit_total: get_decimal(&row, "conduit_total")?,
            grand_total: get_decimal(&row, "grand_total")?,
            notes_awg: row.try_get("notes_awg").map_err(db_error)?,
            notes_conduit: row.try_get("notes_conduit").map_err(db_error)?,
        }))
    }

    async fn load_misc_equipment(
        &self,
        project_id: i64,
    ) -> Result<Option<MiscEquipmentEstimate>, RepositoryError> {
        let Some(row) = sqlx::query(
            "SELECT sales_tax_percentage, sales_tax_amount, misc_total, equipment_total,
                    misc_grand_total, equipment_grand_total, grand_total,
                    notes_misc, notes_equipment
             FROM misc_equipment_estimations WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };

        Ok(Some(MiscEquipmentEstimate {
            project_id,
            misc_entries: self.load_line_items(project_id, Category::Misc).await?,
            equipment_entries: self.load_line_items(project_id, Category::Equipment).await?,
            sales_tax_percentage: get_decimal(&row, "sales_tax_percentage")?,
            sales_tax_amount: get_decimal(&row, "sales_tax_amount")?,
            misc_total: get_decimal(&row, "misc_total")?,
            equipment_total: get_decimal(&row, "equipment_total")?,
            misc_grand_total: get_decimal(&row, "misc_grand_total")?,
            equipment_grand_total: get_decimal(&row, "equipment_grand_total")?,
            grand_total: get_decimal(&row, "grand_total")?,
            notes_misc: row.try_get("notes_misc").map_err(db_error)?,
            notes_equipment: row.try_get("notes_equipment").map_err(db_error)?,
        }))
    }

    async fn load_labor(
        &self,
        project_id: i64,
    ) -> Result<Option<LaborEstimate>, RepositoryError> {
        let Some(row) = sqlx::query(
            "SELECT chargers_count, charger_price, labor_total, low_voltage_total, grand_total
             FROM labor_estimations WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };

        let entries = sqlx::query(
            "SELECT position, rate, workers, hours, days, subtotal FROM labor_entries
             WHERE project_id = ?
             ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let labor_entries = entries
            .iter()
            .map(|entry| -> Result<LaborEntry, RepositoryError> {
                Ok(LaborEntry {
                    position: entry.try_get("position").map_err(db_error)?,
                    rate: get_decimal(entry, "rate")?,
                    workers: count_from(entry, "workers")?,
                    hours: get_decimal(entry, "hours")?,
                    days: get_decimal(entry, "days")?,
                    subtotal: get_decimal(entry, "subtotal")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(LaborEstimate {
            project_id,
            labor_entries,
            chargers_count: count_from(&row, "chargers_count")?,
            charger_price: get_decimal(&row, "charger_price")?,
            labor_total: get_decimal(&row, "labor_total")?,
            low_voltage_total: get_decimal(&row, "low_voltage_total")?,
            grand_total: get_decimal(&row, "grand_total")?,
        }))
    }

    async fn load_summary(
        &self,
        project_id: i64,
    ) -> Result<Option<ProjectSummary>, RepositoryError> {
        let Some(row) = sqlx::query(
            "SELECT tax_base_cost, tax_percentage, tax_subtotal,
                    overhead_base_cost, overhead_percentage, overhead_subtotal,
                    grand_subtotal, grand_total, price_per_unit, price_per_unit_submitted,
                    approved, total_submitted, approved_amount, notes, created_at, updated_at
             FROM project_summaries WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };

        let lines = sqlx::query(
            "SELECT category, base_cost, markup, subtotal, profit FROM summary_lines
             WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let categories: BTreeMap<Category, CategoryLine> = lines
            .iter()
            .map(|line| -> Result<(Category, CategoryLine), RepositoryError> {
                let key: String = line.try_get("category").map_err(db_error)?;
                let category = Category::parse(&key).ok_or_else(|| {
                    RepositoryError::Database(format!("Invalid summary category: {}", key))
                })?;
                Ok((
                    category,
                    CategoryLine {
                        base_cost: get_decimal(line, "base_cost")?,
                        markup: get_decimal(line, "markup")?,
                        subtotal: get_decimal(line, "subtotal")?,
                        profit: get_decimal(line, "profit")?,
                    },
                ))
            })
            .collect::<Result<_, _>>()?;

        Ok(Some(ProjectSummary {
            project_id,
            categories,
            tax: PercentageLine {
                base_cost: get_decimal(&row, "tax_base_cost")?,
                percentage: get_decimal(&row, "tax_percentage")?,
                subtotal: get_decimal(&row, "tax_subtotal")?,
            },
            overhead: PercentageLine {
                base_cost: get_decimal(&row, "overhead_base_cost")?,
                percentage: get_decimal(&row, "overhead_percentage")?,
                subtotal: get_decimal(&row, "overhead_subtotal")?,
            },
            grand_subtotal: get_decimal(&row, "grand_subtotal")?,
            grand_total: get_decimal(&row, "grand_total")?,
            price_per_unit: get_decimal(&row, "price_per_unit")?,
            price_per_unit_submitted: get_decimal(&row, "price_per_unit_submitted")?,
            approved: approval_from(&row)?,
            total_submitted: get_decimal(&row, "total_submitted")?,
            approved_amount: get_decimal(&row, "approved_amount")?,
            notes: row.try_get("notes").map_err(db_error)?,
            created_at: row.try_get("created_at").map_err(db_error)?,
            updated_at: row.try_get("updated_at").map_err(db_error)?,
        }))
    }
}

#[async_trait]
impl EstimateRepository for SqliteRepository {
    async fn create_project(
        &self,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO projects (
                address, company, start_date, project_type, chargers_count, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&project.address)
        .bind(&project.company)
        .bind(project.start_date)
        .bind(&project.project_type)
        .bind(i64::from(project.chargers_count))
        .bind(ProjectStatus::Started.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_project(result.last_insert_rowid()).await
    }

    async fn get_project(
        &self,
        id: i64,
    ) -> Result<Project, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, address, company, start_date, project_type, chargers_count,
                    status, created_at
             FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_project(&row)
    }

    async fn list_projects(&self) -> Result<Vec<ProjectListing>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT p.id, p.address, p.company, p.start_date, p.project_type, p.chargers_count,
                    p.status, p.created_at,
                    l.chargers_count AS labor_chargers_count,
                    s.approved, s.total_submitted, s.approved_amount
             FROM projects p
             LEFT JOIN labor_estimations l ON l.project_id = p.id
             LEFT JOIN project_summaries s ON s.project_id = p.id
             ORDER BY p.start_date DESC, p.id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| -> Result<ProjectListing, RepositoryError> {
                let labor_chargers: Option<i64> =
                    row.try_get("labor_chargers_count").map_err(db_error)?;
                Ok(ProjectListing {
                    project: row_to_project(row)?,
                    chargers_count: labor_chargers
                        .map(u32::try_from)
                        .transpose()
                        .map_err(|e| {
                            RepositoryError::Database(format!("Invalid chargers count: {}", e))
                        })?,
                    approved: approval_from(row)?,
                    approved_amount: get_optional_decimal(row, "approved_amount")?,
                    total_submitted: get_optional_decimal(row, "total_submitted")?,
                })
            })
            .collect()
    }

    async fn get_project_review(
        &self,
        id: i64,
    ) -> Result<ProjectReview, RepositoryError> {
        let project = self.get_project(id).await?;

        Ok(ProjectReview {
            wire_conduit: self.load_wire_conduit(id).await?,
            misc_equipment: self.load_misc_equipment(id).await?,
            labor: self.load_labor(id).await?,
            summary: self.load_summary(id).await?,
            project,
        })
    }

    async fn save_wire_conduit(
        &self,
        estimate: &WireConduitEstimate,
    ) -> Result<(), RepositoryError> {
        let project_id = estimate.project_id;
        let current = self
            .require_status(project_id, ProjectStatus::Started)
            .await?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT OR REPLACE INTO wire_conduit_estimations (
                project_id, sales_tax_percentage, sales_tax_amount, awg_total,
                conduit_total, grand_total, notes_awg, notes_conduit, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(decimal_to_text(estimate.sales_tax_percentage))
        .bind(decimal_to_text(estimate.sales_tax_amount))
        .bind(decimal_to_text(estimate.awg_total))
        .bind(decimal_to_text(estimate.conduit_total))
        .bind(decimal_to_text(estimate.grand_total))
        .bind(&estimate.notes_awg)
        .bind(&estimate.notes_conduit)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        replace_line_items(
            &mut tx,
            project_id,
            [
                (Category::Awg, &estimate.awg_entries),
                (Category::Conduit, &estimate.conduit_entries),
            ],
        )
        .await?;
        advance_status(
            &mut tx,
            project_id,
            current,
            ProjectStatus::WireConduitSubmitted,
        )
        .await?;

        tx.commit().await.map_err(db_error)?;
        debug!(project_id, "stored wire & conduit estimation");
        Ok(())
    }

    async fn save_misc_equipment(
        &self,
        estimate: &MiscEquipmentEstimate,
    ) -> Result<(), RepositoryError> {
        let project_id = estimate.project_id;
        let current = self
            .require_status(project_id, ProjectStatus::WireConduitSubmitted)
            .await?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT OR REPLACE INTO misc_equipment_estimations (
                project_id, sales_tax_percentage, sales_tax_amount, misc_total,
                equipment_total, misc_grand_total, equipment_grand_total, grand_total,
                notes_misc, notes_equipment, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(decimal_to_text(estimate.sales_tax_percentage))
        .bind(decimal_to_text(estimate.sales_tax_amount))
        .bind(decimal_to_text(estimate.misc_total))
        .bind(decimal_to_text(estimate.equipment_total))
        .bind(decimal_to_text(estimate.misc_grand_total))
        .bind(decimal_to_text(estimate.equipment_grand_total))
        .bind(decimal_to_text(estimate.grand_total))
        .bind(&estimate.notes_misc)
        .bind(&estimate.notes_equipment)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        replace_line_items(
            &mut tx,
            project_id,
            [
                (Category::Misc, &estimate.misc_entries),
                (Category::Equipment, &estimate.equipment_entries),
            ],
        )
        .await?;
        advance_status(
            &mut tx,
            project_id,
            current,
            ProjectStatus::MiscEquipmentSubmitted,
        )
        .await?;

        tx.commit().await.map_err(db_error)?;
        debug!(project_id, "stored misc & equipment estimation");
        Ok(())
    }

    async fn save_labor(
        &self,
        estimate: &LaborEstimate,
    ) -> Result<(), RepositoryError> {
        let project_id = estimate.project_id;
        let current = self
            .require_status(project_id, ProjectStatus::MiscEquipmentSubmitted)
            .await?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT OR REPLACE INTO labor_estimations (
                project_id, chargers_count, charger_price, labor_total,
                low_voltage_total, grand_total, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(i64::from(estimate.chargers_count))
        .bind(decimal_to_text(estimate.charger_price))
        .bind(decimal_to_text(estimate.labor_total))
        .bind(decimal_to_text(estimate.low_voltage_total))
        .bind(decimal_to_text(estimate.grand_total))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query("DELETE FROM labor_entries WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for entry in &estimate.labor_entries {
            sqlx::query(
                "INSERT INTO labor_entries (
                    project_id, position, rate, workers, hours, days, subtotal
                ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(project_id)
            .bind(&entry.position)
            .bind(decimal_to_text(entry.rate))
            .bind(i64::from(entry.workers))
            .bind(decimal_to_text(entry.hours))
            .bind(decimal_to_text(entry.days))
            .bind(decimal_to_text(entry.subtotal))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        advance_status(
            &mut tx,
            project_id,
            current,
            ProjectStatus::LaborCostSubmitted,
        )
        .await?;

        tx.commit().await.map_err(db_error)?;
        debug!(project_id, "stored labor estimation");
        Ok(())
    }

    async fn get_estimation_data(
        &self,
        project_id: i64,
    ) -> Result<EstimationData, RepositoryError> {
        let row = sqlx::query(
            "SELECT w.awg_total, w.conduit_total, w.sales_tax_percentage,
                    m.misc_total, m.equipment_total,
                    m.sales_tax_percentage AS misc_sales_tax_percentage,
                    l.labor_total, l.low_voltage_total, l.chargers_count,
                    s.approved, s.total_submitted, s.approved_amount
             FROM wire_conduit_estimations w
             JOIN misc_equipment_estimations m ON m.project_id = w.project_id
             JOIN labor_estimations l ON l.project_id = w.project_id
             LEFT JOIN project_summaries s ON s.project_id = w.project_id
             WHERE w.project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(EstimationData {
            awg_total: get_decimal(&row, "awg_total")?,
            conduit_total: get_decimal(&row, "conduit_total")?,
            misc_total: get_decimal(&row, "misc_total")?,
            equipment_total: get_decimal(&row, "equipment_total")?,
            labor_total: get_decimal(&row, "labor_total")?,
            low_voltage_total: get_decimal(&row, "low_voltage_total")?,
            chargers_count: count_from(&row, "chargers_count")?,
            approved: approval_from(&row)?,
            total_submitted: get_optional_decimal(&row, "total_submitted")?,
            approved_amount: get_optional_decimal(&row, "approved_amount")?,
            tax_percentage: get_decimal(&row, "sales_tax_percentage")?,
            misc_tax_percentage: get_decimal(&row, "misc_sales_tax_percentage")?,
        })
    }

    async fn save_summary(
        &self,
        summary: &ProjectSummary,
    ) -> Result<(), RepositoryError> {
        let project_id = summary.project_id;
        let current = self
            .require_status(project_id, ProjectStatus::LaborCostSubmitted)
            .await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT INTO project_summaries (
                project_id, tax_base_cost, tax_percentage, tax_subtotal,
                overhead_base_cost, overhead_percentage, overhead_subtotal,
                grand_subtotal, grand_total, price_per_unit, price_per_unit_submitted,
                approved, total_submitted, approved_amount, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (project_id) DO UPDATE SET
                tax_base_cost = excluded.tax_base_cost,
                tax_percentage = excluded.tax_percentage,
                tax_subtotal = excluded.tax_subtotal,
                overhead_base_cost = excluded.overhead_base_cost,
                overhead_percentage = excluded.overhead_percentage,
                overhead_subtotal = excluded.overhead_subtotal,
                grand_subtotal = excluded.grand_subtotal,
                grand_total = excluded.grand_total,
                price_per_unit = excluded.price_per_unit,
                price_per_unit_submitted = excluded.price_per_unit_submitted,
                approved = excluded.approved,
                total_submitted = excluded.total_submitted,
                approved_amount = excluded.approved_amount,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
        )
        .bind(project_id)
        .bind(decimal_to_text(summary.tax.base_cost))
        .bind(decimal_to_text(summary.tax.percentage))
        .bind(decimal_to_text(summary.tax.subtotal))
        .bind(decimal_to_text(summary.overhead.base_cost))
        .bind(decimal_to_text(summary.overhead.percentage))
        .bind(decimal_to_text(summary.overhead.subtotal))
        .bind(decimal_to_text(summary.grand_subtotal))
        .bind(decimal_to_text(summary.grand_total))
        .bind(decimal_to_text(summary.price_per_unit))
        .bind(decimal_to_text(summary.price_per_unit_submitted))
        .bind(summary.approved.map(i64::from))
        .bind(decimal_to_text(summary.total_submitted))
        .bind(decimal_to_text(summary.approved_amount))
        .bind(&summary.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for category in Category::ALL {
            let line = summary.line(category);
            sqlx::query(
                "INSERT OR REPLACE INTO summary_lines (
                    project_id, category, base_cost, markup, subtotal, profit
                ) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(project_id)
            .bind(category.key())
            .bind(decimal_to_text(line.base_cost))
            .bind(decimal_to_text(line.markup))
            .bind(decimal_to_text(line.subtotal))
            .bind(decimal_to_text(line.profit))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        advance_status(&mut tx, project_id, current, ProjectStatus::Completed).await?;

        tx.commit().await.map_err(db_error)?;
        debug!(project_id, "stored project summary");
        Ok(())
    }
}
