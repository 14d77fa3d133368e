//! Command implementations behind the `estimator` binary.
//!
//! Each command returns the text to print; nothing here writes to stdout.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use tracing::debug;

use estimate_core::calculations::{LaborForm, MiscEquipmentForm, PricingResult, WireConduitForm};
use estimate_core::db::RepositoryRegistry;
use estimate_core::input::parse_optional_amount;
use estimate_core::workflow::EstimateWorkflow;
use estimate_core::{
    Category, EstimateSnapshot, LineItem, LowVoltageInput, ProjectForm, ProjectListing,
    ProjectReview, SummaryField,
};
use estimate_data::{LaborLoader, LineItemLoader};
use estimate_db_sqlite::SqliteRepositoryFactory;
use estimate_http::HttpRepositoryFactory;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(HttpRepositoryFactory));
    registry
}

fn with_next_step(
    text: String,
    next_location: Option<&str>,
) -> String {
    match next_location {
        Some(location) => format!("{text}\nNext: {location}"),
        None => text,
    }
}

fn open_csv(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("cannot open '{}'", path.display()))
}

// ─── new-project ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Args)]
pub struct ProjectArgs {
    /// Site address.
    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "")]
    pub company: String,

    /// Start date, YYYY-MM-DD.
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Project type, or `custom` together with --custom-project-type.
    #[arg(long, default_value = "")]
    pub project_type: String,

    #[arg(long, default_value = "")]
    pub custom_project_type: String,

    /// Number of chargers to install.
    #[arg(long, allow_negative_numbers = true)]
    pub chargers: Option<i64>,
}

impl ProjectArgs {
    pub fn form(&self) -> ProjectForm {
        ProjectForm {
            address: self.address.clone(),
            company: self.company.clone(),
            start_date: self.start_date,
            project_type: self.project_type.clone(),
            custom_project_type: self.custom_project_type.clone(),
            chargers_count: self.chargers,
        }
    }
}

pub async fn new_project(
    workflow: &EstimateWorkflow<'_>,
    args: &ProjectArgs,
) -> Result<String> {
    let outcome = workflow.create_project(&args.form()).await?;
    let project = outcome.record;

    Ok(with_next_step(
        format!(
            "Project {} created for {} ({} chargers)",
            project.id, project.address, project.chargers_count
        ),
        outcome.next_location.as_deref(),
    ))
}

// ─── wire-conduit ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct WireConduitArgs {
    #[arg(long)]
    pub project_id: i64,

    /// CSV of `section,name,cost,quantity` rows; sections `awg` and `conduit`.
    #[arg(long)]
    pub items: PathBuf,

    /// Sales tax percentage on the combined total.
    #[arg(long, default_value = "")]
    pub sales_tax: String,

    #[arg(long, default_value = "")]
    pub notes_awg: String,

    #[arg(long, default_value = "")]
    pub notes_conduit: String,
}

pub async fn wire_conduit(
    workflow: &EstimateWorkflow<'_>,
    args: &WireConduitArgs,
) -> Result<String> {
    let [awg, conduit] =
        LineItemLoader::load(open_csv(&args.items)?, [Category::Awg, Category::Conduit])
            .with_context(|| format!("cannot import '{}'", args.items.display()))?;

    let form = WireConduitForm {
        awg,
        conduit,
        sales_tax_percentage: args.sales_tax.clone(),
        notes_awg: args.notes_awg.clone(),
        notes_conduit: args.notes_conduit.clone(),
    };
    let outcome = workflow.submit_wire_conduit(args.project_id, &form).await?;
    let estimate = outcome.record;

    Ok(with_next_step(
        format!(
            "Wire & conduit saved: AWG {:.2}, conduit {:.2}, sales tax {:.2}, total {:.2}",
            estimate.awg_total,
            estimate.conduit_total,
            estimate.sales_tax_amount,
            estimate.grand_total
        ),
        outcome.next_location.as_deref(),
    ))
}

// ─── misc-equipment ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct MiscEquipmentArgs {
    #[arg(long)]
    pub project_id: i64,

    /// CSV of `section,name,cost,quantity` rows; sections `misc` and `equipment`.
    #[arg(long)]
    pub items: PathBuf,

    /// Sales tax percentage, applied to each section.
    #[arg(long, default_value = "")]
    pub sales_tax: String,

    #[arg(long, default_value = "")]
    pub notes_misc: String,

    #[arg(long, default_value = "")]
    pub notes_equipment: String,
}

pub async fn misc_equipment(
    workflow: &EstimateWorkflow<'_>,
    args: &MiscEquipmentArgs,
) -> Result<String> {
    let [misc, equipment] =
        LineItemLoader::load(open_csv(&args.items)?, [Category::Misc, Category::Equipment])
            .with_context(|| format!("cannot import '{}'", args.items.display()))?;

    let form = MiscEquipmentForm {
        misc,
        equipment,
        sales_tax_percentage: args.sales_tax.clone(),
        notes_misc: args.notes_misc.clone(),
        notes_equipment: args.notes_equipment.clone(),
    };
    let outcome = workflow.submit_misc_equipment(args.project_id, &form).await?;
    let estimate = outcome.record;

    Ok(with_next_step(
        format!(
            "Misc & equipment saved: misc {:.2}, equipment {:.2}, sales tax {:.2}, total {:.2}",
            estimate.misc_total,
            estimate.equipment_total,
            estimate.sales_tax_amount,
            estimate.grand_total
        ),
        outcome.next_location.as_deref(),
    ))
}

// ─── labor ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct LaborArgs {
    #[arg(long)]
    pub project_id: i64,

    /// CSV of `position,rate,workers,hours,days` rows.
    #[arg(long)]
    pub positions: PathBuf,

    /// Low-voltage charger count.
    #[arg(long)]
    pub chargers: Option<u32>,

    /// Low-voltage price per charger.
    #[arg(long)]
    pub charger_price: Option<String>,
}

pub async fn labor(
    workflow: &EstimateWorkflow<'_>,
    args: &LaborArgs,
) -> Result<String> {
    let positions = LaborLoader::load(open_csv(&args.positions)?)
        .with_context(|| format!("cannot import '{}'", args.positions.display()))?;

    let form = LaborForm {
        positions,
        low_voltage: LowVoltageInput {
            chargers_count: args.chargers,
            charger_price: args.charger_price.as_deref().and_then(parse_optional_amount),
        },
    };
    let outcome = workflow.submit_labor(args.project_id, &form).await?;
    let estimate = outcome.record;

    Ok(with_next_step(
        format!(
            "Labor saved: labor {:.2}, low voltage {:.2}, total {:.2}",
            estimate.labor_total, estimate.low_voltage_total, estimate.grand_total
        ),
        outcome.next_location.as_deref(),
    ))
}

// ─── summary / show ──────────────────────────────────────────────────────────

/// Edits applied on top of the stored stage totals.
#[derive(Debug, Clone, Default, Args)]
pub struct SummaryArgs {
    #[arg(long)]
    pub project_id: i64,

    /// Markup for one category, e.g. `labor=1.5`. Repeatable.
    #[arg(long = "markup", value_name = "CATEGORY=VALUE")]
    pub markups: Vec<String>,

    /// Income tax percentage on profit.
    #[arg(long)]
    pub tax_percentage: Option<String>,

    #[arg(long)]
    pub overhead_percentage: Option<String>,

    /// Permits base cost.
    #[arg(long)]
    pub permits: Option<String>,

    /// Overrides the stored charger count.
    #[arg(long)]
    pub unit_count: Option<String>,

    #[arg(long)]
    pub total_submitted: Option<String>,

    /// `yes`/`no` (also `approved`/`rejected`, `true`/`false`).
    #[arg(long)]
    pub approved: Option<String>,

    #[arg(long)]
    pub approved_amount: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

/// Parses `category=value`.
pub fn parse_markup(text: &str) -> Result<(Category, String)> {
    let Some((category, value)) = text.split_once('=') else {
        bail!("markup '{text}' must look like CATEGORY=VALUE");
    };
    let Some(category) = Category::parse(category) else {
        bail!("unknown category '{}' in markup '{text}'", category.trim());
    };
    Ok((category, value.trim().to_string()))
}

impl SummaryArgs {
    /// Summary form edits in the order they apply.
    pub fn edits(&self) -> Result<Vec<(SummaryField, String)>> {
        let mut edits = Vec::new();
        for markup in &self.markups {
            let (category, value) = parse_markup(markup)?;
            edits.push((SummaryField::Markup(category), value));
        }

        let fields = [
            (SummaryField::TaxPercentage, &self.tax_percentage),
            (SummaryField::OverheadPercentage, &self.overhead_percentage),
            (SummaryField::BaseCost(Category::Permits), &self.permits),
            (SummaryField::UnitCount, &self.unit_count),
            (SummaryField::TotalSubmitted, &self.total_submitted),
            (SummaryField::Approved, &self.approved),
            (SummaryField::ApprovedAmount, &self.approved_amount),
            (SummaryField::Notes, &self.notes),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                edits.push((field, value.clone()));
            }
        }
        Ok(edits)
    }

    pub fn apply(
        &self,
        snapshot: EstimateSnapshot,
    ) -> Result<EstimateSnapshot> {
        Ok(self
            .edits()?
            .into_iter()
            .fold(snapshot, |snapshot, (field, value)| snapshot.with_edit(field, &value)))
    }
}

fn percent(value: rust_decimal::Decimal) -> String {
    value.normalize().to_string()
}

/// Plain-text rendering of a priced summary.
pub fn render_summary(
    snapshot: &EstimateSnapshot,
    result: &PricingResult,
) -> String {
    let mut lines = vec![
        format!("Project {} summary", snapshot.project_id),
        format!(
            "{:<12} {:>12} {:>8} {:>12} {:>12}",
            "Category", "Base cost", "Markup", "Subtotal", "Profit"
        ),
    ];
    for category in Category::ALL {
        let line = result.line(category);
        lines.push(format!(
            "{:<12} {:>12.2} {:>8} {:>12.2} {:>12.2}",
            category.label(),
            line.base_cost,
            percent(line.markup),
            line.subtotal,
            line.profit
        ));
    }

    lines.push(format!(
        "Income tax ({}% of {:.2} profit): {:.2}",
        percent(result.tax.percentage),
        result.tax.base_cost,
        result.tax.subtotal
    ));
    lines.push(format!(
        "Overhead ({}% of {:.2}): {:.2}",
        percent(result.overhead.percentage),
        result.overhead.base_cost,
        result.overhead.subtotal
    ));
    lines.push(format!("Grand subtotal: {:.2}", result.grand_subtotal));
    lines.push(format!("Grand total: {:.2}", result.grand_total));
    lines.push(format!("Quoted total: {:.2}", result.grand_total_reduced));
    lines.push(format!(
        "Price per unit ({} units): {:.2}",
        snapshot.unit_count, result.price_per_unit
    ));
    lines.push(format!(
        "Price per unit (submitted): {:.2}",
        result.price_per_unit_submitted
    ));
    if let Some(approved) = snapshot.approved {
        lines.push(format!(
            "Approved: {}",
            if approved { "yes" } else { "no" }
        ));
    }

    lines.join("\n")
}

async fn edited_snapshot(
    workflow: &EstimateWorkflow<'_>,
    args: &SummaryArgs,
) -> Result<EstimateSnapshot> {
    let snapshot = workflow.load_summary(args.project_id).await?;
    let snapshot = args.apply(snapshot)?;
    debug!(project_id = args.project_id, ?snapshot, "summary snapshot");
    Ok(snapshot)
}

pub async fn summary(
    workflow: &EstimateWorkflow<'_>,
    args: &SummaryArgs,
    save: bool,
) -> Result<String> {
    let snapshot = edited_snapshot(workflow, args).await?;
    let text = render_summary(&snapshot, &workflow.price(&snapshot));
    if !save {
        return Ok(text);
    }

    let outcome = workflow.save_summary(&snapshot).await?;
    Ok(with_next_step(
        format!("{text}\nSummary saved"),
        outcome.next_location.as_deref(),
    ))
}

#[derive(Serialize)]
struct ShowReport<'a> {
    snapshot: &'a EstimateSnapshot,
    pricing: &'a PricingResult,
}

/// Recomputed summary as pretty JSON.
pub async fn show(
    workflow: &EstimateWorkflow<'_>,
    args: &SummaryArgs,
) -> Result<String> {
    let snapshot = edited_snapshot(workflow, args).await?;
    let pricing = workflow.price(&snapshot);

    serde_json::to_string_pretty(&ShowReport {
        snapshot: &snapshot,
        pricing: &pricing,
    })
    .context("cannot serialize summary")
}

// ─── projects / review ───────────────────────────────────────────────────────

fn money_or_dash(value: Option<rust_decimal::Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.2}"))
}

fn yes_no(approved: Option<bool>) -> &'static str {
    match approved {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// Plain-text table of the project listing.
pub fn render_projects(projects: &[ProjectListing]) -> String {
    if projects.is_empty() {
        return "No projects".to_string();
    }

    let mut lines = vec![format!(
        "{:>4}  {:<10}  {:<24}  {:>8}  {:<8}  {:>12}  {:>12}  {}",
        "ID", "Start", "Status", "Chargers", "Approved", "Approved amt", "Submitted", "Address"
    )];
    for listing in projects {
        let project = &listing.project;
        lines.push(format!(
            "{:>4}  {:<10}  {:<24}  {:>8}  {:<8}  {:>12}  {:>12}  {}",
            project.id,
            project.start_date,
            project.status.as_str(),
            listing
                .chargers_count
                .map_or_else(|| "-".to_string(), |count| count.to_string()),
            yes_no(listing.approved),
            money_or_dash(listing.approved_amount),
            money_or_dash(listing.total_submitted),
            project.address
        ));
    }
    lines.join("\n")
}

pub async fn projects(workflow: &EstimateWorkflow<'_>) -> Result<String> {
    Ok(render_projects(&workflow.list_projects().await?))
}

#[derive(Debug, Clone, Args)]
pub struct ReviewArgs {
    #[arg(long)]
    pub project_id: i64,
}

fn push_line_items(
    lines: &mut Vec<String>,
    category: Category,
    items: &[LineItem],
) {
    for item in items {
        lines.push(format!(
            "  {} {}: {:.2} x {} = {:.2}",
            category.label(),
            item.name,
            item.cost,
            item.quantity.normalize(),
            item.subtotal
        ));
    }
}

fn push_notes(
    lines: &mut Vec<String>,
    category: Category,
    notes: &str,
) {
    if !notes.is_empty() {
        lines.push(format!("  {} notes: {notes}", category.label()));
    }
}

/// Plain-text rendering of everything stored for a project.
pub fn render_review(review: &ProjectReview) -> String {
    let project = &review.project;
    let mut lines = vec![
        format!("Project {}: {}", project.id, project.address),
        format!("Company: {}", project.company.as_deref().unwrap_or("-")),
        format!("Start date: {}", project.start_date),
        format!("Type: {}", project.project_type),
        format!("Chargers: {}", project.chargers_count),
        format!("Status: {}", project.status.as_str()),
    ];

    match &review.wire_conduit {
        Some(estimate) => {
            lines.push(format!(
                "Wire & conduit (sales tax {}%):",
                percent(estimate.sales_tax_percentage)
            ));
            push_line_items(&mut lines, Category::Awg, &estimate.awg_entries);
            push_line_items(&mut lines, Category::Conduit, &estimate.conduit_entries);
            lines.push(format!(
                "  AWG {:.2}, conduit {:.2}, sales tax {:.2}, total {:.2}",
                estimate.awg_total,
                estimate.conduit_total,
                estimate.sales_tax_amount,
                estimate.grand_total
            ));
            push_notes(&mut lines, Category::Awg, &estimate.notes_awg);
            push_notes(&mut lines, Category::Conduit, &estimate.notes_conduit);
        }
        None => lines.push("Wire & conduit: not submitted".to_string()),
    }

    match &review.misc_equipment {
        Some(estimate) => {
            lines.push(format!(
                "Misc & equipment (sales tax {}%):",
                percent(estimate.sales_tax_percentage)
            ));
            push_line_items(&mut lines, Category::Misc, &estimate.misc_entries);
            push_line_items(&mut lines, Category::Equipment, &estimate.equipment_entries);
            lines.push(format!(
                "  misc {:.2}, equipment {:.2}, sales tax {:.2}, total {:.2}",
                estimate.misc_total,
                estimate.equipment_total,
                estimate.sales_tax_amount,
                estimate.grand_total
            ));
            push_notes(&mut lines, Category::Misc, &estimate.notes_misc);
            push_notes(&mut lines, Category::Equipment, &estimate.notes_equipment);
        }
        None => lines.push("Misc & equipment: not submitted".to_string()),
    }

    match &review.labor {
        Some(estimate) => {
            lines.push("Labor:".to_string());
            for entry in &estimate.labor_entries {
                lines.push(format!(
                    "  {}: {:.2}/h x {} workers x {} h x {} days = {:.2}",
                    entry.position,
                    entry.rate,
                    entry.workers,
                    entry.hours.normalize(),
                    entry.days.normalize(),
                    entry.subtotal
                ));
            }
            lines.push(format!(
                "  Low voltage: {} chargers at {:.2} = {:.2}",
                estimate.chargers_count, estimate.charger_price, estimate.low_voltage_total
            ));
            lines.push(format!(
                "  labor {:.2}, low voltage {:.2}, total {:.2}",
                estimate.labor_total, estimate.low_voltage_total, estimate.grand_total
            ));
        }
        None => lines.push("Labor: not submitted".to_string()),
    }

    match &review.summary {
        Some(summary) => {
            lines.push("Summary:".to_string());
            lines.push(format!(
                "  grand total {:.2}, price per unit {:.2}, submitted per unit {:.2}",
                summary.grand_total, summary.price_per_unit, summary.price_per_unit_submitted
            ));
            lines.push(format!(
                "  approved {}, approved amount {:.2}, total submitted {:.2}",
                yes_no(summary.approved),
                summary.approved_amount,
                summary.total_submitted
            ));
            if !summary.notes.is_empty() {
                lines.push(format!("  notes: {}", summary.notes));
            }
        }
        None => lines.push("Summary: not saved".to_string()),
    }

    lines.join("\n")
}

pub async fn review(
    workflow: &EstimateWorkflow<'_>,
    args: &ReviewArgs,
) -> Result<String> {
    Ok(render_review(&workflow.review_project(args.project_id).await?))
}
