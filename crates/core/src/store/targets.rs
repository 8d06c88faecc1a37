use crate::domain::{EntityId, Target};
use crate::store::{decode_rows, Collection, CrmStore};
use anyhow::{ensure, Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Writes `target`, keeping at most one row per `(rm_id, period)`: an
/// existing row for the pair is overwritten in place, otherwise a new row is
/// created.
pub async fn upsert_target(store: &dyn CrmStore, target: &Target) -> Result<(UpsertOutcome, Target)> {
    let rm_id = target.rm_id.clone().context("target rm_id is required")?;
    let period = target.period.trim().to_ascii_lowercase();
    ensure!(!period.is_empty(), "target period is required");

    let mut row = target.clone();
    row.period = period.clone();
    row.id = None;

    let current = find_target_id(store, &rm_id, &period).await?;
    let body = serde_json::to_value(&row).context("target serialize failed")?;

    let (outcome, stored) = match current {
        Some(id) => (
            UpsertOutcome::Updated,
            store
                .update(Collection::Targets, &id, &body)
                .await
                .with_context(|| format!("update target {id} failed"))?,
        ),
        None => (
            UpsertOutcome::Created,
            store
                .create(Collection::Targets, &body)
                .await
                .context("create target failed")?,
        ),
    };

    let stored: Target = serde_json::from_value(stored).context("store returned an invalid target row")?;
    tracing::info!(%rm_id, %period, ?outcome, "target saved");
    Ok((outcome, stored))
}

/// Row id of the Target for `(rm_id, period)`, if one exists.
pub async fn find_target_id(store: &dyn CrmStore, rm_id: &EntityId, period: &str) -> Result<Option<EntityId>> {
    let rows: Vec<Target> = decode_rows(Collection::Targets, store.list(Collection::Targets).await?);
    Ok(rows
        .into_iter()
        .find(|t| t.rm_id.as_ref() == Some(rm_id) && t.matches_period(period))
        .and_then(|t| t.id))
}
