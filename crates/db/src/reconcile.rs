//! Consistency checks and repair for the published pointer.
//!
//! A page is consistent when at most one of its versions is flagged
//! `is_published`, that version is exactly the one `published_version_id`
//! points at (or none when the pointer is unset), and `version_counter` is
//! greater than every recorded `version_num`.

use std::collections::BTreeSet;

use cms_core::error::CoreError;
use cms_core::identity::PageIdentity;
use cms_core::types::{DbId, VersionNum};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::StoreResult;
use crate::models::cms_page::CmsPage;
use crate::models::cms_page_version::CmsPageVersion;
use crate::repositories::{CmsPageRepo, CmsPageVersionRepo};

/// One way a page can disagree with its version ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// More than one version is flagged published.
    MultiplePublished { version_nums: Vec<VersionNum> },
    /// The pointer names a version that is missing or soft-deleted.
    DanglingPointer { version_id: DbId },
    /// The flagged version and the pointer disagree.
    PointerMismatch {
        pointer: Option<DbId>,
        flagged: Option<DbId>,
    },
    /// The counter would hand out a number that is already taken.
    CounterLag {
        version_counter: i32,
        max_version_num: VersionNum,
    },
}

/// A page together with everything wrong with it.
#[derive(Debug, Clone, Serialize)]
pub struct PageInconsistency {
    pub page_id: DbId,
    pub identity: PageIdentity,
    pub is_deleted: bool,
    pub issues: Vec<Inconsistency>,
}

/// Totals for a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub pages_checked: u64,
    pub pages_repaired: u64,
    pub versions_repaired: u64,
}

/// Detects and repairs pointer/flag/counter drift.
pub struct Reconciler;

impl Reconciler {
    /// Report every inconsistent page without changing anything.
    pub async fn find_inconsistent_pages(pool: &PgPool) -> StoreResult<Vec<PageInconsistency>> {
        let mut found = Vec::new();
        for page_id in CmsPageRepo::list_ids(pool).await? {
            let Some(page) = CmsPageRepo::find_by_id(pool, page_id).await? else {
                continue;
            };
            let versions = CmsPageVersionRepo::list_history(pool, page_id, true).await?;
            let issues = diagnose(&page, &versions);
            if !issues.is_empty() {
                found.push(PageInconsistency {
                    page_id,
                    identity: page.identity(),
                    is_deleted: page.is_deleted,
                    issues,
                });
            }
        }
        Ok(found)
    }

    /// Repair one page, or every page when `page_id` is `None`.
    ///
    /// Each page is repaired in its own transaction under a row lock.
    pub async fn reconcile(pool: &PgPool, page_id: Option<DbId>) -> StoreResult<ReconcileReport> {
        let ids = match page_id {
            Some(id) => {
                if CmsPageRepo::find_by_id(pool, id).await?.is_none() {
                    return Err(CoreError::not_found("CmsPage", id).into());
                }
                vec![id]
            }
            None => CmsPageRepo::list_ids(pool).await?,
        };

        let mut report = ReconcileReport::default();
        for id in ids {
            report.pages_checked += 1;
            let versions_repaired = Self::repair_page(pool, id).await?;
            if let Some(count) = versions_repaired {
                report.pages_repaired += 1;
                report.versions_repaired += count;
            }
        }

        tracing::info!(
            pages_checked = report.pages_checked,
            pages_repaired = report.pages_repaired,
            versions_repaired = report.versions_repaired,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Returns `Some(versions_touched)` if the page needed repair.
    async fn repair_page(pool: &PgPool, page_id: DbId) -> StoreResult<Option<u64>> {
        let mut tx = pool.begin().await?;

        let Some(page) = CmsPageRepo::lock_by_id(&mut *tx, page_id).await? else {
            return Ok(None);
        };
        let versions = CmsPageVersionRepo::list_history(&mut *tx, page_id, true).await?;
        let issues = diagnose(&page, &versions);
        if issues.is_empty() {
            return Ok(None);
        }

        let live = live_pointer(&page, &versions);
        let mut touched =
            CmsPageVersionRepo::unpublish_all_except(&mut *tx, page_id, live).await?;
        if let Some(id) = live {
            if CmsPageVersionRepo::mark_published(&mut *tx, id).await? {
                touched += 1;
            }
        }

        let counter = page.version_counter.max(max_version_num(&versions) + 1);
        if live != page.published_version_id || counter != page.version_counter {
            CmsPageRepo::repair_pointer(&mut *tx, page_id, live, counter).await?;
        }

        tx.commit().await?;

        tracing::warn!(
            page_id,
            identity = %page.identity(),
            ?issues,
            versions_repaired = touched,
            version_counter = counter,
            "Repaired inconsistent page"
        );
        Ok(Some(touched))
    }
}

/// The pointer, if it names a live version of the page.
fn live_pointer(page: &CmsPage, versions: &[CmsPageVersion]) -> Option<DbId> {
    page.published_version_id
        .filter(|id| versions.iter().any(|v| v.id == *id && !v.is_deleted))
}

fn max_version_num(versions: &[CmsPageVersion]) -> VersionNum {
    versions.iter().map(|v| v.version_num).max().unwrap_or(0)
}

fn diagnose(page: &CmsPage, versions: &[CmsPageVersion]) -> Vec<Inconsistency> {
    let mut issues = Vec::new();

    let flagged: BTreeSet<DbId> = versions
        .iter()
        .filter(|v| v.is_published)
        .map(|v| v.id)
        .collect();
    if flagged.len() > 1 {
        let mut version_nums: Vec<_> = versions
            .iter()
            .filter(|v| v.is_published)
            .map(|v| v.version_num)
            .collect();
        version_nums.sort_unstable();
        issues.push(Inconsistency::MultiplePublished { version_nums });
    }

    let live = live_pointer(page, versions);
    match (page.published_version_id, live) {
        (Some(version_id), None) => issues.push(Inconsistency::DanglingPointer { version_id }),
        _ if flagged.len() <= 1 && flagged.iter().next().copied() != live => {
            issues.push(Inconsistency::PointerMismatch {
                pointer: page.published_version_id,
                flagged: flagged.iter().next().copied(),
            })
        }
        _ => {}
    }

    let max = max_version_num(versions);
    if page.version_counter <= max {
        issues.push(Inconsistency::CounterLag {
            version_counter: page.version_counter,
            max_version_num: max,
        });
    }

    issues
}
