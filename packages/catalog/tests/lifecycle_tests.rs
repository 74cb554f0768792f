// ABOUTME: Feed lifecycle tests with a gateway whose responses are released by hand
// ABOUTME: Verifies stale responses never overwrite newer ones and nothing lands after unmount

mod common;

use async_trait::async_trait;
use common::{funds_fixture, urgent_fixture};
use pretty_assertions::assert_eq;
use serde_json::Value;
use shanyraq_catalog::gateway::{DataGateway, Filter, Query};
use shanyraq_catalog::{
    BeneficiaryFeed, BeneficiaryQueryService, CatalogError, CatalogFilter, CatalogResult,
    FetchOutcome, FetchPhase, MemoryGateway, PartnerFundFeed, PartnerFundQueryService,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_test::{assert_pending, assert_ready_eq, task};

type Release = oneshot::Sender<CatalogResult<Vec<Value>>>;

/// Each select waits until the test releases it
#[derive(Default)]
struct GatedGateway {
    pending: Mutex<VecDeque<oneshot::Receiver<CatalogResult<Vec<Value>>>>>,
}

impl GatedGateway {
    fn gate(&self) -> Release {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl DataGateway for GatedGateway {
    async fn select(&self, _query: &Query) -> CatalogResult<Vec<Value>> {
        let gate = self
            .pending
            .lock()
            .unwrap()
            .pop_front()
            .expect("select without a gate");
        gate.await
            .unwrap_or_else(|_| Err(CatalogError::gateway("gate dropped")))
    }

    async fn count(&self, _query: &Query) -> CatalogResult<usize> {
        unimplemented!()
    }

    async fn insert(&self, _table: &str, _rows: Vec<Value>) -> CatalogResult<Vec<Value>> {
        unimplemented!()
    }

    async fn update(&self, _table: &str, _filters: &[Filter], _patch: Value) -> CatalogResult<Vec<Value>> {
        unimplemented!()
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> CatalogResult<()> {
        unimplemented!()
    }
}

fn rows(ids: &[&str]) -> Vec<Value> {
    urgent_fixture()
        .into_iter()
        .filter(|row| ids.contains(&row["id"].as_str().unwrap_or_default()))
        .collect()
}

fn filter(category: &str, city: &str) -> CatalogFilter {
    CatalogFilter::from_selection(Some(category), Some(city)).unwrap()
}

#[test]
fn test_slow_first_response_does_not_overwrite_second() {
    let gateway = Arc::new(GatedGateway::default());
    let first_release = gateway.gate();
    let second_release = gateway.gate();
    let feed = BeneficiaryFeed::new(BeneficiaryQueryService::new(gateway.clone()));

    let mut first = task::spawn(feed.set_filter(filter("urgent", "Алматы")));
    assert_pending!(first.poll());
    let mut second = task::spawn(feed.set_filter(filter("urgent", "Астана")));
    assert_pending!(second.poll());

    second_release.send(Ok(rows(&["u-astana"]))).unwrap();
    assert_ready_eq!(second.poll(), Some(FetchOutcome::Published));

    first_release
        .send(Ok(rows(&["u-almaty-new", "u-almaty-old"])))
        .unwrap();
    assert_ready_eq!(first.poll(), Some(FetchOutcome::Superseded));

    let snapshot = feed.snapshot();
    let ids: Vec<_> = snapshot.data.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["u-astana"]);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.phase, FetchPhase::Success);
}

#[test]
fn test_no_publication_after_unmount() {
    let gateway = Arc::new(GatedGateway::default());
    let release = gateway.gate();
    let feed = BeneficiaryFeed::new(BeneficiaryQueryService::new(gateway.clone()));
    let mut observer = feed.subscribe();

    let mut fetch = task::spawn(feed.set_filter(CatalogFilter::default()));
    assert_pending!(fetch.poll());
    observer.borrow_and_update();

    feed.unmount();
    release.send(Ok(rows(&["u-astana"]))).unwrap();
    assert_ready_eq!(fetch.poll(), Some(FetchOutcome::Superseded));

    assert!(!observer.has_changed().unwrap());
    assert!(feed.snapshot().data.is_empty());
}

#[test]
fn test_stale_error_is_not_published() {
    let gateway = Arc::new(GatedGateway::default());
    let first_release = gateway.gate();
    let second_release = gateway.gate();
    let feed = BeneficiaryFeed::new(BeneficiaryQueryService::new(gateway.clone()));

    let mut first = task::spawn(feed.set_filter(filter("all", "Алматы")));
    assert_pending!(first.poll());
    let mut second = task::spawn(feed.set_filter(filter("children", "Алматы")));
    assert_pending!(second.poll());

    first_release
        .send(Err(CatalogError::gateway("canceling statement due to statement timeout")))
        .unwrap();
    assert_ready_eq!(first.poll(), Some(FetchOutcome::Superseded));
    assert_eq!(feed.snapshot().error, None);

    second_release.send(Ok(rows(&["c-almaty"]))).unwrap();
    assert_ready_eq!(second.poll(), Some(FetchOutcome::Published));
    assert_eq!(feed.snapshot().data[0].category_name, "Дети");
}

#[tokio::test]
async fn test_unchanged_filter_does_not_refetch() {
    let gateway = Arc::new(common::seeded_gateway(urgent_fixture()));
    let feed = BeneficiaryFeed::new(BeneficiaryQueryService::new(gateway.clone()));

    let urgent = filter("urgent", "Алматы");
    assert_eq!(feed.set_filter(urgent.clone()).await, Some(FetchOutcome::Published));
    assert_eq!(feed.set_filter(urgent).await, None);
    assert_eq!(gateway.executed_queries().len(), 1);

    assert_eq!(feed.refresh().await, FetchOutcome::Published);
    assert_eq!(gateway.executed_queries().len(), 2);
    assert_eq!(feed.snapshot().data.len(), 3);
}

#[tokio::test]
async fn test_failure_is_reported_and_keeps_data() {
    let gateway = Arc::new(common::seeded_gateway(urgent_fixture()));
    let feed = BeneficiaryFeed::new(BeneficiaryQueryService::new(gateway.clone()));
    feed.set_filter(CatalogFilter::default()).await;

    gateway.fail_next("JWT expired");
    assert_eq!(feed.refresh().await, FetchOutcome::Published);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.error.as_deref(), Some("JWT expired"));
    assert_eq!(snapshot.phase, FetchPhase::Failed);
    assert_eq!(snapshot.data.len(), 5);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_partner_fund_feed_mounts() {
    let gateway = MemoryGateway::new().with_rows("partner_funds", funds_fixture());
    let feed = PartnerFundFeed::new(PartnerFundQueryService::new(Arc::new(gateway)));

    assert_eq!(feed.mount().await, FetchOutcome::Published);
    let names: Vec<_> = feed
        .snapshot()
        .data
        .into_iter()
        .map(|fund| fund.name)
        .collect();
    assert_eq!(names, vec!["Мейірім", "Шанырак", "Аяла"]);

    feed.unmount();
}
