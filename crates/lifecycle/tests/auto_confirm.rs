mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Harness;
use hirely_core::status::RequestStatus;
use hirely_db::models::service_request::CreateServiceRequest;
use hirely_lifecycle::AutoConfirmReport;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn sweep_confirms_only_stale_completions() {
    let h = Harness::new();
    let stale = h.awaiting_confirmation().await;
    h.backdate_completion(stale.id, 25);

    let other = h.another_service(Some(2_000));
    let fresh = h
        .requests
        .create_service_request(CreateServiceRequest {
            service_id: other.id,
            ..h.create_input(None)
        })
        .await
        .unwrap()
        .unwrap();
    h.requests.accept_request(fresh.id, None).await.unwrap().unwrap();
    h.requests.start_request(fresh.id).await.unwrap().unwrap();
    assert!(h.requests.mark_expert_completed(fresh.id).await.unwrap());
    h.backdate_completion(fresh.id, 23);

    let candidates = h.requests.get_auto_complete_candidates().await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, stale.id);

    let report = h.sweeper().run_once().await.unwrap();
    assert_eq!(
        report,
        AutoConfirmReport {
            candidates: 1,
            confirmed: 1,
            skipped: 0,
            failed: 0,
        }
    );

    let confirmed = h.requests.find_request(stale.id).await.unwrap().unwrap();
    assert_eq!(confirmed.status, RequestStatus::Completed);
    assert!(confirmed.client_confirmed);
    let untouched = h.requests.find_request(fresh.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, RequestStatus::AwaitingConfirmation);

    assert_eq!(h.payments.calls(), 1);
    let client = h.stats.client_counters(h.client.id).await.unwrap();
    assert_eq!(client.services_purchased, 1);
    assert_eq!(client.total_spent_cents, 10_000);
}

#[tokio::test]
async fn store_failure_on_one_candidate_does_not_stop_the_sweep() {
    let h = Harness::new();
    let first = h.awaiting_confirmation().await;
    let second = h.awaiting_confirmation_for(&h.another_service(Some(2_000))).await;
    let third = h.awaiting_confirmation_for(&h.another_service(Some(3_000))).await;
    h.backdate_completion(first.id, 30);
    h.backdate_completion(second.id, 29);
    h.backdate_completion(third.id, 28);
    h.store.fail_transitions_for(second.id);

    let report = h.sweeper().run_once().await.unwrap();
    assert_eq!(
        report,
        AutoConfirmReport {
            candidates: 3,
            confirmed: 2,
            skipped: 0,
            failed: 1,
        }
    );

    for id in [first.id, third.id] {
        let request = h.requests.find_request(id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Completed);
    }
    let stuck = h.requests.find_request(second.id).await.unwrap().unwrap();
    assert_eq!(stuck.status, RequestStatus::AwaitingConfirmation);
    assert_eq!(h.payments.calls(), 2);
}

#[tokio::test]
async fn second_sweep_finds_nothing() {
    let h = Harness::new();
    let stale = h.awaiting_confirmation().await;
    h.backdate_completion(stale.id, 30);

    let sweeper = h.sweeper();
    assert_eq!(sweeper.run_once().await.unwrap().confirmed, 1);

    let again = sweeper.run_once().await.unwrap();
    assert_eq!(again, AutoConfirmReport::default());
    assert_eq!(h.payments.calls(), 1);
}

#[tokio::test]
async fn manual_confirmation_and_sweep_race_once() {
    let h = Harness::new();
    let stale = h.awaiting_confirmation().await;
    h.backdate_completion(stale.id, 48);

    let sweeper = h.sweeper();
    let (manual, sweep) = tokio::join!(h.requests.confirm_service(stale.id), sweeper.run_once());

    let manual = manual.unwrap();
    let sweep = sweep.unwrap();
    let successes = usize::from(manual) + sweep.confirmed;
    assert_eq!(successes, 1);
    assert_eq!(h.payments.calls(), 1);
    assert_eq!(
        h.stats.expert_counters(h.expert.id).await.unwrap().completed_services,
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_confirmations_release_payment_once() {
    let h = Harness::new();
    let stale = h.awaiting_confirmation().await;
    h.backdate_completion(stale.id, 48);

    let id = stale.id;
    let sweeper = Arc::new(h.sweeper());
    let mut handles = Vec::new();
    for i in 0..8 {
        let requests = h.requests.clone();
        let sweeper = Arc::clone(&sweeper);
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                usize::from(requests.confirm_service(id).await.unwrap())
            } else {
                sweeper.run_once().await.unwrap().confirmed
            }
        }));
    }

    let mut successes = 0;
    for handle in handles {
        successes += handle.await.unwrap();
    }
    assert_eq!(successes, 1);
    assert_eq!(h.payments.calls(), 1);
}

#[tokio::test]
async fn run_loop_sweeps_until_cancelled() {
    let h = Harness::new();
    let stale = h.awaiting_confirmation().await;
    h.backdate_completion(stale.id, 25);

    let id = stale.id;
    let sweeper = h.sweeper();
    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    let requests = h.requests.clone();

    let watch = async move {
        for _ in 0..200 {
            let current = requests.find_request(id).await.unwrap().unwrap();
            if current.status == RequestStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stopper.cancel();
    };

    tokio::join!(sweeper.run(Duration::from_millis(10), cancel), watch);

    let done = h.requests.find_request(id).await.unwrap().unwrap();
    assert_eq!(done.status, RequestStatus::Completed);
    assert_eq!(h.payments.calls(), 1);
}
