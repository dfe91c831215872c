mod common;

use approx::assert_relative_eq;
use bakery::{ModelError, run, simulate};
use common::{script, shop};
use des::DesError;

#[test]
fn given_two_simultaneous_arrivals_and_one_worker_when_run_then_second_waits_for_first() {
    // Given: both customers arrive at t=10, each needs 5 minutes
    let params = shop(100.0, 1);
    let variates = script(&[10.0, 0.0, 1000.0], &[5.0, 5.0], &[20.0, 20.0]);

    // When
    let stats = simulate(&params, variates).unwrap();

    // Then
    assert_eq!(stats.wait_times, vec![0.0, 5.0]);
    assert_eq!(stats.served, 2);
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.arrivals, 2);
    assert_relative_eq!(stats.busy_time, 10.0);
}

#[test]
fn given_two_simultaneous_arrivals_when_summarised_then_utilization_is_ten_percent() {
    let params = shop(100.0, 1);
    let variates = script(&[10.0, 0.0, 1000.0], &[5.0, 5.0], &[20.0, 20.0]);

    let summary = run(&params, variates).unwrap();

    assert_relative_eq!(summary.avg_wait_time, 2.5);
    assert_eq!(summary.served_customers, 2);
    assert_eq!(summary.lost_customers, 0);
    assert_relative_eq!(summary.customer_loss_rate_pct, 0.0);
    assert_relative_eq!(summary.worker_utilization_pct, 10.0);
}

#[test]
fn given_short_patience_when_worker_busy_then_customer_abandons() {
    // Given: the second customer gives up after 3 of the 5 minutes
    let params = shop(100.0, 1);
    let variates = script(&[10.0, 0.0, 1000.0], &[5.0], &[20.0, 3.0]);

    // When
    let summary = run(&params, variates).unwrap();

    // Then
    assert_eq!(summary.served_customers, 1);
    assert_eq!(summary.lost_customers, 1);
    assert_relative_eq!(summary.avg_wait_time, 0.0);
    assert_relative_eq!(summary.customer_loss_rate_pct, 50.0);
    assert_relative_eq!(summary.worker_utilization_pct, 5.0);
}

#[test]
fn given_patience_ending_as_worker_frees_when_run_then_customer_is_served() {
    // Given: the second customer's patience runs out at t=15, exactly when the
    // first customer leaves
    let params = shop(100.0, 1);
    let variates = script(&[10.0, 0.0, 1000.0], &[5.0, 1.0], &[20.0, 5.0]);

    // When
    let stats = simulate(&params, variates).unwrap();

    // Then
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.wait_times, vec![0.0, 5.0]);
}

#[test]
fn given_deadline_queued_before_the_release_when_they_tie_then_customer_is_served() {
    // Given: customer 3 arrives at t=1 with patience 9, so its deadline (t=10)
    // is queued before customer 2's service end (t=2 + 8) is
    let params = shop(100.0, 1);
    let variates = script(&[0.0, 0.5, 0.5, 1000.0], &[2.0, 8.0, 1.0], &[20.0, 20.0, 9.0]);

    // When
    let stats = simulate(&params, variates).unwrap();

    // Then
    assert_eq!(stats.served, 3);
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.wait_times, vec![0.0, 1.5, 9.0]);
    assert_relative_eq!(stats.busy_time, 11.0);
}

#[test]
fn given_queue_when_worker_frees_then_customers_are_served_in_arrival_order() {
    // Given: arrivals at 10, 11 and 12; the first holds the worker until 20
    let params = shop(100.0, 1);
    let variates = script(&[10.0, 1.0, 1.0, 1000.0], &[10.0, 4.0, 4.0], &[50.0, 50.0, 50.0]);

    // When
    let stats = simulate(&params, variates).unwrap();

    // Then
    assert_eq!(stats.wait_times, vec![0.0, 9.0, 12.0]);
}

#[test]
fn given_two_workers_when_two_arrive_together_then_nobody_waits() {
    let params = shop(100.0, 2);
    let variates = script(&[10.0, 0.0, 1000.0], &[5.0, 5.0], &[2.0, 2.0]);

    let summary = run(&params, variates).unwrap();

    assert_relative_eq!(summary.avg_wait_time, 0.0);
    assert_eq!(summary.served_customers, 2);
    assert_relative_eq!(summary.worker_utilization_pct, 5.0);
}

#[test]
fn given_customer_in_service_at_closing_when_run_ends_then_counted_as_in_flight() {
    // Given: arrives at 95 and needs 10 minutes in a shop closing at 100
    let params = shop(100.0, 1);
    let variates = script(&[95.0, 1000.0], &[10.0], &[5.0]);

    // When
    let stats = simulate(&params, variates).unwrap();

    // Then
    assert_eq!(stats.served, 0);
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.arrivals, 1);
    assert_eq!(stats.in_flight(), 1);
    assert_relative_eq!(stats.busy_time, 0.0);
}

#[test]
fn given_zero_workers_when_run_then_invalid_capacity() {
    let params = shop(100.0, 0);

    let result = run(&params, script(&[], &[], &[]));

    assert!(matches!(
        result,
        Err(ModelError::Sim(DesError::InvalidCapacity(0)))
    ));
}

#[test]
fn given_negative_service_sample_when_run_then_invalid_duration() {
    let params = shop(100.0, 1);
    let variates = script(&[10.0, 1000.0], &[-1.0], &[5.0]);

    let result = run(&params, variates);

    assert!(matches!(
        result,
        Err(ModelError::Sim(DesError::InvalidDuration(d))) if d == -1.0
    ));
}
