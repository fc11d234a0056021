//! Literal end-to-end scenarios through the public payment API.

use crate::support::Vendor;
use nanomoni_payments::{PaymentApi, PaymentError};
use shared_crypto::PaywordChain;
use shared_types::b64_encode;
use std::sync::{Arc, Barrier};

#[test]
fn signature_happy_path_open_pay_close() {
    let vendor = Vendor::start();
    let channel_id = vendor.open_signature(100);

    for owed in [10u64, 25, 40] {
        let receipt = vendor
            .service
            .pay_signature(vendor.signed_update(channel_id, owed))
            .unwrap();
        assert_eq!(receipt.accepted_owed_amount, owed);
    }

    let statement = vendor
        .service
        .close_channel(vendor.close_request(channel_id, 40))
        .unwrap();
    assert_eq!(statement.final_cumulative_owed_amount, 40);
    assert!(!statement.vendor_signature_b64.is_empty());
}

#[test]
fn signature_monotonicity_rejects_lower_amount() {
    let vendor = Vendor::start();
    let channel_id = vendor.open_signature(100);

    vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 25))
        .unwrap();

    let rejected = vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 20));
    assert_eq!(
        rejected,
        Err(PaymentError::NonMonotonicIndex {
            current: 25,
            candidate: 20
        })
    );
    assert_eq!(vendor.stored_index(&channel_id), 25);
}

#[test]
fn payword_accepts_up_to_cap_then_rejects() {
    let vendor = Vendor::start();
    let chain = PaywordChain::generate(3, 0).unwrap();
    let channel_id = vendor.open_payword(&chain, 30, 10);

    for k in [1u64, 2, 3] {
        let receipt = vendor
            .service
            .pay_payword(vendor.payword_request(&chain, channel_id, k))
            .unwrap();
        assert_eq!(receipt.accepted_k, k);
        assert_eq!(receipt.cumulative_owed_amount, k * 10);
    }

    // The chain has no token beyond the cap; any bytes must bounce off
    // the cap check, not the token check.
    let rejected = vendor
        .service
        .pay_payword(nanomoni_payments::PaywordPaymentRequest {
            channel_id,
            k: 4,
            token_b64: b64_encode(&[0x42u8; 32]),
        });
    assert_eq!(
        rejected,
        Err(PaymentError::ExceedsIndexCap {
            candidate: 4,
            cap: 3
        })
    );
    assert_eq!(vendor.stored_index(&channel_id), 3);
}

#[test]
fn paytree_index_zero_is_never_a_first_payment() {
    let vendor = Vendor::start();
    let tree = shared_crypto::Paytree::generate(8, b"test-binding").unwrap();
    let channel_id = vendor.open_paytree(&tree, 80, 10);

    // i = 0 must be rejected as non-monotonic, not accepted as "i > -1".
    let rejected = vendor
        .service
        .pay_paytree(nanomoni_payments::PaytreePaymentRequest {
            channel_id,
            i: 0,
            leaf_b64: b64_encode(&[0u8; 32]),
            proof_b64: vec![b64_encode(&[0u8; 32]); 3],
        });
    assert_eq!(
        rejected,
        Err(PaymentError::NonMonotonicIndex {
            current: 0,
            candidate: 0
        })
    );
    assert_eq!(vendor.stored_index(&channel_id), 0);

    // i = 1 is the first valid payment.
    let receipt = vendor
        .service
        .pay_paytree(vendor.paytree_request(&tree, channel_id, 1))
        .unwrap();
    assert_eq!(receipt.accepted_i, 1);
}

#[test]
fn concurrent_race_settles_on_the_maximum() {
    // Two clients' worth of in-flight updates, repeated to shake out
    // interleavings: the final state is always the maximum, owed=20 never
    // overwrites owed=25.
    for _ in 0..50 {
        let vendor = Vendor::start();
        let channel_id = vendor.open_signature(100);
        vendor
            .service
            .pay_signature(vendor.signed_update(channel_id, 10))
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [20u64, 25]
            .into_iter()
            .map(|owed| {
                let service = Arc::clone(&vendor.service);
                let request = vendor.signed_update(channel_id, owed);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    (owed, service.pay_signature(request))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(vendor.stored_index(&channel_id), 25);
        for (owed, result) in results {
            match result {
                Ok(receipt) => assert_eq!(receipt.accepted_owed_amount, owed),
                Err(err) => {
                    // Only the smaller update may lose, and only to the
                    // monotonicity guard.
                    assert_eq!(owed, 20);
                    assert_eq!(
                        err,
                        PaymentError::NonMonotonicIndex {
                            current: 25,
                            candidate: 20
                        }
                    );
                }
            }
        }
    }
}

#[test]
fn tampered_payword_token_is_rejected_without_state_change() {
    let vendor = Vendor::start();
    let chain = PaywordChain::generate(10, 0).unwrap();
    let channel_id = vendor.open_payword(&chain, 100, 10);

    let rejected = vendor
        .service
        .pay_payword(nanomoni_payments::PaywordPaymentRequest {
            channel_id,
            k: 1,
            token_b64: b64_encode(&[0x5Au8; 32]),
        });
    assert_eq!(rejected, Err(PaymentError::InvalidToken));
    assert_eq!(vendor.stored_index(&channel_id), 0);

    // The genuine token for k=1 still goes through.
    let receipt = vendor
        .service
        .pay_payword(vendor.payword_request(&chain, channel_id, 1))
        .unwrap();
    assert_eq!(receipt.accepted_k, 1);
}

#[test]
fn close_is_idempotent_at_the_api_boundary() {
    let vendor = Vendor::start();
    let channel_id = vendor.open_signature(100);
    vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 40))
        .unwrap();

    let close = vendor.close_request(channel_id, 40);
    let first = vendor.service.close_channel(close.clone()).unwrap();
    let second = vendor.service.close_channel(close).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}
