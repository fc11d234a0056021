//! Cross-mode invariants: strict monotonicity, the channel cap and the
//! first-payment floor, checked through the public API in all three
//! modes.

use crate::support::Vendor;
use nanomoni_payments::{PaymentApi, PaymentError};
use shared_crypto::{Paytree, PaywordChain};

#[test]
fn accepted_indices_are_strictly_increasing_in_every_mode() {
    let vendor = Vendor::start();

    // Signature: lower and equal-but-different amounts bounce, higher
    // ones land.
    let sig_channel = vendor.open_signature(1_000);
    let mut accepted = Vec::new();
    for owed in [5u64, 3, 17, 12, 40] {
        if vendor
            .service
            .pay_signature(vendor.signed_update(sig_channel, owed))
            .is_ok()
        {
            accepted.push(owed);
        }
    }
    assert_eq!(accepted, vec![5, 17, 40]);
    assert!(accepted.windows(2).all(|w| w[0] < w[1]));

    // PayWord: same pattern on k.
    let chain = PaywordChain::generate(50, 4).unwrap();
    let pw_channel = vendor.open_payword(&chain, 50, 1);
    let mut accepted = Vec::new();
    for k in [2u64, 1, 9, 7, 30] {
        if vendor
            .service
            .pay_payword(vendor.payword_request(&chain, pw_channel, k))
            .is_ok()
        {
            accepted.push(k);
        }
    }
    assert_eq!(accepted, vec![2, 9, 30]);

    // PayTree: same pattern on i.
    let tree = Paytree::generate(32, b"prop-binding").unwrap();
    let pt_channel = vendor.open_paytree(&tree, 32, 1);
    let mut accepted = Vec::new();
    for i in [4u64, 2, 8, 32] {
        if vendor
            .service
            .pay_paytree(vendor.paytree_request(&tree, pt_channel, i))
            .is_ok()
        {
            accepted.push(i);
        }
    }
    assert_eq!(accepted, vec![4, 8, 32]);
}

#[test]
fn cumulative_owed_never_exceeds_channel_amount() {
    let vendor = Vendor::start();
    let channel_id = vendor.open_signature(100);

    vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 100))
        .unwrap();

    let rejected = vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 101));
    assert_eq!(
        rejected,
        Err(PaymentError::ExceedsChannelAmount {
            candidate_owed: 101,
            channel_amount: 100
        })
    );
    assert_eq!(vendor.stored_index(&channel_id), 100);
}

#[test]
fn first_payment_requires_index_one_in_every_mode() {
    let vendor = Vendor::start();

    // Signature: owed=0 is not a payment.
    let sig_channel = vendor.open_signature(100);
    assert!(matches!(
        vendor
            .service
            .pay_signature(vendor.signed_update(sig_channel, 0)),
        Err(PaymentError::NonMonotonicIndex { .. })
    ));

    // PayWord: k=0 reveals nothing (the root is public).
    let chain = PaywordChain::generate(10, 0).unwrap();
    let pw_channel = vendor.open_payword(&chain, 10, 1);
    assert!(matches!(
        vendor
            .service
            .pay_payword(nanomoni_payments::PaywordPaymentRequest {
                channel_id: pw_channel,
                k: 0,
                token_b64: shared_types::b64_encode(chain.root()),
            }),
        Err(PaymentError::NonMonotonicIndex { .. })
    ));

    // PayTree: i=0 is the unit state.
    let tree = Paytree::generate(8, b"floor-binding").unwrap();
    let pt_channel = vendor.open_paytree(&tree, 8, 1);
    assert!(matches!(
        vendor
            .service
            .pay_paytree(nanomoni_payments::PaytreePaymentRequest {
                channel_id: pt_channel,
                i: 0,
                leaf_b64: shared_types::b64_encode(&[0u8; 32]),
                proof_b64: Vec::new(),
            }),
        Err(PaymentError::NonMonotonicIndex { .. })
    ));
}

#[test]
fn first_signature_payment_clears_at_least_one_unit() {
    let vendor = Vendor::start();
    let channel_id = vendor.open(shared_types::PaymentMode::Signature, 100, 10, None);

    // unit_value is 10: a first payment of 5 is below the floor.
    assert!(matches!(
        vendor
            .service
            .pay_signature(vendor.signed_update(channel_id, 5)),
        Err(PaymentError::NonMonotonicIndex { .. })
    ));
    assert!(vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 10))
        .is_ok());

    // Past the first payment the floor is gone.
    assert!(vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 12))
        .is_ok());
}

#[test]
fn channel_lifecycle_is_one_way() {
    let vendor = Vendor::start();
    let channel_id = vendor.open_signature(100);
    vendor
        .service
        .pay_signature(vendor.signed_update(channel_id, 30))
        .unwrap();
    vendor
        .service
        .close_channel(vendor.close_request(channel_id, 30))
        .unwrap();

    // Closed stays closed; payments bounce, the statement stays fixed.
    assert_eq!(
        vendor
            .service
            .pay_signature(vendor.signed_update(channel_id, 60)),
        Err(PaymentError::ChannelClosed)
    );
    let statement = vendor
        .service
        .close_channel(vendor.close_request(channel_id, 30))
        .unwrap();
    assert_eq!(statement.final_cumulative_owed_amount, 30);

    // A fresh channel for the same client becomes possible again.
    let reopened = vendor.open_signature(100);
    assert_ne!(reopened, channel_id);
}
