//! Blob transaction assembly, signing and submission against a mock chain.

use alloy::{
    consensus::{SignableTransaction, Transaction, TxEip4844Variant, TxEnvelope},
    eips::{eip2718::Decodable2718, eip2930::AccessList, eip4844::calc_blob_gasprice},
    primitives::{address, Address, Bytes, U256},
    signers::local::PrivateKeySigner,
};
use blobtx::{
    fees::DEFAULT_EXCESS_BLOB_GAS, transactor::encode_network, BlobTransactor, BlobTxConfig,
    BlobTxRequest, Blobs, ChainHeader, Error, BLOB_CAPACITY,
};
use blobtx_test_utils::{canonical_payload, dev_signer, test_tracing, MockCall, MockChainClient};

fn new_transactor(client: MockChainClient) -> BlobTransactor<MockChainClient> {
    BlobTransactor::new(client, &BlobTxConfig::default())
}

fn request(payload: impl Into<Bytes>) -> BlobTxRequest<PrivateKeySigner> {
    BlobTxRequest::new(payload).signer(dev_signer())
}

#[tokio::test]
async fn zero_payload_without_overrides() {
    test_tracing();

    let transactor = new_transactor(MockChainClient::new());
    let client = transactor.client();
    let from = dev_signer().address();

    let tx = transactor.assemble(from, &request(vec![0u8; 1000])).await.unwrap();

    assert_eq!(tx.tx.blob_versioned_hashes.len(), 1);
    assert_eq!(tx.sidecar.blobs.len(), 1);
    assert_eq!(tx.tx.max_priority_fee_per_gas, client.tip_cap);
    assert_eq!(
        tx.tx.max_fee_per_gas,
        client.tip_cap + 2 * client.header.base_fee as u128
    );
    assert_eq!(tx.tx.gas_limit, client.gas_estimate);
    assert_eq!(tx.tx.nonce, client.pending_nonce);
    assert_eq!(tx.tx.chain_id, client.chain_id);
    assert_eq!(tx.tx.to, Address::ZERO);
    assert_eq!(tx.tx.value, U256::ZERO);
    assert_eq!(tx.tx.max_fee_per_blob_gas, calc_blob_gasprice(0));
    assert_eq!(tx.tx.access_list, AccessList::default());

    Blobs::default().verify_sidecar(&tx.sidecar, &tx.tx.blob_versioned_hashes).unwrap();

    for call in [
        MockCall::LatestHeader,
        MockCall::SuggestTipCap,
        MockCall::EstimateGas,
        MockCall::PendingNonce,
        MockCall::ChainId,
    ] {
        assert_eq!(client.calls(call), 1, "{call:?}");
    }
    assert_eq!(client.calls(MockCall::Broadcast), 0);
    assert_eq!(client.nonce_queries(), vec![from]);
}

#[tokio::test]
async fn gas_estimate_excludes_blob() {
    let transactor = new_transactor(MockChainClient::new());
    let to = address!("00000000000000000000000000000000000000aa");
    let request = request(canonical_payload(4096, 1)).to(to).input(vec![1u8, 2, 3]);
    let from = dev_signer().address();

    transactor.assemble(from, &request).await.unwrap();

    let queries = transactor.client().gas_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].from, from);
    assert_eq!(queries[0].to, to);
    assert_eq!(queries[0].input, Bytes::from(vec![1u8, 2, 3]));
    assert_eq!(queries[0].tip_cap, transactor.client().tip_cap);
}

#[tokio::test]
async fn oversized_payload_fails_without_network_calls() {
    let transactor = new_transactor(MockChainClient::new());

    let err = transactor.transact(request(vec![0u8; BLOB_CAPACITY + 1])).await.unwrap_err();

    assert!(matches!(err, Error::PayloadTooLarge { len: 131_073, max: 131_072 }));
    assert!(err.to_string().contains("131072"));
    assert_eq!(transactor.client().total_calls(), 0);
}

#[tokio::test]
async fn payload_at_capacity_builds() {
    let transactor = new_transactor(MockChainClient::new());
    let payload = canonical_payload(BLOB_CAPACITY, 2);

    let tx = transactor.assemble(Address::ZERO, &request(payload.clone())).await.unwrap();
    assert_eq!(&tx.sidecar.blobs[0][..], &payload[..]);
}

#[tokio::test]
async fn fee_cap_below_tip_cap() {
    let transactor = new_transactor(MockChainClient::new());

    let err = transactor.transact(request(vec![0u8; 10]).tip_cap(10).fee_cap(5)).await.unwrap_err();

    assert!(matches!(err, Error::InvalidFeeOrdering { fee_cap: 5, tip_cap: 10 }));
    let msg = err.to_string();
    assert!(msg.contains('5') && msg.contains("10"), "{msg}");

    // Fee ordering is checked before estimating gas, fetching a nonce or a tip.
    let client = transactor.client();
    assert_eq!(client.calls(MockCall::SuggestTipCap), 0);
    assert_eq!(client.calls(MockCall::EstimateGas), 0);
    assert_eq!(client.calls(MockCall::PendingNonce), 0);
    assert_eq!(client.calls(MockCall::ChainId), 0);
}

#[tokio::test]
async fn explicit_fees_are_used() {
    let transactor = new_transactor(MockChainClient::new());

    let tx = transactor
        .assemble(Address::ZERO, &request(vec![0u8; 10]).tip_cap(10).fee_cap(10))
        .await
        .unwrap();

    assert_eq!(tx.tx.max_priority_fee_per_gas, 10);
    assert_eq!(tx.tx.max_fee_per_gas, 10);
    assert_eq!(transactor.client().calls(MockCall::SuggestTipCap), 0);
}

#[tokio::test]
async fn no_signer_fails_before_any_call() {
    let transactor = new_transactor(MockChainClient::new());
    let request: BlobTxRequest<PrivateKeySigner> = BlobTxRequest::new(vec![0u8; 1000]);

    let err = transactor.transact(request).await.unwrap_err();

    assert!(matches!(err, Error::NoSigner));
    assert_eq!(transactor.client().total_calls(), 0);
}

#[tokio::test]
async fn explicit_nonce_skips_nonce_fetch() {
    let transactor = new_transactor(MockChainClient::new());

    let signed = transactor.transact(request(vec![0u8; 100]).nonce(42).no_send(true)).await.unwrap();

    assert_eq!(signed.tx().nonce(), 42);
    assert_eq!(transactor.client().calls(MockCall::PendingNonce), 0);
}

#[tokio::test]
async fn explicit_gas_limit_skips_estimate() {
    let transactor = new_transactor(MockChainClient::new());

    let tx = transactor
        .assemble(Address::ZERO, &request(vec![0u8; 100]).gas_limit(100_000))
        .await
        .unwrap();

    assert_eq!(tx.tx.gas_limit, 100_000);
    assert_eq!(transactor.client().calls(MockCall::EstimateGas), 0);
}

#[tokio::test]
async fn value_and_recipient_are_kept() {
    let transactor = new_transactor(MockChainClient::new());
    let to = address!("00000000000000000000000000000000000000bb");

    let tx = transactor
        .assemble(Address::ZERO, &request(vec![0u8; 1]).to(to).value(U256::from(5)))
        .await
        .unwrap();

    assert_eq!(tx.tx.to, to);
    assert_eq!(tx.tx.value, U256::from(5));
}

#[tokio::test]
async fn missing_excess_blob_gas_uses_fallback() {
    let client =
        MockChainClient::new().with_header(ChainHeader { base_fee: 100, excess_blob_gas: None });
    let config = BlobTxConfig { fallback_excess_blob_gas: 0, ..Default::default() };
    let configured = BlobTransactor::new(client, &config);

    let tx = configured.assemble(Address::ZERO, &request(vec![0u8; 1])).await.unwrap();
    assert_eq!(tx.tx.max_fee_per_blob_gas, 1);

    let transactor = new_transactor(
        MockChainClient::new().with_header(ChainHeader { base_fee: 100, excess_blob_gas: None }),
    );
    let tx = transactor.assemble(Address::ZERO, &request(vec![0u8; 1])).await.unwrap();
    assert_eq!(tx.tx.max_fee_per_blob_gas, calc_blob_gasprice(DEFAULT_EXCESS_BLOB_GAS));
}

#[tokio::test]
async fn no_send_returns_verifiable_signed_tx() {
    let transactor = new_transactor(MockChainClient::new());
    let payload = canonical_payload(2000, 3);
    let signer = dev_signer();

    let signed = transactor.transact(request(payload.clone()).no_send(true)).await.unwrap();
    assert_eq!(transactor.client().calls(MockCall::Broadcast), 0);

    let recovered =
        signed.signature().recover_address_from_prehash(&signed.signature_hash()).unwrap();
    assert_eq!(recovered, signer.address());

    // The signature commits to the body only, not the sidecar.
    assert_eq!(signed.signature_hash(), signed.tx().tx().signature_hash());

    let TxEip4844Variant::TxEip4844WithSidecar(with_sidecar) = signed.tx() else {
        panic!("signed tx lost its sidecar");
    };
    assert_eq!(&with_sidecar.sidecar.blobs[0][..payload.len()], &payload[..]);
}

#[tokio::test]
async fn broadcast_sends_network_encoding() {
    let transactor = new_transactor(MockChainClient::new());

    let signed = transactor.transact(request(canonical_payload(64, 4))).await.unwrap();

    let broadcasts = transactor.client().broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0], encode_network(&signed));

    let decoded = TxEnvelope::decode_2718(&mut broadcasts[0].as_ref()).unwrap();
    let TxEnvelope::Eip4844(decoded) = decoded else { panic!("not a blob tx") };
    assert_eq!(decoded.hash(), signed.hash());
    let TxEip4844Variant::TxEip4844WithSidecar(with_sidecar) = decoded.tx() else {
        panic!("broadcast without sidecar");
    };
    Blobs::default()
        .verify_sidecar(&with_sidecar.sidecar, &with_sidecar.tx.blob_versioned_hashes)
        .unwrap();
}

#[tokio::test]
async fn submission_failure_returns_signed_tx() {
    let mut client = MockChainClient::new().failing(MockCall::Broadcast);
    let transactor = new_transactor(MockChainClient::new().failing(MockCall::Broadcast));

    let err = transactor.transact(request(vec![0u8; 32])).await.unwrap_err();
    let signed = err.signed_tx().expect("signed tx is returned").clone();
    assert!(matches!(err, Error::SubmissionFailed { .. }));
    assert_eq!(transactor.client().calls(MockCall::Broadcast), 1);

    // Resubmitting through a working client sends the same bytes without signing again.
    client.recover(MockCall::Broadcast);
    let transactor = BlobTransactor::new(client, &BlobTxConfig::default());
    transactor.resubmit(&signed).await.unwrap();
    assert_eq!(transactor.client().broadcasts(), vec![encode_network(&signed)]);
    assert_eq!(transactor.client().calls(MockCall::LatestHeader), 0);
}

#[tokio::test]
async fn chain_state_failures_map_to_error_kinds() {
    let cases = [
        (MockCall::LatestHeader, "chain state"),
        (MockCall::SuggestTipCap, "chain state"),
        (MockCall::ChainId, "chain state"),
        (MockCall::EstimateGas, "estimate gas"),
        (MockCall::PendingNonce, "nonce"),
    ];

    for (call, expected) in cases {
        let transactor = new_transactor(MockChainClient::new().failing(call));
        let err = transactor.transact(request(vec![0u8; 32])).await.unwrap_err();

        match (&err, call) {
            (Error::ChainStateFetchFailed(_), MockCall::LatestHeader) |
            (Error::ChainStateFetchFailed(_), MockCall::SuggestTipCap) |
            (Error::ChainStateFetchFailed(_), MockCall::ChainId) |
            (Error::GasEstimationFailed(_), MockCall::EstimateGas) |
            (Error::NonceResolutionFailed(_), MockCall::PendingNonce) => {}
            _ => panic!("unexpected error for {call:?}: {err:?}"),
        }
        assert!(err.to_string().contains(expected), "{err}");
        assert_eq!(transactor.client().calls(MockCall::Broadcast), 0);
    }
}

#[tokio::test]
async fn non_canonical_payload_fails_sidecar_construction() {
    let transactor = new_transactor(MockChainClient::new());

    let err = transactor.transact(request(vec![0xffu8; 64])).await.unwrap_err();
    assert!(matches!(err, Error::SidecarConstructionFailed(_)));
    assert_eq!(transactor.client().calls(MockCall::Broadcast), 0);
}

#[tokio::test]
async fn identical_payloads_give_identical_blob_hashes() {
    let transactor = new_transactor(MockChainClient::new());
    let payload = canonical_payload(10_000, 5);

    let a = transactor.assemble(Address::ZERO, &request(payload.clone())).await.unwrap();
    let b = transactor.assemble(Address::ZERO, &request(payload)).await.unwrap();

    assert_eq!(a.sidecar.blobs, b.sidecar.blobs);
    assert_eq!(a.sidecar.commitments, b.sidecar.commitments);
    assert_eq!(a.tx.blob_versioned_hashes, b.tx.blob_versioned_hashes);
}
