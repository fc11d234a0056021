//! Shared test harness: one vendor, one issuer, one client, real keys.

use nanomoni_channel_store::{ChannelStore, InMemoryChannelStore};
use nanomoni_payments::{
    Certificate, CertificateBody, CloseChannelRequest, ClosingStatementPayload,
    ManualTimeSource, OpenChannelPayload, OpenChannelRequest, PaymentApi, PaymentConfig,
    PaymentService, PaytreePaymentRequest, PaywordPaymentRequest, SignaturePaymentRequest,
    SignatureUpdatePayload, StaticIssuerDirectory, TimeSource,
};
use shared_crypto::{EcdsaKeyPair, Paytree, PaywordChain};
use shared_types::{b64_encode, Amount, ChannelId, PaymentMode};
use std::sync::Arc;

pub const NOW: u64 = 1_700_000_000;

pub type Service = PaymentService<
    Arc<InMemoryChannelStore>,
    Arc<StaticIssuerDirectory>,
    Arc<ManualTimeSource>,
>;

pub struct Vendor {
    pub service: Arc<Service>,
    pub store: Arc<InMemoryChannelStore>,
    pub issuer: EcdsaKeyPair,
    pub client: EcdsaKeyPair,
    pub time: Arc<ManualTimeSource>,
}

impl Vendor {
    pub fn start() -> Self {
        let issuer = EcdsaKeyPair::generate().unwrap();
        let client = EcdsaKeyPair::generate().unwrap();
        let vendor_keys = EcdsaKeyPair::generate().unwrap();
        let store = Arc::new(InMemoryChannelStore::new());
        let directory = Arc::new(StaticIssuerDirectory::new(
            issuer.public_key().as_der().to_vec(),
        ));
        let time = Arc::new(ManualTimeSource::new(NOW));
        let service = Arc::new(PaymentService::new(
            Arc::clone(&store),
            directory,
            Arc::clone(&time),
            vendor_keys,
            PaymentConfig::default(),
        ));
        Self {
            service,
            store,
            issuer,
            client,
            time,
        }
    }

    pub fn certificate(&self) -> Certificate {
        let body = CertificateBody {
            client_public_key_der_b64: b64_encode(self.client.public_key().as_der()),
            initial_balance: 1_000_000,
            issued_at: NOW - 60,
            expires_at: NOW + 3_600,
        };
        Certificate::issue(body, &self.issuer).unwrap()
    }

    pub fn open(
        &self,
        mode: PaymentMode,
        channel_amount: Amount,
        unit_value: Amount,
        commitment: Option<([u8; 32], u64)>,
    ) -> ChannelId {
        let payload = OpenChannelPayload {
            client_public_key_der_b64: b64_encode(self.client.public_key().as_der()),
            mode,
            channel_amount,
            unit_value,
            commitment_root_b64: commitment.map(|(root, _)| b64_encode(&root)),
            commitment_max_index: commitment.map(|(_, cap)| cap),
        };
        let bytes = payload.canonical_bytes().unwrap();
        let request = OpenChannelRequest {
            client_signature_b64: b64_encode(&self.client.sign(&bytes)),
            certificate: self.certificate(),
            payload,
        };
        self.service.open_channel(request).unwrap().channel_id
    }

    pub fn open_signature(&self, channel_amount: Amount) -> ChannelId {
        self.open(PaymentMode::Signature, channel_amount, 1, None)
    }

    pub fn open_payword(
        &self,
        chain: &PaywordChain,
        channel_amount: Amount,
        unit_value: Amount,
    ) -> ChannelId {
        self.open(
            PaymentMode::Payword,
            channel_amount,
            unit_value,
            Some((*chain.root(), chain.max_k())),
        )
    }

    pub fn open_paytree(
        &self,
        tree: &Paytree,
        channel_amount: Amount,
        unit_value: Amount,
    ) -> ChannelId {
        self.open(
            PaymentMode::Paytree,
            channel_amount,
            unit_value,
            Some((tree.root(), tree.max_i())),
        )
    }

    pub fn signed_update(&self, channel_id: ChannelId, owed: Amount) -> SignaturePaymentRequest {
        let payload = SignatureUpdatePayload {
            channel_id,
            cumulative_owed_amount: owed,
        };
        let bytes = payload.canonical_bytes().unwrap();
        SignaturePaymentRequest {
            channel_id,
            cumulative_owed_amount: owed,
            signature_b64: b64_encode(&self.client.sign(&bytes)),
        }
    }

    pub fn payword_request(
        &self,
        chain: &PaywordChain,
        channel_id: ChannelId,
        k: u64,
    ) -> PaywordPaymentRequest {
        PaywordPaymentRequest {
            channel_id,
            k,
            token_b64: b64_encode(&chain.token(k).unwrap()),
        }
    }

    pub fn paytree_request(
        &self,
        tree: &Paytree,
        channel_id: ChannelId,
        i: u64,
    ) -> PaytreePaymentRequest {
        PaytreePaymentRequest {
            channel_id,
            i,
            leaf_b64: b64_encode(&tree.leaf(i).unwrap()),
            proof_b64: tree
                .proof(i)
                .unwrap()
                .siblings
                .iter()
                .map(|s| b64_encode(s))
                .collect(),
        }
    }

    pub fn close_request(&self, channel_id: ChannelId, final_owed: Amount) -> CloseChannelRequest {
        let closed_at = self.time.now();
        let payload = ClosingStatementPayload {
            channel_id,
            final_cumulative_owed_amount: final_owed,
            closed_at,
        };
        let bytes = payload.canonical_bytes().unwrap();
        CloseChannelRequest {
            channel_id,
            closed_at,
            client_signature_b64: b64_encode(&self.client.sign(&bytes)),
        }
    }

    pub fn stored_index(&self, channel_id: &ChannelId) -> u64 {
        self.store
            .get(channel_id)
            .unwrap()
            .expect("channel exists")
            .latest
            .index()
    }
}
