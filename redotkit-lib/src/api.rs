//! Typed payment endpoints.
//!
//! Each endpoint is a signed, encrypted request over
//! [`RedotClient::request_api`] to its route in [`crate::ApiRoutes`].
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::client::RedotClient;
use crate::store::SessionStore;
use crate::transport::Transport;
use crate::Result;

/// Lifecycle of a payment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum PaymentStatus {
    /// Created, nothing received.
    Unpaid = 0,
    /// Payment seen, not yet confirmed.
    Paying = 1,
    /// Paid.
    Success = 2,
    /// Payment failed.
    Failed = 3,
    /// Cancelled.
    Cancelled = 4,
}

impl PaymentStatus {
    /// Map a raw status code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unpaid),
            1 => Some(Self::Paying),
            2 => Some(Self::Success),
            3 => Some(Self::Failed),
            4 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Raw status code.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// True once the order can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

/// Pre-order lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrderParams {
    /// Pre-order serial number.
    pub pre_sn: String,
}

impl PreOrderParams {
    /// Lookup for `pre_sn`.
    pub fn new(pre_sn: impl Into<String>) -> Self {
        Self {
            pre_sn: pre_sn.into(),
        }
    }
}

/// Receiving address of a wallet on one chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainAddress {
    /// Chain name, e.g. `TRON`.
    pub chain: String,
    /// Address payments on this chain are sent to.
    pub payment_address: String,
}

/// Web3 wallet accepted for the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Web3Wallet {
    /// Display name of the wallet.
    pub wallet_name: String,
    /// Supported chains and their addresses.
    pub chains: Vec<ChainAddress>,
}

/// Pre-order details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreOrderResponse {
    /// Pre-order serial number.
    pub pre_sn: String,
    /// Merchant-side order reference.
    pub outer_order: String,
    /// Merchant-side user id.
    pub outer_uid: String,
    /// Amount in the order currency.
    pub order_amount: f64,
    /// Amount in the digital currency.
    pub digital_amount: f64,
    /// Fiat currency of `order_amount`.
    pub order_currency: String,
    /// Unix epoch milliseconds.
    pub payment_deadline: i64,
    /// Exchange rate between the two amounts.
    pub rate: f64,
    /// Payment window.
    pub period: i64,
    /// Language requested by the merchant.
    pub language: String,
    /// Callback notified once the payment succeeds.
    pub payment_success_webhook: String,
    /// App wallets accepted for the order.
    pub app_wallets: Vec<String>,
    /// Web3 wallet accepted for the order.
    pub web3_wallets: Web3Wallet,
    /// Merchant business type code.
    pub business_type: i64,
    /// Merchant business action code.
    pub business_action: i64,
}

/// Order status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderStatusParams {
    /// Order serial number.
    pub sn: String,
}

/// Raw order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrderStatusResponse {
    /// Raw status code, see [`PaymentStatus`].
    pub data: i64,
}

impl PaymentOrderStatusResponse {
    /// Decoded status, `None` for codes this client does not know.
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_code(self.data)
    }
}

/// QR code scan status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrcodeStatusParams {
    /// Order serial number.
    pub sn: String,
    /// QR code id shown to the payer.
    pub qrcode_id: String,
}

/// Whether the QR code was scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrcodeStatusResponse {
    /// True once scanned.
    pub data: bool,
}

/// Attach an on-chain transaction to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindTxHashParams {
    /// Order serial number.
    pub sn: String,
    /// On-chain transaction hash.
    pub tx_hash: String,
}

/// Whether the hash was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindTxHashResponse {
    /// True if the gateway accepted the hash.
    pub data: bool,
}

/// Create a payment order for a pre-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderParams {
    /// Pre-order serial number.
    pub pre_sn: String,
    /// Amount to pay in `coin`.
    pub digital_amount: f64,
    /// Digital currency symbol.
    pub coin: String,
    /// Exchange rate quoted by the pre-order.
    pub rate: f64,
    /// Wallet chosen by the payer.
    pub wallet_type: String,
    /// Client platform code.
    pub client_type: i64,
    /// Chain the payment is made on.
    pub chain: String,
    /// Paying address.
    pub signer: String,
    /// 1 for a Web3 wallet, 0 for an app wallet.
    pub is_web3: i64,
}

/// Serial number of the created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrderData {
    /// Order serial number.
    pub sn: String,
}

/// Created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrderResponse {
    /// The created order.
    pub data: PaymentOrderData,
}

impl<T: Transport, S: SessionStore> RedotClient<T, S> {
    /// Fetch pre-order details.
    pub async fn get_pre_order_info(
        &mut self,
        params: &PreOrderParams,
    ) -> Result<PreOrderResponse> {
        let route = self.config().routes.pre_order_details.clone();
        self.request_api(&route, params).await
    }

    /// Fetch the payment order status.
    pub async fn get_payment_order_status(
        &mut self,
        params: &PaymentOrderStatusParams,
    ) -> Result<PaymentOrderStatusResponse> {
        let route = self.config().routes.order_status.clone();
        self.request_api(&route, params).await
    }

    /// Fetch whether the order's QR code was scanned.
    pub async fn get_qr_code_status(
        &mut self,
        params: &QrcodeStatusParams,
    ) -> Result<QrcodeStatusResponse> {
        let route = self.config().routes.qrcode_status.clone();
        self.request_api(&route, params).await
    }

    /// Bind a transaction hash to an order.
    pub async fn bind_tx_hash(&mut self, params: &BindTxHashParams) -> Result<BindTxHashResponse> {
        let route = self.config().routes.bind_tx_hash.clone();
        self.request_api(&route, params).await
    }

    /// Create a payment order.
    pub async fn create_order(
        &mut self,
        params: &PaymentOrderParams,
    ) -> Result<PaymentOrderResponse> {
        let route = self.config().routes.create_order.clone();
        self.request_api(&route, params).await
    }
}
