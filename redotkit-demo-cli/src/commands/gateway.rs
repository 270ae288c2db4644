//! Gateway commands: signed, encrypted calls over HTTP

use anyhow::Result;
use redotkit_lib::api::{
    BindTxHashParams, PaymentOrderStatusParams, PaymentStatus, PreOrderParams, QrcodeStatusParams,
};
use serde_json::Value;

use super::{read_payload, DemoClient};
use crate::ui;

pub async fn call(client: &mut DemoClient, route: &str, payload: &str) -> Result<()> {
    let payload = read_payload(payload)?;
    tracing::debug!(route, "calling gateway");

    let reply: Value = client.request_api(route, &payload).await?;
    ui::json(&reply);
    Ok(())
}

pub async fn pre_order(client: &mut DemoClient, pre_sn: Option<String>) -> Result<()> {
    let pre_sn = match pre_sn {
        Some(sn) => sn,
        None if !client.session().pre_order_id().is_empty() => {
            client.session().pre_order_id().to_string()
        }
        None => anyhow::bail!("No pre-order id: pass one or set REDOT_PREORDER_ID"),
    };

    let order = client.get_pre_order_info(&PreOrderParams::new(pre_sn)).await?;

    ui::header("Pre-order");
    ui::key_value("Pre-order", &order.pre_sn);
    ui::key_value("Merchant order", &order.outer_order);
    ui::key_value(
        "Amount",
        &format!("{} {}", order.order_amount, order.order_currency),
    );
    ui::key_value("Digital amount", &order.digital_amount.to_string());
    ui::key_value("Rate", &order.rate.to_string());
    ui::key_value("Deadline (ms)", &order.payment_deadline.to_string());
    if !order.app_wallets.is_empty() {
        ui::key_value("App wallets", &order.app_wallets.join(", "));
    }
    for chain in &order.web3_wallets.chains {
        ui::key_value(&chain.chain, &chain.payment_address);
    }
    Ok(())
}

pub async fn order_status(client: &mut DemoClient, sn: String) -> Result<()> {
    let response = client
        .get_payment_order_status(&PaymentOrderStatusParams { sn })
        .await?;

    match response.status() {
        Some(status @ PaymentStatus::Success) => ui::success(&format!("{:?}", status)),
        Some(status) if status.is_terminal() => ui::error(&format!("{:?}", status)),
        Some(status) => ui::info(&format!("{:?}", status)),
        None => ui::warning(&format!("Unknown status code {}", response.data)),
    }
    Ok(())
}

pub async fn qrcode_status(client: &mut DemoClient, sn: String, qrcode_id: String) -> Result<()> {
    let response = client
        .get_qr_code_status(&QrcodeStatusParams { sn, qrcode_id })
        .await?;

    if response.data {
        ui::success("QR code scanned");
    } else {
        ui::info("QR code not scanned yet");
    }
    Ok(())
}

pub async fn bind_tx(client: &mut DemoClient, sn: String, tx_hash: String) -> Result<()> {
    let response = client
        .bind_tx_hash(&BindTxHashParams { sn, tx_hash })
        .await?;

    if response.data {
        ui::success("Transaction bound to order");
    } else {
        ui::warning("Gateway did not accept the transaction hash");
    }
    Ok(())
}
