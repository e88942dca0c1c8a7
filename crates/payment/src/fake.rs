//! QR payment gateway that never leaves the process.

use async_trait::async_trait;
use common::OrderId;
use domain::{Money, PaymentError, PaymentGateway, PaymentIntent};
use uuid::Uuid;

/// Payload format indicator, point of initiation and merchant account
/// header of a Mercado Pago dynamic QR.
pub const DEFAULT_QR_PREFIX: &str = "00020101021243650016COM.MERCADOLIBRE0201306";

const MERCHANT_CATEGORY: &str = "0000";
const CURRENCY_BRL: &str = "986";
const COUNTRY: &str = "BR";
const MERCHANT_NAME: &str = "FASTFOOD";
const MERCHANT_CITY: &str = "SAO PAULO";

/// Payment gateway issuing EMV-style QR payloads without calling a provider.
#[derive(Debug, Clone)]
pub struct FakePaymentGateway {
    qr_prefix: String,
}

impl Default for FakePaymentGateway {
    fn default() -> Self {
        Self::new(DEFAULT_QR_PREFIX)
    }
}

impl FakePaymentGateway {
    /// Creates a gateway whose payloads start with `qr_prefix`.
    pub fn new(qr_prefix: impl Into<String>) -> Self {
        Self {
            qr_prefix: qr_prefix.into(),
        }
    }

    pub fn qr_prefix(&self) -> &str {
        &self.qr_prefix
    }

    fn qr_payload(&self, external_id: &str, order_id: OrderId, amount: Money) -> String {
        let mut payload = self.qr_prefix.clone();
        payload.push_str(&field("36", external_id));
        payload.push_str(&field("52", MERCHANT_CATEGORY));
        payload.push_str(&field("53", CURRENCY_BRL));
        payload.push_str(&field("54", &amount.to_string()));
        payload.push_str(&field("58", COUNTRY));
        payload.push_str(&field("59", MERCHANT_NAME));
        payload.push_str(&field("60", MERCHANT_CITY));
        payload.push_str(&field("62", &field("05", &order_id.to_string())));
        payload.push_str("6304");
        let crc = crc16(payload.as_bytes());
        payload.push_str(&format!("{crc:04X}"));
        payload
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    #[tracing::instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentIntent, PaymentError> {
        if !amount.is_positive() {
            return Err(PaymentError::Rejected(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let external_id = Uuid::new_v4().to_string();
        let qr_code_data = self.qr_payload(&external_id, order_id, amount);

        tracing::debug!(%order_id, %external_id, "payment intent issued");

        Ok(PaymentIntent {
            qr_code_data,
            external_id,
        })
    }
}

/// Encodes one EMV data object: id, two-digit length, value.
fn field(id: &str, value: &str) -> String {
    format!("{id}{:02}{value}", value.len())
}

/// CRC-16/CCITT-FALSE, the checksum closing every EMV QR payload.
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
