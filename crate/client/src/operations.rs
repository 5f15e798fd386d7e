use wxpay_protocol::FieldMapping;

use crate::{client::PaymentClient, endpoints::Endpoint, error::result::ClientResult};

macro_rules! operation {
    ($(#[$doc:meta])* $name:ident => $endpoint:ident) => {
        $(#[$doc])*
        pub async fn $name(&self, params: FieldMapping) -> ClientResult<FieldMapping> {
            self.call(Endpoint::$endpoint, params).await
        }
    };
}

/// One method per endpoint of the table, each a thin call to [`PaymentClient::dispatch`].
impl PaymentClient {
    operation!(
        /// Pay with a scanned customer barcode.
        micropay => Micropay
    );
    operation!(
        /// Cancel a barcode payment.
        reverse => Reverse
    );
    operation!(
        /// Place an order; `trade_type` defaults to `JSAPI`.
        unified_order => UnifiedOrder
    );
    operation!(order_query => OrderQuery);
    operation!(close_order => CloseOrder);
    operation!(
        /// Request a refund; `notify_url` defaults to the configured refund URL.
        refund => Refund
    );
    operation!(refund_query => RefundQuery);
    operation!(send_coupon => SendCoupon);
    operation!(query_coupon_stock => QueryCouponStock);
    operation!(query_coupon_info => QueryCouponInfo);
    operation!(
        /// Pay out to a user's wallet.
        transfers => Transfers
    );
    operation!(transfers_query => TransfersQuery);
    operation!(
        /// RSA public key used to encrypt the bank fields of [`Self::pay_bank`].
        get_public_key => GetPublicKey
    );
    operation!(
        /// Pay out to a bank card. `enc_bank_no` and `enc_true_name` are expected
        /// encrypted with [`wxpay_crypto::encrypt_rsa`].
        pay_bank => PayBank
    );
    operation!(query_bank => QueryBank);
    operation!(
        /// Send a red packet; a `mch_autono` parameter is never sent.
        send_redpack => SendRedpack
    );
    operation!(send_group_redpack => SendGroupRedpack);
    operation!(redpack_query => RedpackQuery);
    operation!(micro_submit => MicroSubmit);
    operation!(micro_update_contact => MicroUpdateContact);
    operation!(micro_update_archive => MicroUpdateArchive);
    operation!(micro_get_state => MicroGetState);
    operation!(micro_follow => MicroFollow);
    operation!(micro_bind => MicroBind);
    operation!(micro_query_config => MicroQueryConfig);

    /// Download the trade bill; the report comes back as raw bytes.
    pub async fn download_bill(&self, params: FieldMapping) -> ClientResult<Vec<u8>> {
        self.dispatch(Endpoint::DownloadBill, params)
            .await?
            .into_raw()
    }

    /// Download the fund flow bill; the report comes back as raw bytes.
    pub async fn download_fundflow(&self, params: FieldMapping) -> ClientResult<Vec<u8>> {
        self.dispatch(Endpoint::DownloadFundflow, params)
            .await?
            .into_raw()
    }
}
